//! Create user command handler

use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, SeaOrmAuthService, SignUpRequest};

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    email: &str,
    account_type: Option<String>,
) -> anyhow::Result<()> {
    print!("Password for {username}: ");
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']).to_string();

    let store = Store::new(&config.general.database_path).await?;
    let service = SeaOrmAuthService::new(store.clone());

    let result = service
        .sign_up(SignUpRequest {
            email: email.to_string(),
            username: username.to_string(),
            password,
            account_type,
        })
        .await;
    store.close().await?;

    match result {
        Ok(user) => {
            println!("✓ Created {} ({})", user.username, user.account_type);
            Ok(())
        }
        Err(AuthError::UsernameTaken(name)) => {
            println!("User {name} already exists.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(e)),
    }
}
