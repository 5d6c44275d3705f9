//! CLI module - Command-line interface for StockPlus
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// StockPlus - inventory and label management for small shops
#[derive(Parser)]
#[command(name = "stockplus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server and the low-stock scheduler (default)
    Serve,

    /// Run the low-stock report once and exit
    Report,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a user account; the password is read from stdin
    CreateUser {
        /// Login name
        username: String,
        /// Contact address
        email: String,
        /// Role stored with the account
        #[arg(long)]
        account_type: Option<String>,
    },
}

pub use commands::*;
