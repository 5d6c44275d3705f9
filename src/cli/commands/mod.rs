mod create_user;
mod init;
mod report;

pub use create_user::cmd_create_user;
pub use init::cmd_init;
pub use report::cmd_report;
