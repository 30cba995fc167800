pub mod auth;
pub mod init;
pub mod play;
pub mod ranking;
pub mod validate;
