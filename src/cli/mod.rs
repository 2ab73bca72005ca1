//! CLI command handlers
//!
//! Each subcommand is implemented in its own module.

pub mod ask;
pub mod config;
pub mod export;
pub mod helpers;
pub mod init;
pub mod report;
pub mod status;
pub mod submit;
