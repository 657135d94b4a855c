//! CLI command implementations

pub mod init;
pub mod plugin;
pub mod steps;
