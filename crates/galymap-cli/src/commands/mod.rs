//! CLI command implementations.

pub mod anchors;
pub mod init_config;
pub mod probe;
pub mod read;
pub mod signatures;
pub mod status;
pub mod watch;
