pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod lesson;
pub mod load_config;
pub mod progress;
pub mod prompt;
pub mod synchronise;
pub mod upload;

pub use cli::{run, Cli, Commands};
pub use error::SyncError;
