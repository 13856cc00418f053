pub mod config;
pub mod error;
pub mod jsonl;
pub mod types;

pub use config::Config;
pub use error::RootMapError;
pub use types::*;
