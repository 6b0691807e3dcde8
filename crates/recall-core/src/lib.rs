pub mod config;
pub mod error;

pub use config::{ChatConfig, RecallConfig, StateThresholds, StorageBackend};
pub use error::{RecallError, Result};
