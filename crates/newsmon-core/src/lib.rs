pub mod ai;
pub mod collect;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
