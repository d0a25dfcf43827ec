//! Common utilities and types shared across rxline

pub mod config;
pub mod error;
pub mod utils;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use utils::{normalize_endpoint, parse_duration, seed_member_id};
