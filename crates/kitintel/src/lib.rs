//! KIT Intel command-line client.
//!
//! The library half holds configuration resolution, the HTTP client that
//! implements the submission pipeline's remote contracts, and output
//! helpers. Command handlers live with the binary.

pub mod api;
pub mod config;
pub mod output;

pub use api::{classify_status, ClientInitError, KitApiClient};
pub use config::{ConfigError, ConfigOverrides, KitConfig};
