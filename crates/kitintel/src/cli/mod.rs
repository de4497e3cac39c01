//! CLI command handlers.

pub mod config;
pub mod content;
pub mod error;
pub mod search;
pub mod submit;

use error::HelpfulError;
use kitintel::api::{ClientInitError, KitApiClient};
use kitintel::config::{ConfigError, KitConfig};
use kitintel::output::save_to_file;
use std::io::ErrorKind;
use std::path::Path;

/// Build an authenticated client, turning a missing key into a helpful error.
pub fn connect(config: &KitConfig) -> anyhow::Result<KitApiClient> {
    match KitApiClient::new(config) {
        Ok(client) => Ok(client),
        Err(ClientInitError::Config(ConfigError::MissingApiKey)) => {
            Err(HelpfulError::missing_api_key().into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Save a download and report where it went.
pub fn save_download(dir: &Path, name: &str, extension: &str, content: &[u8]) -> anyhow::Result<()> {
    let target = dir.join(format!("{}.{}", name, extension));
    match save_to_file(dir, name, extension, content) {
        Ok(path) => {
            println!("OK\t- Content downloaded to: {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(HelpfulError::file_exists(&target).into())
        }
        Err(err) => Err(HelpfulError::write_failed(&target, &err).into()),
    }
}
