//! Content command - fetch stored artifacts by UUID

use crate::cli::error::HelpfulError;
use crate::cli::{connect, save_download};
use kitintel::config::KitConfig;
use tracing::{error, info};

#[derive(Debug)]
pub struct ContentArgs {
    pub uuids: Vec<String>,
    pub download: bool,
}

/// Strip the separators users paste along with UUIDs; drop empties.
pub fn normalize_uuids(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|item| item.split(','))
        .map(|uuid| uuid.trim().to_string())
        .filter(|uuid| !uuid.is_empty())
        .collect()
}

/// Parse every UUID, returning them in canonical hyphenated form.
///
/// Values become download file names, so anything that is not a UUID is
/// refused before a request is made.
pub fn parse_uuids(values: &[String]) -> Result<Vec<String>, HelpfulError> {
    values
        .iter()
        .map(|value| {
            uuid::Uuid::parse_str(value)
                .map(|uuid| uuid.hyphenated().to_string())
                .map_err(|err| {
                    HelpfulError::new(format!("Invalid UUID: {}", value))
                        .with_context(err.to_string())
                        .with_suggestion("TRY: Copy the UUID field from a search result")
                })
        })
        .collect()
}

/// Fetch each artifact in turn. One failed UUID does not stop the others;
/// the command fails at the end if any did.
pub fn run(args: ContentArgs, config: &KitConfig) -> anyhow::Result<()> {
    let uuids = parse_uuids(&normalize_uuids(&args.uuids))?;
    if uuids.is_empty() {
        return Err(HelpfulError::new("No UUIDs given")
            .with_suggestion("TRY: kitintel content -u <uuid>")
            .into());
    }

    let client = connect(config)?;
    let mut failures = 0usize;
    for uuid in &uuids {
        info!(uuid = %uuid, "Requesting content");
        let result = client
            .content(uuid)
            .map_err(|e| anyhow::Error::from(HelpfulError::remote(&format!("Content for {}", uuid), &e)))
            .and_then(|body| {
                if args.download {
                    save_download(&config.download_dir, uuid, "txt", body.as_bytes())
                } else {
                    println!("{}", body);
                    Ok(())
                }
            });
        if let Err(err) = result {
            error!(uuid = %uuid, "Content request failed");
            eprint!("{}", err);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} content requests failed", failures, uuids.len());
    }
    Ok(())
}
