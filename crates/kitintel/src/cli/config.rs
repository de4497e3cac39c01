//! Config command - show resolved settings

use kitintel::config::{ConfigSummary, KitConfig};

#[derive(Debug)]
pub struct ConfigArgs {
    pub json: bool,
}

pub fn render_text(summary: &ConfigSummary) -> String {
    let config_file = summary
        .config_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none, using defaults)".to_string());
    [
        format!("api_key:             {}", summary.api_key),
        format!("endpoint:            {}", summary.endpoint),
        format!("download_dir:        {}", summary.download_dir.display()),
        format!("timeout_secs:        {}", summary.timeout_secs),
        format!("max_upload_attempts: {}", summary.max_upload_attempts),
        format!("dedup_delay_ms:      {}", summary.dedup_delay_ms),
        format!("config_file:         {}", config_file),
    ]
    .join("\n")
}

pub fn run(args: ConfigArgs, config: &KitConfig) -> anyhow::Result<()> {
    let summary = config.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", render_text(&summary));
    }
    Ok(())
}
