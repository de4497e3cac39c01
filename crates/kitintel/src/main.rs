//! kitintel - command-line client for the KIT Intel phishing-kit API
//!
//! Usage:
//!   kitintel search -s "kit.sha256:<hash>"    # Query the index
//!   kitintel content -u <uuid>                # Fetch a stored artifact
//!   kitintel submit -f kits/ -r               # Upload kit archives
//!   kitintel config                           # Show resolved settings

use clap::{Parser, Subcommand};
use kitintel::config::{ConfigOverrides, KitConfig};
use kitintel_logging::{init_logging, LogConfig};
use kitintel_protocol::defaults::{
    API_KEY_ENV, DEFAULT_PAGE_SIZE, DEFAULT_RELATIVE_DATE, ENDPOINT_ENV,
};
use kitintel_submit::CancellationToken;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

mod cli;

use cli::error::HelpfulError;

#[derive(Parser, Debug)]
#[command(
    name = "kitintel",
    version,
    about = "Search, download and submit phishing kits with KIT Intel"
)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// API key sent with every request
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the KIT API
    #[arg(long, global = true, env = ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// Directory downloads are written to
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// Config file (default: ~/.kitintel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the index with keyword:value terms
    Search {
        /// Comma separated keyword:value pairs, e.g. "kitname:office,md5:..."
        #[arg(short = 's', long)]
        search: String,

        /// Comma separated fields to return
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// Results per page
        #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
        number: u32,

        /// Relative time window, e.g. 3h, 6d, 9w, 1y
        #[arg(short = 'd', long, default_value = DEFAULT_RELATIVE_DATE)]
        date: String,

        /// Keep one result per distinct value of this field
        #[arg(short = 'u', long)]
        unique: Option<String>,

        /// Output format (default: compact JSON)
        #[arg(long, value_enum)]
        format: Option<cli::search::OutputFormat>,

        /// Save output to <download-dir>/<random uuid>.<ext> instead of printing
        #[arg(long)]
        download: bool,
    },

    /// Fetch stored artifacts by UUID
    Content {
        /// One or more artifact UUIDs
        #[arg(short = 'u', long = "uuid", num_args = 1.., required = true)]
        uuids: Vec<String>,

        /// Save each artifact to <download-dir>/<uuid>.txt
        #[arg(long)]
        download: bool,
    },

    /// Submit kit archives (files or directories)
    Submit {
        /// Archives or directories containing archives
        #[arg(short = 'f', long = "file", num_args = 1.., required = true)]
        files: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(short = 'r', long)]
        recursive: bool,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (API key redacted)
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn needs_api_key(&self) -> bool {
        !matches!(self, Commands::Config { .. })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(LogConfig {
        app_name: "kitintel",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = KitConfig::resolve(ConfigOverrides {
        api_key: cli.api_key,
        endpoint: cli.endpoint,
        download_dir: cli.download_dir,
        config_path: cli.config,
    })?;

    if cli.command.needs_api_key() && config.api_key.is_none() {
        return Err(HelpfulError::missing_api_key().into());
    }
    info!(endpoint = %config.endpoint, "Configuration resolved");

    match cli.command {
        Commands::Search {
            search,
            filter,
            number,
            date,
            unique,
            format,
            download,
        } => cli::search::run(
            cli::search::SearchArgs {
                search,
                filter,
                number,
                date,
                unique,
                format,
                download,
            },
            &config,
        ),
        Commands::Content { uuids, download } => {
            cli::content::run(cli::content::ContentArgs { uuids, download }, &config)
        }
        Commands::Submit {
            files,
            recursive,
            json,
        } => {
            let cancel = CancellationToken::new();
            install_interrupt_handler(cancel.clone());
            cli::submit::run(
                cli::submit::SubmitArgs {
                    files,
                    recursive,
                    json,
                },
                &config,
                cancel,
            )
        }
        Commands::Config { json } => cli::config::run(cli::config::ConfigArgs { json }, &config),
    }
}

/// First Ctrl+C stops the batch after the current file; a second one exits.
fn install_interrupt_handler(cancel: CancellationToken) {
    let result = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("Interrupted, finishing the current file...");
        cancel.cancel();
    });
    if let Err(err) = result {
        warn!("Failed to install Ctrl+C handler: {}", err);
    }
}
