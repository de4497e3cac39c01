//! Search command - query the KIT Intel index

use crate::cli::error::HelpfulError;
use crate::cli::{connect, save_download};
use clap::ValueEnum;
use kitintel::config::KitConfig;
use kitintel::output::apply_unique;
use kitintel_protocol::{
    parse_filter, parse_search_terms, parse_unique_key, DatetimeFilter, ProtocolError,
    SearchRequest,
};
use kitintel_tabular::flatten;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// One row per flattened result combination
    Csv,
}

#[derive(Debug)]
pub struct SearchArgs {
    pub search: String,
    pub filter: Option<String>,
    pub number: u32,
    pub date: String,
    pub unique: Option<String>,
    pub format: Option<OutputFormat>,
    pub download: bool,
}

/// Build the request body from the command arguments.
pub fn build_request(args: &SearchArgs) -> Result<SearchRequest, ProtocolError> {
    if args.number == 0 {
        return Err(ProtocolError::InvalidPageSize(args.number.to_string()));
    }
    let mut request = SearchRequest::new()
        .with_terms(parse_search_terms(&args.search)?)
        .with_page_size(args.number)
        .with_datetime_filter(DatetimeFilter::relative(args.date.trim()));
    if let Some(filter) = &args.filter {
        request = request.with_filter(parse_filter(filter)?);
    }
    Ok(request)
}

/// Render the response in the requested format. Returns the text and the
/// file extension used when downloading.
pub fn render(response: &Value, format: Option<OutputFormat>) -> anyhow::Result<(String, &'static str)> {
    Ok(match format {
        None => (serde_json::to_string(response)?, "json"),
        Some(OutputFormat::Json) => (serde_json::to_string_pretty(response)?, "json"),
        Some(OutputFormat::Csv) => (flatten(response).to_csv_string()?, "csv"),
    })
}

pub fn run(args: SearchArgs, config: &KitConfig) -> anyhow::Result<()> {
    let request = build_request(&args).map_err(|e| HelpfulError::bad_term(&e))?;
    let unique_path = match &args.unique {
        Some(key) => Some(parse_unique_key(key).map_err(|e| HelpfulError::bad_term(&e))?),
        None => None,
    };

    let client = connect(config)?;
    info!(terms = request.terms.len(), page_size = args.number, "Searching");
    let mut response = client
        .search(&request)
        .map_err(|e| HelpfulError::remote("Search", &e))?;

    if let Some(path) = &unique_path {
        apply_unique(&mut response, path);
    }

    let (content, extension) = render(&response, args.format)?;
    if args.download {
        let name = uuid::Uuid::new_v4().to_string();
        save_download(&config.download_dir, &name, extension, content.as_bytes())?;
    } else {
        println!("{}", content);
    }
    Ok(())
}
