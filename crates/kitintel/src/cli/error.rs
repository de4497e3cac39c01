//! User-facing errors for CLI commands.
//!
//! Each error carries what went wrong, optional context, and suggestions.

use kitintel_protocol::defaults::{API_KEY_ENV, ENDPOINT_ENV};
use kitintel_protocol::{known_keywords, ProtocolError};
use kitintel_submit::RemoteError;
use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    pub fn missing_api_key() -> Self {
        Self::new("KIT Intel API key not configured")
            .with_context("Every API call is authenticated with an x-api-key header")
            .with_suggestions([
                format!("TRY: export {}=<your key>", API_KEY_ENV),
                "TRY: Pass the key explicitly with --api-key".to_string(),
            ])
    }

    pub fn file_exists(path: &Path) -> Self {
        Self::new(format!("File already exists: {}", path.display()))
            .with_context("Downloads never overwrite existing files")
            .with_suggestions([
                "TRY: Remove or rename the existing file".to_string(),
                "TRY: Choose another location with --download-dir".to_string(),
            ])
    }

    pub fn write_failed(path: &Path, err: &std::io::Error) -> Self {
        Self::new(format!("Failed to write {}", path.display()))
            .with_context(err.to_string())
            .with_suggestion("TRY: Check that the download directory exists and is writable")
    }

    /// Bad search, filter or unique term.
    pub fn bad_term(err: &ProtocolError) -> Self {
        let keywords: Vec<&str> = known_keywords().collect();
        let base = Self::new(err.to_string());
        match err {
            ProtocolError::UnknownKeyword { .. } => base
                .with_context(format!("Known keywords: {}", keywords.join(", ")))
                .with_suggestion("TRY: Check the keyword spelling"),
            ProtocolError::InvalidPair(_) => base
                .with_context("Search terms are written as keyword:value")
                .with_suggestion("TRY: kitintel search -s \"kit.sha256:<hash>\""),
            ProtocolError::InvalidPageSize(_) => {
                base.with_suggestion("TRY: Use a page size of at least 1")
            }
        }
    }

    /// Failed API call.
    pub fn remote(action: &str, err: &RemoteError) -> Self {
        let base = Self::new(format!("{} failed", action)).with_context(err.to_string());
        match err {
            RemoteError::PermissionDenied => base.with_suggestions([
                format!("TRY: Check the value of {} or --api-key", API_KEY_ENV),
                "TRY: Confirm your key is entitled to this endpoint".to_string(),
            ]),
            RemoteError::Transport(_) => base.with_suggestions([
                "TRY: Check network connectivity".to_string(),
                format!("TRY: Verify the endpoint ({} or --endpoint)", ENDPOINT_ENV),
            ]),
            RemoteError::UnexpectedStatus { .. } | RemoteError::Decode(_) => {
                base.with_suggestion("TRY: Re-run with --verbose and check the log file")
            }
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;
        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }
        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
