//! HTTP API types for the KIT Intel service.
//!
//! Field names match the remote JSON exactly (including `UUID`), so most
//! structs carry explicit `serde(rename)` attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keywords::SearchTerm;

// ============================================================================
// Search
// ============================================================================

/// Relative lower bound on result timestamps, e.g. `{"gte": "now-1y"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatetimeFilter {
    pub gte: String,
}

impl DatetimeFilter {
    /// Build from a relative span such as `3h`, `6d`, `9w`.
    pub fn relative(span: &str) -> Self {
        Self {
            gte: format!("now-{}", span),
        }
    }
}

/// Body of `POST /search`.
///
/// Search constraints are flattened into the top-level object keyed by
/// their API field name (`"kit.sha256": "..."`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub terms: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime_filter: Option<DatetimeFilter>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint. A later term for the same field replaces the earlier one.
    pub fn with_term(mut self, term: SearchTerm) -> Self {
        self.terms
            .insert(term.field.to_string(), Value::String(term.value));
        self
    }

    pub fn with_terms(self, terms: impl IntoIterator<Item = SearchTerm>) -> Self {
        terms.into_iter().fold(self, |req, term| req.with_term(term))
    }

    pub fn with_filter(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_datetime_filter(mut self, filter: DatetimeFilter) -> Self {
        self.datetime_filter = Some(filter);
        self
    }

    /// Minimal lookup used to check whether a kit archive is already indexed.
    pub fn kit_by_sha256(sha256_hex: &str) -> Self {
        Self::new()
            .with_term(SearchTerm {
                field: "kit.sha256",
                value: sha256_hex.to_string(),
            })
            .with_filter(["kit.UUID"])
            .with_page_size(1)
    }
}

/// Body returned by `POST /search`.
///
/// Only the fields the client interprets are typed; everything else is kept
/// in `extra` so the full document can be re-emitted as JSON or CSV.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResponse {
    /// Number of matches reported by the index. A null count means none.
    pub fn match_count(&self) -> u64 {
        self.total_count.unwrap_or(0)
    }
}

// ============================================================================
// Content
// ============================================================================

/// Body of `POST /content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    #[serde(rename = "UUID")]
    pub uuid: String,
}

/// Body returned by `POST /content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub download_url: String,
}

// ============================================================================
// Submission
// ============================================================================

/// Body of `POST /submit`: requests a one-time upload URL for a kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub file_name: String,
}

/// Body returned by `POST /submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub upload_url: String,
}
