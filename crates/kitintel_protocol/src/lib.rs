//! Wire contract for the KIT Intel API.
//!
//! Request/response bodies exchanged with the remote service, the search
//! keyword vocabulary, and the canonical defaults and paths shared by the
//! CLI and the submission pipeline.
//!
//! # Endpoints
//!
//! ```text
//! POST {endpoint}/search   SearchRequest  -> SearchResponse
//! POST {endpoint}/content  ContentRequest -> ContentResponse
//! POST {endpoint}/submit   SubmitRequest  -> SubmitResponse
//! PUT  {upload_url}        raw archive bytes (Content-Type: application/binary)
//! ```

pub mod defaults;
pub mod error;
pub mod http_types;
pub mod keywords;
pub mod paths;

pub use error::ProtocolError;
pub use http_types::{
    ContentRequest, ContentResponse, DatetimeFilter, SearchRequest, SearchResponse, SubmitRequest,
    SubmitResponse,
};
pub use keywords::{
    known_keywords, parse_filter, parse_search_terms, parse_unique_key, resolve_keyword, SearchTerm,
};
