//! Search vocabulary.
//!
//! Users may type short aliases (`sha256`, `filename`) or the full dotted API
//! field name (`file.sha256`). Everything is resolved to the API field name
//! before a request is built; unknown terms never reach the wire.

use crate::error::ProtocolError;

/// `(user term, API field)` pairs, sorted by user term.
const KEYWORDS: &[(&str, &str)] = &[
    ("UUID", "UUID"),
    ("content", "content"),
    ("datetime", "datetime"),
    ("file.UUID", "file.UUID"),
    ("file.filename", "file.filename"),
    ("file.filetype", "file.filetype"),
    ("file.md5", "file.md5"),
    ("file.sha256", "file.sha256"),
    ("file.size", "file.size"),
    ("file.ssdeep", "file.ssdeep"),
    ("filename", "file.filename"),
    ("filetype", "file.filetype"),
    ("fullfilename", "fullfilename"),
    ("kit.UUID", "kit.UUID"),
    ("kit.filetype", "kit.filetype"),
    ("kit.kitname", "kit.kitname"),
    ("kit.md5", "kit.md5"),
    ("kit.sha256", "kit.sha256"),
    ("kit.size", "kit.size"),
    ("kit.ssdeep", "kit.ssdeep"),
    ("md5", "file.md5"),
    ("scroll_id", "scroll_id"),
    ("sha256", "file.sha256"),
    ("size", "file.size"),
    ("size_filter", "size_filter"),
    ("ssdeep", "file.ssdeep"),
];

/// Map a user-facing term to its API field name.
pub fn resolve_keyword(term: &str) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(alias, _)| *alias == term)
        .map(|(_, field)| *field)
}

/// All accepted user-facing terms, for help output.
pub fn known_keywords() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().map(|(alias, _)| *alias)
}

/// One `field:value` search constraint with the field already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub field: &'static str,
    pub value: String,
}

impl SearchTerm {
    /// Parse a single `keyword:value` pair.
    ///
    /// The split happens at the first `:` so values may themselves contain
    /// colons. Spaces inside the keyword are dropped.
    pub fn parse(pair: &str) -> Result<Self, ProtocolError> {
        let (keyword, value) = pair
            .split_once(':')
            .ok_or_else(|| ProtocolError::InvalidPair(pair.to_string()))?;
        let keyword: String = keyword.chars().filter(|c| *c != ' ').collect();
        let field = resolve_keyword(&keyword).ok_or(ProtocolError::UnknownKeyword {
            kind: "search",
            term: keyword.clone(),
        })?;
        Ok(Self {
            field,
            value: value.to_string(),
        })
    }
}

/// Parse a comma separated list of `keyword:value` pairs.
pub fn parse_search_terms(input: &str) -> Result<Vec<SearchTerm>, ProtocolError> {
    input.split(',').map(SearchTerm::parse).collect()
}

/// Parse a comma separated list of field names used to narrow returned keys.
pub fn parse_filter(input: &str) -> Result<Vec<&'static str>, ProtocolError> {
    input
        .split(',')
        .map(|term| {
            let term = term.trim();
            resolve_keyword(term).ok_or(ProtocolError::UnknownKeyword {
                kind: "filter",
                term: term.to_string(),
            })
        })
        .collect()
}

/// Resolve the `--unique` key into the path segments used to walk a result.
pub fn parse_unique_key(input: &str) -> Result<Vec<&'static str>, ProtocolError> {
    let term = input.trim();
    let field = resolve_keyword(term).ok_or(ProtocolError::UnknownKeyword {
        kind: "unique",
        term: term.to_string(),
    })?;
    Ok(field.split('.').collect())
}
