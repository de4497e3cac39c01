use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown {kind} term '{term}'")]
    UnknownKeyword { kind: &'static str, term: String },

    #[error("invalid key:value pair '{0}'")]
    InvalidPair(String),

    #[error("invalid page size '{0}'")]
    InvalidPageSize(String),
}
