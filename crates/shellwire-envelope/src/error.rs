use crate::category::Category;

/// Errors that can occur while decoding a frame payload.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A required envelope field is absent.
    #[error("envelope is missing field `{0}`")]
    MissingField(&'static str),

    /// A field has the wrong JSON type.
    #[error("envelope field `{field}` must be {expected}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
    },

    /// A JSON-encoded category could not be decoded.
    #[error("category `{category}` is not valid JSON: {source}")]
    InvalidCategory {
        category: Category,
        source: serde_json::Error,
    },

    /// An output format name was not recognised.
    #[error("unknown output format `{0}` (expected json, csv, html, text or raw)")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
