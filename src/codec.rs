// Wire codec for expression graphs

pub mod decoder;
pub mod encoder;

// Re-export commonly used items
pub use decoder::{decode, decode_context, decode_structure, Decoder};
pub use encoder::{encode, to_json};

use thiserror::Error;

use crate::expression::{ExpressionError, Tag};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {tag} record: {source}")]
    Construction {
        tag: Tag,
        #[source]
        source: ExpressionError,
    },

    #[error("Context must be a mapping, got {0}")]
    NotAMapping(String),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
