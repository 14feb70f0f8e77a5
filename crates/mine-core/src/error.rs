//! Error types for the engine and the level codec.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Truncated input while reading {context} at offset {offset}")]
    Truncated { context: &'static str, offset: usize },

    #[error("Unsupported format version {found} (max {max})")]
    UnsupportedVersion { found: u32, max: u32 },

    #[error("Unknown tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("Unknown object identifier 0x{byte:02x} at offset {offset}")]
    UnknownObject { byte: u8, offset: usize },

    #[error("Invalid demo: {0}")]
    InvalidDemo(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// True for errors caused by a damaged byte stream, where a truncation
    /// repair may still salvage the leading records.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Truncated { .. } | Error::UnknownTag { .. } | Error::UnknownObject { .. }
        )
    }
}
