use std::error::Error as StdError;

use thiserror::Error;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The crate-wide error type.
///
/// Every variant corresponds to one failure class of loading or saving a document, so callers
/// can branch on [`Error::kind`] without matching message text.
#[derive(Debug, Error)]
pub enum Error {
    /// The archive is unreadable, or its metadata entry is missing or not valid JSON.
    #[error("corrupt container: {message}")]
    CorruptContainer {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A declared source has no matching archive entry.
    #[error("missing asset '{file_name}' in container")]
    MissingAsset { file_name: String },

    /// The audio decoding service rejected a source's bytes.
    #[error("failed to decode audio for '{file_name}': {message}")]
    DecodeFailure { file_name: String, message: String },

    /// The destination sink failed while encoding.
    #[error("write failure: {message}")]
    WriteFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A document violates the model invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Discriminant of [`Error`], handy for assertions and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CorruptContainer,
    MissingAsset,
    DecodeFailure,
    WriteFailure,
    InvariantViolation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CorruptContainer { .. } => ErrorKind::CorruptContainer,
            Self::MissingAsset { .. } => ErrorKind::MissingAsset,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::WriteFailure { .. } => ErrorKind::WriteFailure,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::CorruptContainer {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn corrupt_msg(message: impl Into<String>) -> Self {
        Self::CorruptContainer {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn write(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::WriteFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    pub(crate) fn decode(file_name: impl Into<String>, err: anyhow::Error) -> Self {
        Self::DecodeFailure {
            file_name: file_name.into(),
            message: format!("{err:#}"),
        }
    }
}
