//! Codec error taxonomy

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, decoding or encoding.
///
/// `Clone + Eq` so an error can be carried inside a [`DecodeResult`](super::DecodeResult)
/// and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("ABI not loaded, load an ABI first")]
    NotLoaded,

    #[error("invalid ABI description: {reason}")]
    InvalidDescription { reason: String },

    #[error("failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("data too short to contain a function selector ({len} hex chars, need 8)")]
    DataTooShort { len: usize },

    #[error("invalid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("invalid transaction envelope: {reason}")]
    InvalidTransaction { reason: String },

    #[error("no event matches topic {topic}")]
    UnknownEvent { topic: String },

    #[error("no function named '{name}' in ABI")]
    UnknownFunction { name: String },

    #[error("topic count mismatch: expected {expected}, got {got}")]
    DecodeMismatch { expected: usize, got: usize },

    #[error("ABI decode failed: {reason}")]
    Decode { reason: String },

    #[error("error encoding function call: {reason}")]
    Encode { reason: String },
}

impl CodecError {
    /// Short machine-readable tag, used in JSON output
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotLoaded => "not_loaded",
            Self::InvalidDescription { .. } => "invalid_description",
            Self::Read { .. } => "read",
            Self::DataTooShort { .. } => "data_too_short",
            Self::InvalidHex { .. } => "invalid_hex",
            Self::InvalidTransaction { .. } => "invalid_transaction",
            Self::UnknownEvent { .. } => "unknown_event",
            Self::UnknownFunction { .. } => "unknown_function",
            Self::DecodeMismatch { .. } => "decode_mismatch",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
        }
    }
}

pub type Result<T, E = CodecError> = std::result::Result<T, E>;
