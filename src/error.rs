//! Error taxonomy.
//!
//! Framing and transport failures are returned as typed values, never
//! used as control flow across component boundaries. Per-record
//! content decode issues are not errors at all — they degrade to a raw
//! fallback inside the content codec and are only logged.

use crate::security::LockStage;
use thiserror::Error;

/// Message framing codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Record boundary parsing failed; fatal for the whole message.
    #[error("malformed NDEF message at offset {offset}: {reason}")]
    MalformedMessage { offset: usize, reason: String },

    /// A record field does not fit its length prefix.
    #[error("record {field} too long: {len} bytes")]
    FieldTooLong { field: &'static str, len: usize },
}

/// Tag-side operation errors.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("tag is not writable")]
    NotWritable,

    #[error("insufficient capacity: message needs {required} bytes, tag holds {available}")]
    InsufficientCapacity { required: usize, available: usize },

    #[error("tag format failed: {0}")]
    FormatFailure(String),

    #[error("tag connection failed: {0}")]
    ConnectionFailure(#[from] std::io::Error),

    /// Password authentication did not succeed. Non-fatal for writes:
    /// the write proceeds and may itself fail as not-writable.
    #[error("password authentication failed")]
    AuthenticationFailure,

    /// One stage of the lock sequence failed; the sequence halts there
    /// and earlier stages remain applied.
    #[error("lock sequence failed at stage {stage}")]
    LockStageFailure { stage: LockStage },
}

/// Unified error for the toolkit's public API.
///
/// Module-level errors convert automatically; callers needing finer
/// handling can match the wrapped variants.
#[derive(Debug, Error)]
pub enum NfcKitError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("tag error: {0}")]
    Tag(#[from] TagError),
}

impl NfcKitError {
    /// True if the failure came from message framing or encoding.
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// True if the failure came from the tag or its transport.
    pub fn is_tag_error(&self) -> bool {
        matches!(self, Self::Tag(_))
    }

    /// User-facing guidance when there is an obvious next step.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Tag(TagError::NotWritable) => {
                Some("The tag is read-only or password protected. Use a fresh tag.")
            }
            Self::Tag(TagError::InsufficientCapacity { .. }) => {
                Some("Shorten the content or use a larger-capacity tag variant.")
            }
            Self::Tag(TagError::ConnectionFailure(_)) => {
                Some("Keep the tag still against the reader and try again.")
            }
            Self::Tag(TagError::AuthenticationFailure) => {
                Some("The tag was locked with a different key; writes will be refused.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let codec: NfcKitError = CodecError::MalformedMessage {
            offset: 3,
            reason: "truncated".into(),
        }
        .into();
        assert!(codec.is_codec_error());
        assert!(!codec.is_tag_error());

        let tag: NfcKitError = TagError::NotWritable.into();
        assert!(tag.is_tag_error());
        assert!(tag.suggestion().is_some());
    }

    #[test]
    fn test_display_carries_detail() {
        let err = TagError::InsufficientCapacity {
            required: 200,
            available: 144,
        };
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("144"));

        let err = TagError::LockStageFailure {
            stage: LockStage::AccessConfigured,
        };
        assert!(err.to_string().contains("AccessConfigured"));
    }
}
