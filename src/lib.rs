//! ndefkit — NDEF record codec and NTAG security toolkit.
//!
//! Reads flow one direction: transport bytes → record codec → content
//! classifier → a structured [`reader::TagScan`]. Writes go the other
//! way: structured [`content::ParsedContent`] → record codec →
//! transport pages, optionally followed by the irreversible
//! [`security`] lock sequence. The physical tag is reached only
//! through the [`transport::TagTransport`] seam.

pub mod classify;
pub mod content;
pub mod emulate;
pub mod error;
pub mod hexfmt;
pub mod history;
pub mod reader;
pub mod record;
pub mod security;
pub mod tlv;
pub mod transport;
pub mod uri_prefix;
pub mod wire;
pub mod writer;

pub use classify::{classify, Category, Classification};
pub use content::{decode_content, is_marker, marker_record, ParsedContent, WifiSecurity};
pub use emulate::EmulationSession;
pub use error::{CodecError, NfcKitError, TagError};
pub use history::{ActionKind, HistoryRecord, HistorySink};
pub use reader::{read_tag, scan_message, ScannedRecord, TagScan};
pub use record::{decode_message, encode_message, Record, Tnf};
pub use security::{lock_tag, unlock_for_write, LockSession, LockStage, NtagVariant, TagSecret};
pub use transport::{TagInfo, TagTransport, TagType};
pub use writer::{format_blank, write_content, write_message, WriteOutcome};
