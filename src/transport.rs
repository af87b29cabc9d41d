//! The tag transport seam.
//!
//! The platform owns radio-level addressing and tag discovery; the
//! toolkit only issues these primitives once a transport handle
//! exists. One physical session per tag at a time is the transport's
//! responsibility, not ours.

use crate::hexfmt::to_hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// First page of the user data area on the supported tag family.
pub const FIRST_USER_PAGE: u8 = 4;

/// Connection plus page/command primitives supplied by the platform.
///
/// All calls are synchronous and blocking; callers run them off any
/// UI-blocking context.
pub trait TagTransport {
    fn connect(&mut self) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
    /// Exchange a raw command frame with the tag.
    fn transceive(&mut self, command: &[u8]) -> io::Result<Vec<u8>>;
    /// Read a 4- or 16-byte block starting at `page`.
    fn read_pages(&mut self, page: u8) -> io::Result<Vec<u8>>;
    /// Write one 4-byte page.
    fn write_page(&mut self, page: u8, data: &[u8; 4]) -> io::Result<()>;

    // Discovery-level facts the platform already knows.
    fn is_writable(&self) -> bool;
    fn max_size(&self) -> usize;
    /// The NDEF message cached by the discovery layer, if any.
    fn cached_message(&self) -> Option<Vec<u8>>;
}

/// Tag technology reported by the discovery layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagType {
    NfcA,
    NfcB,
    NfcF,
    NfcV,
    IsoDep,
    MifareClassic,
    MifareUltralight,
    Ntag,
    Unknown,
}

impl TagType {
    pub fn as_str(self) -> &'static str {
        match self {
            TagType::NfcA => "NFC-A",
            TagType::NfcB => "NFC-B",
            TagType::NfcF => "NFC-F",
            TagType::NfcV => "NFC-V",
            TagType::IsoDep => "ISO-DEP",
            TagType::MifareClassic => "MIFARE Classic",
            TagType::MifareUltralight => "MIFARE Ultralight",
            TagType::Ntag => "NTAG",
            TagType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discovery-level summary of one presented tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    pub id: Vec<u8>,
    pub tag_type: TagType,
    pub is_writable: bool,
    pub max_size: usize,
}

impl TagInfo {
    /// Identifier in the usual colon-separated display form.
    pub fn id_hex(&self) -> String {
        to_hex(&self.id, ":")
    }
}
