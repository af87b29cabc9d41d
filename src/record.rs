//! NDEF record and message framing codec.
//!
//! Record header layout:
//!
//! ```text
//! ┌──────┬──────┬──────┬──────┬──────┬─────────┐
//! │MB(1b)│ME(1b)│CF(1b)│SR(1b)│IL(1b)│ TNF(3b) │
//! └──────┴──────┴──────┴──────┴──────┴─────────┘
//! ```
//!
//! followed by the type length (1 byte), the payload length (1 byte if
//! SR is set, 4 bytes big-endian otherwise), an optional id length
//! (present iff IL), then type / id / payload bytes in that order.
//! Record order within a message is the wire order.

use crate::error::CodecError;
use crate::wire::{read_bytes, read_u32_be, read_u8};
use std::borrow::Cow;
use std::io::{self, Cursor};

/// Message-begin flag
const FLAG_MB: u8 = 0x80;
/// Message-end flag
const FLAG_ME: u8 = 0x40;
/// Chunk flag
const FLAG_CF: u8 = 0x20;
/// Short-record flag (1-byte payload length)
const FLAG_SR: u8 = 0x10;
/// Id-length-present flag
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Reserved well-known type for text records
pub const RTD_TEXT: &[u8] = b"T";
/// Reserved well-known type for URI records
pub const RTD_URI: &[u8] = b"U";
/// Reserved well-known type for smart posters
pub const RTD_SMART_POSTER: &[u8] = b"Sp";

/// Type Name Format — 3-bit field classifying a record's type namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tnf {
    Empty = 0x00,
    WellKnown = 0x01,
    MimeMedia = 0x02,
    AbsoluteUri = 0x03,
    ExternalType = 0x04,
    Unknown = 0x05,
}

impl Tnf {
    /// Parse from the low 3 bits of a flags byte
    pub fn from_bits(bits: u8) -> io::Result<Self> {
        match bits & TNF_MASK {
            0x00 => Ok(Tnf::Empty),
            0x01 => Ok(Tnf::WellKnown),
            0x02 => Ok(Tnf::MimeMedia),
            0x03 => Ok(Tnf::AbsoluteUri),
            0x04 => Ok(Tnf::ExternalType),
            0x05 => Ok(Tnf::Unknown),
            bits => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported type name format: 0x{:02X}", bits),
            )),
        }
    }

    /// Convert to the 3-bit wire value
    pub fn to_bits(self) -> u8 {
        self as u8
    }
}

/// A single NDEF record. Immutable once constructed; produced by
/// [`decode_message`], consumed by [`encode_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tnf: Tnf,
    pub type_bytes: Vec<u8>,
    pub id: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn new(tnf: Tnf, type_bytes: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            tnf,
            type_bytes: type_bytes.into(),
            id: None,
            payload: payload.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Vec<u8>>) -> Self {
        let id = id.into();
        self.id = (!id.is_empty()).then_some(id);
        self
    }

    /// True if this record carries the given type bytes under the
    /// given type name format.
    pub fn has_type(&self, tnf: Tnf, type_bytes: &[u8]) -> bool {
        self.tnf == tnf && self.type_bytes == type_bytes
    }

    /// The type field as text (lossy for non-UTF-8 type bytes).
    pub fn type_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.type_bytes)
    }
}

/// Decode a raw message into records in wire order.
///
/// Empty input decodes to an empty sequence. A record whose declared
/// lengths exceed the remaining buffer fails the whole message with
/// [`CodecError::MalformedMessage`].
pub fn decode_message(bytes: &[u8]) -> Result<Vec<Record>, CodecError> {
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let offset = cursor.position() as usize;
        let record =
            read_record(&mut cursor, bytes.len()).map_err(|e| CodecError::MalformedMessage {
                offset,
                reason: e.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}

fn read_record(cursor: &mut Cursor<&[u8]>, total: usize) -> io::Result<Record> {
    let flags = read_u8(cursor)?;
    if flags & FLAG_CF != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "chunked records are not supported",
        ));
    }
    let tnf = Tnf::from_bits(flags)?;
    let type_len = read_u8(cursor)? as usize;
    let payload_len = if flags & FLAG_SR != 0 {
        read_u8(cursor)? as usize
    } else {
        read_u32_be(cursor)? as usize
    };
    let id_len = if flags & FLAG_IL != 0 {
        read_u8(cursor)? as usize
    } else {
        0
    };

    let remaining = total - cursor.position() as usize;
    let declared = type_len as u64 + id_len as u64 + payload_len as u64;
    if declared > remaining as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "declared record length {} exceeds remaining {} bytes",
                declared, remaining
            ),
        ));
    }

    let type_bytes = read_bytes(cursor, type_len)?;
    let id = if id_len > 0 {
        Some(read_bytes(cursor, id_len)?)
    } else {
        None
    };
    let payload = read_bytes(cursor, payload_len)?;

    Ok(Record {
        tnf,
        type_bytes,
        id,
        payload,
    })
}

/// Encode records into message bytes — the inverse of
/// [`decode_message`]. Output is deterministic byte-for-byte for a
/// given record sequence; capacity checks rely on the exact size.
/// An empty sequence encodes to an empty byte vector.
pub fn encode_message(records: &[Record]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    let last = records.len().saturating_sub(1);
    for (index, record) in records.iter().enumerate() {
        encode_record(&mut out, record, index == 0, index == last)?;
    }
    Ok(out)
}

fn encode_record(out: &mut Vec<u8>, record: &Record, mb: bool, me: bool) -> Result<(), CodecError> {
    if record.type_bytes.len() > u8::MAX as usize {
        return Err(CodecError::FieldTooLong {
            field: "type",
            len: record.type_bytes.len(),
        });
    }
    if let Some(id) = &record.id {
        if id.len() > u8::MAX as usize {
            return Err(CodecError::FieldTooLong {
                field: "id",
                len: id.len(),
            });
        }
    }
    if record.payload.len() > u32::MAX as usize {
        return Err(CodecError::FieldTooLong {
            field: "payload",
            len: record.payload.len(),
        });
    }

    let short = record.payload.len() <= u8::MAX as usize;
    let mut flags = record.tnf.to_bits();
    if mb {
        flags |= FLAG_MB;
    }
    if me {
        flags |= FLAG_ME;
    }
    if short {
        flags |= FLAG_SR;
    }
    if record.id.is_some() {
        flags |= FLAG_IL;
    }

    out.push(flags);
    out.push(record.type_bytes.len() as u8);
    if short {
        out.push(record.payload.len() as u8);
    } else {
        out.extend_from_slice(&(record.payload.len() as u32).to_be_bytes());
    }
    if let Some(id) = &record.id {
        out.push(id.len() as u8);
    }
    out.extend_from_slice(&record.type_bytes);
    if let Some(id) = &record.id {
        out.extend_from_slice(id);
    }
    out.extend_from_slice(&record.payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tnf_bits_roundtrip() {
        for bits in 0x00..=0x05 {
            let tnf = Tnf::from_bits(bits).unwrap();
            assert_eq!(tnf.to_bits(), bits);
        }
        assert!(Tnf::from_bits(0x06).is_err());
        assert!(Tnf::from_bits(0x07).is_err());
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(decode_message(&[]).unwrap(), vec![]);
        assert_eq!(encode_message(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_single_short_record_wire_layout() {
        let record = Record::new(Tnf::WellKnown, RTD_TEXT, vec![0x02, b'e', b'n', b'h', b'i']);
        let bytes = encode_message(&[record.clone()]).unwrap();
        // MB|ME|SR + well-known, type len 1, payload len 5, 'T'
        assert_eq!(&bytes[..4], &[0xD1, 0x01, 0x05, 0x54]);
        assert_eq!(decode_message(&bytes).unwrap(), vec![record]);
    }

    #[test]
    fn test_multi_record_flags() {
        let a = Record::new(Tnf::WellKnown, RTD_URI, vec![0x04, b'x']);
        let b = Record::new(Tnf::MimeMedia, b"application/json".as_slice(), b"{}".to_vec());
        let bytes = encode_message(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(bytes[0] & 0xC0, 0x80, "first record carries MB only");
        let second_start = 4 + a.payload.len();
        assert_eq!(bytes[second_start] & 0xC0, 0x40, "last record carries ME only");
        assert_eq!(decode_message(&bytes).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_long_record_uses_four_byte_length() {
        let payload = vec![0xAB; 300];
        let record = Record::new(Tnf::Unknown, Vec::new(), payload);
        let bytes = encode_message(&[record.clone()]).unwrap();
        assert_eq!(bytes[0] & FLAG_SR, 0, "short-record flag clear");
        assert_eq!(&bytes[2..6], &300u32.to_be_bytes());
        assert_eq!(decode_message(&bytes).unwrap(), vec![record]);
    }

    #[test]
    fn test_record_with_id() {
        let record = Record::new(Tnf::ExternalType, b"example.com:t".as_slice(), vec![1, 2, 3])
            .with_id(b"r1".as_slice());
        let bytes = encode_message(&[record.clone()]).unwrap();
        assert_eq!(bytes[0] & FLAG_IL, FLAG_IL);
        assert_eq!(decode_message(&bytes).unwrap(), vec![record]);
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        // Declares a 5-byte payload but supplies 2.
        let bytes = [0xD1, 0x01, 0x05, 0x54, 0x02, 0x65];
        match decode_message(&bytes) {
            Err(CodecError::MalformedMessage { offset, .. }) => assert_eq!(offset, 0),
            other => panic!("expected MalformedMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_second_record_offset_reported() {
        let good = encode_message(&[Record::new(Tnf::WellKnown, RTD_URI, vec![0x04, b'x'])]).unwrap();
        let mut bytes = good.clone();
        bytes.extend_from_slice(&[0x51, 0x01, 0x40, 0x55]); // declares 64-byte payload, has none
        match decode_message(&bytes) {
            Err(CodecError::MalformedMessage { offset, .. }) => assert_eq!(offset, good.len()),
            other => panic!("expected MalformedMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_encode_idempotent() {
        let records = vec![
            Record::new(Tnf::WellKnown, RTD_TEXT, vec![0x02, b'e', b'n', b'h', b'i']),
            Record::new(Tnf::MimeMedia, b"text/vcard".as_slice(), b"BEGIN:VCARD".to_vec()),
            Record::new(Tnf::Unknown, Vec::new(), vec![0xDE, 0xAD]),
        ];
        let bytes = encode_message(&records).unwrap();
        let decoded = decode_message(&bytes).unwrap();
        let reencoded = encode_message(&decoded).unwrap();
        assert_eq!(bytes, reencoded);
        assert_eq!(decode_message(&reencoded).unwrap(), decoded);
    }
}
