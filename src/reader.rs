//! Tag read flow: transport bytes → records → classified content.

use crate::classify::{classify, Classification};
use crate::content::{decode_content, is_marker, ParsedContent};
use crate::error::{NfcKitError, TagError};
use crate::record::{decode_message, Record};
use crate::tlv;
use crate::transport::{TagTransport, FIRST_USER_PAGE};

/// One decoded, classified record.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedRecord {
    pub record: Record,
    pub content: ParsedContent,
    pub classification: Classification,
}

/// Result of reading one tag presentation. The provenance marker, when
/// present, is separated out of the user-facing record list.
#[derive(Debug, Clone, PartialEq)]
pub struct TagScan {
    pub records: Vec<ScannedRecord>,
    pub has_marker: bool,
    pub raw_message: Vec<u8>,
}

/// Read and decode the tag under the transport. The connection is
/// closed on every path. A tag with no message decodes to an empty
/// scan only when the discovery layer cached an empty message;
/// otherwise a missing NDEF container is a [`TagError::FormatFailure`].
pub fn read_tag(transport: &mut dyn TagTransport) -> Result<TagScan, NfcKitError> {
    transport.connect().map_err(TagError::from)?;
    let bytes = read_message_bytes(transport);
    let _ = transport.close();
    scan_message(&bytes?)
}

fn read_message_bytes(transport: &mut dyn TagTransport) -> Result<Vec<u8>, NfcKitError> {
    // Prefer the message the discovery layer already read.
    if let Some(message) = transport.cached_message() {
        tracing::debug!(len = message.len(), "using cached message");
        return Ok(message);
    }

    // Otherwise walk the user pages and carve the message out of the
    // TLV area.
    let capacity = transport.max_size();
    let mut area = Vec::with_capacity(capacity);
    let mut page = FIRST_USER_PAGE;
    while area.len() < capacity {
        let block = transport.read_pages(page).map_err(TagError::from)?;
        if block.is_empty() {
            break;
        }
        let pages_read = (block.len() / tlv::PAGE_SIZE).max(1) as u8;
        area.extend_from_slice(&block);
        page = page.saturating_add(pages_read);
    }
    area.truncate(capacity);

    tlv::find_message(&area)
        .map(|message| message.to_vec())
        .ok_or_else(|| {
            TagError::FormatFailure("tag carries no NDEF message container".to_string()).into()
        })
}

/// Decode message bytes into a classified scan. Content-level issues
/// degrade per record; only framing fails the whole message.
pub fn scan_message(bytes: &[u8]) -> Result<TagScan, NfcKitError> {
    let all = decode_message(bytes)?;
    let has_marker = all.iter().any(is_marker);
    let records = all
        .into_iter()
        .filter(|record| !is_marker(record))
        .map(|record| {
            let content = decode_content(&record);
            let classification = classify(&record);
            ScannedRecord {
                record,
                content,
                classification,
            }
        })
        .collect();
    Ok(TagScan {
        records,
        has_marker,
        raw_message: bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::marker_record;
    use crate::record::encode_message;

    #[test]
    fn test_scan_empty_message() {
        let scan = scan_message(&[]).unwrap();
        assert!(scan.records.is_empty());
        assert!(!scan.has_marker);
    }

    #[test]
    fn test_scan_hides_marker() {
        let records = vec![
            ParsedContent::Text {
                text: "hello".into(),
                language_code: "en".into(),
            }
            .to_record(),
            marker_record(),
        ];
        let bytes = encode_message(&records).unwrap();
        let scan = scan_message(&bytes).unwrap();
        assert!(scan.has_marker);
        assert_eq!(scan.records.len(), 1);
        assert_eq!(
            scan.records[0].content,
            ParsedContent::Text {
                text: "hello".into(),
                language_code: "en".into(),
            }
        );
    }

    #[test]
    fn test_scan_malformed_message_fails() {
        let bytes = [0xD1, 0x01, 0x20, 0x54];
        assert!(scan_message(&bytes).unwrap_err().is_codec_error());
    }
}
