//! Tag write flow: structured content → message bytes → page writes.

use crate::content::{is_marker, marker_record, ParsedContent};
use crate::error::{NfcKitError, TagError};
use crate::record::{decode_message, encode_message, Record};
use crate::security::unlock_for_write;
use crate::tlv;
use crate::transport::{TagTransport, FIRST_USER_PAGE};

/// What a completed write put on the tag.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Encoded message bytes, marker included when one was carried.
    pub message: Vec<u8>,
    /// Container bytes actually written, TLV framing and padding
    /// included.
    pub bytes_written: usize,
}

/// Encode one piece of content and write it as a single-record
/// message. `tag_id` feeds the opportunistic unlock; `append_marker`
/// adds the provenance marker record.
pub fn write_content(
    transport: &mut dyn TagTransport,
    tag_id: &[u8],
    content: &ParsedContent,
    append_marker: bool,
) -> Result<WriteOutcome, NfcKitError> {
    write_message(transport, tag_id, vec![content.to_record()], append_marker)
}

/// Write a record sequence to the tag.
///
/// Gates, in order: writable → capacity → (opportunistic unlock) →
/// page writes. A marker carried by the tag's previous message is
/// preserved when the new records omit it. The connection is closed on
/// every path.
pub fn write_message(
    transport: &mut dyn TagTransport,
    tag_id: &[u8],
    records: Vec<Record>,
    append_marker: bool,
) -> Result<WriteOutcome, NfcKitError> {
    transport.connect().map_err(TagError::from)?;
    let outcome = write_inner(transport, tag_id, records, append_marker);
    let _ = transport.close();
    outcome
}

fn write_inner(
    transport: &mut dyn TagTransport,
    tag_id: &[u8],
    mut records: Vec<Record>,
    append_marker: bool,
) -> Result<WriteOutcome, NfcKitError> {
    if !transport.is_writable() {
        return Err(TagError::NotWritable.into());
    }

    // Preserve an existing provenance marker across overwrites.
    let had_marker = transport
        .cached_message()
        .map(|message| {
            decode_message(&message)
                .map(|records| records.iter().any(is_marker))
                .unwrap_or(false)
        })
        .unwrap_or(false);
    let carries_marker = records.iter().any(is_marker);
    if (append_marker || had_marker) && !carries_marker {
        records.push(marker_record());
    }

    let message = encode_message(&records)?;
    let available = transport.max_size();
    if message.len() > available {
        return Err(TagError::InsufficientCapacity {
            required: message.len(),
            available,
        }
        .into());
    }

    // Best effort: a tag we locked earlier accepts its derived
    // password; anything else keeps its protection and the page
    // writes below will be refused.
    if let Err(error) = unlock_for_write(transport, tag_id) {
        tracing::warn!(%error, "unlock attempt failed; writing anyway");
    }

    let container = tlv::wrap_message(&message);
    write_container(transport, &container)?;

    tracing::debug!(bytes = container.len(), "message written");
    Ok(WriteOutcome {
        message,
        bytes_written: container.len(),
    })
}

fn write_container(transport: &mut dyn TagTransport, container: &[u8]) -> Result<(), NfcKitError> {
    for (index, chunk) in container.chunks(tlv::PAGE_SIZE).enumerate() {
        let mut page = [0u8; 4];
        page[..chunk.len()].copy_from_slice(chunk);
        let page_index = FIRST_USER_PAGE + index as u8;
        transport
            .write_page(page_index, &page)
            .map_err(TagError::from)?;
    }
    Ok(())
}

/// Initialize the tag with an empty message container — the
/// formatting action for a blank or wiped tag.
pub fn format_blank(transport: &mut dyn TagTransport) -> Result<(), NfcKitError> {
    transport.connect().map_err(TagError::from)?;
    let result = format_inner(transport);
    let _ = transport.close();
    result
}

fn format_inner(transport: &mut dyn TagTransport) -> Result<(), NfcKitError> {
    if !transport.is_writable() {
        return Err(TagError::NotWritable.into());
    }
    let container = tlv::wrap_message(&[]);
    write_container(transport, &container).map_err(|error| {
        TagError::FormatFailure(format!("empty container write refused: {}", error)).into()
    })
}
