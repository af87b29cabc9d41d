//! URI abbreviation table for NDEF URI records.
//!
//! A URI record's first payload byte selects one of 36 well-defined
//! scheme prefixes; the remaining bytes carry the suffix. Code 0x00
//! means "no abbreviation".

use lazy_static::lazy_static;

/// The closed abbreviation table, indexed by prefix code (0x00–0x23).
pub const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

lazy_static! {
    // Scan order: longest prefix first, so the most specific entry
    // always wins (e.g. "ftp://ftp." before "ftp://"). Ties keep
    // ascending code order.
    static ref PREFIXES_BY_LENGTH: Vec<(u8, &'static str)> = {
        let mut entries: Vec<(u8, &'static str)> = URI_PREFIXES
            .iter()
            .enumerate()
            .filter(|(_, prefix)| !prefix.is_empty())
            .map(|(code, prefix)| (code as u8, *prefix))
            .collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
        entries
    };
}

/// Look up the prefix string for a code. Undefined codes and 0x00
/// return the empty string.
pub fn lookup_prefix(code: u8) -> &'static str {
    URI_PREFIXES.get(code as usize).copied().unwrap_or("")
}

/// Match a URI against the table, case-insensitively, returning the
/// prefix code and the unabbreviated suffix. URIs matching no entry
/// return `(0x00, uri)`.
pub fn match_prefix(uri: &str) -> (u8, &str) {
    for (code, prefix) in PREFIXES_BY_LENGTH.iter() {
        let len = prefix.len();
        if uri.len() >= len && uri.as_bytes()[..len].eq_ignore_ascii_case(prefix.as_bytes()) {
            return (*code, &uri[len..]);
        }
    }
    (0x00, uri)
}
