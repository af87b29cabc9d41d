//! Typed tag content and its record encoding.
//!
//! [`ParsedContent`] is the caller-facing union of everything the
//! toolkit can write to a tag or reconstruct from one. Builders are
//! pure functions from content to [`Record`]; decoding never fails —
//! payloads the heuristics cannot make sense of degrade to a raw
//! hex-displayed fallback and are logged, so one bad record cannot
//! abort a read.

use crate::hexfmt::to_hex;
use crate::record::{Record, Tnf, RTD_TEXT, RTD_URI};
use crate::uri_prefix::{lookup_prefix, match_prefix};
use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type for vCard contact records
pub const MIME_VCARD: &str = "text/vcard";
/// MIME type for JSON records
pub const MIME_JSON: &str = "application/json";

/// Reserved vendor MIME type of the provenance marker record
pub const MARKER_MIME_TYPE: &str = "application/vnd.x-nfc-toolkit";
/// Fixed marker payload. The marker states that this toolkit produced
/// the message; it is not cryptographic proof.
pub const MARKER_PAYLOAD: [u8; 4] = [0x4E, 0x54, 0x4B, 0x01];

/// Display sentinel for vCard fields the tag does not carry
pub const NOT_PROVIDED: &str = "(not provided)";

/// UTF-16 bit of a text record's status byte
const TEXT_UTF16: u8 = 0x80;
/// Low six bits of the status byte give the language-code length
const TEXT_LANG_MASK: u8 = 0x3F;

/// Wi-Fi credential security kind, as carried in the `T:` field of the
/// single-line credential string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiSecurity {
    Open,
    Wep,
    Wpa,
    Wpa2,
}

impl WifiSecurity {
    pub fn as_str(self) -> &'static str {
        match self {
            WifiSecurity::Open => "nopass",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wpa2 => "WPA2",
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "WEP" => WifiSecurity::Wep,
            "WPA" => WifiSecurity::Wpa,
            "WPA2" => WifiSecurity::Wpa2,
            "" | "NOPASS" => WifiSecurity::Open,
            _ => WifiSecurity::Wpa,
        }
    }
}

/// Structured tag content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedContent {
    Text {
        text: String,
        language_code: String,
    },
    Uri {
        uri: String,
    },
    VCard {
        name: Option<String>,
        phone: Option<String>,
        email: Option<String>,
        company: Option<String>,
        title: Option<String>,
        address: Option<String>,
        website: Option<String>,
    },
    WifiCredential {
        ssid: String,
        password: Option<String>,
        security: WifiSecurity,
    },
    Json {
        text: String,
    },
    Raw {
        bytes: Vec<u8>,
    },
}

impl ParsedContent {
    /// Build the record encoding this content.
    pub fn to_record(&self) -> Record {
        match self {
            ParsedContent::Text {
                text,
                language_code,
            } => text_record(text, language_code),
            ParsedContent::Uri { uri } => uri_record(uri),
            ParsedContent::VCard {
                name,
                phone,
                email,
                company,
                title,
                address,
                website,
            } => {
                let body = vcard_body(name, phone, email, company, title, address, website);
                Record::new(Tnf::MimeMedia, MIME_VCARD.as_bytes(), body.into_bytes())
            }
            ParsedContent::WifiCredential {
                ssid,
                password,
                security,
            } => {
                let line = format!(
                    "WIFI:S:{};T:{};P:{};;",
                    ssid,
                    security.as_str(),
                    password.as_deref().unwrap_or("")
                );
                text_record(&line, "en")
            }
            ParsedContent::Json { text } => {
                Record::new(Tnf::MimeMedia, MIME_JSON.as_bytes(), text.as_bytes().to_vec())
            }
            ParsedContent::Raw { bytes } => Record::new(Tnf::Unknown, Vec::new(), bytes.clone()),
        }
    }
}

impl fmt::Display for ParsedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedContent::Text { text, .. } => f.write_str(text),
            ParsedContent::Uri { uri } => f.write_str(uri),
            ParsedContent::VCard {
                name,
                phone,
                email,
                ..
            } => {
                writeln!(f, "Contact:")?;
                writeln!(f, "  name: {}", name.as_deref().unwrap_or(NOT_PROVIDED))?;
                writeln!(f, "  phone: {}", phone.as_deref().unwrap_or(NOT_PROVIDED))?;
                write!(f, "  email: {}", email.as_deref().unwrap_or(NOT_PROVIDED))
            }
            ParsedContent::WifiCredential {
                ssid,
                password,
                security,
            } => write!(
                f,
                "WIFI:S:{};T:{};P:{};;",
                ssid,
                security.as_str(),
                password.as_deref().unwrap_or("")
            ),
            ParsedContent::Json { text } => f.write_str(text),
            ParsedContent::Raw { bytes } => f.write_str(&to_hex(bytes, " ")),
        }
    }
}

/// The provenance marker record appended to messages written by this
/// toolkit.
pub fn marker_record() -> Record {
    Record::new(Tnf::MimeMedia, MARKER_MIME_TYPE.as_bytes(), MARKER_PAYLOAD.to_vec())
}

/// True if a record is the provenance marker.
pub fn is_marker(record: &Record) -> bool {
    record.has_type(Tnf::MimeMedia, MARKER_MIME_TYPE.as_bytes())
        && record.payload == MARKER_PAYLOAD
}

fn text_record(text: &str, language_code: &str) -> Record {
    let lang = language_code.as_bytes();
    let lang = &lang[..lang.len().min(TEXT_LANG_MASK as usize)];
    let mut payload = Vec::with_capacity(1 + lang.len() + text.len());
    payload.push(lang.len() as u8);
    payload.extend_from_slice(lang);
    payload.extend_from_slice(text.as_bytes());
    Record::new(Tnf::WellKnown, RTD_TEXT, payload)
}

fn uri_record(uri: &str) -> Record {
    let (code, suffix) = match_prefix(uri);
    let mut payload = Vec::with_capacity(1 + suffix.len());
    payload.push(code);
    payload.extend_from_slice(suffix.as_bytes());
    Record::new(Tnf::WellKnown, RTD_URI, payload)
}

fn vcard_body(
    name: &Option<String>,
    phone: &Option<String>,
    email: &Option<String>,
    company: &Option<String>,
    title: &Option<String>,
    address: &Option<String>,
    website: &Option<String>,
) -> String {
    let mut body = String::from("BEGIN:VCARD\nVERSION:3.0\n");
    let fields = [
        ("FN:", name),
        ("TEL:", phone),
        ("EMAIL:", email),
        ("ORG:", company),
        ("TITLE:", title),
        ("ADR:", address),
        ("URL:", website),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            body.push_str(key);
            body.push_str(value);
            body.push('\n');
        }
    }
    body.push_str("END:VCARD");
    body
}

/// Reconstruct structured content from a decoded record.
///
/// Never fails: payloads the heuristics cannot parse come back as
/// [`ParsedContent::Raw`], which displays as a hex string. Only the
/// message-level framing decode reports errors.
pub fn decode_content(record: &Record) -> ParsedContent {
    match record.tnf {
        Tnf::WellKnown if record.type_bytes == RTD_TEXT => decode_text(record),
        Tnf::WellKnown if record.type_bytes == RTD_URI => decode_uri(record),
        Tnf::MimeMedia if record.type_bytes == MIME_VCARD.as_bytes() => decode_vcard(record),
        Tnf::MimeMedia if record.type_bytes == MIME_JSON.as_bytes() => decode_json(record),
        _ => ParsedContent::Raw {
            bytes: record.payload.clone(),
        },
    }
}

fn degraded(record: &Record, reason: &str) -> ParsedContent {
    tracing::warn!(
        record_type = %record.type_str(),
        reason,
        "record payload decode degraded to raw bytes"
    );
    ParsedContent::Raw {
        bytes: record.payload.clone(),
    }
}

fn decode_text(record: &Record) -> ParsedContent {
    let payload = &record.payload;
    if payload.is_empty() {
        return degraded(record, "text payload is empty");
    }
    let status = payload[0];
    let lang_len = (status & TEXT_LANG_MASK) as usize;
    if 1 + lang_len >= payload.len() {
        return degraded(record, "language-code length exceeds payload");
    }
    let language_code = String::from_utf8_lossy(&payload[1..1 + lang_len]).into_owned();
    let text_bytes = &payload[1 + lang_len..];
    let text = if status & TEXT_UTF16 != 0 {
        match decode_utf16_text(text_bytes) {
            Some(text) => text,
            None => return degraded(record, "invalid UTF-16 text"),
        }
    } else {
        String::from_utf8_lossy(text_bytes).into_owned()
    };

    if text.starts_with("WIFI:") {
        if let Some(credential) = parse_wifi_string(&text) {
            return credential;
        }
    }
    ParsedContent::Text {
        text,
        language_code,
    }
}

fn decode_utf16_text(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    // Honor a BOM when present; big-endian otherwise.
    let (data, big_endian) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        _ => (bytes, true),
    };
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

fn decode_uri(record: &Record) -> ParsedContent {
    let payload = &record.payload;
    if payload.is_empty() {
        return degraded(record, "uri payload is empty");
    }
    let prefix = lookup_prefix(payload[0]);
    let suffix = String::from_utf8_lossy(&payload[1..]);
    ParsedContent::Uri {
        uri: format!("{}{}", prefix, suffix),
    }
}

fn decode_vcard(record: &Record) -> ParsedContent {
    let text = match std::str::from_utf8(&record.payload) {
        Ok(text) => text,
        Err(_) => return degraded(record, "vcard payload is not UTF-8"),
    };
    ParsedContent::VCard {
        name: vcard_field(text, "FN:"),
        phone: vcard_field(text, "TEL:"),
        email: vcard_field(text, "EMAIL:"),
        company: vcard_field(text, "ORG:"),
        title: vcard_field(text, "TITLE:"),
        address: vcard_field(text, "ADR:"),
        website: vcard_field(text, "URL:"),
    }
}

// First matching line wins; keys are case-sensitive.
fn vcard_field(text: &str, key: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(key))
        .map(|value| value.trim().to_string())
}

fn decode_json(record: &Record) -> ParsedContent {
    match std::str::from_utf8(&record.payload) {
        Ok(text) => ParsedContent::Json {
            text: text.to_string(),
        },
        Err(_) => degraded(record, "json payload is not UTF-8"),
    }
}

fn parse_wifi_string(line: &str) -> Option<ParsedContent> {
    let body = line.strip_prefix("WIFI:")?;
    let mut ssid = None;
    let mut password = None;
    let mut security = WifiSecurity::Wpa;
    for field in body.split(';') {
        if let Some(value) = field.strip_prefix("S:") {
            ssid = Some(value.to_string());
        } else if let Some(value) = field.strip_prefix("T:") {
            security = WifiSecurity::parse(value);
        } else if let Some(value) = field.strip_prefix("P:") {
            if !value.is_empty() {
                password = Some(value.to_string());
            }
        }
    }
    Some(ParsedContent::WifiCredential {
        ssid: ssid?,
        password,
        security,
    })
}
