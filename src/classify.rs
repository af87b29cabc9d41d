//! Advisory record classification.
//!
//! Assigns a coarse category from the record's type name format and,
//! for recognized URI shapes, a human-readable summary (social handle,
//! email, phone, location). Display-oriented only — never a gate for a
//! correctness-critical decision.

use crate::content::{decode_content, ParsedContent, MIME_JSON, MIME_VCARD, NOT_PROVIDED};
use crate::record::{Record, Tnf, RTD_SMART_POSTER, RTD_TEXT, RTD_URI};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Empty,
    Text,
    Uri,
    SmartPoster,
    Mime,
    AbsoluteUri,
    External,
    Unknown,
}

/// Advisory category plus a human summary, derived from the record's
/// bytes alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub summary: String,
}

const SOCIAL_DOMAINS: [(&str, &str); 8] = [
    ("discord.com/users/", "Discord"),
    ("instagram.com/", "Instagram"),
    ("facebook.com/", "Facebook"),
    ("line.me/ti/p/", "Line"),
    ("t.me/", "Telegram"),
    ("twitter.com/", "Twitter"),
    ("youtube.com/@", "YouTube"),
    ("tiktok.com/@", "TikTok"),
];

/// Classify a decoded record.
pub fn classify(record: &Record) -> Classification {
    let category = match record.tnf {
        Tnf::Empty => Category::Empty,
        Tnf::WellKnown => {
            if record.type_bytes == RTD_TEXT {
                Category::Text
            } else if record.type_bytes == RTD_URI {
                Category::Uri
            } else if record.type_bytes == RTD_SMART_POSTER {
                Category::SmartPoster
            } else {
                Category::Unknown
            }
        }
        Tnf::MimeMedia => Category::Mime,
        Tnf::AbsoluteUri => Category::AbsoluteUri,
        Tnf::ExternalType => Category::External,
        Tnf::Unknown => Category::Unknown,
    };
    Classification {
        summary: summarize(record, category),
        category,
    }
}

fn summarize(record: &Record, category: Category) -> String {
    match category {
        Category::Empty => "Empty record".to_string(),
        Category::SmartPoster => "Smart poster".to_string(),
        Category::Text => match decode_content(record) {
            ParsedContent::WifiCredential { ssid, security, .. } => {
                format!("Wi-Fi network \"{}\" ({})", ssid, security.as_str())
            }
            content => content.to_string(),
        },
        Category::Uri => match decode_content(record) {
            ParsedContent::Uri { uri } => summarize_uri(&uri),
            content => content.to_string(),
        },
        Category::Mime => {
            if record.type_bytes == MIME_VCARD.as_bytes() {
                match decode_content(record) {
                    ParsedContent::VCard { name, .. } => format!(
                        "Contact: {}",
                        name.as_deref().unwrap_or(NOT_PROVIDED)
                    ),
                    content => content.to_string(),
                }
            } else if record.type_bytes == MIME_JSON.as_bytes() {
                "JSON document".to_string()
            } else {
                format!("MIME {}", record.type_str())
            }
        }
        Category::AbsoluteUri => record.type_str().into_owned(),
        Category::External => format!("External type {}", record.type_str()),
        Category::Unknown => format!("{} bytes", record.payload.len()),
    }
}

fn summarize_uri(uri: &str) -> String {
    for (needle, label) in SOCIAL_DOMAINS {
        if uri.contains(needle) {
            return format!("{} profile: {}", label, extract_handle(uri));
        }
    }
    if let Some(rest) = uri.strip_prefix("mailto:") {
        return format!("Email: {}", rest);
    }
    if let Some(rest) = uri.strip_prefix("tel:") {
        return format!("Phone: {}", rest);
    }
    if let Some(rest) = uri.strip_prefix("sms:") {
        let number = rest.split('?').next().unwrap_or(rest);
        return format!("SMS: {}", number);
    }
    if let Some(rest) = uri.strip_prefix("geo:") {
        return format!("Location: {}", rest);
    }
    if let Some(rest) = uri.strip_prefix("bitcoin:") {
        return format!("Bitcoin address: {}", rest);
    }
    format!("Link: {}", uri)
}

// The handle is whatever follows the last `@` or path separator.
fn extract_handle(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches('/');
    let start = trimmed
        .rfind(['@', '/'])
        .map(|i| i + 1)
        .unwrap_or(0);
    &trimmed[start..]
}
