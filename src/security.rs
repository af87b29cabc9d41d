//! Tag security engine: per-tag secret derivation, variant detection,
//! and the irreversible lock sequence.
//!
//! Every secret is derived from the tag's unique identifier — the
//! engine never transmits a hard-coded password, so offline brute
//! forcing costs one hash preimage per tag. The lock sequence is a
//! one-way hardware operation: flash-page writes cannot be rolled
//! back, so a stage failure halts the sequence and leaves the earlier
//! stages applied.

use crate::error::TagError;
use crate::transport::{TagTransport, FIRST_USER_PAGE};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;

/// GET_VERSION command byte
pub const CMD_GET_VERSION: u8 = 0x60;
/// PWD_AUTH command byte
pub const CMD_PWD_AUTH: u8 = 0x1B;

/// Storage-size byte of the version response, per variant
const STORAGE_NTAG213: u8 = 0x0F;
const STORAGE_NTAG215: u8 = 0x11;
const STORAGE_NTAG216: u8 = 0x13;

/// Page holding the static lock bytes (bytes 2–3 cover pages 3–15)
const STATIC_LOCK_PAGE: u8 = 2;
/// PROT bit of the ACCESS page: set = authentication required for
/// reads as well as writes
const PROT_READ_WRITE: u8 = 0x80;

// Compiled-in salt for per-tag secret derivation. Changing it orphans
// every tag locked with the previous value.
const DERIVATION_SALT: [u8; 16] = [
    0x9D, 0x61, 0x5E, 0x3A, 0x27, 0xF4, 0x88, 0x0B, 0xC1, 0x52, 0x7E, 0xD9, 0x33, 0x4A, 0x16,
    0xE8,
];

/// Per-tag password and acknowledgement, recomputed on demand and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSecret {
    pub password: [u8; 4],
    pub pack: [u8; 2],
}

impl TagSecret {
    /// Derive the secret for a tag identifier. Pure and idempotent:
    /// the same identifier always yields the same bytes, so a locked
    /// tag re-authenticates correctly on every later presentation.
    pub fn derive(tag_id: &[u8]) -> Self {
        let pwd_digest = salted_digest(tag_id, b"PWD");
        let pack_digest = salted_digest(tag_id, b"PACK");
        Self {
            password: [pwd_digest[0], pwd_digest[1], pwd_digest[2], pwd_digest[3]],
            pack: [pack_digest[0], pack_digest[1]],
        }
    }
}

fn salted_digest(tag_id: &[u8], label: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(DERIVATION_SALT);
    hasher.update(tag_id);
    hasher.update(label);
    hasher.finalize().into()
}

/// Capacity tier of the supported tag family. The tiers differ only in
/// page count and configuration-page offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NtagVariant {
    Ntag213,
    Ntag215,
    Ntag216,
}

/// Addressable configuration pages for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// CFG0 page; byte 3 is AUTH0, the first page requiring auth
    pub cfg0: u8,
    /// ACCESS page; bit 7 of byte 0 is the PROT bit
    pub access: u8,
    pub pwd: u8,
    pub pack: u8,
    /// Page holding the dynamic lock bytes
    pub dynamic_lock: u8,
    pub user_start: u8,
    pub user_end: u8,
}

impl NtagVariant {
    /// Select the variant from a GET_VERSION response. Unrecognized or
    /// missing responses default to the smallest-capacity tier.
    pub fn from_version_response(response: &[u8]) -> Self {
        match response.get(6) {
            Some(&STORAGE_NTAG215) => NtagVariant::Ntag215,
            Some(&STORAGE_NTAG216) => NtagVariant::Ntag216,
            Some(&STORAGE_NTAG213) => NtagVariant::Ntag213,
            _ => NtagVariant::Ntag213,
        }
    }

    pub fn layout(self) -> PageLayout {
        match self {
            NtagVariant::Ntag213 => PageLayout {
                cfg0: 0x29,
                access: 0x2A,
                pwd: 0x2B,
                pack: 0x2C,
                dynamic_lock: 0x28,
                user_start: FIRST_USER_PAGE,
                user_end: 0x27,
            },
            NtagVariant::Ntag215 => PageLayout {
                cfg0: 0x83,
                access: 0x84,
                pwd: 0x85,
                pack: 0x86,
                dynamic_lock: 0x82,
                user_start: FIRST_USER_PAGE,
                user_end: 0x81,
            },
            NtagVariant::Ntag216 => PageLayout {
                cfg0: 0xE3,
                access: 0xE4,
                pwd: 0xE5,
                pack: 0xE6,
                dynamic_lock: 0xE2,
                user_start: FIRST_USER_PAGE,
                user_end: 0xE1,
            },
        }
    }

    /// User data capacity in bytes.
    pub fn capacity(self) -> usize {
        let layout = self.layout();
        (layout.user_end as usize - layout.user_start as usize + 1) * 4
    }
}

impl fmt::Display for NtagVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtagVariant::Ntag213 => f.write_str("NTAG213"),
            NtagVariant::Ntag215 => f.write_str("NTAG215"),
            NtagVariant::Ntag216 => f.write_str("NTAG216"),
        }
    }
}

/// Stages of the lock sequence, in order. `Failed` is terminal; so is
/// `StaticLocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStage {
    Idle,
    Authenticated,
    PasswordConfigured,
    AccessConfigured,
    DynamicLocked,
    StaticLocked,
    Failed,
}

impl fmt::Display for LockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockStage::Idle => "Idle",
            LockStage::Authenticated => "Authenticated",
            LockStage::PasswordConfigured => "PasswordConfigured",
            LockStage::AccessConfigured => "AccessConfigured",
            LockStage::DynamicLocked => "DynamicLocked",
            LockStage::StaticLocked => "StaticLocked",
            LockStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Ephemeral per-presentation lock state. Created when the tag is
/// presented, discarded once the sequence terminates; never stored.
#[derive(Debug, Clone)]
pub struct LockSession {
    pub tag_id: Vec<u8>,
    pub variant: NtagVariant,
    pub stage: LockStage,
}

impl LockSession {
    /// Start a session for a presented tag, detecting the variant via
    /// a version query. A failed query falls back to the smallest
    /// variant's offsets.
    pub fn begin(transport: &mut dyn TagTransport, tag_id: &[u8]) -> Self {
        let variant = match transport.transceive(&[CMD_GET_VERSION]) {
            Ok(response) => NtagVariant::from_version_response(&response),
            Err(_) => NtagVariant::Ntag213,
        };
        tracing::debug!(%variant, "lock session started");
        Self {
            tag_id: tag_id.to_vec(),
            variant,
            stage: LockStage::Idle,
        }
    }
}

/// Issue PWD_AUTH with the secret and check the PACK echo.
fn authenticate(transport: &mut dyn TagTransport, secret: &TagSecret) -> io::Result<bool> {
    let mut command = Vec::with_capacity(5);
    command.push(CMD_PWD_AUTH);
    command.extend_from_slice(&secret.password);
    let response = transport.transceive(&command)?;
    Ok(response.len() >= 2 && response[..2] == secret.pack)
}

/// Opportunistic unlock before an ordinary write to a possibly-locked
/// tag. Failure is reported but is not a precondition gate: the caller
/// proceeds and the write itself surfaces not-writable if the tag
/// refuses.
pub fn unlock_for_write(transport: &mut dyn TagTransport, tag_id: &[u8]) -> Result<(), TagError> {
    let secret = TagSecret::derive(tag_id);
    match authenticate(transport, &secret) {
        Ok(true) => Ok(()),
        Ok(false) => Err(TagError::AuthenticationFailure),
        Err(error) => {
            tracing::debug!(%error, "authentication exchange failed");
            Err(TagError::AuthenticationFailure)
        }
    }
}

fn fail(session: &mut LockSession, stage: LockStage, error: io::Error) -> TagError {
    session.stage = LockStage::Failed;
    tracing::warn!(%stage, %error, "lock stage failed; earlier stages remain applied");
    TagError::LockStageFailure { stage }
}

fn read_page4(transport: &mut dyn TagTransport, page: u8) -> io::Result<[u8; 4]> {
    let block = transport.read_pages(page)?;
    if block.len() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "short page read",
        ));
    }
    Ok([block[0], block[1], block[2], block[3]])
}

/// Run the full authenticate/configure/lock sequence. On success the
/// session ends in [`LockStage::StaticLocked`] and the tag is
/// permanently read-only. Stages are committed to tag memory as they
/// run; a failure halts the sequence without rolling anything back.
pub fn lock_tag(
    transport: &mut dyn TagTransport,
    session: &mut LockSession,
) -> Result<(), TagError> {
    let secret = TagSecret::derive(&session.tag_id);
    let layout = session.variant.layout();

    // A fresh tag has no password yet, so a failed authentication here
    // is expected and ignored.
    match authenticate(transport, &secret) {
        Ok(true) => session.stage = LockStage::Authenticated,
        Ok(false) | Err(_) => {
            tracing::debug!("authentication skipped; tag not yet protected");
        }
    }

    // Password and acknowledgement.
    let pack_page = [secret.pack[0], secret.pack[1], 0x00, 0x00];
    let result = transport
        .write_page(layout.pwd, &secret.password)
        .and_then(|_| transport.write_page(layout.pack, &pack_page));
    if let Err(error) = result {
        return Err(fail(session, LockStage::PasswordConfigured, error));
    }
    session.stage = LockStage::PasswordConfigured;

    // AUTH0: require authentication from the first user page, then
    // widen protection from write-only to read+write.
    let result = (|| {
        let mut cfg0 = read_page4(transport, layout.cfg0)?;
        cfg0[3] = layout.user_start;
        transport.write_page(layout.cfg0, &cfg0)?;
        let mut access = read_page4(transport, layout.access)?;
        access[0] |= PROT_READ_WRITE;
        transport.write_page(layout.access, &access)
    })();
    if let Err(error) = result {
        return Err(fail(session, LockStage::AccessConfigured, error));
    }
    session.stage = LockStage::AccessConfigured;

    // Dynamic lock bits covering the pages above the static region.
    let result = (|| {
        let mut lock = read_page4(transport, layout.dynamic_lock)?;
        lock[0] = 0xFF;
        lock[1] = 0xFF;
        lock[2] = 0xFF;
        transport.write_page(layout.dynamic_lock, &lock)
    })();
    if let Err(error) = result {
        return Err(fail(session, LockStage::DynamicLocked, error));
    }
    session.stage = LockStage::DynamicLocked;

    // Static lock bytes for pages 3–15, verified by read-back.
    let result = (|| {
        let mut head = read_page4(transport, STATIC_LOCK_PAGE)?;
        head[2] = 0xFF;
        head[3] = 0xFF;
        transport.write_page(STATIC_LOCK_PAGE, &head)?;
        let check = read_page4(transport, STATIC_LOCK_PAGE)?;
        if check != head {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "static lock read-back mismatch",
            ));
        }
        Ok(())
    })();
    if let Err(error) = result {
        return Err(fail(session, LockStage::StaticLocked, error));
    }
    session.stage = LockStage::StaticLocked;
    tracing::info!(variant = %session.variant, "tag permanently locked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_deterministic() {
        let id = [0x04, 0xA3, 0x1B, 0x52, 0x9C, 0x2F, 0x80];
        assert_eq!(TagSecret::derive(&id), TagSecret::derive(&id));
    }

    #[test]
    fn test_secret_is_id_sensitive() {
        let a = TagSecret::derive(&[0x04, 0xA3, 0x1B, 0x52, 0x9C, 0x2F, 0x80]);
        let b = TagSecret::derive(&[0x04, 0xA3, 0x1B, 0x52, 0x9C, 0x2F, 0x81]);
        assert_ne!(a.password, b.password);
    }

    #[test]
    fn test_password_and_pack_use_distinct_labels() {
        let secret = TagSecret::derive(&[0x01, 0x02]);
        assert_ne!(secret.pack, [secret.password[0], secret.password[1]]);
    }

    #[test]
    fn test_variant_from_version_response() {
        let mut response = [0x00, 0x04, 0x04, 0x02, 0x01, 0x00, 0x0F, 0x03];
        assert_eq!(
            NtagVariant::from_version_response(&response),
            NtagVariant::Ntag213
        );
        response[6] = 0x11;
        assert_eq!(
            NtagVariant::from_version_response(&response),
            NtagVariant::Ntag215
        );
        response[6] = 0x13;
        assert_eq!(
            NtagVariant::from_version_response(&response),
            NtagVariant::Ntag216
        );
        assert_eq!(
            NtagVariant::from_version_response(&[]),
            NtagVariant::Ntag213
        );
        response[6] = 0x42;
        assert_eq!(
            NtagVariant::from_version_response(&response),
            NtagVariant::Ntag213
        );
    }

    #[test]
    fn test_variant_capacities() {
        assert_eq!(NtagVariant::Ntag213.capacity(), 144);
        assert_eq!(NtagVariant::Ntag215.capacity(), 504);
        assert_eq!(NtagVariant::Ntag216.capacity(), 888);
    }

    #[test]
    fn test_layout_pages_are_distinct() {
        for variant in [
            NtagVariant::Ntag213,
            NtagVariant::Ntag215,
            NtagVariant::Ntag216,
        ] {
            let layout = variant.layout();
            let pages = [layout.cfg0, layout.access, layout.pwd, layout.pack];
            for (i, a) in pages.iter().enumerate() {
                for b in &pages[i + 1..] {
                    assert_ne!(a, b, "{variant} config pages overlap");
                }
            }
            assert!(layout.dynamic_lock > layout.user_end);
        }
    }
}
