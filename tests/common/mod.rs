//! In-memory emulated tag used by the integration tests.
//!
//! The tag accepts all writes and echoes back exactly what was written
//! on subsequent reads. PWD_AUTH answers with the PACK bytes stored on
//! the tag, so authentication succeeds once the lock sequence has
//! written the derived secret.

use ndefkit::security::{CMD_GET_VERSION, CMD_PWD_AUTH};
use ndefkit::transport::TagTransport;
use ndefkit::NtagVariant;
use std::io;

#[allow(dead_code)]
pub struct EmulatedNtag {
    pub variant: NtagVariant,
    pages: Vec<[u8; 4]>,
    /// Storage-size byte answered to GET_VERSION; None silences the
    /// version query.
    version_byte: Option<u8>,
    writable: bool,
    cached: Option<Vec<u8>>,
    /// Injected fault: writes to this page fail.
    pub fail_write_page: Option<u8>,
    pub connected: bool,
}

#[allow(dead_code)]
impl EmulatedNtag {
    pub fn new(variant: NtagVariant) -> Self {
        let (page_count, version_byte) = match variant {
            NtagVariant::Ntag213 => (0x2D, 0x0F),
            NtagVariant::Ntag215 => (0x87, 0x11),
            NtagVariant::Ntag216 => (0xE7, 0x13),
        };
        Self {
            variant,
            pages: vec![[0u8; 4]; page_count],
            version_byte: Some(version_byte),
            writable: true,
            cached: None,
            fail_write_page: None,
            connected: false,
        }
    }

    pub fn ntag213() -> Self {
        Self::new(NtagVariant::Ntag213)
    }

    /// A tag that stays silent on GET_VERSION.
    pub fn without_version_response(mut self) -> Self {
        self.version_byte = None;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn with_cached_message(mut self, message: Vec<u8>) -> Self {
        self.cached = Some(message);
        self
    }

    pub fn page(&self, index: u8) -> [u8; 4] {
        self.pages[index as usize]
    }

    fn pack_page(&self) -> u8 {
        self.variant.layout().pack
    }

    fn pwd_page(&self) -> u8 {
        self.variant.layout().pwd
    }
}

impl TagTransport for EmulatedNtag {
    fn connect(&mut self) -> io::Result<()> {
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.connected = false;
        Ok(())
    }

    fn transceive(&mut self, command: &[u8]) -> io::Result<Vec<u8>> {
        match command.first() {
            Some(&CMD_GET_VERSION) => match self.version_byte {
                Some(byte) => Ok(vec![0x00, 0x04, 0x04, 0x02, 0x01, 0x00, byte, 0x03]),
                None => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "version query not answered",
                )),
            },
            Some(&CMD_PWD_AUTH) => {
                if command.len() != 5 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "bad PWD_AUTH frame",
                    ));
                }
                let stored = self.pages[self.pwd_page() as usize];
                if stored == [0u8; 4] {
                    // No password configured yet; the real tag NAKs.
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "authentication rejected",
                    ));
                }
                if command[1..5] != stored {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "wrong password",
                    ));
                }
                let pack = self.pages[self.pack_page() as usize];
                Ok(vec![pack[0], pack[1]])
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported command",
            )),
        }
    }

    fn read_pages(&mut self, page: u8) -> io::Result<Vec<u8>> {
        if page as usize >= self.pages.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "page out of range",
            ));
        }
        // Real readers return four consecutive pages.
        let mut block = Vec::with_capacity(16);
        for offset in 0..4u8 {
            let index = page.saturating_add(offset) as usize;
            let data = self.pages.get(index).copied().unwrap_or([0u8; 4]);
            block.extend_from_slice(&data);
        }
        Ok(block)
    }

    fn write_page(&mut self, page: u8, data: &[u8; 4]) -> io::Result<()> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "tag is write protected",
            ));
        }
        if self.fail_write_page == Some(page) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write fault"));
        }
        let index = page as usize;
        if index >= self.pages.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "page out of range",
            ));
        }
        self.pages[index] = *data;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn max_size(&self) -> usize {
        self.variant.capacity()
    }

    fn cached_message(&self) -> Option<Vec<u8>> {
        self.cached.clone()
    }
}
