//! Byte-level read helpers for the NDEF record framing codec.
//!
//! Multi-byte integers in NDEF record headers are big-endian.

use std::io::{self, Read};

/// Read a u8 from a reader
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a u32 (big-endian) from a reader
pub fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read exactly n bytes from a reader
pub fn read_bytes<R: Read>(reader: &mut R, n: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_u8() {
        let mut cursor = Cursor::new(vec![0x42]);
        assert_eq!(read_u8(&mut cursor).unwrap(), 0x42);
        assert!(read_u8(&mut cursor).is_err());
    }

    #[test]
    fn test_read_u32_be() {
        let mut cursor = Cursor::new(vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(read_u32_be(&mut cursor).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_read_bytes() {
        let mut cursor = Cursor::new(vec![0x01, 0x02, 0x03]);
        assert_eq!(read_bytes(&mut cursor, 2).unwrap(), vec![0x01, 0x02]);
        assert!(read_bytes(&mut cursor, 2).is_err());
    }
}
