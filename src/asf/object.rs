//! Low-level ASF object primitives: GUIDs, a bounds-checked reader and
//! UTF-16LE string helpers.

use std::fmt;

use super::AsfError;

/// An ASF object GUID in its on-disk byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// 75B22630-668E-11CF-A6D9-00AA0062CE6C
    pub const HEADER: Guid = Guid([
        0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
        0x6C,
    ]);
    /// 75B22633-668E-11CF-A6D9-00AA0062CE6C
    pub const CONTENT_DESCRIPTION: Guid = Guid([
        0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
        0x6C,
    ]);
    /// D2D0A440-E307-11D2-97F0-00A0C95EA850
    pub const EXTENDED_CONTENT_DESCRIPTION: Guid = Guid([
        0x40, 0xA4, 0xD0, 0xD2, 0x07, 0xE3, 0xD2, 0x11, 0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8,
        0x50,
    ]);
    /// 8CABDCA1-A947-11CF-8EE4-00C00C205365
    pub const FILE_PROPERTIES: Guid = Guid([
        0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53,
        0x65,
    ]);
    /// 75B22636-668E-11CF-A6D9-00AA0062CE6C
    pub const DATA: Guid = Guid([
        0x36, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
        0x6C,
    ]);
    /// 5FBF03B5-A92E-11CF-8EE3-00C00C205365
    pub const HEADER_EXTENSION: Guid = Guid([
        0xB5, 0x03, 0xBF, 0x5F, 0x2E, 0xA9, 0xCF, 0x11, 0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53,
        0x65,
    ]);
    /// ABD3D211-A9BA-11CF-8EE6-00C00C205365, the fixed first field of a header extension
    pub const HEADER_EXTENSION_RESERVED: Guid = Guid([
        0x11, 0xD2, 0xD3, 0xAB, 0xBA, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53,
        0x65,
    ]);
    /// C5F8CBEA-5BAF-4877-8467-AA8C44FA4CCA
    pub const METADATA: Guid = Guid([
        0xEA, 0xCB, 0xF8, 0xC5, 0xAF, 0x5B, 0x77, 0x48, 0x84, 0x67, 0xAA, 0x8C, 0x44, 0xFA, 0x4C,
        0xCA,
    ]);
    /// 44231C94-9498-49D1-A141-1D134E457054
    pub const METADATA_LIBRARY: Guid = Guid([
        0x94, 0x1C, 0x23, 0x44, 0x98, 0x94, 0xD1, 0x49, 0xA1, 0x41, 0x1D, 0x13, 0x4E, 0x45, 0x70,
        0x54,
    ]);
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-",
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
        )?;
        for byte in &b[8..10] {
            write!(f, "{byte:02X}")?;
        }
        f.write_str("-")?;
        for byte in &b[10..] {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Size of the top-level header object preamble: GUID, size, child count, two reserved bytes.
pub const HEADER_PREAMBLE_SIZE: usize = 30;

/// Size of a child object preamble: GUID and size.
pub const OBJECT_PREAMBLE_SIZE: usize = 24;

/// Little-endian cursor over a header buffer.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], AsfError> {
        if len > self.remaining() {
            return Err(AsfError::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn u16(&mut self) -> Result<u16, AsfError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, AsfError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    pub fn u64(&mut self) -> Result<u64, AsfError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn guid(&mut self) -> Result<Guid, AsfError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(Guid(buf))
    }
}

/// Decode UTF-16LE, dropping trailing NUL terminators.
pub fn decode_utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Encode UTF-16LE with a NUL terminator.
pub fn encode_utf16(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// Append one child object (preamble plus payload).
pub fn write_object(out: &mut Vec<u8>, guid: Guid, payload: &[u8]) {
    out.extend_from_slice(&guid.0);
    out.extend_from_slice(&((OBJECT_PREAMBLE_SIZE + payload.len()) as u64).to_le_bytes());
    out.extend_from_slice(payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_round_trip() {
        let encoded = encode_utf16("Été");
        assert_eq!(encoded.len(), 8);
        assert_eq!(&encoded[6..], &[0, 0]);
        assert_eq!(decode_utf16(&encoded), "Été");
    }

    #[test]
    fn test_reader_rejects_overrun() {
        let mut reader = ByteReader::new(&[1, 0, 2]);
        assert_eq!(reader.u16().unwrap(), 1);
        assert!(matches!(reader.u16(), Err(AsfError::Truncated)));
    }

    #[test]
    fn test_guid_debug_format() {
        assert_eq!(
            format!("{:?}", Guid::HEADER),
            "75B22630-668E-11CF-A6D9-00AA0062CE6C"
        );
    }

    #[test]
    fn test_extension_guid_formats() {
        assert_eq!(
            format!("{:?}", Guid::HEADER_EXTENSION),
            "5FBF03B5-A92E-11CF-8EE3-00C00C205365"
        );
        assert_eq!(
            format!("{:?}", Guid::METADATA_LIBRARY),
            "44231C94-9498-49D1-A141-1D134E457054"
        );
    }

    #[test]
    fn test_write_object_size_includes_preamble() {
        let mut out = Vec::new();
        write_object(&mut out, Guid::DATA, &[9, 9]);
        assert_eq!(out.len(), 26);
        assert_eq!(u64::from_le_bytes(out[16..24].try_into().unwrap()), 26);
    }
}
