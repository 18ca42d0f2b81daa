//! Device header encode/decode
//!
//! The configuration image starts with a fixed 16-byte header:
//!
//! ```text
//! offset 0..4   device_id      byte order declared by the format version
//! offset 4..8   format marker  little-endian
//! offset 8..12  config_size    little-endian, table bytes after the header
//! offset 12..16 checksum       little-endian, written last by the builder
//! ```
//!
//! The checksum field is always zero while the image checksum is being
//! computed; the builder patches the real value in afterwards.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use sja1110_core::{Error, FormatVersion, Result};

/// Size of the device header in bytes
pub const HEADER_SIZE: usize = 16;

/// Parsed device header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHeader {
    /// Identifier that must match the physical chip's reported id
    pub device_id: u32,
    /// Format revision of the image
    pub version: FormatVersion,
    /// Number of table bytes following the header
    pub config_size: u32,
    /// Image checksum over the table bytes
    pub checksum: u32,
}

impl DeviceHeader {
    /// Create a header for a fresh image, checksum still zero
    pub fn new(version: FormatVersion, device_id: u32, config_size: u32) -> Self {
        Self {
            device_id,
            version,
            config_size,
            checksum: 0,
        }
    }

    /// Encode the header into its 16-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(HEADER_SIZE);

        if self.version.device_id_big_endian() {
            buffer.put_u32(self.device_id);
        } else {
            buffer.put_u32_le(self.device_id);
        }
        buffer.put_u32_le(self.version.marker());
        buffer.put_u32_le(self.config_size);
        buffer.put_u32_le(self.checksum);

        buffer.to_vec()
    }

    /// Parse a header from the start of an image
    ///
    /// The caller declares the format version; the header's own marker
    /// is checked against that declaration and a disagreement is an
    /// error, never a fallback to another version.
    pub fn parse(data: &[u8], version: FormatVersion) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::TruncatedBuffer {
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..HEADER_SIZE]);

        let device_id = if version.device_id_big_endian() {
            buf.get_u32()
        } else {
            buf.get_u32_le()
        };
        let marker = buf.get_u32_le();
        let config_size = buf.get_u32_le();
        let checksum = buf.get_u32_le();

        let found = FormatVersion::from_marker(marker)?;
        if found != version {
            return Err(Error::FormatVersionMismatch {
                expected: version.to_string(),
                found: found.to_string(),
            });
        }

        Ok(Self {
            device_id,
            version,
            config_size,
            checksum,
        })
    }
}
