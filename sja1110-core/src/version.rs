//! Configuration format versions
//!
//! Two binary format revisions exist for the switch configuration image.
//! They differ in the byte order of the device identifier, the table
//! header layout, whether per-table CRCs are validated, and the R-TAG
//! EtherType written into the general parameters. The revision is always
//! an explicit caller choice; nothing in the codec sniffs bytes to guess
//! which one is in use.

use std::fmt;

use crate::{Error, Result};

/// Binary format revision of the configuration image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// First revision: little-endian device id, 12-byte table headers
    /// (entry count and data size as u16), per-table CRC field reserved,
    /// R-TAG EtherType 0xF1CD.
    V1,
    /// Second revision: big-endian device id, 16-byte table headers
    /// (entry count and entry size as u32), per-table CRC validated,
    /// R-TAG EtherType 0xF1C1 (the IEEE 802.1CB value).
    V2,
}

impl FormatVersion {
    /// Marker value written into the header's format field
    pub const fn marker(&self) -> u32 {
        match self {
            FormatVersion::V1 => 0x0000_0001,
            FormatVersion::V2 => 0x0000_0002,
        }
    }

    /// Look up a version from its header marker
    pub fn from_marker(marker: u32) -> Result<Self> {
        match marker {
            0x0000_0001 => Ok(FormatVersion::V1),
            0x0000_0002 => Ok(FormatVersion::V2),
            other => Err(Error::UnknownFormatVersion(other)),
        }
    }

    /// Whether the device identifier is stored big-endian
    pub const fn device_id_big_endian(&self) -> bool {
        matches!(self, FormatVersion::V2)
    }

    /// Size of a table header in this revision
    pub const fn table_header_size(&self) -> usize {
        match self {
            FormatVersion::V1 => 12,
            FormatVersion::V2 => 16,
        }
    }

    /// Whether per-table CRCs are computed on encode and validated on decode
    pub const fn validates_table_crc(&self) -> bool {
        matches!(self, FormatVersion::V2)
    }

    /// Redundancy-tag EtherType inserted into replicated frames
    pub const fn r_tag_ethertype(&self) -> u16 {
        match self {
            FormatVersion::V1 => 0xF1CD,
            FormatVersion::V2 => 0xF1C1,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatVersion::V1 => write!(f, "v1"),
            FormatVersion::V2 => write!(f, "v2"),
        }
    }
}
