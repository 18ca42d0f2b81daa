//! Configuration table blocks
//!
//! A configuration image is a sequence of self-describing table blocks
//! after the device header. Each block is a table header followed by
//! `entry_count` fixed-size entries. The header layout depends on the
//! format version:
//!
//! ```text
//! v1 (12 bytes): table_id:u32  entry_count:u16  data_size:u16  crc:u32
//! v2 (16 bytes): table_id:u32  entry_count:u32  entry_size:u32 crc:u32
//! ```
//!
//! All header fields are little-endian. In v2 the `crc` field carries a
//! per-table checksum over the entry bytes (same algorithm as the global
//! image checksum); in v1 the field is reserved and written as zero.
//!
//! Table identifiers the codec does not model decode into the same
//! [`Table`] struct and re-encode byte-identically, so an image carrying
//! blocks from a newer firmware round-trips without loss.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use sja1110_core::{Error, FormatVersion, Result};

use crate::checksum;

/// Table identifiers the codec interprets
///
/// Values are the configuration block ids of the switch; everything
/// else is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    /// VLAN membership (0x07)
    VlanLookup,
    /// Per-port reachability and broadcast domains (0x08)
    L2Forwarding,
    /// Per-port MAC/speed/FRER-role configuration (0x09)
    MacConfig,
    /// Switch-wide parameters (0x11)
    GeneralParams,
    /// FRER stream identification rules (0x20)
    FrerStreamIdent,
    /// FRER sequence generation / replication (0x23)
    FrerSeqGeneration,
    /// FRER sequence recovery / elimination (0x25)
    FrerSeqRecovery,
}

impl TableId {
    /// Wire identifier of this table kind
    pub const fn id(&self) -> u32 {
        match self {
            TableId::VlanLookup => 0x07,
            TableId::L2Forwarding => 0x08,
            TableId::MacConfig => 0x09,
            TableId::GeneralParams => 0x11,
            TableId::FrerStreamIdent => 0x20,
            TableId::FrerSeqGeneration => 0x23,
            TableId::FrerSeqRecovery => 0x25,
        }
    }

    /// Look up a modeled table kind from a wire identifier
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0x07 => Some(TableId::VlanLookup),
            0x08 => Some(TableId::L2Forwarding),
            0x09 => Some(TableId::MacConfig),
            0x11 => Some(TableId::GeneralParams),
            0x20 => Some(TableId::FrerStreamIdent),
            0x23 => Some(TableId::FrerSeqGeneration),
            0x25 => Some(TableId::FrerSeqRecovery),
            _ => None,
        }
    }

    /// Fixed entry size of this table kind in bytes
    pub const fn entry_size(&self) -> usize {
        match self {
            TableId::VlanLookup => 8,
            TableId::L2Forwarding => 8,
            TableId::MacConfig => 16,
            TableId::GeneralParams => 40,
            TableId::FrerStreamIdent => 24,
            TableId::FrerSeqGeneration => 16,
            TableId::FrerSeqRecovery => 24,
        }
    }
}

/// Position of a table id in the canonical image order
///
/// The in-chip loader is order-sensitive for some blocks: switch-wide
/// parameters must precede the per-port tables, which must precede the
/// stream tables. Unmodeled blocks sort last and keep their relative
/// order.
pub(crate) fn canonical_rank(id: u32) -> u8 {
    match TableId::from_id(id) {
        Some(TableId::GeneralParams) => 0,
        Some(TableId::MacConfig) => 1,
        Some(TableId::L2Forwarding) => 2,
        Some(TableId::VlanLookup) => 3,
        Some(TableId::FrerStreamIdent) => 4,
        Some(TableId::FrerSeqGeneration) => 5,
        Some(TableId::FrerSeqRecovery) => 6,
        None => 7,
    }
}

/// One configuration table block
///
/// Holds the raw entry bytes plus the declared entry count. For tables
/// the codec models, typed entry structs in the model crates encode
/// into and decode out of `entries`; unknown ids are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Wire table identifier
    pub id: u32,
    /// Number of entries declared by the block header
    pub entry_count: u32,
    /// Raw entry bytes (`entry_count * entry_size` long for regular tables)
    pub entries: Vec<u8>,
    /// CRC field as stored on the wire; meaningful in v2 only
    pub crc: u32,
}

impl Table {
    /// Create a table from entry bytes with a fixed entry size
    ///
    /// # Arguments
    ///
    /// * `id` - Wire table identifier
    /// * `entry_size` - Size of each entry in bytes
    /// * `entries` - Concatenated entry bytes; length must be a multiple
    ///   of `entry_size`
    pub fn new(id: u32, entry_size: usize, entries: Vec<u8>) -> Result<Self> {
        if entry_size == 0 {
            return Err(Error::parameter("entry_size", "must be non-zero"));
        }
        if entries.len() % entry_size != 0 {
            return Err(Error::parameter(
                "entries",
                format!(
                    "{} bytes is not a multiple of the {}-byte entry size",
                    entries.len(),
                    entry_size
                ),
            ));
        }

        Ok(Self {
            id,
            entry_count: (entries.len() / entry_size) as u32,
            entries,
            crc: 0,
        })
    }

    /// The modeled kind of this table, if any
    pub fn kind(&self) -> Option<TableId> {
        TableId::from_id(self.id)
    }

    /// Entry size derived from the entry bytes and declared count
    ///
    /// Zero for empty tables.
    pub fn entry_size(&self) -> usize {
        if self.entry_count == 0 {
            0
        } else {
            self.entries.len() / self.entry_count as usize
        }
    }

    /// Borrow the bytes of entry `index`
    pub fn entry(&self, index: usize) -> Option<&[u8]> {
        let size = self.entry_size();
        if size == 0 || index >= self.entry_count as usize {
            return None;
        }
        Some(&self.entries[index * size..(index + 1) * size])
    }

    /// Total encoded size of this block, header included
    pub fn encoded_size(&self, version: FormatVersion) -> usize {
        version.table_header_size() + self.entries.len()
    }

    /// Encode the block into its wire form
    ///
    /// In v2 the per-table CRC is recomputed from the entry bytes; in v1
    /// the stored CRC field is written back unchanged so that decoding
    /// and re-encoding an existing image is byte-identical.
    pub fn encode(&self, version: FormatVersion) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(self.encoded_size(version));

        buffer.put_u32_le(self.id);
        match version {
            FormatVersion::V1 => {
                buffer.put_u16_le(self.entry_count as u16);
                buffer.put_u16_le(self.entries.len() as u16);
                buffer.put_u32_le(self.crc);
            }
            FormatVersion::V2 => {
                buffer.put_u32_le(self.entry_count);
                buffer.put_u32_le(self.entry_size() as u32);
                buffer.put_u32_le(checksum::compute(&self.entries));
            }
        }
        buffer.put_slice(&self.entries);

        buffer.to_vec()
    }

    /// Decode one block from the front of `data`
    ///
    /// Returns the table and the number of bytes consumed. Fails with
    /// `TruncatedTable` if the declared entry region overflows the
    /// buffer, and (v2 only) with `TableChecksumMismatch` if the stored
    /// per-table CRC disagrees with the entry bytes. A mismatch is
    /// reported, never silently corrected.
    pub fn decode(data: &[u8], version: FormatVersion) -> Result<(Self, usize)> {
        let header_size = version.table_header_size();
        if data.len() < header_size {
            return Err(Error::TruncatedBuffer {
                needed: header_size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..header_size]);
        let id = buf.get_u32_le();

        let (entry_count, data_size, crc) = match version {
            FormatVersion::V1 => {
                let count = buf.get_u16_le() as u32;
                let data_size = buf.get_u16_le() as usize;
                let crc = buf.get_u32_le();
                (count, data_size, crc)
            }
            FormatVersion::V2 => {
                let count = buf.get_u32_le();
                let entry_size = buf.get_u32_le() as usize;
                let crc = buf.get_u32_le();
                (count, count as usize * entry_size, crc)
            }
        };

        let needed = header_size + data_size;
        if data.len() < needed {
            return Err(Error::TruncatedTable {
                table_id: id,
                needed,
                available: data.len(),
            });
        }

        let entries = data[header_size..needed].to_vec();

        if version.validates_table_crc() {
            let computed = checksum::compute(&entries);
            if computed != crc {
                return Err(Error::TableChecksumMismatch {
                    table_id: id,
                    stored: crc,
                    computed,
                });
            }
        }

        Ok((
            Self {
                id,
                entry_count,
                entries,
                crc,
            },
            needed,
        ))
    }
}
