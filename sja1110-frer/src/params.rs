//! Switch-wide general parameters
//!
//! The GENERAL_PARAMS table is a single 40-byte entry carrying the
//! switch identity, host/mirror/cascade port selection, address aging,
//! feature enables, and the FRER globals including the version-scoped
//! R-TAG EtherType.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use sja1110_core::{Error, FormatVersion, PortId, Result};
use sja1110_config::{Table, TableId};

/// Port field value meaning "no port assigned"
const PORT_NONE: u8 = 0xFF;

/// Feature enable bits of the general parameters entry
pub mod features {
    pub const VLAN: u32 = 1 << 0;
    pub const L2_LOOKUP: u32 = 1 << 1;
    pub const POLICING: u32 = 1 << 2;
    pub const FRER: u32 = 1 << 3;
    pub const TSN: u32 = 1 << 4;
    pub const PTP: u32 = 1 << 5;
}

/// Switch-wide parameters (one GENERAL_PARAMS entry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralParams {
    /// 48-bit switch identity, stored as u64
    pub switch_id: u64,
    /// Port connected to the host CPU
    pub host_port: PortId,
    /// Mirror target port, if mirroring is enabled
    pub mirror_port: Option<PortId>,
    /// Cascade port towards a second switch, if any
    pub cascade_port: Option<PortId>,
    /// Whether metadata frames are sent to the host
    pub send_meta: bool,
    /// MAC address aging time in seconds
    pub aging_secs: u32,
    /// Feature enable bits (see [`features`])
    pub features: u32,
    /// Global FRER enable
    pub frer_enabled: bool,
    /// Maximum number of concurrent streams
    pub max_streams: u8,
}

impl Default for GeneralParams {
    fn default() -> Self {
        Self {
            switch_id: 0x0011_2233_4455,
            host_port: PortId::HOST,
            mirror_port: None,
            cascade_port: None,
            send_meta: true,
            aging_secs: 300,
            features: features::VLAN | features::L2_LOOKUP | features::FRER | features::TSN,
            frer_enabled: true,
            max_streams: 16,
        }
    }
}

impl GeneralParams {
    /// Encode the entry; the R-TAG EtherType comes from the format version
    pub fn to_bytes(&self, version: FormatVersion) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::GeneralParams.entry_size());

        buffer.put_u64_le(self.switch_id);
        buffer.put_u8(self.host_port.index());
        buffer.put_u8(self.mirror_port.map_or(PORT_NONE, |p| p.index()));
        buffer.put_u8(self.cascade_port.map_or(PORT_NONE, |p| p.index()));
        buffer.put_u8(self.send_meta as u8);
        buffer.put_u32_le(self.aging_secs);
        buffer.put_u32_le(self.features);
        buffer.put_u8(self.frer_enabled as u8);
        buffer.put_u8(self.max_streams);
        buffer.put_u16_le(version.r_tag_ethertype());
        buffer.put_slice(&[0u8; 16]);

        buffer.to_vec()
    }

    /// Parse the entry back, returning the stored R-TAG EtherType as well
    pub fn parse(data: &[u8]) -> Result<(Self, u16)> {
        let size = TableId::GeneralParams.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        let switch_id = buf.get_u64_le();
        let host_port = PortId(buf.get_u8());
        let mirror = buf.get_u8();
        let cascade = buf.get_u8();
        let send_meta = buf.get_u8() != 0;
        let aging_secs = buf.get_u32_le();
        let features = buf.get_u32_le();
        let frer_enabled = buf.get_u8() != 0;
        let max_streams = buf.get_u8();
        let r_tag = buf.get_u16_le();

        let params = Self {
            switch_id,
            host_port,
            mirror_port: (mirror != PORT_NONE).then_some(PortId(mirror)),
            cascade_port: (cascade != PORT_NONE).then_some(PortId(cascade)),
            send_meta,
            aging_secs,
            features,
            frer_enabled,
            max_streams,
        };
        Ok((params, r_tag))
    }
}

/// Build the GENERAL_PARAMS table
pub fn general_params_table(params: &GeneralParams, version: FormatVersion) -> Result<Table> {
    Table::new(
        TableId::GeneralParams.id(),
        TableId::GeneralParams.entry_size(),
        params.to_bytes(version),
    )
}
