//! VLAN membership
//!
//! The VLAN_LOOKUP table declares which ports belong to each VLAN and
//! which of them egress untagged frames.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use sja1110_core::{Error, PortMask, Result};
use sja1110_config::{Table, TableId};

use crate::policy::{MAX_VLAN, MIN_VLAN};

/// Membership of one VLAN (8-byte table entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanMembership {
    /// VLAN identifier (1-4094)
    pub vlan_id: u16,
    /// Ports belonging to the VLAN
    pub members: PortMask,
    /// Subset of members that egress frames untagged
    pub untagged: PortMask,
}

impl VlanMembership {
    /// Create a membership record, validating the VLAN id range
    pub fn new(vlan_id: u16, members: PortMask, untagged: PortMask) -> Result<Self> {
        if !(MIN_VLAN..=MAX_VLAN).contains(&vlan_id) {
            return Err(Error::parameter(
                "vlan_id",
                format!("VLAN {} out of range {}-{}", vlan_id, MIN_VLAN, MAX_VLAN),
            ));
        }
        if untagged.bits() & !members.bits() != 0 {
            return Err(Error::parameter(
                "untagged",
                "untagged set must be a subset of the member set",
            ));
        }
        Ok(Self {
            vlan_id,
            members,
            untagged,
        })
    }

    /// Encode the entry into its 8-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::VlanLookup.entry_size());

        buffer.put_u16_le(self.vlan_id);
        buffer.put_u16_le(self.members.bits());
        buffer.put_u16_le(self.untagged.bits());
        buffer.put_u8(0x01); // valid
        buffer.put_u8(0);

        buffer.to_vec()
    }

    /// Parse one entry from its wire form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = TableId::VlanLookup.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        Ok(Self {
            vlan_id: buf.get_u16_le(),
            members: PortMask::from_bits(buf.get_u16_le()),
            untagged: PortMask::from_bits(buf.get_u16_le()),
        })
    }
}

/// Build the VLAN_LOOKUP table
pub fn vlan_lookup_table(vlans: &[VlanMembership]) -> Result<Table> {
    let mut entries = Vec::with_capacity(vlans.len() * TableId::VlanLookup.entry_size());
    for vlan in vlans {
        entries.extend_from_slice(&vlan.to_bytes());
    }
    Table::new(TableId::VlanLookup.id(), TableId::VlanLookup.entry_size(), entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sja1110_core::PortId;

    #[test]
    fn test_vlan_id_range() {
        assert!(VlanMembership::new(1, PortMask::ALL, PortMask::EMPTY).is_ok());
        assert!(VlanMembership::new(0, PortMask::ALL, PortMask::EMPTY).is_err());
        assert!(VlanMembership::new(4095, PortMask::ALL, PortMask::EMPTY).is_err());
    }

    #[test]
    fn test_untagged_must_be_member_subset() {
        let err = VlanMembership::new(
            100,
            PortMask::from_ports(&[PortId(1)]),
            PortMask::from_ports(&[PortId(2)]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_entry_roundtrip() {
        let vlan = VlanMembership::new(
            100,
            PortMask::from_ports(&[PortId(1), PortId(2)]),
            PortMask::from_ports(&[PortId(2)]),
        )
        .unwrap();
        let bytes = vlan.to_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(VlanMembership::parse(&bytes).unwrap(), vlan);
    }

    #[test]
    fn test_table_shape() {
        let vlans = vec![
            VlanMembership::new(1, PortMask::ALL, PortMask::ALL).unwrap(),
            VlanMembership::new(100, PortMask::from_bits(0x01E), PortMask::EMPTY).unwrap(),
        ];
        let table = vlan_lookup_table(&vlans).unwrap();
        assert_eq!(table.kind(), Some(TableId::VlanLookup));
        assert_eq!(table.entry_count, 2);
    }
}
