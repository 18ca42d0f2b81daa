//! FRER stream table materialization
//!
//! Turns a validated policy set into the three linked stream tables:
//! stream identification (which frames belong to which stream),
//! sequence generation (replication side), and sequence recovery
//! (elimination side). Each policy yields one identification and one
//! generation entry; recovery entries exist per RECOVERY-role output
//! port, since that is where elimination instances run.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use sja1110_core::{Error, FormatVersion, MacAddr, PortMask, Result};
use sja1110_config::{Table, TableId};

use crate::policy::{validate_policies, FrerAlgorithm, RedundancyPolicy};
use crate::port::{FrerRole, PortConfig, R_TAG_OFFSET};

/// Identification matches on the ingress port
pub const IDENT_PORT: u8 = 0x01;
/// Identification additionally matches on the VLAN id
pub const IDENT_VLAN: u8 = 0x02;
/// Identification additionally matches on the destination MAC
pub const IDENT_DST_MAC: u8 = 0x04;

/// Sequence number space: 16-bit, wrapping
pub const SEQ_SPACE: u16 = u16::MAX;

/// R-TAG offset on a VLAN-tagged frame (after the 802.1Q tag)
const R_TAG_OFFSET_TAGGED: u8 = 18;

/// One FRER_STREAM_IDENT entry (24 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamIdentEntry {
    pub stream_id: u16,
    pub input_port: u8,
    /// Bitwise OR of the `IDENT_*` match selectors
    pub ident_method: u8,
    /// VLAN to match; zero when `IDENT_VLAN` is clear
    pub vlan_id: u16,
    /// Destination MAC to match; zero when `IDENT_DST_MAC` is clear
    pub dst_mac: MacAddr,
    pub priority: u8,
    pub enabled: bool,
}

impl StreamIdentEntry {
    /// Derive the identification rule of one policy
    pub fn from_policy(policy: &RedundancyPolicy) -> Self {
        let mut method = IDENT_PORT;
        if policy.vlan_filter.is_some() {
            method |= IDENT_VLAN;
        }
        if policy.dst_mac_filter.is_some() {
            method |= IDENT_DST_MAC;
        }

        Self {
            stream_id: policy.stream_id.value(),
            input_port: policy.input_port.index(),
            ident_method: method,
            vlan_id: policy.vlan_filter.unwrap_or(0),
            dst_mac: policy.dst_mac_filter.unwrap_or(MacAddr::zero()),
            priority: policy.priority,
            enabled: true,
        }
    }

    /// Encode the entry into its 24-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::FrerStreamIdent.entry_size());

        buffer.put_u16_le(self.stream_id);
        buffer.put_u8(self.input_port);
        buffer.put_u8(self.ident_method);
        buffer.put_u16_le(self.vlan_id);
        buffer.put_slice(self.dst_mac.as_bytes());
        buffer.put_u8(self.priority);
        buffer.put_u8(self.enabled as u8);
        buffer.put_slice(&[0u8; 10]);

        buffer.to_vec()
    }

    /// Parse one entry from its wire form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = TableId::FrerStreamIdent.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        let stream_id = buf.get_u16_le();
        let input_port = buf.get_u8();
        let ident_method = buf.get_u8();
        let vlan_id = buf.get_u16_le();
        let mut mac = [0u8; 6];
        buf.copy_to_slice(&mut mac);
        let priority = buf.get_u8();
        let enabled = buf.get_u8() != 0;

        Ok(Self {
            stream_id,
            input_port,
            ident_method,
            vlan_id,
            dst_mac: MacAddr::new(mac),
            priority,
            enabled,
        })
    }
}

/// One FRER_SEQ_GENERATION entry (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqGenerationEntry {
    pub stream_id: u16,
    pub algorithm: FrerAlgorithm,
    pub input_port: u8,
    /// Sequence number space size; numbers wrap modulo this + 1
    pub seq_space: u16,
    /// Ports the stream is replicated onto
    pub replication_mask: PortMask,
    pub seq_start: u16,
    pub rtag_offset: u8,
}

impl SeqGenerationEntry {
    /// Derive the replication-side entry of one policy
    pub fn from_policy(policy: &RedundancyPolicy) -> Self {
        let rtag_offset = if policy.vlan_filter.is_some() {
            R_TAG_OFFSET_TAGGED
        } else {
            R_TAG_OFFSET
        };

        Self {
            stream_id: policy.stream_id.value(),
            algorithm: policy.algorithm,
            input_port: policy.input_port.index(),
            seq_space: SEQ_SPACE,
            replication_mask: policy.output_ports,
            seq_start: 0,
            rtag_offset,
        }
    }

    /// Encode the entry into its 16-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::FrerSeqGeneration.entry_size());

        buffer.put_u16_le(self.stream_id);
        buffer.put_u8(self.algorithm.to_u8());
        buffer.put_u8(self.input_port);
        buffer.put_u16_le(self.seq_space);
        buffer.put_u16_le(self.replication_mask.bits());
        buffer.put_u16_le(self.seq_start);
        buffer.put_u8(self.rtag_offset);
        buffer.put_slice(&[0u8; 5]);

        buffer.to_vec()
    }

    /// Parse one entry from its wire form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = TableId::FrerSeqGeneration.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        Ok(Self {
            stream_id: buf.get_u16_le(),
            algorithm: FrerAlgorithm::from_u8(buf.get_u8())?,
            input_port: buf.get_u8(),
            seq_space: buf.get_u16_le(),
            replication_mask: PortMask::from_bits(buf.get_u16_le()),
            seq_start: buf.get_u16_le(),
            rtag_offset: buf.get_u8(),
        })
    }
}

/// One FRER_SEQ_RECOVERY entry (24 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqRecoveryEntry {
    pub stream_id: u16,
    pub algorithm: FrerAlgorithm,
    /// Port the elimination instance runs on
    pub recovery_port: u8,
    /// Sequence history depth
    pub history_window: u16,
    /// Generated copies feeding this instance
    pub member_mask: PortMask,
    pub recovery_timeout_us: u32,
    pub reset_timeout_us: u32,
    pub individual_recovery: bool,
    pub latent_error_detect: bool,
}

impl SeqRecoveryEntry {
    /// Derive the elimination entry of one policy on one recovery port
    pub fn from_policy(policy: &RedundancyPolicy, recovery_port: u8) -> Self {
        Self {
            stream_id: policy.stream_id.value(),
            algorithm: policy.algorithm,
            recovery_port,
            history_window: policy.recovery_window,
            member_mask: policy.output_ports,
            recovery_timeout_us: policy.recovery_timeout_us,
            reset_timeout_us: policy.recovery_timeout_us.saturating_mul(10),
            individual_recovery: true,
            latent_error_detect: true,
        }
    }

    /// Encode the entry into its 24-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::FrerSeqRecovery.entry_size());

        buffer.put_u16_le(self.stream_id);
        buffer.put_u8(self.algorithm.to_u8());
        buffer.put_u8(self.recovery_port);
        buffer.put_u16_le(self.history_window);
        buffer.put_u16_le(self.member_mask.bits());
        buffer.put_u32_le(self.recovery_timeout_us);
        buffer.put_u32_le(self.reset_timeout_us);
        buffer.put_u8(self.individual_recovery as u8);
        buffer.put_u8(self.latent_error_detect as u8);
        buffer.put_slice(&[0u8; 6]);

        buffer.to_vec()
    }

    /// Parse one entry from its wire form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = TableId::FrerSeqRecovery.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        Ok(Self {
            stream_id: buf.get_u16_le(),
            algorithm: FrerAlgorithm::from_u8(buf.get_u8())?,
            recovery_port: buf.get_u8(),
            history_window: buf.get_u16_le(),
            member_mask: PortMask::from_bits(buf.get_u16_le()),
            recovery_timeout_us: buf.get_u32_le(),
            reset_timeout_us: buf.get_u32_le(),
            individual_recovery: buf.get_u8() != 0,
            latent_error_detect: buf.get_u8() != 0,
        })
    }
}

/// Materialize the three FRER stream tables from a policy set
///
/// The policy set is validated against the port configuration first;
/// a well-formed set yields one STREAM_IDENT and one SEQ_GENERATION
/// entry per policy and one SEQ_RECOVERY entry per (policy, RECOVERY
/// output port) pair. `_version` is accepted for symmetry with the
/// other table constructors; the entry layouts are version-independent.
pub fn materialize(
    policies: &[RedundancyPolicy],
    ports: &[PortConfig],
    _version: FormatVersion,
) -> Result<Vec<Table>> {
    validate_policies(policies, ports)?;

    let mut ident = Vec::new();
    let mut generation = Vec::new();
    let mut recovery = Vec::new();

    for policy in policies {
        ident.extend_from_slice(&StreamIdentEntry::from_policy(policy).to_bytes());
        generation.extend_from_slice(&SeqGenerationEntry::from_policy(policy).to_bytes());

        for port in policy.output_ports.iter() {
            let is_recovery = ports
                .iter()
                .any(|p| p.port == port && p.frer_role == FrerRole::Recovery);
            if is_recovery {
                recovery.extend_from_slice(
                    &SeqRecoveryEntry::from_policy(policy, port.index()).to_bytes(),
                );
            }
        }
    }

    debug!(
        streams = policies.len(),
        recovery_entries = recovery.len() / TableId::FrerSeqRecovery.entry_size(),
        "materialized FRER tables"
    );

    Ok(vec![
        Table::new(
            TableId::FrerStreamIdent.id(),
            TableId::FrerStreamIdent.entry_size(),
            ident,
        )?,
        Table::new(
            TableId::FrerSeqGeneration.id(),
            TableId::FrerSeqGeneration.entry_size(),
            generation,
        )?,
        Table::new(
            TableId::FrerSeqRecovery.id(),
            TableId::FrerSeqRecovery.entry_size(),
            recovery,
        )?,
    ])
}
