//! Per-port configuration and the L2 forwarding model
//!
//! This module owns the MAC_CONFIG and L2_FORWARDING tables. The
//! forwarding model implements the one asymmetry that distinguishes
//! FRER-scoped forwarding from plain switching: a generator port's
//! reachable set is restricted to exactly its policy's output ports so
//! replicated copies cannot leak to unrelated ports, while a recovery
//! port forwards like any other egress port once duplicates have been
//! eliminated.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use sja1110_core::{Error, PortId, PortMask, Result, NUM_PORTS};
use sja1110_config::{Table, TableId};

use crate::policy::RedundancyPolicy;

/// Byte offset at which the R-TAG is inserted on an untagged frame
pub const R_TAG_OFFSET: u8 = 14;

/// Recovery function id meaning "none" (generation-only port)
pub const NO_RECOVERY_FN: u8 = 0xFF;

/// Default maximum frame size (standard Ethernet + VLAN tag)
pub const DEFAULT_MAX_FRAME: u16 = 1522;

/// Ethernet port speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSpeed {
    /// 10 Mbit/s
    Speed10M,
    /// 100 Mbit/s (100BASE-T1)
    Speed100M,
    /// 1 Gbit/s (1000BASE-T1)
    Speed1G,
    /// 2.5 Gbit/s
    Speed2G5,
}

impl PortSpeed {
    /// Speed in Mbit/s as stored in the MAC configuration entry
    pub const fn to_mbps(self) -> u16 {
        match self {
            PortSpeed::Speed10M => 10,
            PortSpeed::Speed100M => 100,
            PortSpeed::Speed1G => 1000,
            PortSpeed::Speed2G5 => 2500,
        }
    }

    /// Decode a speed from its Mbit/s value
    pub fn from_mbps(mbps: u16) -> Result<Self> {
        match mbps {
            10 => Ok(PortSpeed::Speed10M),
            100 => Ok(PortSpeed::Speed100M),
            1000 => Ok(PortSpeed::Speed1G),
            2500 => Ok(PortSpeed::Speed2G5),
            other => Err(Error::parameter(
                "speed",
                format!("unsupported port speed {} Mbit/s", other),
            )),
        }
    }
}

/// Link duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Duplex {
    Half,
    Full,
}

impl Duplex {
    const fn to_u8(self) -> u8 {
        match self {
            Duplex::Half => 0,
            Duplex::Full => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        if value == 0 {
            Duplex::Half
        } else {
            Duplex::Full
        }
    }
}

/// FRER role of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrerRole {
    /// No FRER function on this port
    #[default]
    None,
    /// Replication side: assigns sequence numbers and fans the stream out
    Generator,
    /// Elimination side: discards duplicate and out-of-window frames
    Recovery,
}

impl FrerRole {
    /// Wire encoding of the role
    pub const fn to_u8(self) -> u8 {
        match self {
            FrerRole::None => 0,
            FrerRole::Generator => 1,
            FrerRole::Recovery => 2,
        }
    }

    /// Decode the role
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FrerRole::None),
            1 => Ok(FrerRole::Generator),
            2 => Ok(FrerRole::Recovery),
            other => Err(Error::parameter(
                "frer_role",
                format!("unknown FRER role {}", other),
            )),
        }
    }
}

/// Configuration of one physical port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Physical port index
    pub port: PortId,
    /// Whether the port is brought up at all
    pub enabled: bool,
    /// Link speed
    pub speed: PortSpeed,
    /// Duplex mode (full on every automotive link)
    pub duplex: Duplex,
    /// FRER role
    pub frer_role: FrerRole,
    /// Maximum frame size in bytes
    pub max_frame: u16,
    /// Port-based default VLAN
    pub default_vlan: u16,
}

impl PortConfig {
    /// Create an enabled 1G full-duplex port with no FRER role
    pub fn new(port: PortId) -> Self {
        Self {
            port,
            enabled: true,
            speed: PortSpeed::Speed1G,
            duplex: Duplex::Full,
            frer_role: FrerRole::None,
            max_frame: DEFAULT_MAX_FRAME,
            default_vlan: 1,
        }
    }

    /// Default configuration for all ports of the reference chip
    pub fn default_set() -> Vec<PortConfig> {
        (0..NUM_PORTS).map(|p| PortConfig::new(PortId(p))).collect()
    }
}

/// One MAC_CONFIG table entry (16 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacConfigEntry {
    pub port: u8,
    pub enabled: bool,
    pub speed_mbps: u16,
    pub duplex: Duplex,
    pub frer_role: FrerRole,
    pub max_frame: u16,
    pub default_vlan: u16,
    /// R-TAG insertion offset; zero on ports without a FRER role
    pub rtag_offset: u8,
    /// Recovery function index, `NO_RECOVERY_FN` when not applicable
    pub recovery_fn: u8,
}

impl MacConfigEntry {
    /// Encode the entry into its 16-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::MacConfig.entry_size());

        buffer.put_u8(self.port);
        buffer.put_u8(self.enabled as u8);
        buffer.put_u16_le(self.speed_mbps);
        buffer.put_u8(self.duplex.to_u8());
        buffer.put_u8(self.frer_role.to_u8());
        buffer.put_u16_le(self.max_frame);
        buffer.put_u16_le(self.default_vlan);
        buffer.put_u8(self.rtag_offset);
        buffer.put_u8(self.recovery_fn);
        buffer.put_slice(&[0u8; 4]);

        buffer.to_vec()
    }

    /// Parse one entry from its wire form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = TableId::MacConfig.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        let port = buf.get_u8();
        let enabled = buf.get_u8() != 0;
        let speed_mbps = buf.get_u16_le();
        let duplex = Duplex::from_u8(buf.get_u8());
        let frer_role = FrerRole::from_u8(buf.get_u8())?;
        let max_frame = buf.get_u16_le();
        let default_vlan = buf.get_u16_le();
        let rtag_offset = buf.get_u8();
        let recovery_fn = buf.get_u8();

        Ok(Self {
            port,
            enabled,
            speed_mbps,
            duplex,
            frer_role,
            max_frame,
            default_vlan,
            rtag_offset,
            recovery_fn,
        })
    }
}

/// One L2_FORWARDING table entry (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2ForwardingEntry {
    /// Ports frames arriving here may be forwarded to
    pub reachable: PortMask,
    /// Ports that receive broadcast/flooded frames from here
    pub broadcast: PortMask,
    pub default_vlan: u16,
    pub flags: u8,
}

impl L2ForwardingEntry {
    /// Flag bits written for an enabled port
    pub const FLAGS_ENABLED: u8 = 0x0F;

    /// Encode the entry into its 8-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(TableId::L2Forwarding.entry_size());

        buffer.put_u16_le(self.reachable.bits());
        buffer.put_u16_le(self.broadcast.bits());
        buffer.put_u16_le(self.default_vlan);
        buffer.put_u8(self.flags);
        buffer.put_u8(0);

        buffer.to_vec()
    }

    /// Parse one entry from its wire form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = TableId::L2Forwarding.entry_size();
        if data.len() < size {
            return Err(Error::TruncatedBuffer {
                needed: size,
                available: data.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(&data[..size]);
        Ok(Self {
            reachable: PortMask::from_bits(buf.get_u16_le()),
            broadcast: PortMask::from_bits(buf.get_u16_le()),
            default_vlan: buf.get_u16_le(),
            flags: buf.get_u8(),
        })
    }
}

/// Recovery function index for each port, assigned in recovery-entry order
///
/// Matches the entry order of the sequence recovery table: policies in
/// declaration order, then the RECOVERY-role output ports of each in
/// ascending port order. Ports without a recovery instance map to
/// `NO_RECOVERY_FN`.
pub(crate) fn recovery_fn_ids(
    ports: &[PortConfig],
    policies: &[RedundancyPolicy],
) -> [u8; NUM_PORTS as usize] {
    let mut ids = [NO_RECOVERY_FN; NUM_PORTS as usize];
    let mut next = 0u8;
    for policy in policies {
        for port in policy.output_ports.iter() {
            let is_recovery = ports
                .iter()
                .any(|p| p.port == port && p.frer_role == FrerRole::Recovery);
            if is_recovery && ids[port.index() as usize] == NO_RECOVERY_FN {
                ids[port.index() as usize] = next;
                next += 1;
            }
        }
    }
    ids
}

/// Build the MAC_CONFIG table for an ordered port list
pub fn mac_config_table(ports: &[PortConfig], policies: &[RedundancyPolicy]) -> Result<Table> {
    let fn_ids = recovery_fn_ids(ports, policies);

    let mut entries = Vec::with_capacity(ports.len() * TableId::MacConfig.entry_size());
    for port in ports {
        let (rtag_offset, recovery_fn) = match port.frer_role {
            FrerRole::None => (0, NO_RECOVERY_FN),
            FrerRole::Generator => (R_TAG_OFFSET, NO_RECOVERY_FN),
            FrerRole::Recovery => (R_TAG_OFFSET, fn_ids[port.port.index() as usize]),
        };

        let entry = MacConfigEntry {
            port: port.port.index(),
            enabled: port.enabled,
            speed_mbps: port.speed.to_mbps(),
            duplex: port.duplex,
            frer_role: port.frer_role,
            max_frame: port.max_frame,
            default_vlan: port.default_vlan,
            rtag_offset,
            recovery_fn,
        };
        entries.extend_from_slice(&entry.to_bytes());
    }

    Table::new(TableId::MacConfig.id(), TableId::MacConfig.entry_size(), entries)
}

/// Build the L2_FORWARDING table
///
/// Default entry for port *p*: full port set minus *p* for both the
/// reachable set and the broadcast domain (frames are never reflected
/// back to their source). A generator port is instead scoped to exactly
/// its policy's output ports; a recovery port keeps the default.
/// Disabled ports forward nowhere.
pub fn l2_forwarding_table(ports: &[PortConfig], policies: &[RedundancyPolicy]) -> Result<Table> {
    let mut entries = Vec::with_capacity(ports.len() * TableId::L2Forwarding.entry_size());

    for port in ports {
        let entry = if !port.enabled {
            L2ForwardingEntry {
                reachable: PortMask::EMPTY,
                broadcast: PortMask::EMPTY,
                default_vlan: port.default_vlan,
                flags: 0,
            }
        } else {
            let default = PortMask::all_except(port.port);
            let (reachable, broadcast) = match port.frer_role {
                FrerRole::Generator => {
                    let policy = policies
                        .iter()
                        .find(|p| p.input_port == port.port)
                        .ok_or_else(|| {
                            Error::role_conflict(
                                port.port.index(),
                                "generator port has no policy".to_string(),
                            )
                        })?;
                    (policy.output_ports, policy.output_ports)
                }
                _ => (default, default),
            };
            L2ForwardingEntry {
                reachable,
                broadcast,
                default_vlan: port.default_vlan,
                flags: L2ForwardingEntry::FLAGS_ENABLED,
            }
        };
        entries.extend_from_slice(&entry.to_bytes());
    }

    Table::new(
        TableId::L2Forwarding.id(),
        TableId::L2Forwarding.entry_size(),
        entries,
    )
}
