//! Common types used throughout SJA1110-RS

use std::fmt;
use std::str::FromStr;

/// Number of physical ports on the SJA1110 reference chip
pub const NUM_PORTS: u8 = 11;

/// Fixed size of the switch configuration image in bytes
///
/// The in-chip loader reads exactly this many bytes; the builder pads
/// shorter configurations with zeros and rejects longer ones.
pub const SWITCH_CONFIG_SIZE: usize = 2236;

/// Device identifier reported by the SJA1110 silicon
pub const DEVICE_ID_SJA1110: u32 = 0xB700_030F;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Zero MAC address (00:00:00:00:00:00), used as "no filter" in stream rules
    pub const fn zero() -> Self {
        Self([0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
    }

    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const fn broadcast() -> Self {
        Self([0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 6]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(crate::Error::parameter("mac", "expected 6 colon-separated octets"));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::parameter("mac", "invalid hex octet"))?;
        }

        Ok(MacAddr(bytes))
    }
}

/// Physical port identifier (0..NUM_PORTS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u8);

impl PortId {
    /// The host/CPU port on the reference platform
    pub const HOST: Self = Self(0);

    /// Create a port id, checking the platform range
    pub fn new(port: u8) -> crate::Result<Self> {
        if port >= NUM_PORTS {
            return Err(crate::Error::parameter(
                "port",
                format!("port {} out of range 0..{}", port, NUM_PORTS),
            ));
        }
        Ok(Self(port))
    }

    /// Raw port index
    pub fn index(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Stream handle referencing one redundancy policy (16-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u16);

impl StreamId {
    /// Raw stream handle value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream {}", self.0)
    }
}

/// Bitmask over the physical port set
///
/// Bit *n* set means port *n* is a member. The reference chip has 11
/// ports, so only the low 11 bits are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PortMask(pub u16);

impl PortMask {
    /// Empty mask (no ports)
    pub const EMPTY: Self = Self(0);

    /// All physical ports of the reference chip
    pub const ALL: Self = Self((1 << NUM_PORTS) - 1);

    /// Create a mask from raw bits
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Create a mask containing a single port
    pub const fn single(port: PortId) -> Self {
        Self(1 << port.0)
    }

    /// Create a mask from a list of ports
    pub fn from_ports(ports: &[PortId]) -> Self {
        let mut mask = 0u16;
        for p in ports {
            mask |= 1 << p.0;
        }
        Self(mask)
    }

    /// Raw bit representation
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Check whether a port is a member
    pub const fn contains(&self, port: PortId) -> bool {
        self.0 & (1 << port.0) != 0
    }

    /// Add a port to the mask
    pub fn insert(&mut self, port: PortId) {
        self.0 |= 1 << port.0;
    }

    /// Remove a port from the mask
    pub fn remove(&mut self, port: PortId) {
        self.0 &= !(1 << port.0);
    }

    /// Check whether no port is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of member ports
    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    /// All ports except the given one
    pub fn all_except(port: PortId) -> Self {
        Self(Self::ALL.0 & !(1 << port.0))
    }

    /// Iterate over member ports in ascending order
    pub fn iter(&self) -> impl Iterator<Item = PortId> + '_ {
        (0..NUM_PORTS).filter(|p| self.0 & (1 << p) != 0).map(PortId)
    }

    /// Set intersection
    pub const fn intersection(&self, other: PortMask) -> PortMask {
        PortMask(self.0 & other.0)
    }
}

impl fmt::Display for PortMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03X}", self.0)
    }
}
