//! Redundancy policies
//!
//! A [`RedundancyPolicy`] is the user-facing intent for one FRER stream:
//! which ingress port feeds it, which egress ports receive replicated
//! copies, and how the elimination side is dimensioned. Policies are
//! immutable inputs to table materialization; every structural invariant
//! is checked up front so the codec below can assume a well-formed set.

use sja1110_core::{Error, MacAddr, PortId, PortMask, Result, StreamId};

use crate::port::{FrerRole, PortConfig};

/// Minimum valid VLAN ID usable as a stream filter
pub const MIN_VLAN: u16 = 1;

/// Maximum valid VLAN ID usable as a stream filter
pub const MAX_VLAN: u16 = 4094;

/// Default sequence history depth of the elimination function
pub const DEFAULT_RECOVERY_WINDOW: u16 = 256;

/// Default elimination timeout in microseconds
pub const DEFAULT_RECOVERY_TIMEOUT_US: u32 = 100_000;

/// FRER recovery algorithm (802.1CB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrerAlgorithm {
    /// Sliding-bitmap history over the recovery window
    Vector,
    /// Direct duplicate elimination by identical sequence number
    Match,
}

impl FrerAlgorithm {
    /// Wire encoding of the algorithm selector
    pub const fn to_u8(self) -> u8 {
        match self {
            FrerAlgorithm::Vector => 0,
            FrerAlgorithm::Match => 1,
        }
    }

    /// Decode the algorithm selector
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FrerAlgorithm::Vector),
            1 => Ok(FrerAlgorithm::Match),
            other => Err(Error::parameter(
                "algorithm",
                format!("unknown recovery algorithm {}", other),
            )),
        }
    }
}

/// Declarative description of one redundant stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundancyPolicy {
    /// Unique 16-bit stream handle
    pub stream_id: StreamId,
    /// Ingress port feeding the stream
    pub input_port: PortId,
    /// Egress ports receiving replicated copies (at least one; two or
    /// more is the interesting replication case)
    pub output_ports: PortMask,
    /// Sequence-number history depth of the elimination function
    pub recovery_window: u16,
    /// Elimination timeout in microseconds
    pub recovery_timeout_us: u32,
    /// Recovery algorithm
    pub algorithm: FrerAlgorithm,
    /// Optional VLAN id the identification rule matches on
    pub vlan_filter: Option<u16>,
    /// Optional destination MAC the identification rule matches on
    pub dst_mac_filter: Option<MacAddr>,
    /// Traffic priority (0-7)
    pub priority: u8,
}

impl RedundancyPolicy {
    /// Create a policy with defaults for window, timeout and algorithm
    ///
    /// # Example
    ///
    /// ```
    /// use sja1110_core::{PortId, PortMask, StreamId};
    /// use sja1110_frer::policy::RedundancyPolicy;
    ///
    /// let policy = RedundancyPolicy::new(
    ///     StreamId(1),
    ///     PortId(4),
    ///     PortMask::from_ports(&[PortId(2), PortId(3)]),
    /// )
    /// .unwrap();
    /// assert_eq!(policy.recovery_window, 256);
    /// ```
    pub fn new(stream_id: StreamId, input_port: PortId, output_ports: PortMask) -> Result<Self> {
        let policy = Self {
            stream_id,
            input_port,
            output_ports,
            recovery_window: DEFAULT_RECOVERY_WINDOW,
            recovery_timeout_us: DEFAULT_RECOVERY_TIMEOUT_US,
            algorithm: FrerAlgorithm::Vector,
            vlan_filter: None,
            dst_mac_filter: None,
            priority: 0,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Set the recovery window
    pub fn with_window(mut self, window: u16) -> Self {
        self.recovery_window = window;
        self
    }

    /// Set the recovery timeout in microseconds
    pub fn with_timeout_us(mut self, timeout_us: u32) -> Self {
        self.recovery_timeout_us = timeout_us;
        self
    }

    /// Select the recovery algorithm
    pub fn with_algorithm(mut self, algorithm: FrerAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Restrict identification to one VLAN
    pub fn with_vlan_filter(mut self, vlan_id: u16) -> Self {
        self.vlan_filter = Some(vlan_id);
        self
    }

    /// Restrict identification to one destination MAC
    pub fn with_dst_mac_filter(mut self, mac: MacAddr) -> Self {
        self.dst_mac_filter = Some(mac);
        self
    }

    /// Set the traffic priority (0-7)
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Check the structural invariants of this policy in isolation
    pub fn validate(&self) -> Result<()> {
        if self.output_ports.is_empty() {
            return Err(Error::policy(format!(
                "{} has no output ports",
                self.stream_id
            )));
        }
        if self.output_ports.contains(self.input_port) {
            return Err(Error::policy(format!(
                "{} input {} appears in its own output set {}",
                self.stream_id, self.input_port, self.output_ports
            )));
        }
        if self.recovery_window == 0 {
            return Err(Error::policy(format!(
                "{} has a zero recovery window",
                self.stream_id
            )));
        }
        if self.priority > 7 {
            return Err(Error::parameter(
                "priority",
                format!("priority {} out of range 0-7", self.priority),
            ));
        }
        if let Some(vlan) = self.vlan_filter {
            if !(MIN_VLAN..=MAX_VLAN).contains(&vlan) {
                return Err(Error::parameter(
                    "vlan_filter",
                    format!("VLAN {} out of range {}-{}", vlan, MIN_VLAN, MAX_VLAN),
                ));
            }
        }
        Ok(())
    }
}

/// Validate a policy set against the port configuration
///
/// Checks the cross-policy invariants the per-policy [`validate`]
/// cannot see:
///
/// - stream ids are unique,
/// - no port is the input of two policies,
/// - no port is the input of one policy and an output of another,
/// - every policy's input port carries the GENERATOR role,
/// - every GENERATOR-role port is exactly one policy's input,
/// - every RECOVERY-role port appears in at least one output mask.
///
/// [`validate`]: RedundancyPolicy::validate
pub fn validate_policies(policies: &[RedundancyPolicy], ports: &[PortConfig]) -> Result<()> {
    let mut all_outputs = PortMask::EMPTY;
    for policy in policies {
        policy.validate()?;
        all_outputs = PortMask::from_bits(all_outputs.bits() | policy.output_ports.bits());
    }

    for (i, a) in policies.iter().enumerate() {
        for b in &policies[i + 1..] {
            if a.stream_id == b.stream_id {
                return Err(Error::policy(format!("duplicate {}", a.stream_id)));
            }
            if a.input_port == b.input_port {
                return Err(Error::role_conflict(
                    a.input_port.index(),
                    format!("input of both {} and {}", a.stream_id, b.stream_id),
                ));
            }
        }
    }

    for policy in policies {
        if all_outputs.contains(policy.input_port) {
            return Err(Error::role_conflict(
                policy.input_port.index(),
                format!(
                    "input of {} but also an output of another policy",
                    policy.stream_id
                ),
            ));
        }
        let role = ports
            .iter()
            .find(|p| p.port == policy.input_port)
            .map(|p| p.frer_role)
            .unwrap_or(FrerRole::None);
        if role != FrerRole::Generator {
            return Err(Error::role_conflict(
                policy.input_port.index(),
                format!("input of {} but not configured as generator", policy.stream_id),
            ));
        }
    }

    for port in ports {
        match port.frer_role {
            FrerRole::Generator => {
                let count = policies.iter().filter(|p| p.input_port == port.port).count();
                if count != 1 {
                    return Err(Error::role_conflict(
                        port.port.index(),
                        format!("generator port is the input of {} policies", count),
                    ));
                }
            }
            FrerRole::Recovery => {
                if !all_outputs.contains(port.port) {
                    return Err(Error::role_conflict(
                        port.port.index(),
                        "recovery port is not an output of any policy".to_string(),
                    ));
                }
            }
            FrerRole::None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortConfig;

    fn ports_with_roles() -> Vec<PortConfig> {
        let mut ports = PortConfig::default_set();
        ports[4].frer_role = FrerRole::Generator;
        ports[2].frer_role = FrerRole::Recovery;
        ports[3].frer_role = FrerRole::Recovery;
        ports
    }

    fn sample_policy() -> RedundancyPolicy {
        RedundancyPolicy::new(
            StreamId(1),
            PortId(4),
            PortMask::from_ports(&[PortId(2), PortId(3)]),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let policy = sample_policy();
        assert_eq!(policy.recovery_window, DEFAULT_RECOVERY_WINDOW);
        assert_eq!(policy.recovery_timeout_us, DEFAULT_RECOVERY_TIMEOUT_US);
        assert_eq!(policy.algorithm, FrerAlgorithm::Vector);
    }

    #[test]
    fn test_input_in_outputs_rejected() {
        let err = RedundancyPolicy::new(
            StreamId(1),
            PortId(2),
            PortMask::from_ports(&[PortId(2), PortId(3)]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));
    }

    #[test]
    fn test_empty_outputs_rejected() {
        let err = RedundancyPolicy::new(StreamId(1), PortId(4), PortMask::EMPTY).unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let policy = sample_policy().with_window(0);
        assert!(matches!(policy.validate(), Err(Error::InvalidPolicy(_))));
    }

    #[test]
    fn test_vlan_filter_range() {
        assert!(sample_policy().with_vlan_filter(100).validate().is_ok());
        assert!(sample_policy().with_vlan_filter(0).validate().is_err());
        assert!(sample_policy().with_vlan_filter(4095).validate().is_err());
    }

    #[test]
    fn test_valid_set_accepted() {
        assert!(validate_policies(&[sample_policy()], &ports_with_roles()).is_ok());
    }

    #[test]
    fn test_duplicate_stream_id() {
        let mut ports = ports_with_roles();
        ports[5].frer_role = FrerRole::Generator;
        let a = sample_policy();
        let b = RedundancyPolicy::new(StreamId(1), PortId(5), PortMask::single(PortId(6)))
            .unwrap();
        let err = validate_policies(&[a, b], &ports).unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));
    }

    #[test]
    fn test_shared_input_port_conflicts() {
        let a = sample_policy();
        let b = RedundancyPolicy::new(StreamId(2), PortId(4), PortMask::single(PortId(6)))
            .unwrap();
        let err = validate_policies(&[a, b], &ports_with_roles()).unwrap_err();
        assert!(matches!(err, Error::PortRoleConflict { port: 4, .. }));
    }

    #[test]
    fn test_input_as_other_output_conflicts() {
        let mut ports = ports_with_roles();
        ports[5].frer_role = FrerRole::Generator;
        let a = sample_policy();
        // Stream 2 replicates onto port 4, which is stream 1's input.
        let b = RedundancyPolicy::new(StreamId(2), PortId(5), PortMask::single(PortId(4)))
            .unwrap();
        let err = validate_policies(&[a, b], &ports).unwrap_err();
        assert!(matches!(err, Error::PortRoleConflict { port: 4, .. }));
    }

    #[test]
    fn test_input_without_generator_role_conflicts() {
        let mut ports = ports_with_roles();
        ports[4].frer_role = FrerRole::None;
        let err = validate_policies(&[sample_policy()], &ports).unwrap_err();
        assert!(matches!(err, Error::PortRoleConflict { port: 4, .. }));
    }

    #[test]
    fn test_idle_generator_role_conflicts() {
        let mut ports = ports_with_roles();
        ports[6].frer_role = FrerRole::Generator;
        let err = validate_policies(&[sample_policy()], &ports).unwrap_err();
        assert!(matches!(err, Error::PortRoleConflict { port: 6, .. }));
    }

    #[test]
    fn test_recovery_role_without_stream_conflicts() {
        let mut ports = ports_with_roles();
        ports[7].frer_role = FrerRole::Recovery;
        let err = validate_policies(&[sample_policy()], &ports).unwrap_err();
        assert!(matches!(err, Error::PortRoleConflict { port: 7, .. }));
    }
}
