//! One-call switch configuration assembly
//!
//! [`SwitchDesign`] bundles everything a configuration image is derived
//! from: the format version, the device identity, per-port settings,
//! VLAN membership, and the redundancy policies. `build()` validates,
//! materializes all tables in canonical order, and hands them to the
//! byte-level builder. Inputs are immutable during the call; every
//! build derives a fresh image.

use tracing::debug;

use sja1110_core::{FormatVersion, PortId, Result, DEVICE_ID_SJA1110};
use sja1110_config::{ConfigBuilder, Table};

use crate::params::{general_params_table, GeneralParams};
use crate::policy::{validate_policies, RedundancyPolicy};
use crate::port::{l2_forwarding_table, mac_config_table, FrerRole, PortConfig};
use crate::tables::materialize;
use crate::vlan::{vlan_lookup_table, VlanMembership};

/// Complete declarative description of one switch configuration
#[derive(Debug, Clone)]
pub struct SwitchDesign {
    /// Binary format revision to emit
    pub version: FormatVersion,
    /// Device identifier written into the header
    pub device_id: u32,
    /// Switch-wide parameters
    pub general: GeneralParams,
    /// All physical ports, in port order
    pub ports: Vec<PortConfig>,
    /// VLAN membership records
    pub vlans: Vec<VlanMembership>,
    /// Redundancy policies
    pub policies: Vec<RedundancyPolicy>,
    /// Unmodeled tables to carry through verbatim
    pub extra_tables: Vec<Table>,
}

impl SwitchDesign {
    /// Create a design with the reference chip's default port set
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            device_id: DEVICE_ID_SJA1110,
            general: GeneralParams::default(),
            ports: PortConfig::default_set(),
            vlans: Vec::new(),
            policies: Vec::new(),
            extra_tables: Vec::new(),
        }
    }

    /// Assign a FRER role to one port
    pub fn set_port_role(&mut self, port: PortId, role: FrerRole) -> Result<()> {
        let config = self
            .ports
            .iter_mut()
            .find(|p| p.port == port)
            .ok_or_else(|| {
                sja1110_core::Error::parameter("port", format!("{} not in design", port))
            })?;
        config.frer_role = role;
        Ok(())
    }

    /// Materialize all configuration tables in canonical order
    pub fn tables(&self) -> Result<Vec<Table>> {
        validate_policies(&self.policies, &self.ports)?;

        let mut tables = vec![
            general_params_table(&self.general, self.version)?,
            mac_config_table(&self.ports, &self.policies)?,
            l2_forwarding_table(&self.ports, &self.policies)?,
        ];
        if !self.vlans.is_empty() {
            tables.push(vlan_lookup_table(&self.vlans)?);
        }
        if !self.policies.is_empty() {
            tables.extend(materialize(&self.policies, &self.ports, self.version)?);
        }
        tables.extend(self.extra_tables.iter().cloned());

        debug!(
            version = %self.version,
            tables = tables.len(),
            policies = self.policies.len(),
            "materialized switch design"
        );

        Ok(tables)
    }

    /// Build the complete configuration image
    pub fn build(&self) -> Result<Vec<u8>> {
        let tables = self.tables()?;
        ConfigBuilder::new(self.version, self.device_id)
            .push_tables(tables)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sja1110_config::TableId;
    use sja1110_core::{PortMask, StreamId, SWITCH_CONFIG_SIZE};

    fn frer_design() -> SwitchDesign {
        let mut design = SwitchDesign::new(FormatVersion::V2);
        design.set_port_role(PortId(4), FrerRole::Generator).unwrap();
        design.set_port_role(PortId(2), FrerRole::Recovery).unwrap();
        design.set_port_role(PortId(3), FrerRole::Recovery).unwrap();
        design.policies.push(
            RedundancyPolicy::new(
                StreamId(1),
                PortId(4),
                PortMask::from_ports(&[PortId(2), PortId(3)]),
            )
            .unwrap(),
        );
        design
    }

    #[test]
    fn test_table_order() {
        let design = frer_design();
        let kinds: Vec<_> = design.tables().unwrap().iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Some(TableId::GeneralParams),
                Some(TableId::MacConfig),
                Some(TableId::L2Forwarding),
                Some(TableId::FrerStreamIdent),
                Some(TableId::FrerSeqGeneration),
                Some(TableId::FrerSeqRecovery),
            ]
        );
    }

    #[test]
    fn test_build_is_platform_sized() {
        let image = frer_design().build().unwrap();
        assert_eq!(image.len(), SWITCH_CONFIG_SIZE);
    }

    #[test]
    fn test_plain_design_omits_stream_tables() {
        let design = SwitchDesign::new(FormatVersion::V1);
        let tables = design.tables().unwrap();
        assert_eq!(tables.len(), 3);
    }

    #[test]
    fn test_invalid_policy_set_fails_build() {
        let mut design = frer_design();
        // Second policy reuses the same input port.
        design.policies.push(
            RedundancyPolicy::new(StreamId(2), PortId(4), PortMask::single(PortId(5))).unwrap(),
        );
        assert!(design.build().is_err());
    }
}
