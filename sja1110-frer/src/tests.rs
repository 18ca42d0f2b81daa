//! End-to-end scenario tests
//!
//! These exercise the full path: declarative design -> tables -> image
//! -> parsed tables -> typed entries, against the reference 11-port
//! FRER scenario.

use sja1110_config::{analyzer, checksum, ConfigBuilder, Table, TableId, HEADER_SIZE};
use sja1110_core::{FormatVersion, PortId, PortMask, StreamId, SWITCH_CONFIG_SIZE};

use crate::device::SwitchDesign;
use crate::params::GeneralParams;
use crate::policy::RedundancyPolicy;
use crate::port::{FrerRole, L2ForwardingEntry, MacConfigEntry, NO_RECOVERY_FN};
use crate::tables::{SeqGenerationEntry, SeqRecoveryEntry, StreamIdentEntry};
use crate::vlan::VlanMembership;

/// The reference scenario: stream 1 enters on port 4 and is replicated
/// to ports 2 and 3, window 256, timeout 100 ms.
fn reference_design(version: FormatVersion) -> SwitchDesign {
    let mut design = SwitchDesign::new(version);
    design.set_port_role(PortId(4), FrerRole::Generator).unwrap();
    design.set_port_role(PortId(2), FrerRole::Recovery).unwrap();
    design.set_port_role(PortId(3), FrerRole::Recovery).unwrap();
    design.policies.push(
        RedundancyPolicy::new(
            StreamId(1),
            PortId(4),
            PortMask::from_ports(&[PortId(2), PortId(3)]),
        )
        .unwrap()
        .with_window(256)
        .with_timeout_us(100_000),
    );
    design
}

fn table_by_kind<'a>(tables: &'a [Table], kind: TableId) -> &'a Table {
    tables
        .iter()
        .find(|t| t.kind() == Some(kind))
        .unwrap_or_else(|| panic!("image carries no {:?} table", kind))
}

#[test]
fn test_reference_scenario() {
    let image = reference_design(FormatVersion::V2).build().unwrap();
    let (header, tables) = analyzer::parse(&image, FormatVersion::V2).unwrap();

    // Port 4's forwarding entry is scoped to exactly {2, 3}.
    let forwarding = table_by_kind(&tables, TableId::L2Forwarding);
    let p4 = L2ForwardingEntry::parse(forwarding.entry(4).unwrap()).unwrap();
    assert_eq!(p4.reachable.bits(), 0x00C);

    // Ports 2 and 3 each run an elimination instance for stream 1.
    let recovery = table_by_kind(&tables, TableId::FrerSeqRecovery);
    assert_eq!(recovery.entry_count, 2);
    for (index, port) in [(0usize, 2u8), (1, 3)] {
        let entry = SeqRecoveryEntry::parse(recovery.entry(index).unwrap()).unwrap();
        assert_eq!(entry.stream_id, 1);
        assert_eq!(entry.recovery_port, port);
        assert_eq!(entry.history_window, 256);
        assert_eq!(entry.recovery_timeout_us, 100_000);
    }

    // Independent recomputation over bytes[16..] matches the header.
    let config_end = HEADER_SIZE + header.config_size as usize;
    assert_eq!(header.checksum, checksum::compute(&image[HEADER_SIZE..config_end]));
}

#[test]
fn test_generation_entry_matches_policy() {
    let image = reference_design(FormatVersion::V1).build().unwrap();
    let (_, tables) = analyzer::parse(&image, FormatVersion::V1).unwrap();

    let generation = table_by_kind(&tables, TableId::FrerSeqGeneration);
    let entry = SeqGenerationEntry::parse(generation.entry(0).unwrap()).unwrap();
    assert_eq!(entry.stream_id, 1);
    assert_eq!(entry.input_port, 4);
    assert_eq!(entry.replication_mask.bits(), 0x00C);

    let ident = table_by_kind(&tables, TableId::FrerStreamIdent);
    let rule = StreamIdentEntry::parse(ident.entry(0).unwrap()).unwrap();
    assert_eq!(rule.stream_id, 1);
    assert_eq!(rule.input_port, 4);
}

#[test]
fn test_forwarding_scoping_invariant_across_policies() {
    // Whatever the output set, the generator port's mask equals it
    // exactly; it is never widened to the full port set.
    for outputs in [
        PortMask::from_ports(&[PortId(1)]),
        PortMask::from_ports(&[PortId(2), PortId(3)]),
        PortMask::from_ports(&[PortId(1), PortId(2), PortId(3), PortId(5)]),
    ] {
        let mut design = SwitchDesign::new(FormatVersion::V2);
        design.set_port_role(PortId(4), FrerRole::Generator).unwrap();
        for port in outputs.iter() {
            design.set_port_role(port, FrerRole::Recovery).unwrap();
        }
        design
            .policies
            .push(RedundancyPolicy::new(StreamId(9), PortId(4), outputs).unwrap());

        let tables = design.tables().unwrap();
        let forwarding = table_by_kind(&tables, TableId::L2Forwarding);
        let p4 = L2ForwardingEntry::parse(forwarding.entry(4).unwrap()).unwrap();
        assert_eq!(p4.reachable, outputs);
        assert_ne!(p4.reachable, PortMask::all_except(PortId(4)));
    }
}

#[test]
fn test_model_roundtrip_through_image() {
    let mut design = reference_design(FormatVersion::V2);
    design.vlans.push(
        VlanMembership::new(100, PortMask::from_bits(0x01E), PortMask::EMPTY).unwrap(),
    );

    let image = design.build().unwrap();
    let (_, tables) = analyzer::parse(&image, FormatVersion::V2).unwrap();

    // MAC entries mirror the port configuration.
    let mac = table_by_kind(&tables, TableId::MacConfig);
    for (index, port) in design.ports.iter().enumerate() {
        let entry = MacConfigEntry::parse(mac.entry(index).unwrap()).unwrap();
        assert_eq!(entry.port, port.port.index());
        assert_eq!(entry.enabled, port.enabled);
        assert_eq!(entry.frer_role, port.frer_role);
        assert_eq!(entry.speed_mbps, port.speed.to_mbps());
    }
    let p4 = MacConfigEntry::parse(mac.entry(4).unwrap()).unwrap();
    assert_eq!(p4.recovery_fn, NO_RECOVERY_FN);

    // General parameters survive, with the version's R-TAG EtherType.
    let general = table_by_kind(&tables, TableId::GeneralParams);
    let (params, r_tag) = GeneralParams::parse(general.entry(0).unwrap()).unwrap();
    assert_eq!(params, design.general);
    assert_eq!(r_tag, 0xF1C1);

    // VLAN membership survives.
    let vlan = table_by_kind(&tables, TableId::VlanLookup);
    let membership = VlanMembership::parse(vlan.entry(0).unwrap()).unwrap();
    assert_eq!(membership, design.vlans[0]);
}

#[test]
fn test_opaque_passthrough_through_full_image() {
    // An image carrying a table the codec does not model round-trips
    // byte-identically.
    let mut design = reference_design(FormatVersion::V2);
    design
        .extra_tables
        .push(Table::new(0x4E, 4, vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04]).unwrap());

    let image = design.build().unwrap();
    let (header, tables) = analyzer::parse(&image, FormatVersion::V2).unwrap();
    assert!(tables.iter().any(|t| t.id == 0x4E && t.kind().is_none()));

    let rebuilt = ConfigBuilder::new(FormatVersion::V2, header.device_id)
        .push_tables(tables)
        .build()
        .unwrap();
    assert_eq!(rebuilt, image);
}

#[test]
fn test_size_bound_enforced_end_to_end() {
    let mut design = reference_design(FormatVersion::V2);
    // Pad the design with enough opaque payload to blow the 2236-byte
    // platform capacity.
    design
        .extra_tables
        .push(Table::new(0x60, 64, vec![0u8; 2560]).unwrap());

    let err = design.build().unwrap_err();
    assert!(matches!(
        err,
        sja1110_core::Error::SizeExceeded {
            capacity: SWITCH_CONFIG_SIZE,
            ..
        }
    ));
}

#[test]
fn test_both_versions_verify() {
    for version in [FormatVersion::V1, FormatVersion::V2] {
        let image = reference_design(version).build().unwrap();
        assert_eq!(image.len(), SWITCH_CONFIG_SIZE);
        assert!(analyzer::verify(&image, version).unwrap());
    }
}

#[test]
fn test_versions_are_not_interchangeable() {
    let image = reference_design(FormatVersion::V1).build().unwrap();
    assert!(analyzer::parse(&image, FormatVersion::V2).is_err());
}
