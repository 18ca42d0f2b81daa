//! Port, VLAN and FRER models for SJA1110-RS
//!
//! This crate turns declarative switch intent (per-port settings, VLAN
//! membership, IEEE 802.1CB redundancy policies) into the typed
//! configuration tables the byte-level codec serializes.
//!
//! # Architecture
//!
//! - [`policy`] - `RedundancyPolicy` and cross-policy validation
//! - [`port`] - per-port configuration and the L2 forwarding model
//! - [`vlan`] - VLAN membership table
//! - [`params`] - switch-wide general parameters
//! - [`tables`] - materialization of the three FRER stream tables
//! - [`recovery`] - executable model of the elimination function
//! - [`device`] - `SwitchDesign`, the one-call image assembly
//!
//! # Quick Start
//!
//! ```rust
//! use sja1110_core::{FormatVersion, PortId, PortMask, StreamId};
//! use sja1110_frer::device::SwitchDesign;
//! use sja1110_frer::policy::RedundancyPolicy;
//! use sja1110_frer::port::FrerRole;
//!
//! let mut design = SwitchDesign::new(FormatVersion::V2);
//! design.set_port_role(PortId(4), FrerRole::Generator).unwrap();
//! design.set_port_role(PortId(2), FrerRole::Recovery).unwrap();
//! design.set_port_role(PortId(3), FrerRole::Recovery).unwrap();
//! design.policies.push(
//!     RedundancyPolicy::new(
//!         StreamId(1),
//!         PortId(4),
//!         PortMask::from_ports(&[PortId(2), PortId(3)]),
//!     )
//!     .unwrap(),
//! );
//!
//! let image = design.build().unwrap();
//! assert_eq!(image.len(), 2236);
//! ```

pub mod device;
pub mod params;
pub mod policy;
pub mod port;
pub mod recovery;
pub mod tables;
pub mod vlan;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use device::SwitchDesign;
pub use params::GeneralParams;
pub use policy::{FrerAlgorithm, RedundancyPolicy};
pub use port::{Duplex, FrerRole, PortConfig, PortSpeed};
pub use recovery::{MatchRecovery, VectorRecovery};
pub use vlan::VlanMembership;
