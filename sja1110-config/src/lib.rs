//! Configuration image codec for SJA1110-RS
//!
//! This crate implements the byte-level format of the SJA1110 switch
//! configuration image: the device header, the self-describing table
//! blocks, the checksum algorithm the in-chip validator runs over the
//! image, and the builder/analyzer pair that assembles and re-parses
//! complete images.
//!
//! # Architecture
//!
//! - [`checksum`] - the hardware CRC32 variant
//! - [`header`] - 16-byte device header encode/decode
//! - [`table`] - typed table blocks with opaque pass-through
//! - [`builder`] - canonical assembly of header + tables + checksum
//! - [`analyzer`] - read-only parsing and checksum verification
//!
//! # Quick Start
//!
//! ```rust
//! use sja1110_config::{ConfigBuilder, Table, TableId, analyzer};
//! use sja1110_core::{FormatVersion, DEVICE_ID_SJA1110};
//!
//! let table = Table::new(TableId::L2Forwarding.id(), 8, vec![0u8; 8]).unwrap();
//!
//! let image = ConfigBuilder::new(FormatVersion::V2, DEVICE_ID_SJA1110)
//!     .push_table(table)
//!     .build()
//!     .unwrap();
//!
//! assert!(analyzer::verify(&image, FormatVersion::V2).unwrap());
//! ```

pub mod analyzer;
pub mod builder;
pub mod checksum;
pub mod header;
pub mod table;

// Re-export commonly used types for convenience
pub use builder::ConfigBuilder;
pub use checksum::compute;
pub use header::{DeviceHeader, HEADER_SIZE};
pub use table::{Table, TableId};
