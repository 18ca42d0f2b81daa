//! SJA1110-RS Core Library
//!
//! This crate provides the fundamental types, platform constants, and error
//! handling shared by the SJA1110 static configuration codec crates.

pub mod error;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{
    MacAddr, PortId, PortMask, StreamId, DEVICE_ID_SJA1110, NUM_PORTS, SWITCH_CONFIG_SIZE,
};
pub use version::FormatVersion;
