//! Error types for SJA1110-RS

use thiserror::Error;

/// Result type alias for SJA1110 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for SJA1110-RS
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Fewer bytes available than a declared field requires
    #[error("Truncated buffer: need {needed} bytes, {available} available")]
    TruncatedBuffer { needed: usize, available: usize },

    /// A table's declared entry region overflows the remaining buffer
    #[error("Truncated table 0x{table_id:02X}: need {needed} bytes, {available} available")]
    TruncatedTable {
        table_id: u32,
        needed: usize,
        available: usize,
    },

    /// Header carries a format marker the codec does not know
    #[error("Unknown format version marker: 0x{0:08X}")]
    UnknownFormatVersion(u32),

    /// Header carries a known format marker that is not the one the caller declared
    #[error("Format version mismatch: caller declared {expected}, buffer carries {found}")]
    FormatVersionMismatch { expected: String, found: String },

    /// Assembled configuration larger than the fixed platform capacity
    #[error("Configuration size {size} exceeds platform capacity of {capacity} bytes")]
    SizeExceeded { size: usize, capacity: usize },

    /// Global checksum verification failure
    #[error("Checksum mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// Per-table checksum verification failure
    #[error("Table 0x{table_id:02X} checksum mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    TableChecksumMismatch {
        table_id: u32,
        stored: u32,
        computed: u32,
    },

    /// A redundancy policy violates a structural invariant
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// A port is assigned incompatible FRER roles by two policies
    #[error("Port {port} role conflict: {reason}")]
    PortRoleConflict { port: u8, reason: String },

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl Error {
    /// Create an `InvalidPolicy` error with a custom message
    pub fn policy<S: Into<String>>(msg: S) -> Self {
        Error::InvalidPolicy(msg.into())
    }

    /// Create a `PortRoleConflict` error for a port
    pub fn role_conflict<S: Into<String>>(port: u8, reason: S) -> Self {
        Error::PortRoleConflict {
            port,
            reason: reason.into(),
        }
    }

    /// Create an `InvalidParameter` error
    pub fn parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
