//! Read-only image analysis
//!
//! The analyzer is the inverse of the builder: it parses an existing
//! image back into a header and table list and re-checks the stored
//! checksum. It never mutates the input and is used for round-trip
//! testing and diagnostics of images pulled off a device.

use tracing::trace;

use sja1110_core::{Error, FormatVersion, Result};

use crate::checksum;
use crate::header::{DeviceHeader, HEADER_SIZE};
use crate::table::Table;

/// Parse an image into its header and tables
///
/// The caller declares the format version of the image; see
/// [`DeviceHeader::parse`] for how disagreement is handled. Tables are
/// decoded sequentially over exactly `config_size` bytes; a table that
/// runs past that range is reported as truncated.
pub fn parse(data: &[u8], version: FormatVersion) -> Result<(DeviceHeader, Vec<Table>)> {
    let header = DeviceHeader::parse(data, version)?;

    let config_end = HEADER_SIZE + header.config_size as usize;
    if data.len() < config_end {
        return Err(Error::TruncatedBuffer {
            needed: config_end,
            available: data.len(),
        });
    }

    let mut tables = Vec::new();
    let mut offset = HEADER_SIZE;
    while offset < config_end {
        let (table, consumed) = Table::decode(&data[offset..config_end], version)?;
        trace!(id = table.id, entries = table.entry_count, offset, "decoded table");
        offset += consumed;
        tables.push(table);
    }

    Ok((header, tables))
}

/// Recompute the image checksum and compare it with the stored value
pub fn verify(data: &[u8], version: FormatVersion) -> Result<bool> {
    let header = DeviceHeader::parse(data, version)?;

    let config_end = HEADER_SIZE + header.config_size as usize;
    if data.len() < config_end {
        return Err(Error::TruncatedBuffer {
            needed: config_end,
            available: data.len(),
        });
    }

    let computed = checksum::compute(&data[HEADER_SIZE..config_end]);
    Ok(computed == header.checksum)
}

/// Like [`verify`], but a mismatch is an error
pub fn ensure_checksum(data: &[u8], version: FormatVersion) -> Result<()> {
    let header = DeviceHeader::parse(data, version)?;

    let config_end = HEADER_SIZE + header.config_size as usize;
    if data.len() < config_end {
        return Err(Error::TruncatedBuffer {
            needed: config_end,
            available: data.len(),
        });
    }

    let computed = checksum::compute(&data[HEADER_SIZE..config_end]);
    if computed != header.checksum {
        return Err(Error::ChecksumMismatch {
            stored: header.checksum,
            computed,
        });
    }
    Ok(())
}
