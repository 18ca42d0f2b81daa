//! Configuration image assembly
//!
//! The builder concatenates the device header and the encoded tables in
//! canonical order, computes the image checksum over the table bytes,
//! patches it into the header, and zero-pads the result to the fixed
//! platform image size. Every `build()` produces a fresh buffer; the
//! builder holds no state that outlives the call.

use tracing::debug;

use sja1110_core::{Error, FormatVersion, Result, SWITCH_CONFIG_SIZE};

use crate::checksum;
use crate::header::{DeviceHeader, HEADER_SIZE};
use crate::table::{canonical_rank, Table};

/// Builder for a complete switch configuration image
///
/// # Examples
///
/// ```
/// use sja1110_config::{ConfigBuilder, Table, TableId};
/// use sja1110_core::{FormatVersion, DEVICE_ID_SJA1110};
///
/// let table = Table::new(TableId::GeneralParams.id(), 40, vec![0u8; 40]).unwrap();
/// let image = ConfigBuilder::new(FormatVersion::V2, DEVICE_ID_SJA1110)
///     .push_table(table)
///     .build()
///     .unwrap();
/// assert_eq!(image.len(), 2236);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    version: FormatVersion,
    device_id: u32,
    tables: Vec<Table>,
}

impl ConfigBuilder {
    /// Create a builder for the given format version and device id
    pub fn new(version: FormatVersion, device_id: u32) -> Self {
        Self {
            version,
            device_id,
            tables: Vec::new(),
        }
    }

    /// Add one table to the image
    pub fn push_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Add several tables to the image
    pub fn push_tables<I: IntoIterator<Item = Table>>(mut self, tables: I) -> Self {
        self.tables.extend(tables);
        self
    }

    /// Tables in the order they will be written
    ///
    /// Modeled tables sort into the canonical loader order; unmodeled
    /// pass-through tables follow in the order they were pushed. The
    /// sort is stable so relative opaque order is preserved.
    fn ordered_tables(&self) -> Vec<&Table> {
        let mut ordered: Vec<&Table> = self.tables.iter().collect();
        ordered.sort_by_key(|t| canonical_rank(t.id));
        ordered
    }

    /// Assemble the final image
    ///
    /// Fails with `SizeExceeded` if header plus tables would not fit the
    /// fixed platform capacity; the image is never truncated to fit.
    pub fn build(&self) -> Result<Vec<u8>> {
        let ordered = self.ordered_tables();

        let config_size: usize = ordered
            .iter()
            .map(|t| t.encoded_size(self.version))
            .sum();
        let total = HEADER_SIZE + config_size;
        if total > SWITCH_CONFIG_SIZE {
            return Err(Error::SizeExceeded {
                size: total,
                capacity: SWITCH_CONFIG_SIZE,
            });
        }

        debug!(
            version = %self.version,
            tables = ordered.len(),
            config_size,
            "assembling configuration image"
        );

        let mut image = Vec::with_capacity(SWITCH_CONFIG_SIZE);
        let header = DeviceHeader::new(self.version, self.device_id, config_size as u32);
        image.extend_from_slice(&header.to_bytes());

        for table in ordered {
            image.extend_from_slice(&table.encode(self.version));
        }

        // Checksum covers the table bytes only; the header checksum
        // field is zero at this point and stays outside the scope.
        let crc = checksum::compute(&image[HEADER_SIZE..]);
        image[12..16].copy_from_slice(&crc.to_le_bytes());

        image.resize(SWITCH_CONFIG_SIZE, 0);

        Ok(image)
    }
}
