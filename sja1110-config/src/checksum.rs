//! Configuration image checksum
//!
//! This module implements the CRC32 variant the SJA1110 runs over a
//! loaded configuration image. It uses the 0x04C11DB7 polynomial but is
//! not interchangeable with the generic table-driven CRC32 found in
//! compression libraries: every input byte is bit-reversed into a 32-bit
//! operand before MSB-first folding, and the final accumulator is
//! complemented and bit-reversed before return. Substituting a stock
//! CRC32 yields a value the in-chip validator rejects, so the algorithm
//! is spelled out here and pinned by known-answer tests.

/// CRC polynomial used by the hardware validator
const POLY: u32 = 0x04C1_1DB7;

/// Seed value for the accumulator
const SEED: u32 = 0xFFFF_FFFF;

/// Reverse the bit order of a 32-bit value
fn bit_reverse(value: u32) -> u32 {
    value.reverse_bits()
}

/// Fold one input byte into the accumulator
fn crc32_add(mut crc: u32, byte: u8) -> u32 {
    let mut byte32 = bit_reverse(byte as u32);

    for _ in 0..8 {
        if (crc ^ byte32) & 0x8000_0000 != 0 {
            crc = (crc << 1) ^ POLY;
        } else {
            crc <<= 1;
        }
        byte32 <<= 1;
    }

    crc
}

/// Compute the configuration checksum over a byte range
///
/// Pure function: identical input always yields identical output, and
/// the working state is a single `u32` accumulator, so it is safe to
/// call from any number of threads concurrently.
///
/// # Arguments
///
/// * `data` - The bytes to checksum
///
/// # Returns
///
/// The 32-bit checksum expected by the hardware validator
///
/// # Examples
///
/// ```
/// use sja1110_config::checksum::compute;
///
/// assert_eq!(compute(&[0u8; 16]), 0xECBB_4B55);
/// ```
pub fn compute(data: &[u8]) -> u32 {
    let mut crc = SEED;

    for &byte in data {
        crc = crc32_add(crc, byte);
    }

    bit_reverse(!crc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    // Known-answer vectors frozen from the reference algorithm. These
    // are the oracle: a reimplementation that disagrees with any of
    // them will be rejected by the hardware validator.
    #[test]
    fn test_known_answer_empty() {
        assert_eq!(compute(&[]), 0x0000_0000);
    }

    #[test]
    fn test_known_answer_16_zeros() {
        assert_eq!(compute(&[0u8; 16]), 0xECBB_4B55);
    }

    #[test]
    fn test_known_answer_ascii_digits() {
        assert_eq!(compute(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_known_answer_single_ff() {
        assert_eq!(compute(&[0xFF]), 0xFF00_0000);
    }

    #[test]
    fn test_known_answer_deadbeef() {
        assert_eq!(compute(&[0xDE, 0xAD, 0xBE, 0xEF]), 0x7C9C_A35A);
    }

    #[test]
    fn test_determinism() {
        let data: Vec<u8> = (0u8..=255).collect();
        assert_eq!(compute(&data), compute(&data));
    }

    #[test]
    fn test_single_bit_flip_changes_checksum() {
        let mut rng = StdRng::seed_from_u64(0x5A11_0CFC);
        let mut data = vec![0u8; 256];
        rng.fill_bytes(&mut data);
        let reference = compute(&data);

        for _ in 0..64 {
            let byte = rng.gen_range(0..data.len());
            let bit = rng.gen_range(0..8);
            data[byte] ^= 1 << bit;
            assert_ne!(
                compute(&data),
                reference,
                "flip of bit {} in byte {} went undetected",
                bit,
                byte
            );
            data[byte] ^= 1 << bit;
        }
    }

    #[test]
    fn test_length_sensitive() {
        assert_ne!(compute(&[0u8; 15]), compute(&[0u8; 16]));
    }
}
