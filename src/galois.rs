//! GF(2^8) lookup tables for CD-ROM EDC/ECC operations
//!
//! This module builds the three 256-entry tables the rest of the crate works from:
//!
//! - **forward**: multiplication by the generator element α, reduced modulo the
//!   primitive polynomial 0x11D (x⁸ + x⁴ + x³ + x² + 1)
//! - **backward**: the inverse mapping, satisfying `backward[forward[i] ^ i] == i`
//! - **edc**: the bit-reversed CRC table for polynomial 0xD8018001 used by the
//!   sector checksum
//!
//! The tables are computed once per process and shared read-only.

use std::sync::OnceLock;

/// GF(2^8) primitive polynomial used by the CD-ROM P/Q parity codes
const GF8_GENERATOR: u32 = 0x11D;

/// Bit-reversed polynomial of the CD-ROM sector EDC
const EDC_POLYNOMIAL: u32 = 0xD801_8001;

/// Precomputed ECC and EDC lookup tables
pub struct Tables {
    forward: [u8; 256],
    backward: [u8; 256],
    edc: [u32; 256],
}

impl Tables {
    /// Build all three tables
    pub fn new() -> Self {
        let mut tables = Tables {
            forward: [0; 256],
            backward: [0; 256],
            edc: [0; 256],
        };
        tables.build_tables();
        tables
    }

    fn build_tables(&mut self) {
        for i in 0..256u32 {
            let j = (i << 1) ^ if i & 0x80 != 0 { GF8_GENERATOR } else { 0 };
            self.forward[i as usize] = j as u8;
            self.backward[(i ^ j) as usize & 0xFF] = i as u8;

            let mut edc = i;
            for _ in 0..8 {
                edc = (edc >> 1) ^ if edc & 1 != 0 { EDC_POLYNOMIAL } else { 0 };
            }
            self.edc[i as usize] = edc;
        }
    }

    /// Multiply by α in GF(2^8)
    #[inline]
    pub fn forward(&self, value: u8) -> u8 {
        self.forward[value as usize]
    }

    /// Inverse of `x -> forward(x) ^ x`
    #[inline]
    pub fn backward(&self, value: u8) -> u8 {
        self.backward[value as usize]
    }

    /// EDC table entry
    #[inline]
    pub fn edc(&self, index: u8) -> u32 {
        self.edc[index as usize]
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

/// Global table instance
static TABLES: OnceLock<Tables> = OnceLock::new();

/// Get the process-wide tables, building them on first use
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::new)
}
