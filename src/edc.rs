//! Sector error detection code (EDC)
//!
//! A table-driven 32-bit running checksum. Each call walks its slice from the
//! last byte to the first; callers thread the returned value into the next call.

use crate::galois::tables;

/// Accumulate `bytes` into the running checksum `edc`
///
/// Bytes are processed from the last index to the first. Splitting a buffer
/// into chunks and threading the value from the last chunk to the first gives
/// the same result as one call over the whole buffer.
#[inline]
pub fn accumulate(edc: u32, bytes: &[u8]) -> u32 {
    let tables = tables();
    bytes.iter().rev().fold(edc, |edc, &byte| {
        (edc >> 8) ^ tables.edc((edc ^ byte as u32) as u8)
    })
}

/// Read a little-endian checksum stored at `offset`
#[inline]
pub fn stored_at(data: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

/// Write `edc` little-endian at `offset`
#[inline]
pub fn store_at(data: &mut [u8], offset: usize, edc: u32) {
    data[offset..offset + 4].copy_from_slice(&edc.to_le_bytes());
}
