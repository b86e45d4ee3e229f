//! Sector layout detection and reconstruction
//!
//! A chunk of input is classified by checking, in a fixed order, whether its
//! sync pattern, subheader, EDC and ECC fields are exactly what the encoder
//! could regenerate from the user data alone. Only then is it safe to drop
//! those fields from the output.
//!
//! ## Layouts
//!
//! | Type | Unit | Checked fields |
//! |------|------|----------------|
//! | Mode 1 | 2352 | sync, mode byte, reserved zeros, EDC @0x810, P/Q @0x81C |
//! | Mode 2 Form 1 | 2336 | subheader copy, EDC @0x808, P/Q @0x80C |
//! | Mode 2 Form 2 | 2336 | subheader copy, EDC @0x91C |
//!
//! Mode 2 offsets are relative to the subheader, 16 bytes into the raw sector.

use std::ops::Range;

use crate::domain::{SectorType, MODE2_SECTOR_SIZE, SECTOR_SIZE};
use crate::ecc::{self, AddressMode};
use crate::edc;
use crate::error::{EcmError, Result};

/// Mode 1 sync pattern at the start of every raw data sector
pub const SYNC_PATTERN: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// Bytes of already-consumed input visible to the classifier
pub const CONTEXT_LEN: usize = 16;

/// Offset of the Mode 1 mode byte
const MODE_BYTE_OFFSET: usize = 0x00F;
/// Mode 1 reserved bytes that must be zero
const RESERVED: Range<usize> = 0x814..0x81C;

/// Stored checksum offsets, in the order the running checksum reaches them
const EDC_FORM1_OFFSET: usize = 0x808;
const EDC_MODE1_OFFSET: usize = 0x810;
const EDC_FORM2_OFFSET: usize = 0x91C;

/// Form 1 parity, relative to the subheader
const FORM1_PARITY_OFFSET: usize = 0x80C;

const LITERAL_PAYLOAD: &[Range<usize>] = &[0..1];
const MODE1_PAYLOAD: &[Range<usize>] = &[0x00C..0x00F, 0x010..0x810];
const FORM1_PAYLOAD: &[Range<usize>] = &[0x004..0x808];
const FORM2_PAYLOAD: &[Range<usize>] = &[0x004..0x91C];

/// Byte ranges of one unit that are written to the output
pub fn payload_ranges(sector_type: SectorType) -> &'static [Range<usize>] {
    match sector_type {
        SectorType::Literal => LITERAL_PAYLOAD,
        SectorType::Mode1 => MODE1_PAYLOAD,
        SectorType::Mode2Form1 => FORM1_PAYLOAD,
        SectorType::Mode2Form2 => FORM2_PAYLOAD,
    }
}

/// Running checksum after each of the three stored-checksum boundaries
///
/// One accumulator is threaded through [0, 0x808), [0x808, 0x810) and
/// [0x810, 0x91C) regardless of which layout is being checked; each layout
/// compares against the value reached at its own boundary.
pub fn checksum_stages(chunk: &[u8]) -> [u32; 3] {
    let form1 = edc::accumulate(0, &chunk[..EDC_FORM1_OFFSET]);
    let mode1 = edc::accumulate(form1, &chunk[EDC_FORM1_OFFSET..EDC_MODE1_OFFSET]);
    let form2 = edc::accumulate(mode1, &chunk[EDC_MODE1_OFFSET..EDC_FORM2_OFFSET]);
    [form1, mode1, form2]
}

/// Candidate layouts still alive during classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidates {
    pub mode1: bool,
    pub mode2_form1: bool,
    pub mode2_form2: bool,
}

impl Candidates {
    /// Pick the surviving layout with the highest priority
    pub fn resolve(self) -> SectorType {
        if self.mode1 {
            SectorType::Mode1
        } else if self.mode2_form1 {
            SectorType::Mode2Form1
        } else if self.mode2_form2 {
            SectorType::Mode2Form2
        } else {
            SectorType::Literal
        }
    }
}

fn has_mode1_framing(chunk: &[u8]) -> bool {
    chunk[..SYNC_PATTERN.len()] == SYNC_PATTERN
        && chunk[MODE_BYTE_OFFSET] == 0x01
        && chunk[RESERVED].iter().all(|&b| b == 0)
}

/// Classify the chunk at the front of `chunk`
///
/// `context` holds the input bytes immediately before the chunk; only its last
/// 16 bytes are used, and fewer are fine. `can_be_mode1` is false when less
/// than a full raw sector is available. Every failed check just rules a
/// layout out, so the worst case is [`SectorType::Literal`].
pub fn classify(context: &[u8], chunk: &[u8], can_be_mode1: bool) -> SectorType {
    if chunk.len() < MODE2_SECTOR_SIZE {
        return SectorType::Literal;
    }

    let mut candidates = Candidates {
        mode1: can_be_mode1 && chunk.len() >= SECTOR_SIZE,
        mode2_form1: true,
        mode2_form2: true,
    };

    if candidates.mode1 && !has_mode1_framing(chunk) {
        candidates.mode1 = false;
    }

    if chunk[0..4] != chunk[4..8] {
        candidates.mode2_form1 = false;
        candidates.mode2_form2 = false;
        if !candidates.mode1 {
            return SectorType::Literal;
        }
    }

    let [form1_edc, mode1_edc, form2_edc] = checksum_stages(chunk);
    if candidates.mode2_form1 && edc::stored_at(chunk, EDC_FORM1_OFFSET) != form1_edc {
        candidates.mode2_form1 = false;
    }
    if candidates.mode1 && edc::stored_at(chunk, EDC_MODE1_OFFSET) != mode1_edc {
        candidates.mode1 = false;
    }
    if candidates.mode2_form2 && edc::stored_at(chunk, EDC_FORM2_OFFSET) != form2_edc {
        candidates.mode2_form2 = false;
    }

    if candidates.mode1 {
        let mut sector = [0u8; SECTOR_SIZE];
        sector.copy_from_slice(&chunk[..SECTOR_SIZE]);
        candidates.mode1 = ecc::verify_sector(&mut sector, AddressMode::Included).is_match();
    }
    if candidates.mode2_form1 {
        let mut sector = mode2_as_raw_sector(context, &chunk[..MODE2_SECTOR_SIZE]);
        candidates.mode2_form1 = ecc::verify_sector(&mut sector, AddressMode::Zeroed).is_match();
    }

    candidates.resolve()
}

/// Place a Mode 2 sector behind its 16-byte sync/header prefix
///
/// The prefix is filled from the tail of `context`, right-aligned; missing
/// bytes stay zero.
fn mode2_as_raw_sector(context: &[u8], mode2: &[u8]) -> [u8; SECTOR_SIZE] {
    let context = &context[context.len().saturating_sub(CONTEXT_LEN)..];
    let mut sector = [0u8; SECTOR_SIZE];
    sector[CONTEXT_LEN - context.len()..CONTEXT_LEN].copy_from_slice(context);
    sector[CONTEXT_LEN..].copy_from_slice(mode2);
    sector
}

/// Extract the stored payload of one unit
pub fn extract_payload(sector_type: SectorType, unit: &[u8], out: &mut Vec<u8>) {
    for range in payload_ranges(sector_type) {
        out.extend_from_slice(&unit[range.clone()]);
    }
}

/// Rebuild the full unit from its stored payload
///
/// Literal payloads come back unchanged. For sector types the sync pattern,
/// mode byte, subheader copy, checksum and parity are regenerated.
pub fn rebuild(sector_type: SectorType, payload: &[u8]) -> Result<Vec<u8>> {
    if sector_type == SectorType::Literal {
        return Ok(payload.to_vec());
    }

    let expected = sector_type.payload_size();
    if payload.len() != expected {
        return Err(EcmError::PayloadLength {
            sector_type,
            expected,
            actual: payload.len(),
        });
    }

    let mut unit = vec![0u8; sector_type.unit_size()];
    let mut remaining = payload;
    for range in payload_ranges(sector_type) {
        let (head, tail) = remaining.split_at(range.len());
        unit[range.clone()].copy_from_slice(head);
        remaining = tail;
    }

    match sector_type {
        SectorType::Mode1 => {
            unit[..SYNC_PATTERN.len()].copy_from_slice(&SYNC_PATTERN);
            unit[MODE_BYTE_OFFSET] = 0x01;
            let [_, mode1_edc, _] = checksum_stages(&unit);
            edc::store_at(&mut unit, EDC_MODE1_OFFSET, mode1_edc);
            ecc::generate_sector(&mut unit, AddressMode::Included);
        }
        SectorType::Mode2Form1 => {
            unit.copy_within(4..8, 0);
            let [form1_edc, _, _] = checksum_stages(&unit);
            edc::store_at(&mut unit, EDC_FORM1_OFFSET, form1_edc);
            let mut sector = mode2_as_raw_sector(&[], &unit);
            ecc::generate_sector(&mut sector, AddressMode::Zeroed);
            unit[FORM1_PARITY_OFFSET..]
                .copy_from_slice(&sector[CONTEXT_LEN + FORM1_PARITY_OFFSET..]);
        }
        SectorType::Mode2Form2 => {
            unit.copy_within(4..8, 0);
            let [_, _, form2_edc] = checksum_stages(&unit);
            edc::store_at(&mut unit, EDC_FORM2_OFFSET, form2_edc);
        }
        SectorType::Literal => unreachable!(),
    }

    Ok(unit)
}
