//! CD-ROM P/Q parity (ECC) generation and verification
//!
//! Both codes are Reed-Solomon product codes over GF(2^8). They read the
//! sector from offset 0xC (address header onward) and store their parity at
//! 0x81C (P, 172 bytes) and 0x8C8 (Q, 104 bytes). The Q code also covers the
//! P parity, so P must be generated first.
//!
//! For Mode 2 Form 1 sectors the address header is not part of the parity;
//! [`AddressMode::Zeroed`] treats it as zero for the duration of the call.

use std::ops::{Deref, DerefMut};

use crate::galois::tables;

/// Offset of the region covered by both parity codes
pub const ECC_DATA_OFFSET: usize = 0x00C;
/// Offset of the P parity bytes
pub const ECC_P_OFFSET: usize = 0x81C;
/// Offset of the Q parity bytes
pub const ECC_Q_OFFSET: usize = 0x8C8;
/// End of the Q parity bytes (one full 2352-byte sector)
pub const ECC_END: usize = 0x930;

/// Address header covered by [`AddressMode::Zeroed`]
const ADDRESS_RANGE: std::ops::Range<usize> = 12..16;

/// Geometry of one interleaved parity code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParityCode {
    pub major_count: usize,
    pub minor_count: usize,
    pub major_mult: usize,
    pub minor_inc: usize,
}

/// P code: 86 columns of 24 bytes
pub const P_CODE: ParityCode = ParityCode {
    major_count: 86,
    minor_count: 24,
    major_mult: 2,
    minor_inc: 86,
};

/// Q code: 52 diagonals of 43 bytes
pub const Q_CODE: ParityCode = ParityCode {
    major_count: 52,
    minor_count: 43,
    major_mult: 86,
    minor_inc: 88,
};

/// Outcome of comparing computed parity with stored parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityCheck {
    Match,
    Mismatch,
}

impl ParityCheck {
    pub fn is_match(self) -> bool {
        self == ParityCheck::Match
    }
}

/// Where the computed parity goes
pub enum Parity<'a> {
    /// Compare against these bytes
    Verify(&'a [u8]),
    /// Overwrite these bytes
    Generate(&'a mut [u8]),
}

/// Whether the 4-byte address header takes part in the parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Included,
    Zeroed,
}

impl ParityCode {
    /// Number of source bytes the code covers
    pub const fn data_len(&self) -> usize {
        self.major_count * self.minor_count
    }

    /// Number of parity bytes the code produces
    pub const fn parity_len(&self) -> usize {
        self.major_count * 2
    }

    /// Parity pair for one major position
    fn pair(&self, src: &[u8], major: usize) -> (u8, u8) {
        let tables = tables();
        let size = self.data_len();
        let mut index = (major >> 1) * self.major_mult + (major & 1);
        let mut a = 0u8;
        let mut b = 0u8;

        for _ in 0..self.minor_count {
            let byte = src[index];
            index += self.minor_inc;
            if index >= size {
                index -= size;
            }
            a ^= byte;
            b ^= byte;
            a = tables.forward(a);
        }

        let p = tables.backward(tables.forward(a) ^ b);
        (p, p ^ b)
    }

    /// Run the code over `src`, either verifying or generating `parity`
    ///
    /// Verification stops at the first mismatching pair. Generation always
    /// returns [`ParityCheck::Match`].
    pub fn run(&self, src: &[u8], parity: Parity<'_>) -> ParityCheck {
        debug_assert!(src.len() >= self.data_len());

        match parity {
            Parity::Verify(stored) => {
                let all_match = (0..self.major_count).all(|major| {
                    let (p, q) = self.pair(src, major);
                    stored[major] == p && stored[major + self.major_count] == q
                });
                if all_match {
                    ParityCheck::Match
                } else {
                    ParityCheck::Mismatch
                }
            }
            Parity::Generate(dest) => {
                for major in 0..self.major_count {
                    let (p, q) = self.pair(src, major);
                    dest[major] = p;
                    dest[major + self.major_count] = q;
                }
                ParityCheck::Match
            }
        }
    }
}

/// Zeroes the address header while alive and restores it on drop
struct AddressGuard<'a> {
    sector: &'a mut [u8],
    saved: Option<[u8; 4]>,
}

impl<'a> AddressGuard<'a> {
    fn new(sector: &'a mut [u8], mode: AddressMode) -> Self {
        let saved = match mode {
            AddressMode::Included => None,
            AddressMode::Zeroed => {
                let mut saved = [0u8; 4];
                saved.copy_from_slice(&sector[ADDRESS_RANGE]);
                sector[ADDRESS_RANGE].fill(0);
                Some(saved)
            }
        };
        Self { sector, saved }
    }
}

impl Deref for AddressGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &*self.sector
    }
}

impl DerefMut for AddressGuard<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut *self.sector
    }
}

impl Drop for AddressGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved {
            self.sector[ADDRESS_RANGE].copy_from_slice(&saved);
        }
    }
}

/// Verify the P and Q parity stored in a 2352-byte sector
///
/// The sector is only mutated while the address header is zeroed; it is
/// restored before returning.
pub fn verify_sector(sector: &mut [u8], address: AddressMode) -> ParityCheck {
    let guard = AddressGuard::new(sector, address);
    let sector: &[u8] = &guard;

    let p = P_CODE.run(
        &sector[ECC_DATA_OFFSET..ECC_P_OFFSET],
        Parity::Verify(&sector[ECC_P_OFFSET..ECC_Q_OFFSET]),
    );
    if !p.is_match() {
        return ParityCheck::Mismatch;
    }

    Q_CODE.run(
        &sector[ECC_DATA_OFFSET..ECC_Q_OFFSET],
        Parity::Verify(&sector[ECC_Q_OFFSET..ECC_END]),
    )
}

/// Generate P and Q parity into a 2352-byte sector
pub fn generate_sector(sector: &mut [u8], address: AddressMode) {
    let mut guard = AddressGuard::new(sector, address);

    let (data, parity) = guard.split_at_mut(ECC_P_OFFSET);
    P_CODE.run(
        &data[ECC_DATA_OFFSET..],
        Parity::Generate(&mut parity[..ECC_Q_OFFSET - ECC_P_OFFSET]),
    );

    let (data, parity) = guard.split_at_mut(ECC_Q_OFFSET);
    Q_CODE.run(
        &data[ECC_DATA_OFFSET..],
        Parity::Generate(&mut parity[..ECC_END - ECC_Q_OFFSET]),
    );
}
