//! Core domain types for ECM encoding
//!
//! - **SectorType**: the four record types of the ECM format and their wire codes
//! - **Run**: a contiguous span of units sharing one type, waiting to be flushed
//! - **TypeTally**: per-type unit counts reported after an encode

use std::fmt;

/// Size of a raw sector including sync and header
pub const SECTOR_SIZE: usize = 2352;

/// Size of a Mode 2 sector without sync and header
pub const MODE2_SECTOR_SIZE: usize = 2336;

/// Classification of one unit of input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorType {
    /// Bytes that match no known layout, stored verbatim
    Literal,
    /// 2352-byte Mode 1 sector
    Mode1,
    /// 2336-byte Mode 2 Form 1 sector
    Mode2Form1,
    /// 2336-byte Mode 2 Form 2 sector
    Mode2Form2,
}

impl SectorType {
    pub const ALL: [SectorType; 4] = [
        SectorType::Literal,
        SectorType::Mode1,
        SectorType::Mode2Form1,
        SectorType::Mode2Form2,
    ];

    /// Two-bit code used in record headers
    pub fn code(self) -> u8 {
        match self {
            SectorType::Literal => 0,
            SectorType::Mode1 => 1,
            SectorType::Mode2Form1 => 2,
            SectorType::Mode2Form2 => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SectorType::Literal),
            1 => Some(SectorType::Mode1),
            2 => Some(SectorType::Mode2Form1),
            3 => Some(SectorType::Mode2Form2),
            _ => None,
        }
    }

    /// Input bytes consumed by one unit of this type
    pub fn unit_size(self) -> usize {
        match self {
            SectorType::Literal => 1,
            SectorType::Mode1 => SECTOR_SIZE,
            SectorType::Mode2Form1 | SectorType::Mode2Form2 => MODE2_SECTOR_SIZE,
        }
    }

    /// Output bytes stored for one unit of this type
    pub fn payload_size(self) -> usize {
        match self {
            SectorType::Literal => 1,
            SectorType::Mode1 => 0x003 + 0x800,
            SectorType::Mode2Form1 => 0x804,
            SectorType::Mode2Form2 => 0x918,
        }
    }
}

impl fmt::Display for SectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectorType::Literal => "literal",
            SectorType::Mode1 => "mode 1",
            SectorType::Mode2Form1 => "mode 2 form 1",
            SectorType::Mode2Form2 => "mode 2 form 2",
        };
        f.write_str(name)
    }
}

/// A run of same-typed units starting at `start` in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub sector_type: SectorType,
    pub start: u64,
    pub count: u64,
}

impl Run {
    pub fn new(sector_type: SectorType, start: u64) -> Self {
        Self {
            sector_type,
            start,
            count: 1,
        }
    }

    /// Number of source bytes the run covers
    pub fn byte_len(&self) -> u64 {
        self.count * self.sector_type.unit_size() as u64
    }

    /// Source offset just past the run
    pub fn end(&self) -> u64 {
        self.start + self.byte_len()
    }
}

/// Unit counts per sector type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTally([u64; 4]);

impl TypeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sector_type: SectorType, count: u64) {
        self.0[sector_type.code() as usize] += count;
    }

    pub fn get(&self, sector_type: SectorType) -> u64 {
        self.0[sector_type.code() as usize]
    }

    /// Source bytes accounted for by all tallied units
    pub fn total_bytes(&self) -> u64 {
        SectorType::ALL
            .iter()
            .map(|&t| self.get(t) * t.unit_size() as u64)
            .sum()
    }
}
