//! Shared helpers for building sector images and reading ECM output back

#![allow(dead_code)]

use std::io::{Cursor, Read};

use ecmrs::record::{read_header, MAGIC};
use ecmrs::sector::rebuild;
use ecmrs::SectorType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// A valid sector of `sector_type` built from seeded random user data
pub fn sector(sector_type: SectorType, seed: u64) -> Vec<u8> {
    rebuild(sector_type, &random_bytes(sector_type.payload_size(), seed)).unwrap()
}

/// One parsed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub sector_type: SectorType,
    pub count: u64,
}

/// Decoded ECM stream: records, reconstructed image and trailer checksum
pub struct Decoded {
    pub records: Vec<Record>,
    pub image: Vec<u8>,
    pub checksum: u32,
}

/// Reverse an encoded stream, rebuilding every unit from its payload
pub fn decode(ecm: &[u8]) -> Decoded {
    let mut cursor = Cursor::new(ecm);
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).unwrap();
    assert_eq!(magic, MAGIC);

    let mut records = Vec::new();
    let mut image = Vec::new();

    while let Some(header) = read_header(&mut cursor).unwrap() {
        records.push(Record {
            sector_type: header.sector_type,
            count: header.count,
        });

        if header.sector_type == SectorType::Literal {
            let mut bytes = vec![0u8; header.count as usize];
            cursor.read_exact(&mut bytes).unwrap();
            image.extend_from_slice(&bytes);
            continue;
        }

        for _ in 0..header.count {
            let mut payload = vec![0u8; header.sector_type.payload_size()];
            cursor.read_exact(&mut payload).unwrap();
            image.extend_from_slice(&rebuild(header.sector_type, &payload).unwrap());
        }
    }

    let mut trailer = [0u8; 4];
    cursor.read_exact(&mut trailer).unwrap();
    assert_eq!(cursor.position() as usize, ecm.len(), "bytes after trailer");

    Decoded {
        records,
        image,
        checksum: u32::from_le_bytes(trailer),
    }
}
