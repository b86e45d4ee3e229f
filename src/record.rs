//! ECM record stream: headers and run payloads
//!
//! ```text
//! "ECM\0" { header payload }* terminator checksum[4, little-endian]
//! ```
//!
//! A header packs the type code and `count - 1` into a little-endian base-128
//! varint whose first byte only carries 5 count bits:
//!
//! ```text
//! byte 0:  C nnnnn tt     C = more bytes follow, n = low 5 bits, t = type
//! byte k:  C nnnnnnn      next 7 bits
//! ```
//!
//! The terminator stores `count - 1` as 0xFFFFFFFF.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::debug;
use smallvec::SmallVec;

use crate::domain::{Run, SectorType, SECTOR_SIZE};
use crate::edc;
use crate::error::{EcmError, Result};
use crate::sector;

/// File magic
pub const MAGIC: [u8; 4] = *b"ECM\0";

/// `count - 1` value written by the terminator header
const TERMINATOR_VALUE: u64 = 0xFFFF_FFFF;

/// Largest encoded header: 5 bits + 9 × 7 bits covers 64 bits
pub type EncodedHeader = SmallVec<[u8; 10]>;

/// A decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub sector_type: SectorType,
    pub count: u64,
}

/// Encode a type/count header; `count == 0` produces the terminator
pub fn encode_header(sector_type: SectorType, count: u64) -> EncodedHeader {
    let mut value = match count {
        0 => TERMINATOR_VALUE,
        n => n - 1,
    };
    let mut bytes = EncodedHeader::new();

    let more = if value >= 32 { 0x80 } else { 0 };
    bytes.push(more | (((value & 0x1F) as u8) << 2) | sector_type.code());
    value >>= 5;

    while value != 0 {
        let more = if value >= 128 { 0x80 } else { 0 };
        bytes.push(more | (value & 0x7F) as u8);
        value >>= 7;
    }

    bytes
}

/// Write a type/count header
pub fn write_header<W: Write>(out: &mut W, sector_type: SectorType, count: u64) -> io::Result<()> {
    out.write_all(&encode_header(sector_type, count))
}

/// Read one header; `None` marks the terminator
pub fn read_header<R: Read>(input: &mut R) -> io::Result<Option<Header>> {
    let mut byte = [0u8; 1];
    input.read_exact(&mut byte)?;

    let sector_type = SectorType::from_code(byte[0] & 0x03).unwrap_or(SectorType::Literal);
    let mut value = u64::from((byte[0] >> 2) & 0x1F);
    let mut shift = 5;

    while byte[0] & 0x80 != 0 {
        if shift >= 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "record header longer than 64 bits",
            ));
        }
        input.read_exact(&mut byte)?;
        value |= u64::from(byte[0] & 0x7F) << shift;
        shift += 7;
    }

    if value == TERMINATOR_VALUE {
        Ok(None)
    } else {
        Ok(Some(Header {
            sector_type,
            count: value + 1,
        }))
    }
}

/// Emit one run: header plus the payload of every unit
///
/// The run's bytes are re-read from `source` starting at `run.start`, not taken
/// from the classification window. The whole-file checksum is updated over
/// every unit in full, including the bytes that are not written, and returned.
/// `on_progress` receives the source offset after each unit or literal chunk.
pub fn flush_run<R, W, F>(
    edc: u32,
    run: &Run,
    source: &mut R,
    dest: &mut W,
    mut on_progress: F,
) -> Result<u32>
where
    R: Read + Seek,
    W: Write,
    F: FnMut(u64),
{
    debug!(
        "flushing {} run: {} units, source bytes {}..{}",
        run.sector_type,
        run.count,
        run.start,
        run.end()
    );

    write_header(dest, run.sector_type, run.count).map_err(EcmError::WriteError)?;
    source
        .seek(SeekFrom::Start(run.start))
        .map_err(|source| EcmError::SeekError {
            offset: run.start,
            source,
        })?;

    let mut edc = edc;
    let mut buf = [0u8; SECTOR_SIZE];
    let mut position = run.start;

    if run.sector_type == SectorType::Literal {
        let mut remaining = run.count;
        while remaining > 0 {
            let len = remaining.min(SECTOR_SIZE as u64) as usize;
            read_unit(source, &mut buf[..len], position)?;
            edc = edc::accumulate(edc, &buf[..len]);
            dest.write_all(&buf[..len]).map_err(EcmError::WriteError)?;
            remaining -= len as u64;
            position += len as u64;
            on_progress(position);
        }
        return Ok(edc);
    }

    let unit_size = run.sector_type.unit_size();
    let ranges = sector::payload_ranges(run.sector_type);
    for _ in 0..run.count {
        read_unit(source, &mut buf[..unit_size], position)?;
        edc = edc::accumulate(edc, &buf[..unit_size]);
        for range in ranges {
            dest.write_all(&buf[range.clone()])
                .map_err(EcmError::WriteError)?;
        }
        position += unit_size as u64;
        on_progress(position);
    }

    Ok(edc)
}

fn read_unit<R: Read>(source: &mut R, buf: &mut [u8], offset: u64) -> Result<()> {
    source
        .read_exact(buf)
        .map_err(|source| EcmError::ReadError {
            offset,
            length: buf.len(),
            source,
        })
}

/// Write the terminator header and the final checksum
pub fn write_trailer<W: Write>(out: &mut W, edc: u32) -> io::Result<()> {
    write_header(out, SectorType::Literal, 0)?;
    out.write_all(&edc.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_single_byte_headers() {
        assert_eq!(encode_header(SectorType::Literal, 1).as_slice(), &[0x00]);
        assert_eq!(encode_header(SectorType::Mode1, 1).as_slice(), &[0x01]);
        assert_eq!(encode_header(SectorType::Mode2Form2, 32).as_slice(), &[0x7F]);
    }

    #[test]
    fn test_continuation_headers() {
        // count 33 -> value 32: low five bits zero, one more byte carrying 1
        assert_eq!(
            encode_header(SectorType::Mode2Form1, 33).as_slice(),
            &[0x82, 0x01]
        );
        // count 4128 -> value 4127 = 0b1_0000000_11111
        assert_eq!(
            encode_header(SectorType::Literal, 4128).as_slice(),
            &[0xFC, 0x80, 0x01]
        );
    }

    #[test]
    fn test_terminator_bytes() {
        assert_eq!(
            encode_header(SectorType::Literal, 0).as_slice(),
            &[0xFC, 0xFF, 0xFF, 0xFF, 0x3F]
        );
        let mut cursor = Cursor::new(vec![0xFC, 0xFF, 0xFF, 0xFF, 0x3F]);
        assert_eq!(read_header(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_read_header_round_trip() {
        for count in [1u64, 31, 32, 33, 4127, 4128, 1 << 40] {
            for t in SectorType::ALL {
                let bytes = encode_header(t, count);
                let decoded = read_header(&mut Cursor::new(bytes.to_vec())).unwrap();
                assert_eq!(
                    decoded,
                    Some(Header {
                        sector_type: t,
                        count
                    })
                );
            }
        }
    }

    #[test]
    fn test_read_header_truncated() {
        let mut cursor = Cursor::new(vec![0x80]);
        let err = read_header(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_flush_literal_run_copies_bytes_and_checksum() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 253) as u8).collect();
        let mut source = Cursor::new(data.clone());
        let mut out = Vec::new();
        let run = Run {
            sector_type: SectorType::Literal,
            start: 100,
            count: 4000,
        };

        let mut positions = Vec::new();
        let edc = flush_run(0, &run, &mut source, &mut out, |p| positions.push(p)).unwrap();

        let header = encode_header(SectorType::Literal, 4000);
        assert_eq!(&out[..header.len()], header.as_slice());
        assert_eq!(&out[header.len()..], &data[100..4100]);
        assert_eq!(positions, vec![100 + 2352, 4100]);

        let expected = edc::accumulate(
            edc::accumulate(0, &data[100..100 + 2352]),
            &data[100 + 2352..4100],
        );
        assert_eq!(edc, expected);
    }

    #[test]
    fn test_flush_fails_on_short_source() {
        let mut source = Cursor::new(vec![0u8; 100]);
        let run = Run {
            sector_type: SectorType::Mode2Form2,
            start: 0,
            count: 1,
        };
        let result = flush_run(0, &run, &mut source, &mut Vec::new(), |_| {});
        assert!(matches!(result, Err(EcmError::ReadError { offset: 0, .. })));
    }
}
