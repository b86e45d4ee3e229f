//! End-to-end encoder tests: encode an image, decode it back, compare

mod common;

use std::cell::RefCell;
use std::io::Cursor;
use std::path::Path;

use common::{decode, random_bytes, sector, Record};
use ecmrs::edc::accumulate;
use ecmrs::reporters::{EncodeReporter, Reporter, ScanProgress, SilentEncodeReporter};
use ecmrs::window::Window;
use ecmrs::{encode_file, EcmError, EncodeConfig, EncodeStats, Encoder, SectorType};
use proptest::prelude::*;
use tempfile::TempDir;

fn encode_with(encoder: Encoder<'_>, image: &[u8]) -> (Vec<u8>, EncodeStats) {
    let mut out = Vec::new();
    let stats = encoder.encode(&mut Cursor::new(image), &mut out).unwrap();
    (out, stats)
}

fn encode(image: &[u8]) -> (Vec<u8>, EncodeStats) {
    let reporter = SilentEncodeReporter::new();
    encode_with(Encoder::new(&reporter), image)
}

/// 100 literal bytes, 3 Mode 1, 2 Form 1, 2 Form 2, then a 777-byte tail
fn mixed_image() -> (Vec<u8>, Vec<Vec<u8>>) {
    let mut pieces = vec![random_bytes(100, 1)];
    for seed in 0..3 {
        pieces.push(sector(SectorType::Mode1, 10 + seed));
    }
    for seed in 0..2 {
        pieces.push(sector(SectorType::Mode2Form1, 20 + seed));
    }
    for seed in 0..2 {
        pieces.push(sector(SectorType::Mode2Form2, 30 + seed));
    }
    pieces.push(random_bytes(777, 2));
    (pieces.concat(), pieces)
}

#[test]
fn test_mixed_image_round_trip() {
    let (image, pieces) = mixed_image();
    let (out, stats) = encode(&image);
    let decoded = decode(&out);

    assert_eq!(decoded.image, image);
    assert_eq!(
        decoded.records,
        vec![
            Record {
                sector_type: SectorType::Literal,
                count: 100,
            },
            Record {
                sector_type: SectorType::Mode1,
                count: 3,
            },
            Record {
                sector_type: SectorType::Mode2Form1,
                count: 2,
            },
            Record {
                sector_type: SectorType::Mode2Form2,
                count: 2,
            },
            Record {
                sector_type: SectorType::Literal,
                count: 777,
            },
        ]
    );

    // Each piece is flushed as one slice (none exceeds a raw sector)
    let expected = pieces.iter().fold(0, |edc, piece| accumulate(edc, piece));
    assert_eq!(decoded.checksum, expected);
    assert_eq!(stats.checksum, expected);

    assert_eq!(stats.tally.get(SectorType::Literal), 877);
    assert_eq!(stats.tally.get(SectorType::Mode1), 3);
    assert_eq!(stats.tally.get(SectorType::Mode2Form1), 2);
    assert_eq!(stats.tally.get(SectorType::Mode2Form2), 2);
    assert_eq!(stats.tally.total_bytes(), image.len() as u64);
    assert_eq!(stats.input_len, image.len() as u64);
    assert_eq!(stats.output_len, out.len() as u64);
    assert!(out.len() < image.len());
}

#[test]
fn test_sector_payloads_are_stripped() {
    let image = sector(SectorType::Mode1, 3);
    let (out, _) = encode(&image);
    // magic + 1-byte header + payload + terminator + checksum
    assert_eq!(out.len(), 4 + 1 + SectorType::Mode1.payload_size() + 5 + 4);
    assert_eq!(&out[5..5 + 3], &image[0x0C..0x0F]);
    assert_eq!(&out[8..8 + 0x800], &image[0x10..0x810]);
}

#[test]
fn test_damaged_sector_stays_literal() {
    let mut image = sector(SectorType::Mode1, 4);
    image[0x400] ^= 0x20;
    let (out, stats) = encode(&image);
    let decoded = decode(&out);

    assert_eq!(decoded.image, image);
    assert_eq!(stats.tally.get(SectorType::Mode1), 0);
    assert_eq!(stats.tally.get(SectorType::Literal), image.len() as u64);
}

#[test]
fn test_zero_image_encodes_as_form1() {
    // All-zero Mode 2 data has a zero checksum and zero parity
    let image = vec![0u8; 10 * 2336 + 5];
    let (out, stats) = encode(&image);
    let decoded = decode(&out);

    assert_eq!(decoded.image, image);
    assert_eq!(
        decoded.records,
        vec![
            Record {
                sector_type: SectorType::Mode2Form1,
                count: 10,
            },
            Record {
                sector_type: SectorType::Literal,
                count: 5,
            },
        ]
    );
    assert_eq!(stats.checksum, 0);
}

#[test]
fn test_small_window_matches_default() {
    let (image, _) = mixed_image();
    let mut image = image;
    image.extend_from_slice(&mixed_image().0);

    let reporter = SilentEncodeReporter::new();
    let (expected, _) = encode_with(Encoder::new(&reporter), &image);
    let (small, _) = encode_with(
        Encoder::with_window(Window::with_capacity(8192), &reporter),
        &image,
    );
    assert_eq!(small, expected);
}

#[derive(Default)]
struct RecordingReporter {
    progress: RefCell<Vec<ScanProgress>>,
    summaries: RefCell<usize>,
    completions: RefCell<Vec<String>>,
}

impl Reporter for RecordingReporter {
    fn report_complete(&self, message: &str) {
        self.completions.borrow_mut().push(message.to_string());
    }
}

impl EncodeReporter for RecordingReporter {
    fn report_encode_start(&self, _input: &Path, _output: &Path) {}

    fn report_scan_progress(&self, progress: &ScanProgress) {
        self.progress.borrow_mut().push(*progress);
    }

    fn report_summary(&self, _stats: &EncodeStats) {
        *self.summaries.borrow_mut() += 1;
    }
}

#[test]
fn test_progress_reported_on_mib_boundaries() {
    let image = vec![0u8; 3 << 20];
    let reporter = RecordingReporter::default();
    encode_with(Encoder::new(&reporter), &image);

    let progress = reporter.progress.borrow();
    let total = image.len() as u64;
    assert!(progress.iter().all(|p| p.total == total));
    assert!(progress.windows(2).all(|w| w[0].analyzed <= w[1].analyzed));
    assert!(progress.windows(2).all(|w| w[0].encoded <= w[1].encoded));
    // The encode cursor crosses every MiB mark up to the end
    for mib in 1..=3u64 {
        assert!(progress.iter().any(|p| p.encoded >> 20 == mib));
    }
    assert_eq!(progress.last().map(|p| p.encoded), Some(total));
    assert!(progress.iter().any(|p| p.analyzed >> 20 >= 2));
    assert!(progress.len() < 16);
}

#[test]
fn test_encode_file_default_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("disc.bin");
    let (image, _) = mixed_image();
    std::fs::write(&input, &image).unwrap();

    let config = EncodeConfig::new(&input, None, true);
    assert_eq!(config.output, dir.path().join("disc.bin.ecm"));

    let reporter = RecordingReporter::default();
    let stats = encode_file(&config, &reporter).unwrap();
    assert_eq!(*reporter.summaries.borrow(), 1);
    assert_eq!(*reporter.completions.borrow(), vec!["Done.".to_string()]);

    let out = std::fs::read(&config.output).unwrap();
    assert_eq!(stats.output_len, out.len() as u64);
    assert_eq!(decode(&out).image, image);
}

#[test]
fn test_encode_file_missing_input() {
    let dir = TempDir::new().unwrap();
    let config = EncodeConfig::new(dir.path().join("missing.bin"), None, true);
    let reporter = RecordingReporter::default();

    let err = encode_file(&config, &reporter).unwrap_err();
    assert!(matches!(err, EcmError::FileOpenError { .. }));
    assert!(!config.output.exists());
    assert_eq!(*reporter.summaries.borrow(), 0);
    assert!(reporter.completions.borrow().is_empty());
}

#[test]
fn test_encode_file_uncreatable_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("disc.bin");
    std::fs::write(&input, b"data").unwrap();
    let output = dir.path().join("no_such_dir").join("disc.ecm");

    let config = EncodeConfig::new(&input, Some(output), true);
    let reporter = SilentEncodeReporter::new();
    let err = encode_file(&config, &reporter).unwrap_err();
    assert!(matches!(err, EcmError::FileCreateError { .. }));
}

/// One piece of a generated image
#[derive(Debug, Clone)]
enum Piece {
    Literal(usize, u64),
    Sector(SectorType, u64),
}

fn piece_strategy() -> impl Strategy<Value = Piece> {
    prop_oneof![
        (1usize..600, any::<u64>()).prop_map(|(len, seed)| Piece::Literal(len, seed)),
        (1usize..4, any::<u64>())
            .prop_map(|(index, seed)| Piece::Sector(SectorType::ALL[index], seed)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: decoding the output reproduces the input exactly
    #[test]
    fn prop_encode_decode_identity(pieces in proptest::collection::vec(piece_strategy(), 0..6)) {
        let image: Vec<u8> = pieces
            .iter()
            .flat_map(|piece| match *piece {
                Piece::Literal(len, seed) => random_bytes(len, seed),
                Piece::Sector(t, seed) => sector(t, seed),
            })
            .collect();

        let (out, stats) = encode(&image);
        let decoded = decode(&out);
        prop_assert_eq!(&decoded.image, &image);
        prop_assert_eq!(decoded.checksum, stats.checksum);
        prop_assert_eq!(stats.tally.total_bytes(), image.len() as u64);
    }

    /// Property: input shorter than a Mode 2 sector is one literal record
    #[test]
    fn prop_short_input_is_single_literal(len in 1usize..2336, seed in any::<u64>()) {
        let image = random_bytes(len, seed);
        let (out, _) = encode(&image);
        let decoded = decode(&out);
        prop_assert_eq!(
            decoded.records,
            vec![Record {
                sector_type: SectorType::Literal,
                count: len as u64,
            }]
        );
        prop_assert_eq!(decoded.checksum, accumulate(0, &image));
    }
}
