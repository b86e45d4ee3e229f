//! Console reporter for ECM encoding
//!
//! Writes progress and the final summary to stderr, keeping stdout free.

use std::path::Path;

use super::{EncodeReporter, Reporter, ScanProgress};
use crate::domain::SectorType;
use crate::encoder::EncodeStats;

const SIZE_UNITS: [&str; 6] = ["bytes", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a byte count with a binary prefix and two decimals
pub fn format_byte_size(size: u64) -> String {
    let mut shift = 0u32;
    let mut unit = 0usize;
    while (size >> shift) >= 1024 && unit < SIZE_UNITS.len() - 1 {
        shift += 10;
        unit += 1;
    }

    let whole = size >> shift;
    let rest = size - (whole << shift);
    let hundredths = (rest * 100) >> shift;
    format!("{}.{:02} {}", whole, hundredths, SIZE_UNITS[unit])
}

/// Console implementation for encode operations
#[derive(Default)]
pub struct ConsoleEncodeReporter;

impl ConsoleEncodeReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleEncodeReporter {
    fn report_complete(&self, message: &str) {
        eprintln!("{}", message);
    }
}

impl EncodeReporter for ConsoleEncodeReporter {
    fn report_encode_start(&self, input: &Path, output: &Path) {
        eprintln!("Encoding {} to {}.", input.display(), output.display());
    }

    fn report_scan_progress(&self, progress: &ScanProgress) {
        eprint!(
            "Analyzing ({:02}%) Encoding ({:02}%)\r",
            progress.percent(progress.analyzed),
            progress.percent(progress.encoded)
        );
    }

    fn report_summary(&self, stats: &EncodeStats) {
        eprintln!(
            "Literal bytes........... {:>10}",
            stats.tally.get(SectorType::Literal)
        );
        eprintln!(
            "Mode 1 sectors.......... {:>10}",
            stats.tally.get(SectorType::Mode1)
        );
        eprintln!(
            "Mode 2 form 1 sectors... {:>10}",
            stats.tally.get(SectorType::Mode2Form1)
        );
        eprintln!(
            "Mode 2 form 2 sectors... {:>10}",
            stats.tally.get(SectorType::Mode2Form2)
        );
        eprintln!(
            "Encoded {} -> {}",
            format_byte_size(stats.input_len),
            format_byte_size(stats.output_len)
        );
        if let Some(saved) = stats.saved_bytes() {
            eprintln!(
                "Stripped file is {} smaller ({}%)",
                format_byte_size(saved),
                stats.saved_percent()
            );
        }
    }
}
