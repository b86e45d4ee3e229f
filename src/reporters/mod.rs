//! Progress and output reporting for ECM encoding
//!
//! This module provides traits and implementations for reporting progress and
//! results of an encode. It keeps the pipeline decoupled from output formatting.

mod console;
mod silent;

pub use console::{format_byte_size, ConsoleEncodeReporter};
pub use silent::SilentEncodeReporter;

use std::path::Path;

use crate::encoder::EncodeStats;

/// Position of both source cursors during an encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanProgress {
    /// Bytes read ahead for classification
    pub analyzed: u64,
    /// Bytes re-read and emitted
    pub encoded: u64,
    /// Source length
    pub total: u64,
}

impl ScanProgress {
    /// Percentage of `value` relative to the source length, computed on
    /// 128-byte units so it never overflows
    pub fn percent(&self, value: u64) -> u64 {
        let done = (value + 64) / 128;
        let total = ((self.total + 64) / 128).max(1);
        (100 * done) / total
    }
}

/// Base trait for all reporters
pub trait Reporter {
    /// Report successful completion of an operation
    fn report_complete(&self, message: &str);
}

/// Trait for reporting encode progress and results
pub trait EncodeReporter: Reporter {
    /// Report the input and output paths before anything is read
    fn report_encode_start(&self, input: &Path, output: &Path);

    /// Report that a cursor crossed a 1 MiB boundary
    fn report_scan_progress(&self, progress: &ScanProgress);

    /// Report the per-type tally and size summary
    fn report_summary(&self, stats: &EncodeStats);
}
