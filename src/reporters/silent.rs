//! Silent reporter for ECM encoding
//!
//! Provides a no-output implementation for tests and quiet operation.

use std::path::Path;

use super::{EncodeReporter, Reporter, ScanProgress};
use crate::encoder::EncodeStats;

/// Silent implementation for encode operations
#[derive(Default)]
pub struct SilentEncodeReporter;

impl SilentEncodeReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for SilentEncodeReporter {
    fn report_complete(&self, _message: &str) {}
}

impl EncodeReporter for SilentEncodeReporter {
    fn report_encode_start(&self, _input: &Path, _output: &Path) {}
    fn report_scan_progress(&self, _progress: &ScanProgress) {}
    fn report_summary(&self, _stats: &EncodeStats) {}
}
