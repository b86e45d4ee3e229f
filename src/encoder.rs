//! Streaming ECM encoder
//!
//! The encoder walks the source with two cursors over one seekable handle:
//!
//! - the **analyze** cursor reads ahead into a fixed [`Window`] and classifies
//!   one unit at a time, growing the current [`Run`] while the type repeats;
//! - the **encode** cursor seeks back to the start of a finished run and
//!   re-reads it for emission (see [`record::flush_run`]).
//!
//! Both cursors are tracked explicitly and every read is preceded by a seek, so
//! neither disturbs the other. Memory use is the window size, independent of
//! the image size.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};

use log::{debug, info};

use crate::config::EncodeConfig;
use crate::counting_writer::CountingWriter;
use crate::domain::{Run, SectorType, TypeTally, MODE2_SECTOR_SIZE, SECTOR_SIZE};
use crate::error::{EcmError, Result};
use crate::record;
use crate::reporters::{EncodeReporter, ScanProgress};
use crate::sector;
use crate::window::Window;

/// Progress is reported each time a cursor enters a new MiB
const PROGRESS_SHIFT: u32 = 20;

/// Result of a finished encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStats {
    pub tally: TypeTally,
    pub input_len: u64,
    pub output_len: u64,
    /// Checksum over the whole source, as written in the trailer
    pub checksum: u32,
}

impl EncodeStats {
    /// Bytes saved, if the output is not larger than the input
    pub fn saved_bytes(&self) -> Option<u64> {
        self.input_len.checked_sub(self.output_len)
    }

    /// Saved bytes as a whole percentage of the input
    pub fn saved_percent(&self) -> u64 {
        match (self.saved_bytes(), self.input_len) {
            (Some(saved), len) if len > 0 => saved * 100 / len,
            _ => 0,
        }
    }
}

/// Reports progress only when a cursor crosses a MiB boundary
struct ProgressTracker<'a> {
    reporter: &'a dyn EncodeReporter,
    progress: ScanProgress,
}

impl<'a> ProgressTracker<'a> {
    fn new(reporter: &'a dyn EncodeReporter, total: u64) -> Self {
        Self {
            reporter,
            progress: ScanProgress {
                total,
                ..ScanProgress::default()
            },
        }
    }

    fn analyzed(&mut self, position: u64) {
        let crossed = position >> PROGRESS_SHIFT != self.progress.analyzed >> PROGRESS_SHIFT;
        self.progress.analyzed = position;
        if crossed {
            self.reporter.report_scan_progress(&self.progress);
        }
    }

    fn encoded(&mut self, position: u64) {
        let crossed = position >> PROGRESS_SHIFT != self.progress.encoded >> PROGRESS_SHIFT;
        self.progress.encoded = position;
        if crossed {
            self.reporter.report_scan_progress(&self.progress);
        }
    }
}

/// Streaming encoder state
pub struct Encoder<'a> {
    window: Window,
    reporter: &'a dyn EncodeReporter,
}

impl<'a> Encoder<'a> {
    pub fn new(reporter: &'a dyn EncodeReporter) -> Self {
        Self::with_window(Window::new(), reporter)
    }

    /// Use a caller-provided window, e.g. a smaller one in tests
    pub fn with_window(window: Window, reporter: &'a dyn EncodeReporter) -> Self {
        Self { window, reporter }
    }

    /// Encode `source` into `dest`
    ///
    /// Writes the magic, one record per run, the terminator and the checksum.
    /// `dest` is flushed before returning.
    pub fn encode<R, W>(mut self, source: &mut R, dest: W) -> Result<EncodeStats>
    where
        R: Read + Seek,
        W: Write,
    {
        let input_len = source
            .seek(SeekFrom::End(0))
            .map_err(|source| EcmError::SeekError { offset: 0, source })?;
        info!("encoding {} input bytes", input_len);

        let mut dest = CountingWriter::new(dest);
        let mut tracker = ProgressTracker::new(self.reporter, input_len);
        let mut tally = TypeTally::new();
        let mut checksum = 0u32;

        dest.write_all(&record::MAGIC).map_err(EcmError::WriteError)?;

        let mut read_pos = 0u64;
        let mut check_pos = 0u64;
        let mut current: Option<Run> = None;

        loop {
            let remaining = input_len - read_pos;
            if self.window.available() < SECTOR_SIZE && remaining > 0 {
                tracker.analyzed(read_pos);
                source
                    .seek(SeekFrom::Start(read_pos))
                    .map_err(|source| EcmError::SeekError {
                        offset: read_pos,
                        source,
                    })?;
                let length = self.window.refill_len(remaining);
                let added = self
                    .window
                    .refill(source, remaining)
                    .map_err(|source| EcmError::ReadError {
                        offset: read_pos,
                        length,
                        source,
                    })?;
                read_pos += added as u64;
            }

            let available = self.window.available();
            if available == 0 {
                break;
            }

            let detected = if available < MODE2_SECTOR_SIZE {
                SectorType::Literal
            } else {
                sector::classify(
                    self.window.context(),
                    self.window.data(),
                    available >= SECTOR_SIZE,
                )
            };

            match current.as_mut() {
                Some(run) if run.sector_type == detected => run.count += 1,
                _ => {
                    if let Some(run) = current.take() {
                        checksum = flush(
                            &run,
                            checksum,
                            source,
                            &mut dest,
                            &mut tally,
                            &mut tracker,
                        )?;
                    }
                    current = Some(Run::new(detected, check_pos));
                }
            }

            let unit = detected.unit_size();
            check_pos += unit as u64;
            self.window.consume(unit);
        }

        if let Some(run) = current.take() {
            checksum = flush(
                &run,
                checksum,
                source,
                &mut dest,
                &mut tally,
                &mut tracker,
            )?;
        }

        record::write_trailer(&mut dest, checksum).map_err(EcmError::WriteError)?;
        dest.flush().map_err(EcmError::WriteError)?;

        let stats = EncodeStats {
            tally,
            input_len,
            output_len: dest.bytes_written(),
            checksum,
        };
        info!(
            "encoded {} -> {} bytes, checksum {:08x}",
            stats.input_len, stats.output_len, stats.checksum
        );
        Ok(stats)
    }
}

fn flush<R, W>(
    run: &Run,
    checksum: u32,
    source: &mut R,
    dest: &mut W,
    tally: &mut TypeTally,
    tracker: &mut ProgressTracker<'_>,
) -> Result<u32>
where
    R: Read + Seek,
    W: Write,
{
    tally.add(run.sector_type, run.count);
    record::flush_run(checksum, run, source, dest, |position| tracker.encoded(position))
}

/// Encode the file named by `config.input` into `config.output`
pub fn encode_file(config: &EncodeConfig, reporter: &dyn EncodeReporter) -> Result<EncodeStats> {
    reporter.report_encode_start(&config.input, &config.output);

    let mut source = File::open(&config.input).map_err(|source| EcmError::FileOpenError {
        file: config.input.clone(),
        source,
    })?;
    let output = File::create(&config.output).map_err(|source| EcmError::FileCreateError {
        file: config.output.clone(),
        source,
    })?;
    debug!(
        "opened {} -> {}",
        config.input.display(),
        config.output.display()
    );

    let stats = Encoder::new(reporter).encode(&mut source, BufWriter::new(output))?;
    reporter.report_summary(&stats);
    reporter.report_complete("Done.");
    Ok(stats)
}
