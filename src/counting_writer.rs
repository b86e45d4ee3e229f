//! CountingWriter - track output size while writing
//!
//! Wraps the encoder's destination so the final output size is known without
//! querying the file afterwards.

use std::io::{self, Write};

/// A writer that counts every byte written through it.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use ecmrs::counting_writer::CountingWriter;
///
/// let mut writer = CountingWriter::new(Vec::new());
/// writer.write_all(b"ECM\0")?;
/// writer.write_all(&[0xFC, 0xFF, 0xFF, 0xFF, 0x3F])?;
/// assert_eq!(writer.bytes_written(), 9);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Count only what the inner writer accepted
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_multiple_writes() {
        let mut data = Vec::new();
        let mut writer = CountingWriter::new(&mut data);
        writer.write_all(b"hello").unwrap();
        writer.write_all(b" ").unwrap();
        writer.write_all(b"world").unwrap();

        assert_eq!(writer.bytes_written(), 11);
        assert_eq!(data, b"hello world");
    }

    #[test]
    fn test_counts_partial_write() {
        struct PartialWriter;

        impl Write for PartialWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len().min(5))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = CountingWriter::new(PartialWriter);
        let n = writer.write(b"hello world").unwrap();
        assert_eq!(n, 5);
        assert_eq!(writer.bytes_written(), 5);
    }

    #[test]
    fn test_empty() {
        let writer = CountingWriter::new(Vec::new());
        assert_eq!(writer.bytes_written(), 0);
    }
}
