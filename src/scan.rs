//! Record scanning with a bounded line buffer.

use std::io::{BufRead, BufReader, Read};

use crate::error::{QcdError, Result};

/// Maximum record length: 1 MiB.
pub const MAX_RECORD_LENGTH: usize = 1 << 20;

/// A line scanner over any byte stream.
///
/// Yields records without their delimiter: lines end at `\n` and a single
/// trailing `\r` is stripped, so CRLF input hashes like LF input. A final
/// line without a trailing newline is still a record. A record longer than
/// [`MAX_RECORD_LENGTH`] aborts the scan with
/// [`QcdError::OversizedRecord`].
pub struct LineScanner<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    line: u64,
}

impl<R: Read> LineScanner<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(64 * 1024, reader),
            buf: Vec::new(),
            line: 0,
        }
    }

    /// 1-based number of the most recently returned record.
    #[must_use]
    pub const fn line(&self) -> u64 {
        self.line
    }

    /// The next record, or `None` at end of stream.
    ///
    /// The returned slice is only valid until the next call.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying reader and rejects
    /// oversized records.
    pub fn next_record(&mut self) -> Result<Option<&[u8]>> {
        self.buf.clear();
        loop {
            let (complete, used) = {
                let chunk = self.inner.fill_buf()?;
                if chunk.is_empty() {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    (true, 0)
                } else if let Some(pos) = chunk.iter().position(|&b| b == b'\n') {
                    self.buf.extend_from_slice(&chunk[..pos]);
                    (true, pos + 1)
                } else {
                    self.buf.extend_from_slice(chunk);
                    (false, chunk.len())
                }
            };
            self.inner.consume(used);
            if self.buf.len() > MAX_RECORD_LENGTH {
                return Err(QcdError::OversizedRecord {
                    line: self.line + 1,
                    limit: MAX_RECORD_LENGTH,
                });
            }
            if complete {
                self.line += 1;
                let mut record = self.buf.as_slice();
                if record.last() == Some(&b'\r') {
                    record = &record[..record.len() - 1];
                }
                return Ok(Some(record));
            }
        }
    }
}
