use std::io::{BufRead, ErrorKind};

use crate::error::{DecodeError, Result};

/// Sequential, forward-only view over a compressed log.
///
/// The cursor wraps any buffered byte source and tracks how many bytes have
/// been consumed so far, which is what every error offset in this crate
/// refers to. Running out of bytes is only an error when a decoder asks for
/// more than remain in the middle of a record; at a record boundary it is
/// simply the end of the stream.
///
/// # Examples
///
/// ```
/// # use binary_log_decoder::ByteCursor;
/// let data = [0x01u8, 0x02, 0x03];
/// let mut cursor = ByteCursor::new(&data[..]);
///
/// assert_eq!(cursor.peek().unwrap(), Some(0x01));
/// assert_eq!(cursor.read_byte().unwrap(), 0x01);
/// assert_eq!(cursor.position(), 1);
/// ```
pub struct ByteCursor<'a> {
    inner: Box<dyn BufRead + 'a>,
    position: u64,
    // Reused for NUL-terminated strings; grows to the longest one seen.
    scratch: Vec<u8>,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the first byte of `inner`.
    pub fn new<R: BufRead + 'a>(inner: R) -> Self {
        Self {
            inner: Box::new(inner),
            position: 0,
            scratch: Vec::new(),
        }
    }

    /// Number of bytes consumed since the cursor was created.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the next byte without consuming it, or `None` at end of stream.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Whether the underlying source has no bytes left.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }

    /// Consumes the next byte if there is one.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.inner.consume(1);
            self.position += 1;
        }
        Ok(byte)
    }

    /// Consumes one byte that the current record requires.
    pub fn read_byte(&mut self) -> Result<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Fills `buf` completely from the stream.
    ///
    /// Fails with [`DecodeError::TruncatedRecord`] when the stream ends
    /// first; the bytes that were available are still consumed.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                return Err(DecodeError::TruncatedRecord {
                    offset: self.position,
                    needed: buf.len() - filled,
                });
            }

            let n = available.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&available[..n]);
            self.inner.consume(n);
            self.position += n as u64;
            filled += n;
        }
        Ok(())
    }

    /// Reads a fixed-size field.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads a NUL-terminated byte string and returns it without the NUL.
    ///
    /// The returned slice borrows the cursor's scratch buffer and is only
    /// valid until the next read.
    pub fn read_c_string(&mut self) -> Result<&[u8]> {
        self.scratch.clear();
        let n = self.inner.read_until(0, &mut self.scratch)?;
        self.position += n as u64;

        if self.scratch.last() != Some(&0) {
            return Err(DecodeError::TruncatedRecord {
                offset: self.position,
                needed: 1,
            });
        }
        self.scratch.pop();
        Ok(&self.scratch)
    }

    /// Consumes a run of zero bytes and returns how many were skipped.
    pub fn skip_zeros(&mut self) -> Result<u64> {
        let mut skipped = 0u64;
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let len = available.len();
            let run = available.iter().take_while(|&&b| b == 0).count();
            if run == 0 {
                return Ok(skipped);
            }

            self.inner.consume(run);
            self.position += run as u64;
            skipped += run as u64;
            if run < len {
                return Ok(skipped);
            }
        }
    }
}
