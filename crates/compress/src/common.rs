use std::io::{self, Read, Write};

/// Writer adapter that counts the bytes passed through to `inner`.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    bytes: u64,
}

impl<W> CountingWriter<W> {
    /// Wraps `inner` with a zeroed counter.
    pub const fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    /// Bytes accepted by the inner writer so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Returns a reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consumes the adapter, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Sink that discards everything written to it.
///
/// Paired with [`CountingWriter`] it measures an output size without
/// buffering the output.
#[derive(Clone, Copy, Debug, Default)]
pub struct CountingSink;

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader adapter that counts the bytes pulled from `inner`.
///
/// Also records whether `inner` itself reported an error, so callers can
/// tell source failures from decoder failures further down the pipeline.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    bytes: u64,
    failed: bool,
}

impl<R> CountingReader<R> {
    /// Wraps `inner` with a zeroed counter.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            bytes: 0,
            failed: false,
        }
    }

    /// Bytes read from the inner reader so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Reports whether the inner reader returned an error.
    #[must_use]
    pub const fn source_failed(&self) -> bool {
        self.failed
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => {
                self.bytes = self.bytes.saturating_add(n as u64);
                Ok(n)
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    self.failed = true;
                }
                Err(e)
            }
        }
    }
}

/// Reads from `reader` until `buf` is full or the input ends.
///
/// Returns the number of bytes read; fewer than `buf.len()` means end of input.
pub fn fill_prefix<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
