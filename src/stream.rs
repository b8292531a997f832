//! Byte-stream interface the shell is bound to.
//!
//! A [`Stream`] is the only view the shell has of its transport. Reading
//! blocks until at least one byte is available; a read returning `Ok(0)` (or
//! any read error) means the peer is gone and the session ends.
//!
//! # Examples
//!
//! ```rust
//! use xshell::stream::Stream;
//! use xshell::Error;
//!
//! struct Loopback {
//!     pending: heapless::Deque<u8, 64>,
//! }
//!
//! impl Stream for Loopback {
//!     fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
//!         match (buf.first_mut(), self.pending.pop_front()) {
//!             (Some(slot), Some(byte)) => {
//!                 *slot = byte;
//!                 Ok(1)
//!             }
//!             _ => Ok(0),
//!         }
//!     }
//!
//!     fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
//!         for &byte in buf {
//!             self.pending.push_back(byte).map_err(|_| Error::WriteError)?;
//!         }
//!         Ok(buf.len())
//!     }
//! }
//! ```

use core::fmt;

use crate::error::Error;

/// A bidirectional byte stream.
///
/// Implementations wrap a serial port, a virtual terminal, a socket or any
/// other transport. Each stream is bound to exactly one shell session, so
/// output from the editor and from command handlers is never interleaved
/// with another session.
pub trait Stream {
    /// Read up to `buf.len()` bytes, blocking until at least one byte is
    /// available.
    ///
    /// Returns the number of bytes read; `0` signals disconnection.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Write bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;

    /// Write a single byte.
    fn put(&mut self, byte: u8) -> Result<(), Error> {
        match self.write(&[byte])? {
            0 => Err(Error::WriteError),
            _ => Ok(()),
        }
    }

    /// Flush buffered output, if the transport buffers at all.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Write the whole buffer, retrying short writes.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<(), Error> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => return Err(Error::WriteError),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    /// Print text, dropping it if the transport fails.
    ///
    /// Shell output is best effort: a broken output path shows up as a
    /// failed read on the next input byte, which ends the session.
    fn print(&mut self, text: &str) {
        if let Err(err) = self.write_all(text.as_bytes()) {
            trace!("shell output dropped: {}", err);
        }
    }

    /// Print formatted text, see [`Stream::print`].
    fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        let mut printer = Printer::new(self);
        if fmt::Write::write_fmt(&mut printer, args).is_err() {
            trace!("shell output dropped: {}", Error::WriteError);
        }
    }
}

impl<S: Stream + ?Sized> Stream for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        (**self).write(buf)
    }

    fn put(&mut self, byte: u8) -> Result<(), Error> {
        (**self).put(byte)
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }
}

/// `core::fmt::Write` adapter over a [`Stream`].
///
/// This is what `write!` on a shell goes through; it lets command handlers
/// format numbers and strings without an intermediate buffer.
pub struct Printer<'a, S: Stream + ?Sized> {
    stream: &'a mut S,
}

impl<'a, S: Stream + ?Sized> Printer<'a, S> {
    /// Wrap a stream.
    pub fn new(stream: &'a mut S) -> Self {
        Self { stream }
    }
}

impl<S: Stream + ?Sized> fmt::Write for Printer<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.stream.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl<S: Stream + ?Sized> fmt::Debug for Printer<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Printer").finish_non_exhaustive()
    }
}

/// [`Stream`] over a pair of `std::io` halves.
///
/// Output is flushed after every write so that echoed characters reach a
/// line-buffered terminal immediately.
///
/// ```rust,no_run
/// use std::net::TcpListener;
/// use xshell::stream::IoStream;
///
/// let listener = TcpListener::bind("127.0.0.1:2323")?;
/// let (socket, _) = listener.accept()?;
/// let stream = IoStream::new(socket.try_clone()?, socket);
/// # Ok::<(), std::io::Error>(())
/// ```
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct IoStream<R, W> {
    reader: R,
    writer: W,
}

#[cfg(feature = "std")]
impl<R: std::io::Read, W: std::io::Write> IoStream<R, W> {
    /// Build a stream from a reader and a writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give the halves back.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read, W: std::io::Write> Stream for IoStream<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => return Err(Error::ReadError),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.writer.write_all(buf).map_err(|_| Error::WriteError)?;
        self.writer.flush().map_err(|_| Error::WriteError)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush().map_err(|_| Error::WriteError)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_io_stream_reads_until_eof() {
        let input: &[u8] = b"ab";
        let mut stream = IoStream::new(input, Vec::new());
        let mut buf = [0u8; 1];

        assert_eq!(stream.read(&mut buf), Ok(1));
        assert_eq!(buf[0], b'a');
        assert_eq!(stream.read(&mut buf), Ok(1));
        assert_eq!(buf[0], b'b');
        assert_eq!(stream.read(&mut buf), Ok(0));
    }

    #[test]
    fn test_print_fmt_formats_into_stream() {
        let input: &[u8] = b"";
        let mut stream = IoStream::new(input, Vec::new());

        stream.print("value: ");
        stream.print_fmt(format_args!("{}-{}", 4, "x"));
        stream.put(b'!').unwrap();

        let (_, written) = stream.into_inner();
        assert_eq!(written, b"value: 4-x!");
    }
}
