use std::io::{self, Write};
use std::sync::Arc;

/// A connected duplex byte stream with a stable identity.
///
/// All methods take `&self`: one thread may sit in a blocking [`read`](Self::read)
/// while others write, the same way `&UnixStream` implements both `Read` and
/// `Write`. Implementations decide how (or whether) concurrent writes interleave.
pub trait Transport: Send + Sync {
    /// Read up to `buf.len()` bytes, blocking until at least one byte is
    /// available. `Ok(0)` means the peer closed the stream.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write some prefix of `buf`, returning how many bytes were accepted.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Flush any buffered outbound bytes.
    fn flush(&self) -> io::Result<()>;

    /// Identifier of the logical connection, stable for its lifetime.
    fn connection_id(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    fn connection_id(&self) -> &str {
        (**self).connection_id()
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    fn connection_id(&self) -> &str {
        (**self).connection_id()
    }
}

/// Borrowing [`Write`] adapter over a [`Transport`].
///
/// Codecs serialize against `std::io::Write`; this is how they reach the
/// transport without taking ownership of it.
pub struct TransportWriter<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> TransportWriter<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }
}

impl<T: Transport + ?Sized> Write for TransportWriter<'_, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.transport.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.transport.flush()
    }
}

impl<T: ?Sized> std::fmt::Debug for TransportWriter<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportWriter").finish_non_exhaustive()
    }
}
