use std::io::{self, Read, Write};
use std::time::Duration;

use crate::traits::Transport;

/// [`Transport`] over any stream whose shared reference is `Read + Write`.
///
/// `UnixStream` and `TcpStream` both qualify, so one `StreamTransport` can be
/// read on one thread while being written on another without cloning the
/// underlying descriptor.
pub struct StreamTransport<S> {
    stream: S,
    id: String,
}

impl<S> StreamTransport<S>
where
    for<'a> &'a S: Read + Write,
{
    /// Wrap a connected stream under an explicit connection id.
    pub fn new(stream: S, id: impl Into<String>) -> Self {
        Self {
            stream,
            id: id.into(),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consume the transport and return the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: Send + Sync,
    for<'a> &'a S: Read + Write,
{
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = &self.stream;
        stream.read(buf)
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut stream = &self.stream;
        stream.write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        let mut stream = &self.stream;
        stream.flush()
    }

    fn connection_id(&self) -> &str {
        &self.id
    }
}

#[cfg(unix)]
impl StreamTransport<std::os::unix::net::UnixStream> {
    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)
    }
}

impl StreamTransport<std::net::TcpStream> {
    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)
    }
}

impl<S> std::fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
