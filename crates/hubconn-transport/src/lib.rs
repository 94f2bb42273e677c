//! Duplex byte-stream transport abstraction for hub connections.
//!
//! A hub connection only needs three things from the wire underneath it:
//! blocking reads, writes, and a stable connection identifier. This crate
//! defines that contract ([`Transport`]) and ships adapters for the stream
//! types the standard library already provides:
//! - [`StreamTransport`] over any stream whose shared reference is `Read + Write`
//!   (Unix domain sockets, TCP)
//! - [`UnixDomainSocket`] for binding and accepting on a filesystem path

pub mod error;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::StreamTransport;
pub use traits::{Transport, TransportWriter};

#[cfg(unix)]
pub use uds::UnixDomainSocket;
