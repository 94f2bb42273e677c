use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a hub connection. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    NotStarted = 0,
    Started = 1,
    Closed = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::NotStarted,
            1 => ConnectionState::Started,
            _ => ConnectionState::Closed,
        }
    }
}

/// Lock-free cell holding a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::NotStarted as u8))
    }

    pub(crate) fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// NotStarted -> Started. Returns whether this call made the transition.
    pub(crate) fn start(&self) -> bool {
        self.0
            .compare_exchange(
                ConnectionState::NotStarted as u8,
                ConnectionState::Started as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to Closed from any state, returning the state it replaced.
    pub(crate) fn close(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.swap(ConnectionState::Closed as u8, Ordering::AcqRel))
    }
}
