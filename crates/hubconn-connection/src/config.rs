/// Size of each transport read while assembling a message.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for a hub connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Bytes requested per transport read. Default: 4 KiB. Zero is treated as one.
    pub read_chunk_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
