// RustyDB core: latch-free page version control and storage metadata
//
// This crate carries the nucleus of RustyDB's NUMA-aware concurrency
// control: thread identity, epochs, the PageVersion latch-free protocol, the
// fixed PageHeader layout, and the storage registry that maps a storage id
// to its persistent metadata. Buffer pooling, the SQL engine, transaction
// management, replication and the rest of the wider system are external
// collaborators built on top of this core.

pub mod concurrent;
pub mod error;
pub mod page;
pub mod storage;
pub mod thread_id;
pub mod timeout;

pub use error::{DbError, Result};

/// Process-wide tuning knobs for the concurrency core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of NUMA groups the thread identity scheme should expect.
    pub numa_groups: u8,
    /// Default timeout, in microseconds, for page version lock acquisition
    /// when a caller doesn't specify one explicitly.
    pub default_lock_timeout_micros: crate::timeout::TimeoutMicros,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            numa_groups: 1,
            default_lock_timeout_micros: crate::timeout::TIMEOUT_INFINITE,
        }
    }
}
