// Copyright (c) 2025 RustyDB Contributors
//
// Narrow traits standing in for the engine-level collaborators this crate's
// core calls out to but does not implement: the thread-local log buffer a
// storage creation appends a record to, and the buffer pool a page-fault
// path asks for a fresh volatile page. Both are black boxes per spec (§6);
// these traits are just enough surface for `StorageRegistry::create` and a
// page-fault resolution path to have something concrete to call.

use crate::page::pointer::VolatilePagePointer;

/// A thread-local log buffer. `reserve_new_log` carves out `length` bytes for
/// the caller to fill in place, mirroring the real WAL's append-in-place
/// reservation style rather than handing back an owned, copied buffer.
pub trait LogSink {
    fn reserve_new_log(&mut self, length: usize) -> &mut [u8];
}

/// A buffer pool's volatile page allocator, as seen from this crate: it only
/// needs to hand out a fresh, uniquely-owned page identity.
pub trait VolatilePageSource {
    fn allocate_volatile_page(&mut self) -> VolatilePagePointer;
}

/// An in-process [`LogSink`] that appends every reservation to an owned
/// buffer instead of a real WAL segment. Useful for tests and for embedders
/// that have not wired up write-ahead logging yet.
#[derive(Debug, Default)]
pub struct BufferingLogSink {
    buffer: Vec<u8>,
    reservations: usize,
}

impl BufferingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reservations(&self) -> usize {
        self.reservations
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl LogSink for BufferingLogSink {
    fn reserve_new_log(&mut self, length: usize) -> &mut [u8] {
        self.reservations += 1;
        let start = self.buffer.len();
        self.buffer.resize(start + length, 0);
        &mut self.buffer[start..]
    }
}

/// A [`VolatilePageSource`] that hands out sequential offsets on a single
/// fixed NUMA node. Useful for tests and single-node embedders; a real
/// multi-node buffer pool implements the trait directly.
pub struct SequentialPageSource {
    numa_node: u8,
    next_offset: u64,
}

impl SequentialPageSource {
    pub const fn new(numa_node: u8) -> Self {
        Self {
            numa_node,
            next_offset: 0,
        }
    }
}

impl VolatilePageSource for SequentialPageSource {
    fn allocate_volatile_page(&mut self) -> VolatilePagePointer {
        let offset = self.next_offset;
        self.next_offset += 1;
        VolatilePagePointer::new(self.numa_node, offset)
    }
}
