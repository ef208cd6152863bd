// Copyright (c) 2025 RustyDB Contributors
//
// PagePointer: a page's identity, encoded as a single tagged 64-bit value so
// it fits in PageHeader's `page_id` field and in any in-memory reference that
// needs to distinguish "page live in a NUMA-local pool" from "page sealed in
// a snapshot file" without carrying a second discriminant around.

use serde::{Deserialize, Serialize};

use crate::concurrent::tagged_ptr;

/// Number of low bits reserved for the NUMA node id in a volatile pointer.
const NUMA_NODE_BITS: u32 = 8;

/// Identifies a page resident in a NUMA-local volatile pool: which node it
/// lives on, and its offset within that node's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolatilePagePointer {
    numa_node: u8,
    offset: u64,
}

impl VolatilePagePointer {
    pub const fn new(numa_node: u8, offset: u64) -> Self {
        Self { numa_node, offset }
    }

    pub const fn numa_node(&self) -> u8 {
        self.numa_node
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Encode into the 64-bit form stored in `PageHeader::page_id`.
    pub const fn encode(&self) -> u64 {
        tagged_ptr::pack(self.offset, self.numa_node, NUMA_NODE_BITS)
    }

    pub const fn decode(word: u64) -> Self {
        Self {
            numa_node: tagged_ptr::unpack_tag(word, NUMA_NODE_BITS),
            offset: tagged_ptr::unpack_payload(word, NUMA_NODE_BITS),
        }
    }
}

/// Identifies a page sealed into a snapshot file. The id is opaque to this
/// crate; the snapshot subsystem (out of scope here) owns its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotPagePointer {
    id: u64,
}

impl SnapshotPagePointer {
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn encode(&self) -> u64 {
        self.id
    }

    pub const fn decode(word: u64) -> Self {
        Self { id: word }
    }
}

/// A page's identity, tagged by which of the two spaces it lives in.
///
/// `PageHeader` itself stores only the raw 64-bit word plus its `snapshot`
/// flag; this enum is the decoded, ergonomic view produced by
/// [`crate::page::header::PageHeader::page_pointer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagePointer {
    Volatile(VolatilePagePointer),
    Snapshot(SnapshotPagePointer),
}

impl PagePointer {
    pub const fn is_volatile(&self) -> bool {
        matches!(self, PagePointer::Volatile(_))
    }

    pub const fn is_snapshot(&self) -> bool {
        matches!(self, PagePointer::Snapshot(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volatile_pointer_roundtrips() {
        let ptr = VolatilePagePointer::new(5, 0xDEAD_BEEF);
        let decoded = VolatilePagePointer::decode(ptr.encode());
        assert_eq!(ptr, decoded);
    }

    #[test]
    fn volatile_pointer_boundaries() {
        let ptr = VolatilePagePointer::new(255, u64::MAX >> NUMA_NODE_BITS);
        assert_eq!(VolatilePagePointer::decode(ptr.encode()), ptr);

        let zero = VolatilePagePointer::new(0, 0);
        assert_eq!(VolatilePagePointer::decode(zero.encode()), zero);
    }

    #[test]
    fn snapshot_pointer_roundtrips() {
        let ptr = SnapshotPagePointer::new(0x1122_3344_5566_7788);
        assert_eq!(SnapshotPagePointer::decode(ptr.encode()), ptr);
    }

    #[test]
    fn page_pointer_tag_predicates() {
        let v = PagePointer::Volatile(VolatilePagePointer::new(1, 2));
        let s = PagePointer::Snapshot(SnapshotPagePointer::new(3));
        assert!(v.is_volatile());
        assert!(!v.is_snapshot());
        assert!(s.is_snapshot());
        assert!(!s.is_volatile());
    }
}
