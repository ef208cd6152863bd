// Copyright (c) 2025 RustyDB Contributors
//
// The page module: the fixed-size, NUMA-addressable unit of storage that
// everything else in this crate (registry, checksums, concurrency control)
// ultimately operates on.

pub mod header;
pub mod initializer;
pub mod pointer;
pub mod version;

pub use header::{PageHeader, PageType, PAGE_HEADER_SIZE};
pub use initializer::{NullInitializer, VolatilePageInitializer};
pub use pointer::{PagePointer, SnapshotPagePointer, VolatilePagePointer};
pub use version::{PageVersion, PageVersionWord};

use crate::error::{DbError, Result};
use crate::storage::checksum::hardware_crc32c;

/// Fixed page size, 4 KiB, matching typical OS page granularity.
pub const PAGE_SIZE: usize = 4096;

/// A fixed-size page: `PageHeader` at offset 0, followed by an opaque body.
///
/// `#[repr(C)]` with this field order guarantees the header occupies the
/// first [`PAGE_HEADER_SIZE`] bytes with no reordering; the body is the
/// remaining bytes, meaningful only to the storage kind that owns the page.
#[repr(C)]
pub struct Page {
    header: PageHeader,
    body: [u8; PAGE_SIZE - PAGE_HEADER_SIZE],
}

impl Page {
    /// A fresh, zeroed page. Callers must still call
    /// `header_mut().init_volatile` or `init_snapshot` before use.
    pub fn new() -> Self {
        Self {
            header: PageHeader::default(),
            body: [0u8; PAGE_SIZE - PAGE_HEADER_SIZE],
        }
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut PageHeader {
        &mut self.header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut [u8] {
        &mut self.body
    }

    /// Recompute this page's checksum over its body (bytes 32..4096) and
    /// stamp it into the header. Called once, at snapshot seal time; the
    /// header's own `checksum` field is never part of the range checksummed.
    pub fn seal_checksum(&mut self) {
        let sum = hardware_crc32c(&self.body);
        self.header.set_checksum(sum);
    }

    /// Verify a snapshot page's stored checksum against its current body.
    /// A no-op success for volatile pages, which are never persisted.
    pub fn verify_checksum(&self) -> Result<()> {
        if !self.header.is_snapshot() {
            return Ok(());
        }
        let expected = hardware_crc32c(&self.body);
        let actual = self.header.checksum();
        if expected != actual {
            return Err(DbError::PageChecksumMismatch(format!(
                "storage {} page: expected {:#010x}, found {:#010x}",
                self.header.storage_id(),
                expected,
                actual
            )));
        }
        Ok(())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
