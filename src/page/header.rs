// Copyright (c) 2025 RustyDB Contributors
//
// PageHeader: the fixed 32-byte prefix embedded at offset 0 of every page,
// shared by every storage kind. Field order matters: it is chosen so that
// natural alignment under `#[repr(C)]` produces exactly 32 bytes with no
// padding (verified by a unit test below), matching the on-disk layout in
// the external interface contract.

use crate::error::{DbError, Result};
use crate::page::pointer::{PagePointer, SnapshotPagePointer, VolatilePagePointer};
use crate::page::version::PageVersion;

/// On-disk-stable storage type tag. Numeric values must never be renumbered;
/// they survive across snapshot files written by old binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PageType {
    Unknown = 0,
    Array = 1,
    MasstreeIntermediate = 2,
    MasstreeBorder = 3,
    Sequential = 4,
    SequentialRoot = 5,
    HashRoot = 6,
    HashBin = 7,
    HashData = 8,
}

impl PageType {
    /// Decode a raw tag byte. Any value outside the known range decodes to
    /// `Unknown` rather than panicking — a page fault is the caller's job.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            1 => PageType::Array,
            2 => PageType::MasstreeIntermediate,
            3 => PageType::MasstreeBorder,
            4 => PageType::Sequential,
            5 => PageType::SequentialRoot,
            6 => PageType::HashRoot,
            7 => PageType::HashBin,
            8 => PageType::HashData,
            _ => PageType::Unknown,
        }
    }

    pub const fn tag(self) -> u8 {
        self as u8
    }
}

#[repr(C)]
pub struct PageHeader {
    /// Interpreted as a volatile or snapshot pointer depending on `snapshot`.
    page_id: u64,
    storage_id: u32,
    /// Meaningful only for snapshot pages; recomputed at snapshot seal.
    checksum: u32,
    page_type: u8,
    snapshot: bool,
    root: bool,
    /// Non-transactional hint: NUMA group of the thread that last wrote this page.
    stat_latest_modifier: u8,
    /// Non-transactional hint: epoch of the last write.
    stat_latest_modify_epoch: u32,
    pub page_version: PageVersion,
}

impl PageHeader {
    /// Zero every field and mark this page volatile.
    ///
    /// Precondition: caller exclusively owns the memory (fresh allocation or
    /// a page returned to the pool and about to be reused).
    pub fn init_volatile(
        &mut self,
        page_id: VolatilePagePointer,
        storage_id: u32,
        page_type: PageType,
        root: bool,
        layer: u8,
    ) {
        self.page_id = page_id.encode();
        self.storage_id = storage_id;
        self.checksum = 0;
        self.page_type = page_type.tag();
        self.snapshot = false;
        self.root = root;
        self.stat_latest_modifier = 0;
        self.stat_latest_modify_epoch = 0;
        self.page_version = PageVersion::new_initialized(
            false,
            false,
            page_type == PageType::MasstreeBorder,
            false,
            layer,
        );
    }

    /// As [`Self::init_volatile`], but for a snapshot (on-disk, immutable) page.
    pub fn init_snapshot(
        &mut self,
        page_id: SnapshotPagePointer,
        storage_id: u32,
        page_type: PageType,
        root: bool,
        layer: u8,
    ) {
        self.page_id = page_id.encode();
        self.storage_id = storage_id;
        self.checksum = 0;
        self.page_type = page_type.tag();
        self.snapshot = true;
        self.root = root;
        self.stat_latest_modifier = 0;
        self.stat_latest_modify_epoch = 0;
        self.page_version = PageVersion::new_initialized(
            false,
            false,
            page_type == PageType::MasstreeBorder,
            false,
            layer,
        );
    }

    pub fn page_type(&self) -> PageType {
        PageType::from_tag(self.page_type)
    }

    /// Confirm this header's tag matches `expected`, the way a reader must
    /// before trusting a page's body layout. `Unknown` never matches
    /// anything, including itself — it means "not yet initialized or
    /// corrupt", not "a storage kind named Unknown".
    pub fn ensure_type(&self, expected: PageType) -> Result<()> {
        let actual = self.page_type();
        if actual != expected || actual == PageType::Unknown {
            return Err(DbError::PageTypeMismatch(format!(
                "expected page type {:?}, found {:?}",
                expected, actual
            )));
        }
        Ok(())
    }

    pub fn storage_id(&self) -> u32 {
        self.storage_id
    }

    pub fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn set_checksum(&mut self, checksum: u32) {
        self.checksum = checksum;
    }

    pub fn stat_latest_modifier(&self) -> u8 {
        self.stat_latest_modifier
    }

    pub fn stat_latest_modify_epoch(&self) -> u32 {
        self.stat_latest_modify_epoch
    }

    pub fn set_stat_latest_modifier(&mut self, group: u8, epoch: u32) {
        self.stat_latest_modifier = group;
        self.stat_latest_modify_epoch = epoch;
    }

    /// Decode `page_id` according to `snapshot`.
    pub fn page_pointer(&self) -> PagePointer {
        if self.snapshot {
            PagePointer::Snapshot(SnapshotPagePointer::decode(self.page_id))
        } else {
            PagePointer::Volatile(VolatilePagePointer::decode(self.page_id))
        }
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self {
            page_id: 0,
            storage_id: 0,
            checksum: 0,
            page_type: PageType::Unknown.tag(),
            snapshot: false,
            root: false,
            stat_latest_modifier: 0,
            stat_latest_modify_epoch: 0,
            page_version: PageVersion::new_initialized(false, false, false, false, 0),
        }
    }
}

/// Size of [`PageHeader`] in bytes; must stay exactly 32 to match the
/// on-disk contract.
pub const PAGE_HEADER_SIZE: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_exactly_32_bytes() {
        assert_eq!(std::mem::size_of::<PageHeader>(), PAGE_HEADER_SIZE);
    }

    #[test]
    fn page_type_tag_stability() {
        assert_eq!(PageType::Unknown.tag(), 0);
        assert_eq!(PageType::Array.tag(), 1);
        assert_eq!(PageType::MasstreeIntermediate.tag(), 2);
        assert_eq!(PageType::MasstreeBorder.tag(), 3);
        assert_eq!(PageType::Sequential.tag(), 4);
        assert_eq!(PageType::SequentialRoot.tag(), 5);
        assert_eq!(PageType::HashRoot.tag(), 6);
        assert_eq!(PageType::HashBin.tag(), 7);
        assert_eq!(PageType::HashData.tag(), 8);
    }

    #[test]
    fn unknown_tag_decodes_out_of_range_values() {
        assert_eq!(PageType::from_tag(200), PageType::Unknown);
        assert_eq!(PageType::from_tag(0), PageType::Unknown);
    }

    #[test]
    fn init_volatile_zeroes_header_and_version() {
        let mut header = PageHeader::default();
        header.init_volatile(
            VolatilePagePointer::new(1, 0x1234),
            7,
            PageType::Array,
            true,
            0,
        );

        assert_eq!(header.storage_id(), 7);
        assert_eq!(header.page_type(), PageType::Array);
        assert!(!header.is_snapshot());
        assert!(header.is_root());
        assert_eq!(header.checksum(), 0);

        let v = header.page_version.stable_version();
        assert!(!v.locked());
        assert_eq!(v.insertion_counter(), 0);
        assert_eq!(v.split_counter(), 0);
        assert_eq!(v.key_count(), 0);
    }

    #[test]
    fn ensure_type_accepts_a_match_and_rejects_a_mismatch() {
        let mut header = PageHeader::default();
        header.init_volatile(VolatilePagePointer::new(0, 1), 1, PageType::Array, false, 0);
        assert!(header.ensure_type(PageType::Array).is_ok());
        assert!(matches!(
            header.ensure_type(PageType::Sequential),
            Err(DbError::PageTypeMismatch(_))
        ));
    }

    #[test]
    fn ensure_type_rejects_unknown_even_against_itself() {
        let header = PageHeader::default();
        assert!(matches!(
            header.ensure_type(PageType::Unknown),
            Err(DbError::PageTypeMismatch(_))
        ));
    }

    #[test]
    fn init_snapshot_sets_snapshot_flag() {
        let mut header = PageHeader::default();
        header.init_snapshot(SnapshotPagePointer::new(99), 3, PageType::HashRoot, false, 0);
        assert!(header.is_snapshot());
        assert!(!header.is_root());
        assert_eq!(header.page_type(), PageType::HashRoot);
    }
}
