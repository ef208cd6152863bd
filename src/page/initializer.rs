// Copyright (c) 2025 RustyDB Contributors
//
// VolatilePageInitializer: a capability-set strategy for producing a freshly
// allocated volatile page, keyed by storage kind. Composition over
// inheritance: each storage type supplies its own initializer rather than a
// page subclass hierarchy.

use crate::page::header::PageType;
use crate::page::pointer::VolatilePagePointer;
use crate::page::Page;
use crate::storage::metadata::StorageId;

/// One-shot strategy for bringing a freshly allocated page to life:
/// zero it, stamp the common header, then run a type-specific hook.
///
/// `initialize` is the entry point a page-fault path calls; `initialize_more`
/// is the only thing a concrete storage kind actually needs to supply.
pub trait VolatilePageInitializer: Send + Sync {
    /// The storage kind this initializer produces pages for.
    fn page_type(&self) -> PageType;

    /// Fill in the body of `page`. The header has already been initialized
    /// and the body zeroed. Default: no-op, matching storage kinds whose
    /// body layout is out of scope here.
    fn initialize_more(&self, _page: &mut Page) {}

    /// Masstree layer this initializer's pages belong to. Default 0, the
    /// root layer; a foster-twin or layer-pushdown initializer overrides
    /// this to stamp a deeper layer at construction.
    fn layer(&self) -> u8 {
        0
    }

    /// Zero the page, stamp the header, then call `initialize_more`.
    fn initialize(
        &self,
        page_id: VolatilePagePointer,
        storage_id: StorageId,
        root: bool,
    ) -> Page {
        let mut page = Page::new();
        page.header_mut().init_volatile(
            page_id,
            storage_id,
            self.page_type(),
            root,
            self.layer(),
        );
        self.initialize_more(&mut page);
        page
    }
}

/// An initializer whose `initialize_more` is a no-op. Used when a page-fault
/// path asserts that no page will actually be created, or for storage kinds
/// with no type-specific body setup in this crate's scope.
pub struct NullInitializer {
    page_type: PageType,
}

impl NullInitializer {
    pub const fn new(page_type: PageType) -> Self {
        Self { page_type }
    }
}

impl VolatilePageInitializer for NullInitializer {
    fn page_type(&self) -> PageType {
        self.page_type
    }
}
