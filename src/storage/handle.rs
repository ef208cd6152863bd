// Copyright (c) 2025 RustyDB Contributors
//
// StorageHandle: what `StorageRegistry::create`/`lookup` hand back — the
// live pairing of a storage's metadata and its root page, both shared via
// `Arc` the way `Catalog` hands back cloned, independently-owned values
// rather than guarded references into its map.

use std::sync::Arc;

use crate::page::Page;
use crate::storage::metadata::StorageMetadata;

/// A live, in-memory storage: its metadata plus its root page.
#[derive(Clone)]
pub struct StorageHandle {
    metadata: Arc<StorageMetadata>,
    root_page: Arc<Page>,
}

impl StorageHandle {
    pub(crate) fn new(metadata: Arc<StorageMetadata>, root_page: Page) -> Self {
        Self {
            metadata,
            root_page: Arc::new(root_page),
        }
    }

    pub fn metadata(&self) -> &Arc<StorageMetadata> {
        &self.metadata
    }

    pub fn root_page(&self) -> &Arc<Page> {
        &self.root_page
    }
}
