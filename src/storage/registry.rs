// Copyright (c) 2025 RustyDB Contributors
//
// StorageRegistry: the process-wide map from StorageId/name to metadata and
// live storage handle, plus the factory table that dispatches `create` to a
// storage kind's validation and root-page construction. Modeled on the
// catalog's Arc<RwLock<HashMap<..>>> pattern: storage creation is rare and
// may pay the writer's cost, lookups are frequent and must never block.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{DbError, Result};
use crate::storage::factory::StorageFactory;
use crate::storage::handle::StorageHandle;
use crate::storage::interfaces::{LogSink, VolatilePageSource};
use crate::storage::metadata::{StorageId, StorageMetadata, StorageType};

#[derive(Default)]
struct RegistryState {
    by_id: HashMap<StorageId, Arc<StorageMetadata>>,
    id_by_name: HashMap<String, StorageId>,
    handles: HashMap<StorageId, Arc<StorageHandle>>,
    factories: HashMap<StorageType, Arc<dyn StorageFactory>>,
}

impl RegistryState {
    fn check_available(&self, metadata: &StorageMetadata) -> Result<()> {
        if metadata.id == 0 {
            return Err(DbError::StorageInvalidOption(
                "storage id 0 is reserved for \"invalid\"".into(),
            ));
        }
        if self.by_id.contains_key(&metadata.id) {
            return Err(DbError::StorageDuplicateId(metadata.id.to_string()));
        }
        if self.id_by_name.contains_key(&metadata.name) {
            return Err(DbError::StorageDuplicateName(metadata.name.clone()));
        }
        Ok(())
    }
}

/// Concurrent map from storage identity to its metadata and live handle.
///
/// Cloning a `StorageRegistry` is cheap and shares the underlying map, the
/// same way `Catalog` is shared across connections.
#[derive(Clone, Default)]
pub struct StorageRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a factory at engine init. Overwrites any factory previously
    /// registered for the same storage type.
    pub fn register_factory(&self, factory: Arc<dyn StorageFactory>) {
        let storage_type = factory.storage_type();
        log::debug!("registering storage factory for {:?}", storage_type);
        self.state.write().factories.insert(storage_type, factory);
    }

    /// Create a brand-new storage: validate `metadata` through the factory
    /// registered for its type, build its root page, append a create-log
    /// entry, and publish the result. Fails without mutating the registry if
    /// any step before publication fails.
    pub fn create(
        &self,
        metadata: StorageMetadata,
        page_source: &mut dyn VolatilePageSource,
        log_sink: &mut dyn LogSink,
    ) -> Result<Arc<StorageHandle>> {
        let factory = {
            let state = self.state.read();
            state.check_available(&metadata)?;
            state
                .factories
                .get(&metadata.storage_type)
                .cloned()
                .ok_or_else(|| {
                    DbError::StorageInvalidOption(format!(
                        "no factory registered for storage type {:?}",
                        metadata.storage_type
                    ))
                })?
        };

        factory.validate(&metadata)?;
        let page_id = page_source.allocate_volatile_page();
        let root_page = factory.create_root_page(&metadata, page_id);

        let mut state = self.state.write();
        // Re-check under the write lock: another creator may have raced us
        // between the read-lock validation above and acquiring the writer.
        state.check_available(&metadata)?;

        let log_record = format!(
            "CREATE_STORAGE id={} type={:?} name={}",
            metadata.id, metadata.storage_type, metadata.name
        );
        log_sink
            .reserve_new_log(log_record.len())
            .copy_from_slice(log_record.as_bytes());

        let metadata = Arc::new(metadata);
        let handle = Arc::new(StorageHandle::new(Arc::clone(&metadata), root_page));
        state
            .id_by_name
            .insert(metadata.name.clone(), metadata.id);
        state.by_id.insert(metadata.id, Arc::clone(&metadata));
        state.handles.insert(metadata.id, Arc::clone(&handle));
        log::debug!("created storage {} ({})", metadata.id, metadata.name);
        Ok(handle)
    }

    /// Register metadata for a storage that already exists (e.g. recovered
    /// from a snapshot's metadata document) without running a factory or
    /// allocating a root page. No live handle is published for it.
    pub fn register_existing(&self, metadata: StorageMetadata) -> Result<()> {
        let mut state = self.state.write();
        state.check_available(&metadata)?;
        log::debug!("registering storage {} ({})", metadata.id, metadata.name);
        state.id_by_name.insert(metadata.name.clone(), metadata.id);
        state.by_id.insert(metadata.id, Arc::new(metadata));
        Ok(())
    }

    /// Look up a live storage handle by id.
    pub fn lookup(&self, id: StorageId) -> Option<Arc<StorageHandle>> {
        self.state.read().handles.get(&id).cloned()
    }

    pub fn get(&self, id: StorageId) -> Result<Arc<StorageMetadata>> {
        self.state
            .read()
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::StorageNotFound(id.to_string()))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Arc<StorageMetadata>> {
        let state = self.state.read();
        let id = state
            .id_by_name
            .get(name)
            .ok_or_else(|| DbError::StorageNotFound(name.to_string()))?;
        state
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::StorageNotFound(name.to_string()))
    }

    /// Remove a storage from the registry. Does not touch any pages or
    /// on-disk metadata file; callers that need that must do it first.
    pub fn drop_storage(&self, id: StorageId) -> Result<Arc<StorageMetadata>> {
        let mut state = self.state.write();
        let metadata = state
            .by_id
            .remove(&id)
            .ok_or_else(|| DbError::StorageNotFound(id.to_string()))?;
        state.id_by_name.remove(&metadata.name);
        state.handles.remove(&id);
        log::debug!("dropped storage {} ({})", metadata.id, metadata.name);
        Ok(metadata)
    }

    pub fn len(&self) -> usize {
        self.state.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every registered storage's metadata, ordered by id.
    pub fn list(&self) -> Vec<Arc<StorageMetadata>> {
        let state = self.state.read();
        let mut all: Vec<_> = state.by_id.values().cloned().collect();
        all.sort_by_key(|m| m.id);
        all
    }

    /// Iterator over every live storage's metadata, for a snapshot metadata
    /// dump. Equivalent to [`Self::list`], named to match the spec's
    /// `each()` operation.
    pub fn each(&self) -> impl Iterator<Item = Arc<StorageMetadata>> {
        self.list().into_iter()
    }
}
