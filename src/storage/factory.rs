// Copyright (c) 2025 RustyDB Contributors
//
// StorageFactory: dispatch target for `StorageRegistry::create`. Each
// storage kind registers one factory at engine init; the registry looks it
// up by `StorageType` and delegates metadata validation and root-page
// construction to it, the same dispatch-by-kind shape `catalog/mod.rs` uses
// for its table operations, generalized from a flat match to a trait-object
// registry since storage kinds here are an open set.

use crate::error::{DbError, Result};
use crate::page::initializer::{NullInitializer, VolatilePageInitializer};
use crate::page::pointer::VolatilePagePointer;
use crate::page::{Page, PageType};
use crate::storage::metadata::{StorageMetadata, StorageType};

/// Produces and validates storages of one [`StorageType`].
pub trait StorageFactory: Send + Sync {
    /// The storage kind this factory builds.
    fn storage_type(&self) -> StorageType;

    /// Reject metadata this factory cannot build a storage from. Called
    /// before any page is touched.
    fn validate(&self, metadata: &StorageMetadata) -> Result<()>;

    /// Build the new storage's root page at `page_id`. Only called after
    /// `validate` has returned `Ok`.
    fn create_root_page(&self, metadata: &StorageMetadata, page_id: VolatilePagePointer) -> Page;
}

/// Factory for [`StorageType::Array`] storages. Rejects a zero `array_size`
/// or `payload_size` per S6; the array's record layout itself is out of
/// scope here, so the root page carries only the common header.
pub struct ArrayFactory;

impl StorageFactory for ArrayFactory {
    fn storage_type(&self) -> StorageType {
        StorageType::Array
    }

    fn validate(&self, metadata: &StorageMetadata) -> Result<()> {
        let array = metadata.as_array()?;
        if array.payload_size == 0 {
            return Err(DbError::StorageInvalidOption(format!(
                "storage {}: array payload_size must be nonzero",
                metadata.id
            )));
        }
        if array.array_size == 0 {
            return Err(DbError::StorageInvalidOption(format!(
                "storage {}: array array_size must be nonzero",
                metadata.id
            )));
        }
        Ok(())
    }

    fn create_root_page(&self, metadata: &StorageMetadata, page_id: VolatilePagePointer) -> Page {
        NullInitializer::new(PageType::Array).initialize(page_id, metadata.id, true)
    }
}

/// Factory for [`StorageType::Sequential`] storages. No extension fields to
/// validate; the root page is a plain `SequentialRoot`-tagged header.
pub struct SequentialFactory;

impl StorageFactory for SequentialFactory {
    fn storage_type(&self) -> StorageType {
        StorageType::Sequential
    }

    fn validate(&self, _metadata: &StorageMetadata) -> Result<()> {
        Ok(())
    }

    fn create_root_page(&self, metadata: &StorageMetadata, page_id: VolatilePagePointer) -> Page {
        NullInitializer::new(PageType::SequentialRoot).initialize(page_id, metadata.id, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::metadata::{ArrayMetadata, StorageMetadataExtension};

    fn array_metadata(array_size: u64, payload_size: u32) -> StorageMetadata {
        StorageMetadata::new(
            1,
            StorageType::Array,
            "orders",
            StorageMetadataExtension::Array(ArrayMetadata {
                array_size,
                payload_size,
            }),
        )
        .unwrap()
    }

    /// S6 — factory rejects payload_size=0 and array_size=0, accepts a valid shape.
    #[test]
    fn s6_array_factory_rejects_zero_payload_and_zero_size() {
        let factory = ArrayFactory;
        assert!(matches!(
            factory.validate(&array_metadata(10, 0)),
            Err(DbError::StorageInvalidOption(_))
        ));
        assert!(matches!(
            factory.validate(&array_metadata(0, 16)),
            Err(DbError::StorageInvalidOption(_))
        ));
        assert!(factory.validate(&array_metadata(1024, 16)).is_ok());
    }

    #[test]
    fn s6_array_factory_root_page_matches_expected_header() {
        let factory = ArrayFactory;
        let metadata = array_metadata(1024, 16);
        let page = factory.create_root_page(&metadata, VolatilePagePointer::new(0, 1));

        assert_eq!(page.header().storage_id(), metadata.id);
        assert_eq!(page.header().page_type(), PageType::Array);
        assert!(!page.header().is_snapshot());
        assert!(page.header().is_root());
        assert_eq!(page.header().page_version.stable_version().raw(), 0);
    }

    #[test]
    fn array_factory_rejects_wrong_metadata_type() {
        let factory = ArrayFactory;
        let sequential =
            StorageMetadata::new(2, StorageType::Sequential, "log", StorageMetadataExtension::None)
                .unwrap();
        assert!(matches!(
            factory.validate(&sequential),
            Err(DbError::StorageWrongMetadataType(_))
        ));
    }

    #[test]
    fn sequential_factory_accepts_anything_and_tags_root_page() {
        let factory = SequentialFactory;
        let metadata =
            StorageMetadata::new(3, StorageType::Sequential, "log", StorageMetadataExtension::None)
                .unwrap();
        assert!(factory.validate(&metadata).is_ok());
        let page = factory.create_root_page(&metadata, VolatilePagePointer::new(0, 5));
        assert_eq!(page.header().page_type(), PageType::SequentialRoot);
    }
}
