// Copyright (c) 2025 RustyDB Contributors
//
// StorageMetadata: the persistent description of a storage instance (its id,
// kind, name, and root page), saved and loaded as a small human-readable
// document the way `InstanceMetadata` did in the wider RustyDB tree, but
// scoped to a single storage rather than a whole data directory.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};
use crate::page::pointer::SnapshotPagePointer;

/// Maximum length, in bytes, of a storage name.
pub const MAX_STORAGE_NAME_LEN: usize = 32;

pub type StorageId = u32;

/// Storage kinds known to the registry. New kinds are added here and given a
/// matching metadata extension below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    Array,
    MasstreeHash,
    Sequential,
}

/// Extension fields specific to an [`StorageType::Array`] storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    /// Number of records in the array.
    pub array_size: u64,
    /// Size in bytes of each record's payload.
    pub payload_size: u32,
}

/// Storage-type-specific extension. Every variant here must correspond to a
/// [`StorageType`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMetadataExtension {
    Array(ArrayMetadata),
    None,
}

/// The persistent description of one storage instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMetadata {
    pub id: StorageId,
    pub storage_type: StorageType,
    pub name: String,
    pub root_snapshot_page_id: Option<SnapshotPagePointer>,
    pub extension: StorageMetadataExtension,
}

impl StorageMetadata {
    pub fn new(
        id: StorageId,
        storage_type: StorageType,
        name: impl Into<String>,
        extension: StorageMetadataExtension,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_STORAGE_NAME_LEN {
            return Err(DbError::StorageInvalidOption(format!(
                "storage name must be 1..={} bytes, got {}",
                MAX_STORAGE_NAME_LEN,
                name.len()
            )));
        }
        Ok(Self {
            id,
            storage_type,
            name,
            root_snapshot_page_id: None,
            extension,
        })
    }

    /// Returns the [`ArrayMetadata`] extension, or an error if this metadata
    /// describes a different storage kind. Mirrors the "wrong metadata type"
    /// failure mode a factory hits when asked to open a storage it doesn't
    /// own.
    pub fn as_array(&self) -> Result<&ArrayMetadata> {
        match &self.extension {
            StorageMetadataExtension::Array(array) => Ok(array),
            _ => Err(DbError::StorageWrongMetadataType(format!(
                "storage {} is not an array storage",
                self.id
            ))),
        }
    }

    /// Serialize to the on-disk document format (pretty JSON, matching the
    /// style RustyDB uses for its other metadata documents).
    pub fn to_document(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(DbError::from)
    }

    pub fn from_document(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(DbError::from)
    }

    /// Atomically persist this metadata to `path`: write to a temp file in
    /// the same directory, `sync_all`, then rename over the destination.
    pub fn save_atomic(&self, path: &std::path::Path) -> Result<()> {
        let document = self.to_document()?;
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            use std::io::Write;
            file.write_all(document.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let document = std::fs::read_to_string(path)?;
        Self::from_document(&document)
    }
}
