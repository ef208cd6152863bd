// Copyright (c) 2025 RustyDB Contributors
//
// Storage metadata and registry: the persistent, non-transactional layer
// describing what storages exist, independent of the pages they own.

pub mod checksum;
pub mod factory;
pub mod handle;
pub mod interfaces;
pub mod metadata;
pub mod registry;

pub use checksum::hardware_crc32c;
pub use factory::{ArrayFactory, SequentialFactory, StorageFactory};
pub use handle::StorageHandle;
pub use interfaces::{BufferingLogSink, LogSink, SequentialPageSource, VolatilePageSource};
pub use metadata::{
    ArrayMetadata, StorageId, StorageMetadata, StorageMetadataExtension, StorageType,
    MAX_STORAGE_NAME_LEN,
};
pub use registry::StorageRegistry;
