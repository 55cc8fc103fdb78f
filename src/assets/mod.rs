//! Asset storage and packaging engine.
//!
//! [`AssetVault`] is the record-level API used by the rest of the campaign
//! tool. It wraps the sled-backed [`AssetStore`] together with the chunked
//! writer, archive pipelines, resource resolver and JSON document facade, and
//! converts every internal error into an [`OperationResult`]-shaped value so
//! callers never see a storage exception.
//!
//! Import and export against the same namespace must not run concurrently;
//! the vault does not serialize independent calls. Reads may interleave
//! freely. Handles returned by [`AssetVault::resolve_url`] and
//! [`ExportReport::archive`] belong to the caller, who must release them.
//! Operations cannot be cancelled once started.

pub mod batch;
pub mod codec;
pub mod documents;
pub mod errors;
pub mod export;
pub mod import;
pub mod mime;
pub mod resolver;
pub mod storage;
pub mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use batch::{BatchedWriter, DEFAULT_WRITE_CHUNK_SIZE};
pub use documents::DocumentStore;
pub use errors::AssetError;
pub use export::{ArchiveExporter, ExportSummary, ExportedArchive};
pub use import::{ArchiveImporter, ImportSummary, DEFAULT_IMPORT_BATCH_SIZE};
pub use resolver::{
    BlobHost, MaterializedBlob, MemoryBlobHost, ResolvedResource, ResourceResolver,
    TempDirBlobHost,
};
pub use storage::{AssetStore, AssetStoreBuilder};
pub use types::{
    AssetNamespace, AssetRecord, AssetSummary, NamespaceCounts, OperationResult, VaultStats,
};

use crate::config::Config;
use crate::logutil::escape_log;
use crate::validation::validate_asset_name;

/// Tuning knobs for the bulk paths.
#[derive(Debug, Clone)]
pub struct VaultOptions {
    pub write_chunk_size: usize,
    pub chunk_pause: Duration,
    pub import_batch_size: usize,
    pub max_extract_bytes: u64,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            write_chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
            chunk_pause: Duration::ZERO,
            import_batch_size: DEFAULT_IMPORT_BATCH_SIZE,
            max_extract_bytes: import::DEFAULT_MAX_EXTRACT_BYTES,
        }
    }
}

impl From<&Config> for VaultOptions {
    fn from(config: &Config) -> Self {
        Self {
            write_chunk_size: config.storage.write_chunk_size,
            chunk_pause: config.storage.chunk_pause(),
            import_batch_size: config.archive.import_batch_size,
            max_extract_bytes: config.archive.max_extract_bytes,
        }
    }
}

/// Result of `import_archive`: success flag, human-readable message, counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub counts: NamespaceCounts,
}

/// Result of `export_archive`. `archive` is present on success.
#[derive(Debug)]
pub struct ExportReport {
    pub success: bool,
    pub message: String,
    pub counts: NamespaceCounts,
    pub archive: Option<ExportedArchive>,
}

pub struct AssetVault {
    store: AssetStore,
    documents: DocumentStore,
    resolver: ResourceResolver,
    importer: ArchiveImporter,
    exporter: ArchiveExporter,
}

impl AssetVault {
    /// Vault over `store` with default tuning and temp-file blob handles.
    pub fn new(store: AssetStore) -> Self {
        Self::with_options(store, Arc::new(TempDirBlobHost::new()), VaultOptions::default())
    }

    pub fn with_options(store: AssetStore, host: Arc<dyn BlobHost>, options: VaultOptions) -> Self {
        let writer = BatchedWriter::new(store.clone())
            .with_chunk_size(options.write_chunk_size)
            .with_pause(options.chunk_pause);
        let importer = ArchiveImporter::new(writer)
            .with_batch_size(options.import_batch_size)
            .with_max_extract_bytes(options.max_extract_bytes);
        Self {
            documents: DocumentStore::new(store.clone()),
            resolver: ResourceResolver::new(store.clone(), host.clone()),
            exporter: ArchiveExporter::new(store.clone(), host),
            importer,
            store,
        }
    }

    /// Open the database named in `config` and build a vault around it.
    pub fn from_config(config: &Config) -> Result<Self, AssetError> {
        let store = AssetStore::open(&config.storage.db_path)?;
        let host = match &config.blobs.dir {
            Some(dir) => TempDirBlobHost::in_dir(dir),
            None => TempDirBlobHost::new(),
        };
        Ok(Self::with_options(store, Arc::new(host), VaultOptions::from(config)))
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub async fn list_assets(&self, namespace: AssetNamespace) -> Vec<AssetSummary> {
        match self.store.list(namespace) {
            Ok(records) => records.iter().map(AssetRecord::summary).collect(),
            Err(e) => {
                error!("failed to list {}: {}", namespace, e);
                Vec::new()
            }
        }
    }

    pub async fn has_assets(&self, namespace: AssetNamespace) -> bool {
        match self.store.exists(namespace) {
            Ok(exists) => exists,
            Err(e) => {
                error!("failed to check {}: {}", namespace, e);
                false
            }
        }
    }

    /// Store a file under its own name, replacing any record with that name.
    pub async fn add_asset(
        &self,
        namespace: AssetNamespace,
        file_name: &str,
        bytes: &[u8],
    ) -> OperationResult {
        if let Err(e) = validate_asset_name(file_name) {
            return OperationResult::failed(e.to_string());
        }
        let content_type = mime::classify(file_name);
        if namespace == AssetNamespace::Data && mime::is_json_like(content_type) {
            if let Err(e) = serde_json::from_slice::<serde_json::Value>(bytes) {
                return OperationResult::failed(format!("{} is not valid JSON: {}", file_name, e));
            }
        }
        let record = AssetRecord::new(file_name, codec::payload_for(content_type, bytes))
            .with_content_type(content_type);
        match self.store.put(namespace, &record) {
            Ok(()) => {
                info!("added {}/{}", namespace, escape_log(file_name));
                OperationResult::ok(format!("Added {} to {}", file_name, namespace))
            }
            Err(e) => {
                error!("failed to add {}/{}: {}", namespace, escape_log(file_name), e);
                OperationResult::failed(format!("Failed to save {}: {}", file_name, e))
            }
        }
    }

    pub async fn delete_asset(&self, namespace: AssetNamespace, name: &str) -> OperationResult {
        match self.store.delete(namespace, name) {
            Ok(true) => {
                info!("deleted {}/{}", namespace, escape_log(name));
                OperationResult::ok(format!("Deleted {} from {}", name, namespace))
            }
            Ok(false) => OperationResult::failed(format!("{} not found in {}", name, namespace)),
            Err(e) => {
                error!("failed to delete {}/{}: {}", namespace, escape_log(name), e);
                OperationResult::failed(format!("Failed to delete {}: {}", name, e))
            }
        }
    }

    /// Wipe all three namespaces.
    pub async fn clear_all_assets(&self) -> OperationResult {
        match self.store.clear_all() {
            Ok(removed) => {
                info!("cleared {} record(s) from all namespaces", removed);
                OperationResult::ok(format!("Removed {} asset(s)", removed))
            }
            Err(e) => {
                error!("failed to clear assets: {}", e);
                OperationResult::failed(format!("Failed to clear assets: {}", e))
            }
        }
    }

    /// Resolve an asset to a URL-bearing handle; `None` when not found.
    pub async fn resolve_url(
        &self,
        namespace: AssetNamespace,
        name: &str,
    ) -> Option<ResolvedResource> {
        match self.resolver.resolve(namespace, name) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("failed to resolve {}/{}: {}", namespace, escape_log(name), e);
                None
            }
        }
    }

    pub async fn read_document<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.documents.read_document(name)
    }

    pub async fn write_document<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> OperationResult {
        match self.documents.write_document(name, value) {
            Ok(()) => OperationResult::ok(format!("Saved {}", name)),
            Err(e) => {
                error!("failed to write document {}: {}", escape_log(name), e);
                OperationResult::failed(format!("Failed to save {}: {}", name, e))
            }
        }
    }

    /// Save hand-edited JSON text into the `data` namespace.
    pub async fn save_json_text(&self, name: &str, text: &str) -> OperationResult {
        match self.documents.save_json_text(name, text) {
            Ok(()) => OperationResult::ok(format!("Saved {}", name)),
            Err(e) => OperationResult::failed(format!("Failed to save {}: {}", name, e)),
        }
    }

    pub async fn import_archive(&self, path: &Path) -> ImportReport {
        Self::import_report(self.importer.import_path(path).await)
    }

    pub async fn import_archive_bytes(&self, bytes: Vec<u8>) -> ImportReport {
        Self::import_report(self.importer.import_bytes(bytes).await)
    }

    fn import_report(result: Result<ImportSummary, AssetError>) -> ImportReport {
        match result {
            Ok(summary) => {
                let mut message = format!("Imported {}", summary.counts);
                if summary.skipped > 0 {
                    message.push_str(&format!(
                        " ({} file(s) could not be read and were skipped)",
                        summary.skipped
                    ));
                }
                let untouched: Vec<String> = summary
                    .folders_present
                    .iter()
                    .filter(|ns| summary.counts.get(**ns) == 0)
                    .map(|ns| format!("{}/", ns))
                    .collect();
                if !untouched.is_empty() {
                    message.push_str(&format!(
                        "; {} had no readable files and left existing assets unchanged",
                        untouched.join(", ")
                    ));
                }
                ImportReport {
                    success: true,
                    message,
                    counts: summary.counts,
                }
            }
            Err(e) => {
                warn!("import failed: {}", e);
                let message = match e {
                    AssetError::NoRecognizedContent => {
                        "No recognized content: the archive has no files in audio/, images/ or data/"
                            .to_string()
                    }
                    other => format!("Import failed: {}", other),
                };
                ImportReport {
                    success: false,
                    message,
                    counts: NamespaceCounts::default(),
                }
            }
        }
    }

    pub async fn export_archive(&self) -> ExportReport {
        match self.exporter.export().await {
            Ok(summary) => {
                let mut message = format!("Exported {}", summary.counts);
                if summary.skipped > 0 {
                    message.push_str(&format!(
                        " ({} record(s) had unreadable payloads and were skipped)",
                        summary.skipped
                    ));
                }
                ExportReport {
                    success: true,
                    message,
                    counts: summary.counts,
                    archive: Some(summary.archive),
                }
            }
            Err(e) => {
                error!("export failed: {}", e);
                ExportReport {
                    success: false,
                    message: format!("Export failed: {}", e),
                    counts: NamespaceCounts::default(),
                    archive: None,
                }
            }
        }
    }

    /// Record counts and payload sizes per namespace.
    pub async fn stats(&self) -> Option<VaultStats> {
        let mut stats = VaultStats::default();
        for namespace in AssetNamespace::ALL {
            let records = match self.store.list(namespace) {
                Ok(records) => records,
                Err(e) => {
                    error!("failed to gather stats for {}: {}", namespace, e);
                    return None;
                }
            };
            stats.records.set(namespace, records.len());
            stats
                .payload_bytes
                .set(namespace, records.iter().map(|r| r.payload.len()).sum());
            let latest = records.iter().map(|r| r.last_modified).max();
            stats.latest_write = stats.latest_write.max(latest);
        }
        Some(stats)
    }
}
