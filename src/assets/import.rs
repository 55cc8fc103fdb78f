//! Bulk import of a zip archive laid out as `audio/`, `images/`, `data/`.
//!
//! Only files directly inside those three folders are read. Entries are read
//! a few at a time and encoded on blocking tasks so peak memory stays bounded
//! by the batch size. A bad entry is logged and skipped; it never aborts the
//! import. Each namespace that yields at least one record is replaced
//! wholesale through the [`BatchedWriter`]; all other namespaces are left
//! untouched.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::{debug, info, warn};
use tokio::task::JoinSet;
use zip::ZipArchive;

use crate::assets::batch::BatchedWriter;
use crate::assets::codec;
use crate::assets::errors::AssetError;
use crate::assets::mime;
use crate::assets::types::{AssetNamespace, AssetRecord, NamespaceCounts};
use crate::logutil::{escape_log, human_bytes};
use crate::validation::{archive_child_name, validate_file_size};

/// Entries read and encoded together before the next batch starts.
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 5;

/// Maximum total uncompressed size of an imported archive (500 MB).
pub const DEFAULT_MAX_EXTRACT_BYTES: u64 = 500 * 1024 * 1024;

/// Upper bound on the buffer preallocated from an entry's declared size.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Outcome of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records written per namespace.
    pub counts: NamespaceCounts,
    /// Entries inside the known folders that could not be decoded.
    pub skipped: usize,
    /// Folders present in the archive, including empty ones.
    pub folders_present: Vec<AssetNamespace>,
}

struct EntryMeta {
    index: usize,
    path: String,
    is_dir: bool,
    size: u64,
}

pub struct ArchiveImporter {
    writer: BatchedWriter,
    batch_size: usize,
    max_extract_bytes: u64,
}

impl ArchiveImporter {
    pub fn new(writer: BatchedWriter) -> Self {
        Self {
            writer,
            batch_size: DEFAULT_IMPORT_BATCH_SIZE,
            max_extract_bytes: DEFAULT_MAX_EXTRACT_BYTES,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_extract_bytes(mut self, max_extract_bytes: u64) -> Self {
        self.max_extract_bytes = max_extract_bytes;
        self
    }

    /// Import an archive file. Only `.zip` files are accepted.
    pub async fn import_path(&self, path: &Path) -> Result<ImportSummary, AssetError> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        if !is_zip {
            return Err(AssetError::Validation(format!(
                "not a recognized archive type: {} (expected a .zip file)",
                escape_log(&path.display().to_string())
            )));
        }
        let file = File::open(path)?;
        info!("Importing archive {}", escape_log(&path.display().to_string()));
        self.import_reader(file).await
    }

    /// Import an archive held in memory.
    pub async fn import_bytes(&self, bytes: Vec<u8>) -> Result<ImportSummary, AssetError> {
        info!("Importing archive from memory ({})", human_bytes(bytes.len() as u64));
        self.import_reader(std::io::Cursor::new(bytes)).await
    }

    /// Import from any seekable reader.
    pub async fn import_reader<R: Read + Seek>(
        &self,
        reader: R,
    ) -> Result<ImportSummary, AssetError> {
        let mut archive = ZipArchive::new(reader).map_err(|e| {
            AssetError::Validation(format!("not a recognized archive type: {}", e))
        })?;
        let entries = Self::scan(&mut archive)?;

        let total: u64 = entries.iter().map(|e| e.size).sum();
        validate_file_size(total, self.max_extract_bytes)
            .map_err(|e| AssetError::Validation(format!("archive too large: {}", e)))?;

        let mut summary = ImportSummary::default();
        let mut collections: Vec<(AssetNamespace, Vec<AssetRecord>)> = Vec::new();

        for namespace in AssetNamespace::ALL {
            let folder = namespace.as_str();
            let prefix = namespace.folder_prefix();
            if !entries.iter().any(|e| e.path.starts_with(&prefix)) {
                debug!("archive has no {} folder; leaving namespace untouched", prefix);
                continue;
            }
            summary.folders_present.push(namespace);

            let candidates: Vec<(usize, String)> = entries
                .iter()
                .filter(|e| !e.is_dir)
                .filter_map(|e| {
                    archive_child_name(&e.path, folder).map(|name| (e.index, name.to_string()))
                })
                .collect();

            let mut records = Vec::with_capacity(candidates.len());
            for batch in candidates.chunks(self.batch_size) {
                summary.skipped += self.decode_batch(&mut archive, batch, &mut records).await;
            }

            debug!("{}: decoded {} of {} entries", namespace, records.len(), candidates.len());
            if !records.is_empty() {
                collections.push((namespace, records));
            }
        }

        if collections.is_empty() {
            warn!("archive contained no importable files");
            return Err(AssetError::NoRecognizedContent);
        }

        for (namespace, records) in collections {
            let written = self.writer.write_all(namespace, &records).await?;
            summary.counts.set(namespace, written);
        }

        info!(
            "Import complete: {} ({} skipped)",
            summary.counts, summary.skipped
        );
        Ok(summary)
    }

    fn scan<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<EntryMeta>, AssetError> {
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            entries.push(EntryMeta {
                index,
                path: entry.name().to_string(),
                is_dir: entry.is_dir(),
                size: entry.size(),
            });
        }
        Ok(entries)
    }

    /// Read one batch of entries, then encode them concurrently. Returns the
    /// number of entries skipped.
    async fn decode_batch<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        batch: &[(usize, String)],
        records: &mut Vec<AssetRecord>,
    ) -> usize {
        let mut skipped = 0usize;
        let mut tasks = JoinSet::new();

        for (index, name) in batch {
            match Self::read_entry(archive, *index) {
                Ok(bytes) => {
                    let name = name.clone();
                    tasks.spawn_blocking(move || build_record(name, bytes));
                }
                Err(e) => {
                    warn!("skipping archive entry {}: {}", escape_log(name), e);
                    skipped += 1;
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("archive entry encoding task failed: {}", e);
                    skipped += 1;
                }
            }
        }
        skipped
    }

    fn read_entry<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        index: usize,
    ) -> Result<Vec<u8>, AssetError> {
        let mut entry = archive.by_index(index)?;
        let mut bytes = Vec::with_capacity(entry.size().min(MAX_PREALLOC) as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

fn build_record(name: String, bytes: Vec<u8>) -> AssetRecord {
    let content_type = mime::classify(&name);
    let payload = codec::payload_for(content_type, &bytes);
    AssetRecord::new(name, payload).with_content_type(content_type)
}
