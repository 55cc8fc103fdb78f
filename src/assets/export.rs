//! Re-packs every stored record into a single zip archive.
//!
//! Raw-text JSON records are written as text; everything else is written as
//! the base64-decoded bytes, so exporting then importing gives back the same
//! records regardless of which encoding each one used.

use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::assets::codec;
use crate::assets::errors::AssetError;
use crate::assets::resolver::{BlobHost, MaterializedBlob};
use crate::assets::storage::AssetStore;
use crate::assets::types::{AssetNamespace, NamespaceCounts};
use crate::logutil::{escape_log, human_bytes};

pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// A finished archive: the bytes, their SHA-256, and a downloadable handle.
#[derive(Debug)]
pub struct ExportedArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub checksum: String,
    /// `None` when the blob host could not materialize the archive.
    pub handle: Option<MaterializedBlob>,
}

#[derive(Debug)]
pub struct ExportSummary {
    pub counts: NamespaceCounts,
    pub skipped: usize,
    pub archive: ExportedArchive,
}

pub struct ArchiveExporter {
    store: AssetStore,
    host: Arc<dyn BlobHost>,
}

impl ArchiveExporter {
    pub fn new(store: AssetStore, host: Arc<dyn BlobHost>) -> Self {
        Self { store, host }
    }

    pub async fn export(&self) -> Result<ExportSummary, AssetError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut counts = NamespaceCounts::default();
        let mut skipped = 0usize;

        for namespace in AssetNamespace::ALL {
            zip.add_directory(namespace.folder_prefix(), SimpleFileOptions::default())?;
            let records = self.store.list(namespace)?;
            let mut written = 0usize;
            for record in records {
                let bytes = match codec::payload_bytes(&record.content_type, &record.payload) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(
                            "skipping {}/{} during export: {}",
                            namespace,
                            escape_log(&record.name),
                            e
                        );
                        skipped += 1;
                        continue;
                    }
                };
                let options = SimpleFileOptions::default()
                    .compression_method(compression_for(&record.content_type));
                zip.start_file(format!("{}/{}", namespace, record.name), options)?;
                zip.write_all(&bytes)?;
                written += 1;
            }
            counts.set(namespace, written);
            tokio::task::yield_now().await;
        }

        let bytes = zip.finish()?.into_inner();
        let checksum = format!("{:x}", Sha256::digest(&bytes));
        let file_name = format!("campaign-assets-{}.zip", Utc::now().format("%Y%m%d_%H%M%S"));

        let handle = match self.host.materialize(&bytes, ARCHIVE_CONTENT_TYPE, &file_name) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("archive built but no download handle available: {}", e);
                None
            }
        };

        info!(
            "Export complete: {} ({}, {} skipped)",
            counts,
            human_bytes(bytes.len() as u64),
            skipped
        );

        Ok(ExportSummary {
            counts,
            skipped,
            archive: ExportedArchive {
                file_name,
                bytes,
                checksum,
                handle,
            },
        })
    }
}

/// Already-compressed media is stored as-is; text formats are deflated.
fn compression_for(content_type: &str) -> CompressionMethod {
    match content_type {
        "audio/mpeg" | "audio/ogg" | "image/png" | "image/jpeg" | "image/gif" | "image/webp" => {
            CompressionMethod::Stored
        }
        _ => CompressionMethod::Deflated,
    }
}
