//! Test utilities & fixtures.
//! Builds zip archives in memory and opens throwaway vaults.

use std::io::{Cursor, Write};
use std::sync::Arc;

use campaign_vault::assets::{
    AssetNamespace, AssetStore, AssetStoreBuilder, AssetVault, MemoryBlobHost, VaultOptions,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A vault over a temporary sled database with in-memory blob handles.
#[allow(dead_code)]
pub fn temp_vault() -> AssetVault {
    temp_vault_with(VaultOptions::default())
}

#[allow(dead_code)]
pub fn temp_vault_with(options: VaultOptions) -> AssetVault {
    let store = AssetStoreBuilder::temporary().open().expect("temporary store");
    AssetVault::with_options(store, Arc::new(MemoryBlobHost), options)
}

/// Build a zip from `(path, bytes)` pairs; paths ending in `/` become directories.
#[allow(dead_code)]
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    zip_archive_with(entries, CompressionMethod::Deflated)
}

#[allow(dead_code)]
pub fn zip_archive_with(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);
    for (path, bytes) in entries {
        if path.ends_with('/') {
            zip.add_directory(path.to_string(), options).expect("add directory");
        } else {
            zip.start_file(path.to_string(), options).expect("start file");
            zip.write_all(bytes).expect("write entry");
        }
    }
    zip.finish().expect("finish zip").into_inner()
}

/// `(name, payload, content_type)` for every record in a namespace, by name.
#[allow(dead_code)]
pub fn snapshot(store: &AssetStore, namespace: AssetNamespace) -> Vec<(String, String, String)> {
    store
        .list(namespace)
        .expect("list")
        .into_iter()
        .map(|r| (r.name, r.payload, r.content_type))
        .collect()
}
