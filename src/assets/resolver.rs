//! Turns stored records into consumable resource handles.
//!
//! Media resolve to `data:` URLs. PDF documents are materialized through a
//! [`BlobHost`] instead, since large `data:` URLs render poorly for them.
//!
//! The resolver never caches what it hands out. A [`MaterializedBlob`] is
//! owned by the caller, who must release it (explicitly via
//! [`MaterializedBlob::release`] or by dropping it) once the consumer is done.
//! Resolving the same asset twice yields two independent handles.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use uuid::Uuid;

use crate::assets::codec;
use crate::assets::errors::AssetError;
use crate::assets::mime;
use crate::assets::storage::AssetStore;
use crate::assets::types::AssetNamespace;
use crate::logutil::escape_log;

/// Characters escaped in the path of a `file://` URL.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

enum Backing {
    File(tempfile::TempPath),
    Memory(Arc<[u8]>),
}

/// A short-lived, host-managed reference to materialized bytes.
pub struct MaterializedBlob {
    id: Uuid,
    url: String,
    content_type: String,
    size: usize,
    backing: Backing,
}

impl MaterializedBlob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Backing file for file-hosted blobs.
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(&**path),
            Backing::Memory(_) => None,
        }
    }

    /// Bytes for memory-hosted blobs.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.backing {
            Backing::File(_) => None,
            Backing::Memory(bytes) => Some(&bytes[..]),
        }
    }

    /// Dispose of the handle, reporting any cleanup failure.
    pub fn release(self) -> Result<(), AssetError> {
        match self.backing {
            Backing::File(path) => path.close()?,
            Backing::Memory(_) => {}
        }
        debug!("released blob {}", self.id);
        Ok(())
    }

    /// Detach a file-hosted blob from its handle so the file outlives it.
    /// Memory-hosted blobs have nothing to keep and return `None`.
    pub fn keep(self) -> Result<Option<PathBuf>, AssetError> {
        match self.backing {
            Backing::File(path) => Ok(Some(path.keep().map_err(std::io::Error::from)?)),
            Backing::Memory(_) => Ok(None),
        }
    }
}

impl std::fmt::Debug for MaterializedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedBlob")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish()
    }
}

/// Host environment able to turn bytes into a short-lived handle.
pub trait BlobHost: Send + Sync {
    fn materialize(
        &self,
        bytes: &[u8],
        content_type: &str,
        file_name: &str,
    ) -> Result<MaterializedBlob, AssetError>;
}

/// Writes each blob to its own temporary file and hands out a `file://` URL.
/// The file is removed when the handle is released or dropped.
#[derive(Debug, Clone, Default)]
pub struct TempDirBlobHost {
    dir: Option<PathBuf>,
}

impl TempDirBlobHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl BlobHost for TempDirBlobHost {
    fn materialize(
        &self,
        bytes: &[u8],
        content_type: &str,
        file_name: &str,
    ) -> Result<MaterializedBlob, AssetError> {
        let suffix = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("vault-blob-").suffix(&suffix);
        let mut file = match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        let path = file.into_temp_path();
        let url = file_url(&path);
        Ok(MaterializedBlob {
            id: Uuid::new_v4(),
            url,
            content_type: content_type.to_string(),
            size: bytes.len(),
            backing: Backing::File(path),
        })
    }
}

/// Keeps blob bytes inside the handle and hands out a `blob:` URL.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobHost;

impl BlobHost for MemoryBlobHost {
    fn materialize(
        &self,
        bytes: &[u8],
        content_type: &str,
        _file_name: &str,
    ) -> Result<MaterializedBlob, AssetError> {
        let id = Uuid::new_v4();
        Ok(MaterializedBlob {
            id,
            url: format!("blob:campaign-vault/{}", id),
            content_type: content_type.to_string(),
            size: bytes.len(),
            backing: Backing::Memory(Arc::from(bytes)),
        })
    }
}

fn file_url(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let text = if text.starts_with('/') {
        text
    } else {
        format!("/{}", text)
    };
    format!("file://{}", utf8_percent_encode(&text, PATH_SET))
}

/// What `resolve` hands back.
#[derive(Debug)]
pub enum ResolvedResource {
    /// The name was already a URL and is returned unchanged.
    Passthrough(String),
    /// Self-contained `data:` URL.
    DataUrl(String),
    /// Materialized handle; the caller owns its disposal.
    Blob(MaterializedBlob),
}

impl ResolvedResource {
    pub fn url(&self) -> &str {
        match self {
            ResolvedResource::Passthrough(url) | ResolvedResource::DataUrl(url) => url,
            ResolvedResource::Blob(blob) => blob.url(),
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, ResolvedResource::Blob(_))
    }
}

/// True when `name` is already a remote or embedded reference.
pub fn is_external_reference(name: &str) -> bool {
    let lower = name.trim_start().to_ascii_lowercase();
    if lower.starts_with("data:") || lower.starts_with("blob:") {
        return true;
    }
    match lower.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            scheme.len() >= 2
                && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

pub struct ResourceResolver {
    store: AssetStore,
    host: Arc<dyn BlobHost>,
}

impl ResourceResolver {
    pub fn new(store: AssetStore, host: Arc<dyn BlobHost>) -> Self {
        Self { store, host }
    }

    /// Resolve `(namespace, name)` to a handle. `Ok(None)` means not found;
    /// the `data` namespace is never resolvable.
    pub fn resolve(
        &self,
        namespace: AssetNamespace,
        name: &str,
    ) -> Result<Option<ResolvedResource>, AssetError> {
        if is_external_reference(name) {
            return Ok(Some(ResolvedResource::Passthrough(name.trim_start().to_string())));
        }
        if namespace == AssetNamespace::Data {
            debug!(
                "resolve requested for data/{}; documents are read via read_document",
                escape_log(name)
            );
            return Ok(None);
        }
        let Some(record) = self.store.get(namespace, name)? else {
            return Ok(None);
        };

        if mime::is_document(&record.name) {
            match codec::payload_bytes(&record.content_type, &record.payload)
                .and_then(|bytes| self.host.materialize(&bytes, &record.content_type, &record.name))
            {
                Ok(blob) => {
                    debug!(
                        "materialized {}/{} as {} ({} bytes)",
                        namespace,
                        escape_log(name),
                        blob.url(),
                        blob.size()
                    );
                    return Ok(Some(ResolvedResource::Blob(blob)));
                }
                Err(e) => {
                    warn!(
                        "could not materialize {}/{} ({}); falling back to data URL",
                        namespace,
                        escape_log(name),
                        e
                    );
                }
            }
        }

        Ok(Some(ResolvedResource::DataUrl(codec::data_url(
            &record.content_type,
            &record.payload,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::storage::AssetStoreBuilder;
    use crate::assets::types::AssetRecord;

    struct RefusingHost;

    impl BlobHost for RefusingHost {
        fn materialize(&self, _: &[u8], _: &str, _: &str) -> Result<MaterializedBlob, AssetError> {
            Err(AssetError::Internal("host refused".to_string()))
        }
    }

    fn store_with_pdf() -> AssetStore {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        store
            .put(
                AssetNamespace::Images,
                &AssetRecord::new("map.pdf", codec::encode(b"%PDF-1.4 test")),
            )
            .expect("put");
        store
    }

    #[test]
    fn external_references() {
        assert!(is_external_reference("https://example.com/a.png"));
        assert!(is_external_reference("data:image/png;base64,AAAA"));
        assert!(is_external_reference("blob:abc"));
        assert!(is_external_reference("file:///tmp/a.pdf"));
        assert!(!is_external_reference("map.png"));
        assert!(!is_external_reference("weird ://name.png"));
    }

    #[test]
    fn passthrough_skips_lookup() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        let resolver = ResourceResolver::new(store, Arc::new(MemoryBlobHost));
        let resolved = resolver
            .resolve(AssetNamespace::Images, "https://cdn.example/x.png")
            .expect("resolve")
            .expect("some");
        assert!(matches!(resolved, ResolvedResource::Passthrough(_)));
        assert_eq!(resolved.url(), "https://cdn.example/x.png");
    }

    #[test]
    fn passthrough_drops_leading_whitespace() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        let resolver = ResourceResolver::new(store, Arc::new(MemoryBlobHost));
        let resolved = resolver
            .resolve(AssetNamespace::Images, "  \thttps://cdn.example/x.png")
            .expect("resolve")
            .expect("some");
        assert_eq!(resolved.url(), "https://cdn.example/x.png");
    }

    #[test]
    fn media_resolves_to_data_url() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        store
            .put(AssetNamespace::Images, &AssetRecord::new("token.png", "iVBORw=="))
            .expect("put");
        let resolver = ResourceResolver::new(store, Arc::new(MemoryBlobHost));
        let resolved = resolver
            .resolve(AssetNamespace::Images, "token.png")
            .expect("resolve")
            .expect("some");
        assert_eq!(resolved.url(), "data:image/png;base64,iVBORw==");
        assert!(resolver
            .resolve(AssetNamespace::Images, "missing.png")
            .expect("resolve")
            .is_none());
    }

    #[test]
    fn pdf_materializes_to_file_blob() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let resolver = ResourceResolver::new(
            store_with_pdf(),
            Arc::new(TempDirBlobHost::in_dir(dir.path())),
        );
        let resolved = resolver
            .resolve(AssetNamespace::Images, "map.pdf")
            .expect("resolve")
            .expect("some");
        let ResolvedResource::Blob(blob) = resolved else {
            panic!("expected blob handle");
        };
        assert!(blob.url().starts_with("file://"));
        assert_eq!(blob.content_type(), mime::PDF);
        let path = blob.path().expect("file backed").to_path_buf();
        assert_eq!(std::fs::read(&path).expect("read"), b"%PDF-1.4 test");
        blob.release().expect("release");
        assert!(!path.exists());
    }

    #[test]
    fn kept_blob_file_survives_the_handle() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let host = TempDirBlobHost::in_dir(dir.path());
        let blob = host
            .materialize(b"%PDF", mime::PDF, "map.pdf")
            .expect("materialize");
        let path = blob.keep().expect("keep").expect("file backed");
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));

        let memory = MemoryBlobHost
            .materialize(b"%PDF", mime::PDF, "map.pdf")
            .expect("materialize");
        assert!(memory.keep().expect("keep").is_none());
    }

    #[test]
    fn each_resolve_yields_an_independent_handle() {
        let resolver = ResourceResolver::new(store_with_pdf(), Arc::new(MemoryBlobHost));
        let first = resolver.resolve(AssetNamespace::Images, "map.pdf").unwrap().unwrap();
        let second = resolver.resolve(AssetNamespace::Images, "map.pdf").unwrap().unwrap();
        assert_ne!(first.url(), second.url());
    }

    #[test]
    fn pdf_falls_back_to_data_url_when_host_fails() {
        let resolver = ResourceResolver::new(store_with_pdf(), Arc::new(RefusingHost));
        let resolved = resolver
            .resolve(AssetNamespace::Images, "map.pdf")
            .expect("resolve")
            .expect("some");
        assert!(resolved.url().starts_with("data:application/pdf;base64,"));
    }

    #[test]
    fn data_namespace_is_not_resolvable() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        store
            .put(AssetNamespace::Data, &AssetRecord::new("locations.json", "[]"))
            .expect("put");
        let resolver = ResourceResolver::new(store, Arc::new(MemoryBlobHost));
        assert!(resolver
            .resolve(AssetNamespace::Data, "locations.json")
            .expect("resolve")
            .is_none());
    }

    #[test]
    fn file_urls_escape_spaces() {
        assert_eq!(
            file_url(Path::new("/tmp/a b/c.pdf")),
            "file:///tmp/a%20b/c.pdf"
        );
    }
}
