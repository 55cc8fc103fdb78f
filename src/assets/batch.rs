//! Chunked replacement of a whole namespace.
//!
//! `write_all` clears the namespace in one transaction, then writes the new
//! records in fixed-size chunks, each in its own transaction, yielding to the
//! runtime between chunks. A failure part-way leaves the namespace partially
//! populated: chunks already committed stay committed.

use std::time::Duration;

use log::{debug, info};

use crate::assets::errors::AssetError;
use crate::assets::storage::AssetStore;
use crate::assets::types::{AssetNamespace, AssetRecord};

/// Records per write transaction. Tunable; never derived from input size.
pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 8;

pub struct BatchedWriter {
    store: AssetStore,
    chunk_size: usize,
    pause: Duration,
}

impl BatchedWriter {
    pub fn new(store: AssetStore) -> Self {
        Self {
            store,
            chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
            pause: Duration::ZERO,
        }
    }

    /// Records per chunk; zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Extra sleep between chunks on top of the cooperative yield.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Replace the contents of `namespace` with `records`. Returns the number
    /// of records written.
    pub async fn write_all(
        &self,
        namespace: AssetNamespace,
        records: &[AssetRecord],
    ) -> Result<usize, AssetError> {
        let removed = self.store.clear(namespace)?;
        debug!("cleared {} record(s) from {}", removed, namespace);
        self.cooperate().await;

        let total_chunks = records.len().div_ceil(self.chunk_size);
        let mut written = 0usize;
        for (index, chunk) in records.chunks(self.chunk_size).enumerate() {
            written += self.store.put_batch(namespace, chunk)?;
            debug!(
                "{}: committed chunk {}/{} ({} record(s))",
                namespace,
                index + 1,
                total_chunks,
                chunk.len()
            );
            self.cooperate().await;
        }

        self.store.flush_async().await?;
        info!("{}: wrote {} record(s) in {} chunk(s)", namespace, written, total_chunks);
        Ok(written)
    }

    async fn cooperate(&self) {
        tokio::task::yield_now().await;
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::storage::AssetStoreBuilder;

    fn records(count: usize) -> Vec<AssetRecord> {
        (0..count)
            .map(|i| AssetRecord::new(format!("track_{:04}.ogg", i), "T2dnUw=="))
            .collect()
    }

    #[tokio::test]
    async fn replaces_existing_namespace_contents() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        store
            .put(AssetNamespace::Audio, &AssetRecord::new("old.mp3", "AAAA"))
            .expect("put");
        store
            .put(AssetNamespace::Images, &AssetRecord::new("keep.png", "AAAA"))
            .expect("put");

        let writer = BatchedWriter::new(store.clone()).with_chunk_size(3);
        let written = writer
            .write_all(AssetNamespace::Audio, &records(10))
            .await
            .expect("write");
        assert_eq!(written, 10);

        let audio = store.list(AssetNamespace::Audio).expect("list");
        assert_eq!(audio.len(), 10);
        assert!(audio.iter().all(|r| r.name != "old.mp3"));
        assert!(store.get(AssetNamespace::Images, "keep.png").expect("get").is_some());
    }

    #[tokio::test]
    async fn chunk_size_is_not_observable_in_final_state() {
        let input = records(25);
        let mut snapshots = Vec::new();
        for chunk_size in [1, 7, 25, 100] {
            let store = AssetStoreBuilder::temporary().open().expect("store");
            BatchedWriter::new(store.clone())
                .with_chunk_size(chunk_size)
                .write_all(AssetNamespace::Audio, &input)
                .await
                .expect("write");
            snapshots.push(store.list(AssetNamespace::Audio).expect("list"));
        }
        assert!(snapshots.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(snapshots[0].len(), 25);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_clamped() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        let writer = BatchedWriter::new(store.clone()).with_chunk_size(0);
        assert_eq!(writer.chunk_size(), 1);
        writer
            .write_all(AssetNamespace::Audio, &records(2))
            .await
            .expect("write");
        assert_eq!(store.list(AssetNamespace::Audio).expect("list").len(), 2);
    }

    #[tokio::test]
    async fn empty_input_clears_namespace() {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        store
            .put(AssetNamespace::Audio, &AssetRecord::new("old.mp3", "AAAA"))
            .expect("put");
        let written = BatchedWriter::new(store.clone())
            .write_all(AssetNamespace::Audio, &[])
            .await
            .expect("write");
        assert_eq!(written, 0);
        assert!(!store.exists(AssetNamespace::Audio).expect("exists"));
    }
}
