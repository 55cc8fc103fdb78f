use std::path::{Path, PathBuf};

use sled::transaction::ConflictableTransactionError;
use sled::{Batch, IVec};

use crate::assets::errors::AssetError;
use crate::assets::types::{AssetNamespace, AssetRecord, VAULT_SCHEMA_VERSION};

const SCHEMA_KEY: &[u8] = b"vault_schema_version";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct AssetStoreBuilder {
    path: Option<PathBuf>,
}

impl AssetStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// In-memory database that disappears when the last handle is dropped.
    pub fn temporary() -> Self {
        Self { path: None }
    }

    pub fn open(self) -> Result<AssetStore, AssetError> {
        let db = match self.path {
            Some(path) => {
                std::fs::create_dir_all(&path)?;
                sled::open(path)?
            }
            None => sled::Config::new().temporary(true).open()?,
        };
        AssetStore::from_db(db)
    }
}

/// Sled-backed persistence for asset records, one tree per namespace.
///
/// The database handle is shared; tree handles are opened per operation and
/// dropped when it returns. Cloning the store shares the same database.
#[derive(Clone)]
pub struct AssetStore {
    db: sled::Db,
}

impl AssetStore {
    /// Open (or create) the asset database rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        AssetStoreBuilder::new(path.as_ref()).open()
    }

    /// Wrap an already-open database, stamping or checking its schema version.
    pub fn from_db(db: sled::Db) -> Result<Self, AssetError> {
        match db.get(SCHEMA_KEY)? {
            Some(found) => {
                let found = found.first().copied().unwrap_or(0);
                if found != VAULT_SCHEMA_VERSION {
                    return Err(AssetError::SchemaMismatch {
                        expected: VAULT_SCHEMA_VERSION,
                        found,
                    });
                }
            }
            None => {
                db.insert(SCHEMA_KEY, vec![VAULT_SCHEMA_VERSION])?;
                db.flush()?;
            }
        }
        Ok(Self { db })
    }

    fn tree(&self, namespace: AssetNamespace) -> Result<sled::Tree, AssetError> {
        Ok(self.db.open_tree(namespace.as_str())?)
    }

    fn serialize(record: &AssetRecord) -> Result<Vec<u8>, AssetError> {
        Ok(bincode::serialize(record)?)
    }

    fn deserialize(bytes: IVec) -> Result<AssetRecord, AssetError> {
        Ok(bincode::deserialize::<AssetRecord>(&bytes)?)
    }

    fn check_name(name: &str) -> Result<(), AssetError> {
        if name.trim().is_empty() {
            return Err(AssetError::Validation("asset name is empty".to_string()));
        }
        Ok(())
    }

    /// Insert or replace a record in one transaction.
    pub fn put(&self, namespace: AssetNamespace, record: &AssetRecord) -> Result<(), AssetError> {
        Self::check_name(&record.name)?;
        let tree = self.tree(namespace)?;
        let bytes = Self::serialize(record)?;
        tree.transaction(|tx| {
            tx.insert(record.name.as_bytes(), bytes.as_slice())?;
            Ok::<_, ConflictableTransactionError<AssetError>>(())
        })?;
        tree.flush()?;
        Ok(())
    }

    /// Insert or replace many records atomically.
    pub fn put_batch(
        &self,
        namespace: AssetNamespace,
        records: &[AssetRecord],
    ) -> Result<usize, AssetError> {
        let tree = self.tree(namespace)?;
        let mut batch = Batch::default();
        for record in records {
            Self::check_name(&record.name)?;
            batch.insert(record.name.as_bytes(), Self::serialize(record)?);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;
        Ok(records.len())
    }

    /// Fetch a record; `None` when absent.
    pub fn get(
        &self,
        namespace: AssetNamespace,
        name: &str,
    ) -> Result<Option<AssetRecord>, AssetError> {
        let tree = self.tree(namespace)?;
        match tree.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(Self::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// All records of a namespace, ordered by name.
    pub fn list(&self, namespace: AssetNamespace) -> Result<Vec<AssetRecord>, AssetError> {
        let tree = self.tree(namespace)?;
        tree.iter()
            .map(|entry| {
                entry
                    .map_err(AssetError::from)
                    .and_then(|(_key, value)| Self::deserialize(value))
            })
            .collect()
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete(&self, namespace: AssetNamespace, name: &str) -> Result<bool, AssetError> {
        let tree = self.tree(namespace)?;
        let previous = tree.transaction(|tx| {
            let previous = tx.remove(name.as_bytes())?;
            Ok::<_, ConflictableTransactionError<AssetError>>(previous)
        })?;
        tree.flush()?;
        Ok(previous.is_some())
    }

    /// Remove every record in a namespace atomically. Returns the number removed.
    pub fn clear(&self, namespace: AssetNamespace) -> Result<usize, AssetError> {
        let tree = self.tree(namespace)?;
        let mut batch = Batch::default();
        let mut removed = 0usize;
        for key in tree.iter().keys() {
            batch.remove(key?);
            removed += 1;
        }
        tree.apply_batch(batch)?;
        tree.flush()?;
        Ok(removed)
    }

    /// Clear all three namespaces. Each namespace is its own transaction.
    pub fn clear_all(&self) -> Result<usize, AssetError> {
        let mut removed = 0usize;
        for namespace in AssetNamespace::ALL {
            removed += self.clear(namespace)?;
        }
        Ok(removed)
    }

    /// Whether the namespace holds any record. Implemented over `list`.
    pub fn exists(&self, namespace: AssetNamespace) -> Result<bool, AssetError> {
        Ok(!self.list(namespace)?.is_empty())
    }

    /// Flush outstanding writes without blocking the runtime.
    pub async fn flush_async(&self) -> Result<(), AssetError> {
        self.db.flush_async().await?;
        Ok(())
    }
}
