//! Whole-document JSON access to the `data` namespace.
//!
//! Writes always store pretty-printed raw JSON text. Reads accept the
//! current raw form and both legacy base64 forms (see
//! [`codec::decode_json_text`]).

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::assets::codec::{self, DocumentEncoding};
use crate::assets::errors::AssetError;
use crate::assets::mime;
use crate::assets::storage::AssetStore;
use crate::assets::types::{AssetNamespace, AssetRecord};
use crate::logutil::escape_log;
use crate::validation::validate_asset_name;

#[derive(Clone)]
pub struct DocumentStore {
    store: AssetStore,
}

impl DocumentStore {
    pub fn new(store: AssetStore) -> Self {
        Self { store }
    }

    /// Read and parse a document. Missing documents and documents that fail
    /// every decode attempt both yield `None`; the latter is logged.
    pub fn read_document<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let record = match self.store.get(AssetNamespace::Data, name) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                error!("failed to load document {}: {}", escape_log(name), e);
                return None;
            }
        };

        let Some((text, encoding)) = codec::decode_json_text(&record.payload) else {
            error!(
                "document {} is neither raw JSON nor decodable base64",
                escape_log(name)
            );
            return None;
        };
        if encoding != DocumentEncoding::RawText {
            debug!("document {} read from legacy {:?} layout", escape_log(name), encoding);
        }

        match serde_json::from_str::<T>(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(
                    "document {} does not match the expected shape: {}",
                    escape_log(name),
                    e
                );
                None
            }
        }
    }

    /// Serialize `value` as pretty-printed JSON and store it as raw text.
    pub fn write_document<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), AssetError> {
        let text = serde_json::to_string_pretty(value)?;
        self.put_text(name, text)
    }

    /// Store hand-edited JSON text after checking that it parses.
    pub fn save_json_text(&self, name: &str, text: &str) -> Result<(), AssetError> {
        if let Err(e) = serde_json::from_str::<serde_json::Value>(text) {
            warn!("rejected invalid JSON for {}: {}", escape_log(name), e);
            return Err(AssetError::Validation(format!("invalid JSON: {}", e)));
        }
        self.put_text(name, text.to_string())
    }

    fn put_text(&self, name: &str, text: String) -> Result<(), AssetError> {
        validate_asset_name(name).map_err(|e| AssetError::Validation(e.to_string()))?;
        let record = AssetRecord::new(name, text).with_content_type(mime::JSON);
        self.store.put(AssetNamespace::Data, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::storage::AssetStoreBuilder;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Location {
        id: String,
        name: String,
    }

    fn docs() -> (AssetStore, DocumentStore) {
        let store = AssetStoreBuilder::temporary().open().expect("store");
        (store.clone(), DocumentStore::new(store))
    }

    #[test]
    fn write_stores_pretty_raw_json() {
        let (store, docs) = docs();
        let value = vec![Location {
            id: "tavern".into(),
            name: "Tavern".into(),
        }];
        docs.write_document("locations.json", &value).expect("write");
        let record = store
            .get(AssetNamespace::Data, "locations.json")
            .expect("get")
            .expect("present");
        assert!(record.payload.starts_with('['));
        assert!(record.payload.contains('\n'));
        assert_eq!(record.content_type, mime::JSON);
        let back: Vec<Location> = docs.read_document("locations.json").expect("read");
        assert_eq!(back, value);
    }

    #[test]
    fn missing_document_is_none() {
        let (_, docs) = docs();
        assert!(docs.read_document::<serde_json::Value>("nope.json").is_none());
    }

    #[test]
    fn wrong_shape_is_none() {
        let (_, docs) = docs();
        docs.save_json_text("combat.json", r#"{"round": 3}"#).expect("save");
        assert!(docs.read_document::<Vec<Location>>("combat.json").is_none());
        assert!(docs.read_document::<serde_json::Value>("combat.json").is_some());
    }

    #[test]
    fn invalid_manual_save_changes_nothing() {
        let (store, docs) = docs();
        let err = docs.save_json_text("broken.json", "{oops").unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));
        assert!(store.get(AssetNamespace::Data, "broken.json").expect("get").is_none());
    }

    #[test]
    fn empty_document_name_rejected() {
        let (_, docs) = docs();
        assert!(matches!(
            docs.write_document("", &serde_json::json!({})),
            Err(AssetError::Validation(_))
        ));
    }
}
