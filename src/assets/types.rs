use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::assets::errors::AssetError;
use crate::assets::mime;

/// Version marker written into the database root on first open.
pub const VAULT_SCHEMA_VERSION: u8 = 1;

/// One of the three independent asset keyspaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AssetNamespace {
    Audio,
    Images,
    Data,
}

impl AssetNamespace {
    /// All namespaces in archive folder order.
    pub const ALL: [AssetNamespace; 3] = [
        AssetNamespace::Audio,
        AssetNamespace::Images,
        AssetNamespace::Data,
    ];

    /// Sled tree name and archive folder name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetNamespace::Audio => "audio",
            AssetNamespace::Images => "images",
            AssetNamespace::Data => "data",
        }
    }

    /// Archive folder prefix including the trailing slash, e.g. `images/`.
    pub fn folder_prefix(&self) -> String {
        format!("{}/", self.as_str())
    }
}

impl fmt::Display for AssetNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetNamespace {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(AssetNamespace::Audio),
            "images" => Ok(AssetNamespace::Images),
            "data" => Ok(AssetNamespace::Data),
            other => Err(AssetError::Validation(format!(
                "unknown namespace '{}' (expected audio, images or data)",
                other
            ))),
        }
    }
}

/// The sole persisted unit. `payload` is base64 of the original bytes, or raw
/// JSON text for JSON-typed records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRecord {
    pub name: String,
    pub payload: String,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

impl AssetRecord {
    /// Build a record, classifying the content type from the file name.
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        let name = name.into();
        let content_type = mime::classify(&name).to_string();
        Self {
            name,
            payload: payload.into(),
            content_type,
            last_modified: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            last_modified: self.last_modified,
        }
    }
}

/// Listing projection handed to UI collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetSummary {
    pub name: String,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

/// Per-namespace counters used by import/export reports and stats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceCounts {
    pub audio: usize,
    pub images: usize,
    pub data: usize,
}

impl NamespaceCounts {
    pub fn get(&self, namespace: AssetNamespace) -> usize {
        match namespace {
            AssetNamespace::Audio => self.audio,
            AssetNamespace::Images => self.images,
            AssetNamespace::Data => self.data,
        }
    }

    pub fn set(&mut self, namespace: AssetNamespace, value: usize) {
        match namespace {
            AssetNamespace::Audio => self.audio = value,
            AssetNamespace::Images => self.images = value,
            AssetNamespace::Data => self.data = value,
        }
    }

    pub fn total(&self) -> usize {
        self.audio + self.images + self.data
    }
}

impl fmt::Display for NamespaceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} audio, {} images, {} data",
            self.audio, self.images, self.data
        )
    }
}

/// Uniform `{success, message}` shape returned by every public operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Storage statistics for status displays.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct VaultStats {
    pub records: NamespaceCounts,
    pub payload_bytes: NamespaceCounts,
    pub latest_write: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_parses_case_insensitively() {
        assert_eq!("Images".parse::<AssetNamespace>().unwrap(), AssetNamespace::Images);
        assert_eq!(" audio ".parse::<AssetNamespace>().unwrap(), AssetNamespace::Audio);
        assert!(matches!(
            "maps".parse::<AssetNamespace>(),
            Err(AssetError::Validation(_))
        ));
    }

    #[test]
    fn record_classifies_content_type_from_name() {
        let record = AssetRecord::new("Theme.MP3", "AAAA");
        assert_eq!(record.content_type, "audio/mpeg");
        assert_eq!(record.summary().name, "Theme.MP3");
    }

    #[test]
    fn counts_display_and_total() {
        let mut counts = NamespaceCounts::default();
        counts.set(AssetNamespace::Images, 10);
        counts.set(AssetNamespace::Data, 2);
        assert_eq!(counts.total(), 12);
        assert_eq!(counts.to_string(), "0 audio, 10 images, 2 data");
    }
}
