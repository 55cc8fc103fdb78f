//! # Campaign Vault - Asset Storage & Packaging Engine
//!
//! Campaign Vault persists the media and data files of a tabletop campaign
//! (background music, maps, character art, JSON world data) in an embedded
//! sled database, and moves them in and out of the tool as a single zip
//! archive.
//!
//! ## Features
//!
//! - **Namespaced Storage**: Three independent collections (`audio`, `images`, `data`) keyed by file name.
//! - **Archive Import**: Zip archives laid out as `audio/`, `images/`, `data/` replace each present namespace wholesale; bad entries are skipped, not fatal.
//! - **Archive Export**: Every stored record is packed back into the same layout with a SHA-256 checksum.
//! - **Chunked Writes**: Bulk replacement commits in small atomic batches and yields between them.
//! - **Resource Resolution**: External URLs pass through; stored media becomes a data URL; PDFs become a disposable blob handle.
//! - **JSON Documents**: Typed read/write of `data` documents, tolerant of two legacy base64 layouts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use campaign_vault::assets::{AssetNamespace, AssetVault};
//! use campaign_vault::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("vault.toml").await?;
//!     let vault = AssetVault::from_config(&config)?;
//!
//!     let report = vault.import_archive("campaign.zip".as_ref()).await;
//!     println!("{}", report.message);
//!
//!     for asset in vault.list_assets(AssetNamespace::Images).await {
//!         println!("{} ({})", asset.name, asset.content_type);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`assets`] - Storage, archive pipelines, resolver and the [`assets::AssetVault`] facade
//! - [`config`] - Configuration management
//! - [`validation`] - Asset name and archive path validation
//! - [`logutil`] - Log-safe formatting helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     AssetVault                      │
//! ├─────────────────┬─────────────────┬─────────────────┤
//! │ ArchiveImporter │ ArchiveExporter │ResourceResolver │
//! │  BatchedWriter  │                 │  DocumentStore  │
//! ├─────────────────┴─────────────────┴─────────────────┤
//! │            AssetStore (sled, one tree each)         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod assets;
pub mod config;
pub mod logutil;
pub mod validation;
