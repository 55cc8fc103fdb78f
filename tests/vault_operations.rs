mod common;

use campaign_vault::assets::{AssetNamespace, AssetVault, ResolvedResource};
use campaign_vault::config::Config;
use common::temp_vault;

#[tokio::test]
async fn add_replace_and_delete() {
    let vault = temp_vault();
    assert!(!vault.has_assets(AssetNamespace::Images).await);

    let added = vault.add_asset(AssetNamespace::Images, "map.png", b"v1").await;
    assert!(added.success, "{}", added.message);
    assert!(vault.add_asset(AssetNamespace::Images, "map.png", b"v2").await.success);

    let assets = vault.list_assets(AssetNamespace::Images).await;
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].content_type, "image/png");
    let record = vault
        .store()
        .get(AssetNamespace::Images, "map.png")
        .expect("get")
        .expect("present");
    assert_eq!(record.payload, "djI=");

    assert!(vault.delete_asset(AssetNamespace::Images, "map.png").await.success);
    let again = vault.delete_asset(AssetNamespace::Images, "map.png").await;
    assert!(!again.success);
    assert!(again.message.contains("not found"));
    assert!(!vault.has_assets(AssetNamespace::Images).await);
}

#[tokio::test]
async fn namespaces_are_independent() {
    let vault = temp_vault();
    assert!(vault.add_asset(AssetNamespace::Audio, "theme.png", b"a").await.success);
    assert!(vault.add_asset(AssetNamespace::Images, "theme.png", b"b").await.success);
    assert!(vault.delete_asset(AssetNamespace::Audio, "theme.png").await.success);
    assert!(vault.has_assets(AssetNamespace::Images).await);
}

#[tokio::test]
async fn invalid_input_is_rejected_without_writing() {
    let vault = temp_vault();
    assert!(!vault.add_asset(AssetNamespace::Images, "", b"x").await.success);
    assert!(!vault
        .add_asset(AssetNamespace::Images, "../map.png", b"x")
        .await
        .success);
    let bad_json = vault
        .add_asset(AssetNamespace::Data, "npcs.json", b"{not json")
        .await;
    assert!(!bad_json.success);
    assert!(bad_json.message.contains("not valid JSON"));
    for ns in AssetNamespace::ALL {
        assert!(!vault.has_assets(ns).await);
    }
}

#[tokio::test]
async fn clear_all_empties_every_namespace() {
    let vault = temp_vault();
    assert!(vault.add_asset(AssetNamespace::Audio, "a.mp3", b"a").await.success);
    assert!(vault.add_asset(AssetNamespace::Images, "b.gif", b"b").await.success);
    assert!(vault.save_json_text("c.json", "{}").await.success);

    let result = vault.clear_all_assets().await;
    assert!(result.success);
    assert_eq!(result.message, "Removed 3 asset(s)");
    for ns in AssetNamespace::ALL {
        assert!(vault.list_assets(ns).await.is_empty());
    }
}

#[tokio::test]
async fn stats_count_records_and_payload_bytes() {
    let vault = temp_vault();
    let empty = vault.stats().await.expect("stats");
    assert_eq!(empty.records.total(), 0);
    assert!(empty.latest_write.is_none());

    assert!(vault.add_asset(AssetNamespace::Audio, "a.mp3", b"abc").await.success);
    assert!(vault.save_json_text("c.json", "[1]").await.success);
    let stats = vault.stats().await.expect("stats");
    assert_eq!(stats.records.audio, 1);
    assert_eq!(stats.records.data, 1);
    assert_eq!(stats.payload_bytes.audio, 4);
    assert_eq!(stats.payload_bytes.data, 3);
    assert!(stats.latest_write.is_some());
}

#[tokio::test]
async fn vault_opens_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::default();
    let db_path = dir.path().join("vault");
    config.storage.db_path = db_path.to_string_lossy().into_owned();
    config.storage.write_chunk_size = 2;
    config.blobs.dir = Some(dir.path().join("blobs"));

    let vault = AssetVault::from_config(&config).expect("open");
    assert!(db_path.exists());
    assert!(vault.add_asset(AssetNamespace::Images, "map.pdf", b"%PDF").await.success);
    let resolved = vault
        .resolve_url(AssetNamespace::Images, "map.pdf")
        .await
        .expect("resolved");
    let ResolvedResource::Blob(blob) = resolved else {
        panic!("expected blob handle");
    };
    let path = blob.path().expect("file backed");
    assert!(path.starts_with(dir.path().join("blobs")));
}
