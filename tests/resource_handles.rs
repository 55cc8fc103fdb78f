mod common;

use std::sync::Arc;

use campaign_vault::assets::{
    AssetNamespace, AssetStoreBuilder, AssetVault, ResolvedResource, TempDirBlobHost, VaultOptions,
};
use common::temp_vault;

#[tokio::test]
async fn map_pdf_resolves_to_disposable_file_handle() {
    let blob_dir = tempfile::tempdir().expect("tempdir");
    let store = AssetStoreBuilder::temporary().open().expect("store");
    let vault = AssetVault::with_options(
        store,
        Arc::new(TempDirBlobHost::in_dir(blob_dir.path())),
        VaultOptions::default(),
    );
    let pdf = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF";
    assert!(vault.add_asset(AssetNamespace::Images, "map.pdf", pdf).await.success);

    let first = vault
        .resolve_url(AssetNamespace::Images, "map.pdf")
        .await
        .expect("resolved");
    let second = vault
        .resolve_url(AssetNamespace::Images, "map.pdf")
        .await
        .expect("resolved");
    let (ResolvedResource::Blob(first), ResolvedResource::Blob(second)) = (first, second) else {
        panic!("expected blob handles for a PDF");
    };
    assert_ne!(first.url(), second.url());
    assert!(first.url().starts_with("file://"));
    assert_eq!(first.content_type(), "application/pdf");

    let path = first.path().expect("file backed").to_path_buf();
    assert_eq!(std::fs::read(&path).expect("read"), pdf);
    first.release().expect("release");
    assert!(!path.exists());

    let other = second.path().expect("file backed").to_path_buf();
    drop(second);
    assert!(!other.exists());
}

#[tokio::test]
async fn media_resolves_to_data_url_and_urls_pass_through() {
    let vault = temp_vault();
    assert!(vault
        .add_asset(AssetNamespace::Audio, "rain.ogg", b"OggS")
        .await
        .success);

    let resolved = vault
        .resolve_url(AssetNamespace::Audio, "rain.ogg")
        .await
        .expect("resolved");
    assert!(!resolved.is_blob());
    assert_eq!(resolved.url(), "data:audio/ogg;base64,T2dnUw==");

    let remote = vault
        .resolve_url(AssetNamespace::Audio, "https://example.com/rain.ogg")
        .await
        .expect("passthrough");
    assert_eq!(remote.url(), "https://example.com/rain.ogg");

    assert!(vault
        .resolve_url(AssetNamespace::Audio, "missing.ogg")
        .await
        .is_none());
}

#[tokio::test]
async fn export_handle_describes_the_archive() {
    let vault = temp_vault();
    assert!(vault
        .add_asset(AssetNamespace::Images, "map.png", b"PNG")
        .await
        .success);
    let archive = vault.export_archive().await.archive.expect("archive");
    let handle = archive.handle.expect("handle");
    assert!(handle.url().starts_with("blob:campaign-vault/"));
    assert_eq!(handle.size(), archive.bytes.len());
    assert_eq!(handle.bytes(), Some(archive.bytes.as_slice()));
}
