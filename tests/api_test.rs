// End-to-end: deployment record -> filesystem cache -> local package file -> host files.

mod common;

use std::sync::Arc;

use love_package_loader::api::loader_api::{is_cached, load_deployed};
use love_package_loader::api::simple::init_tracing;
use love_package_loader::config::LoaderConfig;
use love_package_loader::engine::status::NullStatus;
use love_package_loader::package::deploy::DeployedPackage;

use common::{memory_host, package_bytes};

fn deployment(size: usize, etag: &str) -> DeployedPackage {
    DeployedPackage::from_json(&format!(
        r#"{{"gameFile": "pong.data", "gameSize": {}, "etag": "{}", "prefixUrl": "builds/"}}"#,
        size, etag
    ))
    .unwrap()
}

#[tokio::test]
async fn test_second_load_comes_from_cache() {
    init_tracing();
    let site = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(site.path().join("builds")).unwrap();
    std::fs::write(site.path().join("builds/pong.data"), package_bytes(1000)).unwrap();

    let config = LoaderConfig {
        cache_dir: cache.path().to_path_buf(),
        ..LoaderConfig::default()
    };
    let deployed = deployment(1000, "abc123");
    assert!(!is_cached(&config, &deployed).await);

    let (host, dyn_host) = memory_host();
    let first = load_deployed(&config, &deployed, dyn_host, Arc::new(NullStatus), site.path())
        .await
        .unwrap();
    assert!(!first.from_cache);
    first.cache_write.unwrap().await.unwrap();
    assert_eq!(host.file("/game.love").unwrap().data, package_bytes(1000));
    assert!(is_cached(&config, &deployed).await);

    // The package file is gone; only the cache can serve it now.
    std::fs::remove_file(site.path().join("builds/pong.data")).unwrap();
    let (host, dyn_host) = memory_host();
    let second = load_deployed(&config, &deployed, dyn_host, Arc::new(NullStatus), site.path())
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(host.file("/game.love").unwrap().data, package_bytes(1000));

    // A new build under the same key is stale.
    let rebuilt = deployment(1000, "def456");
    assert!(!is_cached(&config, &rebuilt).await);
}

#[tokio::test]
async fn test_disabled_cache_loads_network_only() {
    let site = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(site.path().join("builds")).unwrap();
    std::fs::write(site.path().join("builds/pong.data"), package_bytes(500)).unwrap();

    let config = LoaderConfig {
        cache_dir: cache.path().to_path_buf(),
        persist_cache: false,
        ..LoaderConfig::default()
    };
    let deployed = deployment(500, "abc123");

    let (_, dyn_host) = memory_host();
    let report = load_deployed(&config, &deployed, dyn_host, Arc::new(NullStatus), site.path())
        .await
        .unwrap();
    assert!(!report.from_cache);
    assert!(report.cache_write.is_none());
    assert!(!is_cached(&config, &deployed).await);
    assert!(!config.db_path().exists());
}

#[tokio::test]
async fn test_missing_package_file_is_an_error() {
    let site = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let config = LoaderConfig {
        cache_dir: cache.path().to_path_buf(),
        ..LoaderConfig::default()
    };

    let (host, dyn_host) = memory_host();
    let result = load_deployed(
        &config,
        &deployment(1000, "abc123"),
        dyn_host,
        Arc::new(NullStatus),
        site.path(),
    )
    .await;
    assert!(result.is_err());
    assert!(host.pending_dependencies().is_empty());
}

#[tokio::test]
async fn test_site_absolute_prefix_resolves_under_local_root() {
    let site = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(site.path().join("games/pong")).unwrap();
    std::fs::write(site.path().join("games/pong/pong.data"), package_bytes(800)).unwrap();

    let config = LoaderConfig {
        cache_dir: cache.path().to_path_buf(),
        ..LoaderConfig::default()
    };
    let deployed = DeployedPackage::from_json(
        r#"{"gameFile": "pong.data", "gameSize": 800, "etag": "abc123", "prefixUrl": "/games/pong/"}"#,
    )
    .unwrap();

    let (host, dyn_host) = memory_host();
    let report = load_deployed(&config, &deployed, dyn_host, Arc::new(NullStatus), site.path())
        .await
        .unwrap();
    assert!(!report.from_cache);
    report.cache_write.unwrap().await.unwrap();
    assert_eq!(host.file("/game.love").unwrap().data, package_bytes(800));
    assert!(host.pending_dependencies().is_empty());
    assert!(is_cached(&config, &deployed).await);
}
