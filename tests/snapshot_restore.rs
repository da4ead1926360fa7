mod common;

use ccr_desktop::config::{DirectConfig, RouterRole};
use ccr_desktop::error::{ConfigError, Side};
use ccr_desktop::events::AppEvent;
use ccr_desktop::ErrorKind;
use common::{direct_config_json, TestHome};
use serde_json::json;

fn seeded_home() -> TestHome {
    let home = TestHome::with_router();
    home.write_json(&home.paths.direct_config(), &direct_config_json());
    home
}

#[tokio::test]
async fn snapshot_projects_both_documents() {
    let home = seeded_home();
    let snapshot = home.context().snapshots.create_snapshot().await.unwrap();

    let ccr = &snapshot.ccr_config;
    assert_eq!(ccr.providers.len(), 2);
    assert_eq!(ccr.providers[1].name, "deepseek");
    assert_eq!(ccr.providers[1].models, vec!["deepseek-chat", "deepseek-reasoner"]);
    assert_eq!(ccr.router.default, "openrouter,anthropic/claude-sonnet-4");
    assert_eq!(ccr.router.think, "deepseek,deepseek-reasoner");
    assert_eq!(ccr.router.background, "");
    assert_eq!(ccr.router.long_context_threshold, 60000);

    assert_eq!(snapshot.direct_config.direct_configs.len(), 2);
    assert_eq!(snapshot.direct_config.direct_configs[1].api_key, "sk-work");
    assert!(snapshot.timestamp.ends_with('Z'));

    // Provider secrets never enter a snapshot.
    let value = serde_json::to_value(&snapshot).unwrap();
    assert!(value["ccrConfig"]["providers"][0].get("api_key").is_none());
}

#[tokio::test]
async fn snapshot_failure_names_the_side() {
    let home = TestHome::with_router();
    let err = home.context().snapshots.create_snapshot().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ConfigError::Side { side: Side::Direct, .. }));
    assert!(err.to_string().contains("direct config"));
}

#[tokio::test]
async fn restore_brings_back_snapshotted_state() {
    let home = seeded_home();
    let ctx = home.context();
    let snapshot = ctx.snapshots.create_snapshot().await.unwrap();

    ctx.router.delete_provider("deepseek").await.unwrap();
    ctx.router
        .update_route(RouterRole::Think, "")
        .await
        .unwrap();
    ctx.direct.save(&DirectConfig::default()).await.unwrap();

    let mut events = ctx.events.subscribe();
    ctx.snapshots.restore_from_snapshot(&snapshot).await.unwrap();
    assert_eq!(events.try_recv().unwrap(), AppEvent::RouterConfigChanged);
    assert_eq!(events.try_recv().unwrap(), AppEvent::DirectConfigChanged);

    let router = ctx.router.read_config().await.unwrap();
    assert_eq!(router.providers.len(), 2);
    assert_eq!(router.router.route(RouterRole::Think), "deepseek,deepseek-reasoner");
    assert_eq!(router.router.long_context_threshold, Some(60000));
    // Restored providers carry only name and models.
    assert_eq!(router.providers[0].api_key, None);
    assert_eq!(router.providers[0].api_base_url, None);

    let raw = home.read_json(&home.paths.router_config());
    assert_eq!(raw["LOG"], true);

    let direct = ctx.direct.read().await.unwrap();
    assert_eq!(direct.direct_configs.len(), 2);
    assert_eq!(direct.find("work").unwrap().api_key, "sk-work");
}

#[tokio::test]
async fn failed_restore_leaves_both_files_untouched() {
    let home = seeded_home();
    let ctx = home.context();
    let snapshot = ctx.snapshots.create_snapshot().await.unwrap();

    // A directory where the direct config should be makes its commit fail
    // after the router config was already replaced.
    let direct_path = home.paths.direct_config();
    std::fs::remove_file(&direct_path).unwrap();
    std::fs::create_dir(&direct_path).unwrap();

    let router_path = home.paths.router_config();
    let before = std::fs::read(&router_path).unwrap();

    let err = ctx
        .snapshots
        .restore_from_snapshot(&snapshot)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Side { side: Side::Direct, .. }));

    assert_eq!(std::fs::read(&router_path).unwrap(), before);
    assert!(direct_path.is_dir());

    let leftovers: Vec<_> = std::fs::read_dir(router_path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["config.json".to_string()]);
}

#[tokio::test]
async fn restore_from_backup_file_requires_a_snapshot() {
    let home = seeded_home();
    let ctx = home.context();

    let empty = home.path().join("empty-backup.json");
    home.write_json(&empty, &json!({"version": "1.0", "backupSnapshot": {"ccrConfig": null}}));
    let err = ctx
        .snapshots
        .restore_from_backup_file(&empty)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let snapshot = ctx.snapshots.create_snapshot().await.unwrap();
    let backup = home.path().join("backup.json");
    home.write_json(
        &backup,
        &json!({"version": "1.0", "backupSnapshot": serde_json::to_value(&snapshot).unwrap()}),
    );

    ctx.router.delete_provider("openrouter").await.unwrap();
    let restored = ctx
        .snapshots
        .restore_from_backup_file(&backup)
        .await
        .unwrap();
    assert_eq!(restored.timestamp, snapshot.timestamp);

    let router = ctx.router.read_config().await.unwrap();
    assert!(router.provider("openrouter").is_some());
    assert_eq!(router.router.default, "openrouter,anthropic/claude-sonnet-4");
}
