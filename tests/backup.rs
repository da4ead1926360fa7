//! Local and WebDAV backups against a mock server.

mod common;

use ccr_desktop::backup::{BackupLocation, BackupOptions, BACKUP_PREFIX};
use ccr_desktop::config::WebDavPatch;
use ccr_desktop::AppContext;
use ccr_desktop::ErrorKind;
use common::mock_webdav::{DavEntry, MockResponse, MockWebDav};
use common::{direct_config_json, TestHome};
use serde_json::{json, Value};

fn seeded_home() -> TestHome {
    let home = TestHome::with_router();
    home.write_json(&home.paths.direct_config(), &direct_config_json());
    home
}

async fn configure_webdav(ctx: &AppContext, mock: &MockWebDav, remote_path: Option<&str>) {
    ctx.webdav
        .set(WebDavPatch {
            server: Some(mock.server_url()),
            username: Some("alice".into()),
            password: Some("secret".into()),
            remote_path: remote_path.map(String::from),
        })
        .await
        .unwrap();
}

fn webdav_options() -> BackupOptions {
    BackupOptions {
        use_webdav: true,
        update_snapshot: true,
    }
}

#[tokio::test]
async fn local_backup_embeds_fresh_snapshot() {
    let home = seeded_home();
    let ctx = home.context();

    let outcome = ctx.backups.backup(BackupOptions::default()).await.unwrap();
    assert!(outcome.file_name.starts_with(BACKUP_PREFIX));
    assert!(outcome.file_name.ends_with(".json"));
    assert!(!outcome.file_name.contains(':'));

    let BackupLocation::Local { path } = &outcome.location else {
        panic!("expected a local backup, got {:?}", outcome.location);
    };
    assert_eq!(path.parent().unwrap(), home.paths.backups_dir());

    let written = home.read_json(path);
    let snapshot = &written["backupSnapshot"];
    assert_eq!(snapshot["ccrConfig"]["providers"][0]["name"], "openrouter");
    assert_eq!(snapshot["directConfig"]["directConfigs"][1]["name"], "work");
    assert!(snapshot["timestamp"].is_string());
}

#[tokio::test]
async fn snapshot_failure_does_not_abort_backup() {
    let home = TestHome::new();
    let ctx = home.context();

    let outcome = ctx.backups.backup(BackupOptions::default()).await.unwrap();
    let BackupLocation::Local { path } = &outcome.location else {
        panic!("expected a local backup");
    };
    let written = home.read_json(path);
    assert_eq!(written["backupSnapshot"]["ccrConfig"], Value::Null);
    assert_eq!(written["version"], "1.0");
}

#[tokio::test]
async fn webdav_backup_uploads_into_existing_directory() {
    let home = seeded_home();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    configure_webdav(&ctx, &mock, None).await;

    mock.enqueue(MockResponse::multistatus(&[DavEntry::dir("/dav/ccr-backups/")]))
        .await;
    mock.enqueue(MockResponse::status(201)).await;

    let outcome = ctx.backups.backup(webdav_options()).await.unwrap();

    let requests = mock.captured_requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "PROPFIND");
    assert_eq!(requests[0].path, "/dav/ccr-backups");
    assert_eq!(requests[0].header("depth"), Some("0"));
    assert_eq!(requests[0].header("authorization"), Some("Basic YWxpY2U6c2VjcmV0"));

    assert_eq!(requests[1].method, "PUT");
    assert_eq!(
        requests[1].path,
        format!("/dav/ccr-backups/{}", outcome.file_name)
    );
    let uploaded: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        uploaded["backupSnapshot"]["ccrConfig"]["router"]["default"],
        "openrouter,anthropic/claude-sonnet-4"
    );
    assert!(!uploaded["lastModified"].as_str().unwrap().is_empty());

    assert_eq!(
        outcome.location,
        BackupLocation::WebDav {
            url: format!("{}/ccr-backups/{}", mock.server_url(), outcome.file_name)
        }
    );
}

#[tokio::test]
async fn missing_remote_directory_is_created_segment_by_segment() {
    let home = seeded_home();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    configure_webdav(&ctx, &mock, Some("/team/ccr")).await;

    mock.enqueue(MockResponse::status(404)).await;
    mock.enqueue(MockResponse::status(201)).await;
    // Already there: servers answer MKCOL on an existing collection with 405.
    mock.enqueue(MockResponse::status(405)).await;
    mock.enqueue(MockResponse::status(201)).await;

    ctx.backups.backup(webdav_options()).await.unwrap();

    let calls: Vec<(String, String)> = mock
        .captured_requests()
        .await
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], ("PROPFIND".to_string(), "/dav/team/ccr".to_string()));
    assert_eq!(calls[1], ("MKCOL".to_string(), "/dav/team".to_string()));
    assert_eq!(calls[2], ("MKCOL".to_string(), "/dav/team/ccr".to_string()));
    assert_eq!(calls[3].0, "PUT");
    assert!(calls[3].1.starts_with("/dav/team/ccr/ccr-desktop-backup-"));
}

#[tokio::test]
async fn failed_upload_is_a_remote_error() {
    let home = seeded_home();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    configure_webdav(&ctx, &mock, None).await;

    mock.enqueue(MockResponse::multistatus(&[])).await;
    mock.enqueue(MockResponse::status(507)).await;

    let err = ctx.backups.backup(webdav_options()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteError);
    assert!(matches!(
        err,
        ccr_desktop::ConfigError::Remote {
            status: Some(507),
            ..
        }
    ));
}

#[tokio::test]
async fn incomplete_webdav_config_is_rejected_before_any_request() {
    let home = seeded_home();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    ctx.webdav
        .set(WebDavPatch {
            server: Some(mock.server_url()),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = ctx.backups.backup(webdav_options()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(mock.captured_requests().await.is_empty());
}

#[tokio::test]
async fn remote_listing_filters_and_sorts_newest_first() {
    let home = TestHome::new();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    configure_webdav(&ctx, &mock, None).await;

    mock.enqueue(MockResponse::multistatus(&[
        DavEntry::dir("/dav/ccr-backups/"),
        DavEntry::file(
            "/dav/ccr-backups/ccr-desktop-backup-2024-01-01T00-00-00-000Z.json",
            120,
            "Mon, 01 Jan 2024 00:00:05 GMT",
        ),
        DavEntry::file("/dav/ccr-backups/notes.txt", 3, "Fri, 01 Mar 2024 00:00:00 GMT"),
        DavEntry::file(
            "/dav/ccr-backups/ccr-desktop-backup-2024-02-01T00-00-00-000Z.json",
            140,
            "Thu, 01 Feb 2024 00:00:05 GMT",
        ),
        DavEntry::dir("/dav/ccr-backups/ccr-desktop-backup-archive.json/"),
        DavEntry::file("/dav/ccr-backups/other-backup.json", 10, "Fri, 01 Mar 2024 00:00:00 GMT"),
    ]))
    .await;

    let backups = ctx.backups.list_remote_backups().await.unwrap();
    let names: Vec<&str> = backups.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ccr-desktop-backup-2024-02-01T00-00-00-000Z.json",
            "ccr-desktop-backup-2024-01-01T00-00-00-000Z.json",
        ]
    );
    assert_eq!(backups[0].size, 140);
    assert_eq!(
        backups[0].path,
        "/ccr-backups/ccr-desktop-backup-2024-02-01T00-00-00-000Z.json"
    );

    let requests = mock.captured_requests().await;
    assert_eq!(requests[0].method, "PROPFIND");
    assert_eq!(requests[0].header("depth"), Some("1"));
}

#[tokio::test]
async fn restore_from_remote_replaces_app_config() {
    let home = TestHome::new();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    configure_webdav(&ctx, &mock, None).await;
    ctx.unified.read().await.unwrap();

    let remote = json!({
        "version": "1.0",
        "lastModified": "2024-02-01T00:00:00.000Z",
        "appSettings": {"networkMode": "direct", "autoBackup": true, "backupInterval": 6}
    });
    mock.enqueue(MockResponse::json(&remote.to_string())).await;

    let path = "/ccr-backups/ccr-desktop-backup-2024-02-01T00-00-00-000Z.json";
    let restored = ctx.backups.restore_from_remote(path).await.unwrap();
    assert!(restored.app_settings.auto_backup);

    let current = ctx.unified.read().await.unwrap();
    assert_eq!(current.app_settings.backup_interval, 6);
    assert_eq!(current.last_modified, "2024-02-01T00:00:00.000Z");

    let requests = mock.captured_requests().await;
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, format!("/dav{}", path));
}

#[tokio::test]
async fn restore_from_remote_rejects_invalid_json() {
    let home = TestHome::new();
    let ctx = home.context();
    let mock = MockWebDav::start().await;
    configure_webdav(&ctx, &mock, None).await;
    let before = ctx.unified.read().await.unwrap();

    mock.enqueue(MockResponse::json("<html>login</html>")).await;
    let err = ctx
        .backups
        .restore_from_remote("/ccr-backups/x.json")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseError);
    assert_eq!(ctx.unified.read().await.unwrap(), before);
}

#[tokio::test]
async fn legacy_backups_are_moved() {
    let home = TestHome::new();
    let ctx = home.context();
    let legacy = home.paths.legacy_backups_dir();
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::write(legacy.join("ccr-desktop-backup-a.json"), "{}").unwrap();
    std::fs::write(legacy.join("ccr-desktop-backup-b.json"), "{\"b\":1}").unwrap();

    let target = home.paths.backups_dir();
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("ccr-desktop-backup-b.json"), "{\"kept\":true}").unwrap();

    let report = ctx.backups.migrate_legacy_backups().await.unwrap();
    assert_eq!(report.copied, vec!["ccr-desktop-backup-a.json".to_string()]);
    assert_eq!(report.already_present, vec!["ccr-desktop-backup-b.json".to_string()]);
    assert!(report.failed.is_empty());
    assert!(report.removed_legacy_dir);
    assert!(!legacy.exists());

    assert!(target.join("ccr-desktop-backup-a.json").exists());
    let kept = home.read_json(&target.join("ccr-desktop-backup-b.json"));
    assert_eq!(kept["kept"], true);
}

#[tokio::test]
async fn legacy_dir_with_other_files_is_kept() {
    let home = TestHome::new();
    let ctx = home.context();
    let legacy = home.paths.legacy_backups_dir();
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::write(legacy.join("old.json"), "{}").unwrap();
    std::fs::write(legacy.join("README"), "keep me").unwrap();

    let report = ctx.backups.migrate_legacy_backups().await.unwrap();
    assert_eq!(report.copied, vec!["old.json".to_string()]);
    assert!(!report.removed_legacy_dir);
    assert!(legacy.join("README").exists());
    assert!(!legacy.join("old.json").exists());
}

#[tokio::test]
async fn no_legacy_dir_is_a_no_op() {
    let home = TestHome::new();
    let report = home.context().backups.migrate_legacy_backups().await.unwrap();
    assert_eq!(report, Default::default());
    assert!(!home.paths.backups_dir().exists());
}
