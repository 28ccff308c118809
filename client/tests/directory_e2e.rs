//! End-to-end flows against an in-process backend.

use directory_backend::db::repo;
use directory_backend::{AppState, router};
use directory_client::cache::is_temporary_id;
use directory_client::{
    Directory, FileStorage, FormError, HttpUserApi, ListView, LoadOutcome, SyncState, UserApi,
    UserCache,
};
use directory_model::{Designation, Favorite, Field, Gender};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_backend() -> String {
    let db = repo::connect_in_memory().await.expect("store");
    let app = router(Arc::new(AppState { db }));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{address}/api")
}

/// A URL nothing listens on: bind an ephemeral port, then release it.
async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{address}/api")
}

fn directory(url: &str, cache: UserCache) -> (Directory, Arc<HttpUserApi>) {
    let api = Arc::new(HttpUserApi::new(url).expect("client"));
    (Directory::new(api.clone(), cache), api)
}

fn fill_ann(directory: &Directory) {
    let form = directory.form();
    form.set_name("Ann");
    form.set_gender(Gender::Female);
    form.set_designation(Designation::Developer);
    form.toggle_favorite(Favorite::Music);
}

#[tokio::test]
async fn create_with_api_reachable() {
    let url = spawn_backend().await;
    let (directory, api) = directory(&url, UserCache::in_memory());
    assert_eq!(directory.start().await, LoadOutcome::Network);

    fill_ann(&directory);
    let outcome = directory.submit().await.expect("submit");

    assert!(outcome.saved_remotely());
    assert!(!outcome.user().id.is_empty());
    assert!(!outcome.user().is_temporary());

    let remote = api.list().await.expect("list");
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].fields.name, "Ann");

    match directory.view() {
        ListView::Users(users) => assert_eq!(users[0].id, outcome.user().id),
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn create_with_api_unreachable() {
    let url = dead_url().await;
    let (directory, _) = directory(&url, UserCache::in_memory());
    directory.start().await;

    fill_ann(&directory);
    let outcome = directory.submit().await.expect("submit");

    let id = &outcome.user().id;
    assert!(is_temporary_id(id));
    assert!(id["temp_".len()..].chars().all(|c| c.is_ascii_digit()));
    match directory.view() {
        ListView::Users(users) => assert_eq!(&users[0].id, id),
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn missing_gender_is_blocked() {
    let url = spawn_backend().await;
    let (directory, api) = directory(&url, UserCache::in_memory());
    directory.start().await;

    let form = directory.form();
    form.set_name("Ann");
    form.set_designation(Designation::Developer);
    form.toggle_favorite(Favorite::Music);

    let err = directory.submit().await.unwrap_err();
    assert!(matches!(err, FormError::Invalid(ref e) if e.contains(Field::Gender)));
    assert!(form.errors().contains(Field::Gender));
    assert!(api.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn delete_local_only_record_while_offline() {
    let url = dead_url().await;
    let (directory, _) = directory(&url, UserCache::in_memory());
    directory.start().await;
    fill_ann(&directory);
    let id = directory.submit().await.expect("submit").user().id.clone();

    let outcome = directory.delete(&id).await;

    assert!(outcome.removed);
    assert!(!outcome.deleted_remotely);
    assert!(directory.list().users().is_empty());
}

#[tokio::test]
async fn offline_work_syncs_when_api_returns() {
    let cache_dir = tempfile::tempdir().expect("tempdir");
    let cache = UserCache::new(Arc::new(FileStorage::new(cache_dir.path())));

    let offline_url = dead_url().await;
    let (offline, _) = directory(&offline_url, cache.clone());
    offline.start().await;
    fill_ann(&offline);
    offline.submit().await.expect("submit");

    let url = spawn_backend().await;
    let (online, api) = directory(&url, cache.clone());
    online.start().await;
    let report = online.sync().await;

    assert_eq!(report.created, 1);
    let remote = api.list().await.expect("list");
    assert_eq!(remote.len(), 1);

    let cached = cache.load().expect("cache").expect("entry");
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, remote[0].id);
    assert_eq!(cached[0].sync, SyncState::Synced);
}

#[tokio::test]
async fn api_reports_validation_and_not_found() {
    let url = spawn_backend().await;
    let api = HttpUserApi::new(&url).expect("client");

    let err = api.delete("missing").await.unwrap_err();
    assert!(matches!(err, directory_client::ApiError::NotFound(id) if id == "missing"));

    let bad = directory_model::UserFields {
        name: "  ".into(),
        gender: Gender::Male,
        designation: "Developer".into(),
        favorites: vec!["Music".into()],
    };
    let err = api.create(&bad).await.unwrap_err();
    assert!(matches!(err, directory_client::ApiError::Validation(_)));
}
