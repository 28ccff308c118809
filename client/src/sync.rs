//! Pushes locally written records to the API once it is reachable again.
//!
//! Only `pending` records are touched. A temporary id is replaced by the id
//! the API assigns; a record the API reports missing, or rejects, becomes a
//! `conflict` and is left for the user to resolve.

use tracing::{info, warn};

use crate::api::{ApiError, UserApi};
use crate::cache::{CacheError, CachedUser, SyncState, UserCache};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub conflicts: usize,
    pub still_pending: usize,
}

pub async fn reconcile(api: &dyn UserApi, cache: &UserCache) -> Result<SyncReport, CacheError> {
    let mut report = SyncReport::default();
    let Some(mut users) = cache.load()? else {
        return Ok(report);
    };

    for user in users.iter_mut().filter(|u| u.sync == SyncState::Pending) {
        let temporary = user.is_temporary();
        let result = if temporary {
            api.create(&user.fields).await
        } else {
            api.update(&user.id, &user.fields).await
        };

        match result {
            Ok(remote) => {
                info!(local = %user.id, remote = %remote.id, "pending user synced");
                *user = CachedUser::synced(remote);
                if temporary {
                    report.created += 1;
                } else {
                    report.updated += 1;
                }
            }
            Err(e @ (ApiError::NotFound(_) | ApiError::Validation(_))) => {
                warn!(error = %e, id = %user.id, "API refused pending user");
                user.sync = SyncState::Conflict;
                report.conflicts += 1;
            }
            Err(e) => {
                warn!(error = %e, id = %user.id, "pending user not synced");
                report.still_pending += 1;
            }
        }
    }

    cache.replace(&users)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeApi, fields};

    #[tokio::test]
    async fn empty_cache_is_a_no_op() {
        let api = FakeApi::online();
        let report = reconcile(&api, &UserCache::in_memory()).await.unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn temporary_records_get_server_ids() {
        let api = FakeApi::online();
        let cache = UserCache::in_memory();
        cache
            .replace(&[CachedUser::pending("temp_5".into(), fields("Ann"))])
            .unwrap();

        let report = reconcile(&api, &cache).await.unwrap();

        assert_eq!(report.created, 1);
        let users = cache.load().unwrap().unwrap();
        assert_eq!(users.len(), 1);
        assert!(!users[0].is_temporary());
        assert_eq!(users[0].id, api.stored()[0].id);
        assert_eq!(users[0].sync, SyncState::Synced);
    }

    #[tokio::test]
    async fn pending_edits_are_pushed() {
        let api = FakeApi::online();
        let stored = api.seed(fields("Ann"));
        let mut edited = CachedUser::synced(stored.clone());
        edited.fields.name = "Annie".into();
        edited.sync = SyncState::Pending;
        let cache = UserCache::in_memory();
        cache.replace(&[edited]).unwrap();

        let report = reconcile(&api, &cache).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(api.stored()[0].fields.name, "Annie");
    }

    #[tokio::test]
    async fn missing_remote_record_is_a_conflict() {
        let api = FakeApi::online();
        let cache = UserCache::in_memory();
        let mut orphan = CachedUser::pending("srv404".into(), fields("Ann"));
        orphan.sync = SyncState::Pending;
        cache.replace(&[orphan]).unwrap();

        let report = reconcile(&api, &cache).await.unwrap();

        assert_eq!(report.conflicts, 1);
        assert_eq!(cache.load().unwrap().unwrap()[0].sync, SyncState::Conflict);
    }

    #[tokio::test]
    async fn unreachable_api_leaves_records_pending() {
        let api = FakeApi::offline();
        let cache = UserCache::in_memory();
        let local = CachedUser::pending("temp_5".into(), fields("Ann"));
        cache.replace(&[local.clone()]).unwrap();

        let report = reconcile(&api, &cache).await.unwrap();

        assert_eq!(report.still_pending, 1);
        assert_eq!(cache.load().unwrap().unwrap(), vec![local]);
    }
}
