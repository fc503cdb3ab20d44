//! Request-scoped entity factory with per-kind identity caches.
//!
//! Loads entities from the store on first access and serves cached copies
//! afterwards. The caches are local to this factory instance; there is no
//! cross-process coherence. Writers must invalidate the ids they touched
//! so the next read observes fresh state.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::{EntityKind, ModelError, Result};
use crate::model::{Activity, Route, Trackdata};
use crate::store::Store;

/// Cache capacity per entity kind. A request rarely touches more than a
/// handful of rows; the cap only bounds pathological callers.
const CACHE_CAPACITY: usize = 100;

/// Per-account entity loader and cache.
pub struct Factory {
    account_id: i64,
    activities: LruCache<i64, Activity>,
    routes: LruCache<i64, Route>,
    trackdata: LruCache<i64, Trackdata>,
}

impl Factory {
    pub fn new(account_id: i64) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap();
        Self {
            account_id,
            activities: LruCache::new(capacity),
            routes: LruCache::new(capacity),
            trackdata: LruCache::new(capacity),
        }
    }

    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    /// Get an activity by id, loading it on first access.
    pub fn activity(&mut self, store: &Store, id: i64) -> Result<Activity> {
        if let Some(cached) = self.activities.get(&id) {
            return Ok(cached.clone());
        }
        let activity = store
            .load_activity(self.account_id, id)?
            .ok_or(ModelError::NotFound {
                kind: EntityKind::Activity,
                id,
            })?;
        self.activities.put(id, activity.clone());
        Ok(activity)
    }

    /// Get a route by id, loading it on first access.
    pub fn route(&mut self, store: &Store, id: i64) -> Result<Route> {
        if let Some(cached) = self.routes.get(&id) {
            return Ok(cached.clone());
        }
        let route = store
            .load_route(self.account_id, id)?
            .ok_or(ModelError::NotFound {
                kind: EntityKind::Route,
                id,
            })?;
        self.routes.put(id, route.clone());
        Ok(route)
    }

    /// Get the track-data for an activity, loading it on first access.
    pub fn trackdata(&mut self, store: &Store, activity_id: i64) -> Result<Trackdata> {
        if let Some(cached) = self.trackdata.get(&activity_id) {
            return Ok(cached.clone());
        }
        let trackdata =
            store
                .load_trackdata(self.account_id, activity_id)?
                .ok_or(ModelError::NotFound {
                    kind: EntityKind::Trackdata,
                    id: activity_id,
                })?;
        self.trackdata.put(activity_id, trackdata.clone());
        Ok(trackdata)
    }

    /// Drop one cached entity so the next access re-reads from storage.
    pub fn invalidate(&mut self, kind: EntityKind, id: i64) {
        match kind {
            EntityKind::Activity => {
                self.activities.pop(&id);
            }
            EntityKind::Route => {
                self.routes.pop(&id);
            }
            EntityKind::Trackdata => {
                self.trackdata.pop(&id);
            }
        }
    }

    /// Drop all cached entities of one kind.
    pub fn clear_cache(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Activity => self.activities.clear(),
            EntityKind::Route => self.routes.clear(),
            EntityKind::Trackdata => self.trackdata.clear(),
        }
    }

    /// Drop everything.
    pub fn clear_all(&mut self) {
        self.activities.clear();
        self.routes.clear();
        self.trackdata.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Activity;
    use crate::persister::ActivityPersister;

    fn store_with_activity(account_id: i64) -> (Store, i64) {
        let store = Store::in_memory().unwrap();
        let mut activity = Activity::new(account_id, 1_700_000_000);
        let id = ActivityPersister::new(store.conn(), account_id)
            .insert(&mut activity)
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_missing_entity_is_not_found() {
        let store = Store::in_memory().unwrap();
        let mut factory = Factory::new(1);
        let err = factory.activity(&store, 42).unwrap_err();
        assert!(matches!(
            err,
            ModelError::NotFound {
                kind: EntityKind::Activity,
                id: 42
            }
        ));
    }

    #[test]
    fn test_other_account_is_not_found() {
        let (store, id) = store_with_activity(1);
        let mut factory = Factory::new(2);
        assert!(matches!(
            factory.activity(&store, id),
            Err(ModelError::NotFound { .. })
        ));
    }

    #[test]
    fn test_cached_copy_served_until_invalidated() {
        let (store, id) = store_with_activity(1);
        let mut factory = Factory::new(1);

        let first = factory.activity(&store, id).unwrap();
        assert_eq!(first.hr_avg, 0);

        // Mutate storage behind the cache
        store
            .conn()
            .execute("UPDATE activity SET hravg = 150 WHERE id = ?1", [id])
            .unwrap();

        // Cached copy still served
        assert_eq!(factory.activity(&store, id).unwrap().hr_avg, 0);

        // Invalidation forces a re-read
        factory.invalidate(EntityKind::Activity, id);
        assert_eq!(factory.activity(&store, id).unwrap().hr_avg, 150);
    }

    #[test]
    fn test_clear_cache_per_kind() {
        let (store, id) = store_with_activity(1);
        let mut factory = Factory::new(1);
        factory.activity(&store, id).unwrap();

        store
            .conn()
            .execute("UPDATE activity SET hravg = 99 WHERE id = ?1", [id])
            .unwrap();

        factory.clear_cache(EntityKind::Route); // unrelated kind
        assert_eq!(factory.activity(&store, id).unwrap().hr_avg, 0);

        factory.clear_cache(EntityKind::Activity);
        assert_eq!(factory.activity(&store, id).unwrap().hr_avg, 99);
    }
}
