//! Persister family: account-scoped writers for the three entity kinds.
//!
//! Each persister is bound to one connection and one owning account.
//! Writes touching a row owned by another account fail with an
//! authorization error before anything is changed; missing rows fail
//! with not-found. The composite insert path writes an activity together
//! with its route and track-data in one transaction, linking ids along
//! the way.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{EntityKind, ModelError, Result};
use crate::model::{Activity, Route, TrackMetric, Trackdata};
use crate::store::encode_seq;

/// Verify that the row exists and belongs to `account_id`.
fn check_owner(conn: &Connection, kind: EntityKind, id: i64, account_id: i64) -> Result<()> {
    let (table, key) = match kind {
        EntityKind::Activity => ("activity", "id"),
        EntityKind::Route => ("route", "id"),
        EntityKind::Trackdata => ("trackdata", "activityid"),
    };
    let owner: Option<i64> = conn
        .query_row(
            &format!("SELECT accountid FROM {} WHERE {} = ?1", table, key),
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(ModelError::NotFound { kind, id }),
        Some(owner) if owner != account_id => Err(ModelError::Authorization { kind, id }),
        Some(_) => Ok(()),
    }
}

// ============================================================================
// Activity
// ============================================================================

pub struct ActivityPersister<'a> {
    conn: &'a Connection,
    account_id: i64,
}

impl<'a> ActivityPersister<'a> {
    pub fn new(conn: &'a Connection, account_id: i64) -> Self {
        Self { conn, account_id }
    }

    /// Insert the activity and assign its row id.
    pub fn insert(&self, activity: &mut Activity) -> Result<i64> {
        if activity.account_id != self.account_id {
            return Err(ModelError::Authorization {
                kind: EntityKind::Activity,
                id: activity.id,
            });
        }

        self.conn.execute(
            "INSERT INTO activity (accountid, timestamp, sportid, routeid, hravg, trimp,
                                   temperature, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                activity.account_id,
                activity.timestamp,
                activity.sport_id,
                activity.route_id,
                activity.hr_avg,
                activity.trimp,
                activity.temperature,
                chrono::Utc::now().timestamp(),
            ],
        )?;
        activity.id = self.conn.last_insert_rowid();
        log::debug!("inserted activity {}", activity.id);
        Ok(activity.id)
    }

    /// Insert an activity together with its route and track-data.
    ///
    /// The route is written first so its id can be linked into
    /// `activity.route_id` before the activity row is created. Empty
    /// companions are skipped: an empty route or track-data row never
    /// reaches storage.
    pub fn insert_with(
        &self,
        activity: &mut Activity,
        route: Option<&mut Route>,
        trackdata: Option<&mut Trackdata>,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        if let Some(route) = route {
            if !route.is_empty() {
                let id = RoutePersister::new(&tx, self.account_id).insert(route)?;
                activity.route_id = id;
            }
        }

        let activity_id = ActivityPersister::new(&tx, self.account_id).insert(activity)?;

        if let Some(trackdata) = trackdata {
            if !trackdata.is_empty() {
                trackdata.activity_id = activity_id;
                TrackdataPersister::new(&tx, self.account_id).insert(trackdata)?;
            }
        }

        tx.commit()?;
        Ok(activity_id)
    }

    /// Rewrite the activity row. Assumes ids are already linked.
    pub fn update(&self, activity: &Activity) -> Result<()> {
        check_owner(self.conn, EntityKind::Activity, activity.id, self.account_id)?;

        self.conn.execute(
            "UPDATE activity
             SET timestamp = ?1, sportid = ?2, routeid = ?3, hravg = ?4, trimp = ?5,
                 temperature = ?6
             WHERE id = ?7 AND accountid = ?8",
            params![
                activity.timestamp,
                activity.sport_id,
                activity.route_id,
                activity.hr_avg,
                activity.trimp,
                activity.temperature,
                activity.id,
                self.account_id,
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        check_owner(self.conn, EntityKind::Activity, id, self.account_id)?;
        self.conn.execute(
            "DELETE FROM activity WHERE id = ?1 AND accountid = ?2",
            params![id, self.account_id],
        )?;
        Ok(())
    }
}

// ============================================================================
// Route
// ============================================================================

pub struct RoutePersister<'a> {
    conn: &'a Connection,
    account_id: i64,
}

impl<'a> RoutePersister<'a> {
    pub fn new(conn: &'a Connection, account_id: i64) -> Self {
        Self { conn, account_id }
    }

    pub fn insert(&self, route: &mut Route) -> Result<i64> {
        if route.account_id != self.account_id {
            return Err(ModelError::Authorization {
                kind: EntityKind::Route,
                id: route.id,
            });
        }

        self.conn.execute(
            "INSERT INTO route (accountid, geohashes, elevations_original,
                                elevations_corrected, elevation, elevation_up, elevation_down)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                route.account_id,
                encode_seq(&route.geohashes),
                encode_seq(&route.elevations_original),
                encode_seq(&route.elevations_corrected),
                route.elevation,
                route.elevation_up,
                route.elevation_down,
            ],
        )?;
        route.id = self.conn.last_insert_rowid();
        log::debug!("inserted route {}", route.id);
        Ok(route.id)
    }

    pub fn update(&self, route: &Route) -> Result<()> {
        check_owner(self.conn, EntityKind::Route, route.id, self.account_id)?;

        self.conn.execute(
            "UPDATE route
             SET geohashes = ?1, elevations_original = ?2, elevations_corrected = ?3,
                 elevation = ?4, elevation_up = ?5, elevation_down = ?6
             WHERE id = ?7 AND accountid = ?8",
            params![
                encode_seq(&route.geohashes),
                encode_seq(&route.elevations_original),
                encode_seq(&route.elevations_corrected),
                route.elevation,
                route.elevation_up,
                route.elevation_down,
                route.id,
                self.account_id,
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        check_owner(self.conn, EntityKind::Route, id, self.account_id)?;
        self.conn.execute(
            "DELETE FROM route WHERE id = ?1 AND accountid = ?2",
            params![id, self.account_id],
        )?;
        Ok(())
    }
}

// ============================================================================
// Trackdata
// ============================================================================

pub struct TrackdataPersister<'a> {
    conn: &'a Connection,
    account_id: i64,
}

impl<'a> TrackdataPersister<'a> {
    pub fn new(conn: &'a Connection, account_id: i64) -> Self {
        Self { conn, account_id }
    }

    /// Serialize each present metric, NULL for absent ones.
    fn column_values(trackdata: &Trackdata) -> Vec<Option<String>> {
        TrackMetric::ALL
            .iter()
            .map(|m| trackdata.series(*m).map(encode_seq))
            .collect()
    }

    pub fn insert(&self, trackdata: &Trackdata) -> Result<i64> {
        if trackdata.account_id != self.account_id {
            return Err(ModelError::Authorization {
                kind: EntityKind::Trackdata,
                id: trackdata.activity_id,
            });
        }
        trackdata.validate_lengths()?;

        let cols = Self::column_values(trackdata);
        self.conn.execute(
            "INSERT INTO trackdata (activityid, accountid, time, distance, heartrate,
                                    temperature, cadence, power)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                trackdata.activity_id,
                trackdata.account_id,
                cols[0],
                cols[1],
                cols[2],
                cols[3],
                cols[4],
                cols[5],
            ],
        )?;
        log::debug!("inserted trackdata for activity {}", trackdata.activity_id);
        Ok(trackdata.activity_id)
    }

    /// Full rewrite of all metric columns for the activity's row.
    pub fn update(&self, trackdata: &Trackdata) -> Result<()> {
        check_owner(
            self.conn,
            EntityKind::Trackdata,
            trackdata.activity_id,
            self.account_id,
        )?;
        trackdata.validate_lengths()?;

        let cols = Self::column_values(trackdata);
        self.conn.execute(
            "UPDATE trackdata
             SET time = ?1, distance = ?2, heartrate = ?3, temperature = ?4,
                 cadence = ?5, power = ?6
             WHERE activityid = ?7 AND accountid = ?8",
            params![
                cols[0],
                cols[1],
                cols[2],
                cols[3],
                cols[4],
                cols[5],
                trackdata.activity_id,
                self.account_id,
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, activity_id: i64) -> Result<()> {
        check_owner(self.conn, EntityKind::Trackdata, activity_id, self.account_id)?;
        self.conn.execute(
            "DELETE FROM trackdata WHERE activityid = ?1 AND accountid = ?2",
            params![activity_id, self.account_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn sample_activity(account_id: i64) -> Activity {
        Activity::new(account_id, 1_700_000_000)
    }

    #[test]
    fn test_insert_assigns_ids() {
        let store = Store::in_memory().unwrap();
        let persister = ActivityPersister::new(store.conn(), 1);

        let mut a = sample_activity(1);
        let id = persister.insert(&mut a).unwrap();
        assert!(id > 0);
        assert_eq!(a.id, id);

        let loaded = store.load_activity(1, id).unwrap().unwrap();
        assert_eq!(loaded, a);
    }

    #[test]
    fn test_cross_account_insert_rejected() {
        let store = Store::in_memory().unwrap();
        let persister = ActivityPersister::new(store.conn(), 1);

        let mut a = sample_activity(2);
        let err = persister.insert(&mut a).unwrap_err();
        assert!(matches!(err, ModelError::Authorization { .. }));
    }

    #[test]
    fn test_cross_account_update_rejected() {
        let store = Store::in_memory().unwrap();
        let mut a = sample_activity(1);
        ActivityPersister::new(store.conn(), 1).insert(&mut a).unwrap();

        // Same row, different account
        a.account_id = 2;
        let err = ActivityPersister::new(store.conn(), 2)
            .update(&a)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Authorization {
                kind: EntityKind::Activity,
                ..
            }
        ));
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let store = Store::in_memory().unwrap();
        let a = Activity {
            id: 99,
            ..sample_activity(1)
        };
        let err = ActivityPersister::new(store.conn(), 1)
            .update(&a)
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn test_trackdata_length_mismatch_rejected() {
        let store = Store::in_memory().unwrap();
        let mut td = Trackdata::new(1);
        td.activity_id = 1;
        td.set_series(TrackMetric::Time, vec![60.0, 120.0]);
        td.set_series(TrackMetric::Heartrate, vec![140.0]);

        let err = TrackdataPersister::new(store.conn(), 1)
            .insert(&td)
            .unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn test_composite_insert_links_route() {
        let store = Store::in_memory().unwrap();
        let persister = ActivityPersister::new(store.conn(), 1);

        let mut a = sample_activity(1);
        let mut route = Route::new(1);
        route.geohashes = vec!["u1xjhpfe7yvs".into(), "u1xjhzdtjx62".into()];
        let mut td = Trackdata::new(1);
        td.set_series(TrackMetric::Time, vec![300.0, 600.0]);

        let id = persister
            .insert_with(&mut a, Some(&mut route), Some(&mut td))
            .unwrap();

        assert!(a.route_id > 0);
        assert_eq!(a.route_id, route.id);
        assert_eq!(td.activity_id, id);

        let loaded = store.load_activity(1, id).unwrap().unwrap();
        assert_eq!(loaded.route_id, route.id);
        assert!(store.load_route(1, route.id).unwrap().is_some());
        assert!(store.load_trackdata(1, id).unwrap().is_some());
    }

    #[test]
    fn test_composite_insert_skips_empty_companions() {
        let store = Store::in_memory().unwrap();
        let persister = ActivityPersister::new(store.conn(), 1);

        let mut a = sample_activity(1);
        let mut route = Route::new(1);
        let mut td = Trackdata::new(1);

        let id = persister
            .insert_with(&mut a, Some(&mut route), Some(&mut td))
            .unwrap();

        assert_eq!(a.route_id, 0);
        assert!(store.load_trackdata(1, id).unwrap().is_none());
    }
}
