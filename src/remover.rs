//! Data-series removal with cascading cleanup.
//!
//! A `DataSeriesRemover` is bound to one loaded activity. Removal calls
//! only stage intent; `save_changes` applies everything in one storage
//! transaction: route fields are dropped (deleting a route that became
//! empty and unlinking it from the activity), track-data series are
//! dropped (deleting an emptied row), and the activity's derived
//! aggregates are recomputed from the post-removal state before the
//! activity row is rewritten. A failed commit rolls everything back and
//! keeps the staged removals, so the caller may retry.

use std::collections::BTreeSet;

use crate::error::{EntityKind, ModelError, Result};
use crate::factory::Factory;
use crate::model::activity::NO_ROUTE;
use crate::model::{Activity, RouteField, TrackMetric, Trackdata};
use crate::persister::{ActivityPersister, RoutePersister, TrackdataPersister};
use crate::store::Store;
use crate::trimp::{HeartRateTrimp, TrimpCalculator};

/// Stages and commits series removals for one activity.
pub struct DataSeriesRemover<'a> {
    store: &'a Store,
    account_id: i64,
    activity: Activity,
    route_removals: BTreeSet<RouteField>,
    trackdata_removals: BTreeSet<TrackMetric>,
    trimp_calc: Box<dyn TrimpCalculator>,
}

impl std::fmt::Debug for DataSeriesRemover<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSeriesRemover")
            .field("account_id", &self.account_id)
            .field("activity", &self.activity)
            .field("route_removals", &self.route_removals)
            .field("trackdata_removals", &self.trackdata_removals)
            .finish_non_exhaustive()
    }
}

impl<'a> DataSeriesRemover<'a> {
    /// Bind a remover to an already loaded activity.
    pub fn new(store: &'a Store, account_id: i64, activity: Activity) -> Result<Self> {
        if activity.account_id != account_id {
            return Err(ModelError::Authorization {
                kind: EntityKind::Activity,
                id: activity.id,
            });
        }
        Ok(Self {
            store,
            account_id,
            activity,
            route_removals: BTreeSet::new(),
            trackdata_removals: BTreeSet::new(),
            trimp_calc: Box::new(HeartRateTrimp::default()),
        })
    }

    /// Replace the training-load strategy.
    pub fn with_trimp_calculator(mut self, calc: impl TrimpCalculator + 'static) -> Self {
        self.trimp_calc = Box::new(calc);
        self
    }

    /// The activity as seen by this remover (reflects committed changes).
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn has_staged_removals(&self) -> bool {
        !self.route_removals.is_empty() || !self.trackdata_removals.is_empty()
    }

    // ========================================================================
    // Staging
    // ========================================================================

    /// Mark a route field for removal.
    pub fn remove_from_route(&mut self, field: RouteField) {
        self.route_removals.insert(field);
    }

    /// Mark the GPS path for removal as a single unit.
    ///
    /// The geohash sequence is the defining feature of a route's geometry,
    /// so dropping it gets its own operation rather than going through
    /// ordinary field removal.
    pub fn remove_gps_path_from_route(&mut self) {
        self.route_removals.insert(RouteField::Geohashes);
    }

    /// Mark a metric series for removal from the track-data.
    pub fn remove_from_trackdata(&mut self, metric: TrackMetric) {
        self.trackdata_removals.insert(metric);
    }

    /// String-keyed variant of `remove_from_route` for callers holding
    /// storage field names. Unknown names fail without staging anything.
    pub fn remove_route_field(&mut self, name: &str) -> Result<()> {
        let field = RouteField::from_name(name)?;
        self.remove_from_route(field);
        Ok(())
    }

    /// String-keyed variant of `remove_from_trackdata`.
    pub fn remove_trackdata_field(&mut self, name: &str) -> Result<()> {
        let metric = TrackMetric::from_name(name)?;
        self.remove_from_trackdata(metric);
        Ok(())
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Apply all staged removals in one storage transaction.
    ///
    /// Ordering: route first, then track-data, then the activity's derived
    /// aggregates (which must see the post-removal series state), then the
    /// activity row itself. Factory entries for everything touched are
    /// invalidated after a successful commit. With nothing staged this is
    /// a no-op and performs zero writes.
    pub fn save_changes(&mut self, factory: &mut Factory) -> Result<()> {
        if !self.has_staged_removals() {
            log::debug!(
                "no staged removals for activity {}, skipping commit",
                self.activity.id
            );
            return Ok(());
        }

        // Work on a copy so a rolled-back commit leaves the bound activity
        // (and the staged sets) untouched for a retry.
        let mut activity = self.activity.clone();
        let old_route_id = activity.route_id;

        let tx = self.store.transaction()?;

        // 1. Route removals, cascading to route deletion
        if !self.route_removals.is_empty() && activity.has_route() {
            if let Some(mut route) = self.store.load_route(self.account_id, activity.route_id)? {
                let mut changed = false;
                for field in &self.route_removals {
                    if route.has(*field) {
                        route.unset(*field);
                        changed = true;
                    }
                }

                let routes = RoutePersister::new(&tx, self.account_id);
                if route.is_empty() {
                    routes.delete(route.id)?;
                    activity.route_id = NO_ROUTE;
                    log::debug!(
                        "route {} emptied by removal, deleted and unlinked from activity {}",
                        route.id,
                        activity.id
                    );
                } else if changed {
                    routes.update(&route)?;
                }
            }
        }

        // 2. Track-data removals, cascading to row deletion
        let mut series_changed = false;
        let mut heartrate_removed = false;
        let mut trackdata_after: Option<Trackdata> = None;
        if !self.trackdata_removals.is_empty() {
            if let Some(mut trackdata) = self.store.load_trackdata(self.account_id, activity.id)? {
                for metric in &self.trackdata_removals {
                    if trackdata.remove(*metric) {
                        series_changed = true;
                        if *metric == TrackMetric::Heartrate {
                            heartrate_removed = true;
                        }
                    }
                }

                let persister = TrackdataPersister::new(&tx, self.account_id);
                if trackdata.is_empty() {
                    persister.delete(trackdata.activity_id)?;
                    log::debug!(
                        "trackdata for activity {} emptied by removal, deleted",
                        activity.id
                    );
                } else {
                    if series_changed {
                        persister.update(&trackdata)?;
                    }
                    trackdata_after = Some(trackdata);
                }
            }
        }

        // 3. Derived aggregates, computed from the post-removal state.
        // hr_avg is series-derived: it survives only when no recorded
        // heart-rate series backed it. The temperature scalar is
        // independently entered weather data and is never touched here.
        if heartrate_removed {
            activity.hr_avg = 0;
        }
        if series_changed {
            activity.trimp = self.trimp_calc.compute(&activity, trackdata_after.as_ref());
        }

        // 4. Activity row
        ActivityPersister::new(&tx, self.account_id).update(&activity)?;

        tx.commit()?;

        // 5. Invalidate everything this commit may have touched
        factory.invalidate(EntityKind::Activity, activity.id);
        if old_route_id != NO_ROUTE {
            factory.invalidate(EntityKind::Route, old_route_id);
        }
        factory.invalidate(EntityKind::Trackdata, activity.id);

        log::info!(
            "committed series removal for activity {} ({} route field(s), {} metric(s))",
            activity.id,
            self.route_removals.len(),
            self.trackdata_removals.len()
        );

        self.activity = activity;
        self.route_removals.clear();
        self.trackdata_removals.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_account_binding_rejected() {
        let store = Store::in_memory().unwrap();
        let activity = Activity::new(2, 1_700_000_000);
        let err = DataSeriesRemover::new(&store, 1, activity).unwrap_err();
        assert!(matches!(err, ModelError::Authorization { .. }));
    }

    #[test]
    fn test_unknown_field_names_stage_nothing() {
        let store = Store::in_memory().unwrap();
        let activity = Activity::new(1, 1_700_000_000);
        let mut remover = DataSeriesRemover::new(&store, 1, activity).unwrap();

        assert!(remover.remove_route_field("startpoint").is_err());
        assert!(remover.remove_trackdata_field("oxygen").is_err());
        assert!(!remover.has_staged_removals());

        remover.remove_route_field("elevations_original").unwrap();
        remover.remove_trackdata_field("heartrate").unwrap();
        assert!(remover.has_staged_removals());
    }
}
