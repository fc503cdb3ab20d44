//! # trainlog
//!
//! Data model for a personal training log: activity summaries, routes and
//! per-sample track-data backed by SQLite.
//!
//! The interesting part is the data-series consistency core: removing a
//! recorded series (GPS path, elevation profile, heart rate, ...) from an
//! activity must keep the three related rows consistent. The
//! [`DataSeriesRemover`] stages removals, cascades deletion of emptied
//! route/track-data rows, recomputes the activity's derived aggregates
//! and commits everything atomically.
//!
//! Typical flow:
//!
//! ```no_run
//! use trainlog::{DataSeriesRemover, Factory, RouteField, Store, TrackMetric};
//!
//! # fn run() -> trainlog::Result<()> {
//! let store = Store::open("trainlog.db")?;
//! let mut factory = Factory::new(1);
//!
//! let activity = factory.activity(&store, 42)?;
//! let mut remover = DataSeriesRemover::new(&store, 1, activity)?;
//! remover.remove_gps_path_from_route();
//! remover.remove_from_route(RouteField::ElevationsOriginal);
//! remover.remove_from_trackdata(TrackMetric::Heartrate);
//! remover.save_changes(&mut factory)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod factory;
pub mod model;
pub mod persister;
pub mod remover;
pub mod store;
pub mod trimp;

pub use error::{EntityKind, ModelError, Result};
pub use factory::Factory;
pub use model::activity::NO_ROUTE;
pub use model::{Activity, Route, RouteField, TrackMetric, Trackdata};
pub use persister::{ActivityPersister, RoutePersister, TrackdataPersister};
pub use remover::DataSeriesRemover;
pub use store::Store;
pub use trimp::{HeartRateTrimp, TrimpCalculator};
