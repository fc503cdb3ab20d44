//! Entity records for the training log.
//!
//! Each persisted row maps to a plain struct with defaulted fields.
//! A field counts as "set" when it differs from its default, which keeps
//! the sparse-row semantics of the storage schema while field names stay
//! checked at compile time.

pub mod activity;
pub mod route;
pub mod trackdata;

pub use activity::Activity;
pub use route::{Route, RouteField};
pub use trackdata::{TrackMetric, Trackdata};
