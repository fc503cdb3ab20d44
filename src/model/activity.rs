//! Activity record: the summary row for one training session.

use serde::{Deserialize, Serialize};

/// No associated route.
pub const NO_ROUTE: i64 = 0;

/// Stored activity record.
///
/// `hr_avg` and `temperature` are summary scalars. They may be derived from
/// the matching track-data series or entered independently by the user; the
/// remover is responsible for keeping them consistent when series vanish.
/// `trimp` is always derived from the heart-rate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Row id, 0 until inserted
    pub id: i64,
    /// Owning account
    pub account_id: i64,
    /// Session start (Unix seconds)
    pub timestamp: i64,
    /// Sport reference
    pub sport_id: i64,
    /// Weak reference to a route row, `NO_ROUTE` when none
    pub route_id: i64,
    /// Average heart rate in bpm, 0 when unknown
    pub hr_avg: u32,
    /// Training load score derived from the heart-rate series
    pub trimp: f64,
    /// Temperature in degrees Celsius, independently entered weather data
    pub temperature: Option<f64>,
}

impl Activity {
    /// New empty activity owned by `account_id`.
    pub fn new(account_id: i64, timestamp: i64) -> Self {
        Self {
            id: 0,
            account_id,
            timestamp,
            sport_id: 0,
            route_id: NO_ROUTE,
            hr_avg: 0,
            trimp: 0.0,
            temperature: None,
        }
    }

    pub fn has_route(&self) -> bool {
        self.route_id != NO_ROUTE
    }
}
