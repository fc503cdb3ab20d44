//! Route record: the GPS path and elevation profile of an activity.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Data-bearing route fields.
///
/// The geohash path is included so it can be inspected and unset like any
/// other field, but the remover treats it as a distinct operation (see
/// `DataSeriesRemover::remove_gps_path_from_route`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteField {
    Geohashes,
    ElevationsOriginal,
    ElevationsCorrected,
    Elevation,
    ElevationUp,
    ElevationDown,
}

impl RouteField {
    /// All fields, in column order.
    pub const ALL: [RouteField; 6] = [
        RouteField::Geohashes,
        RouteField::ElevationsOriginal,
        RouteField::ElevationsCorrected,
        RouteField::Elevation,
        RouteField::ElevationUp,
        RouteField::ElevationDown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteField::Geohashes => "geohashes",
            RouteField::ElevationsOriginal => "elevations_original",
            RouteField::ElevationsCorrected => "elevations_corrected",
            RouteField::Elevation => "elevation",
            RouteField::ElevationUp => "elevation_up",
            RouteField::ElevationDown => "elevation_down",
        }
    }

    /// Parse a storage field name. Unknown names fail with a validation
    /// error so string-keyed callers get rejected before anything is staged.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| ModelError::validation(format!("unknown route field: {}", name)))
    }
}

/// Stored route record.
///
/// `elevations_original` and `elevations_corrected` are index-aligned with
/// `geohashes`: index `i` across all three describes the same sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    /// Row id, 0 until inserted
    pub id: i64,
    /// Owning account
    pub account_id: i64,
    /// Ordered GPS path as geohash strings
    pub geohashes: Vec<String>,
    /// Elevation profile as recorded by the device
    pub elevations_original: Vec<i32>,
    /// Elevation profile after SRTM correction
    pub elevations_corrected: Vec<i32>,
    /// Total elevation difference in meters
    pub elevation: i32,
    /// Cumulative ascent in meters
    pub elevation_up: i32,
    /// Cumulative descent in meters
    pub elevation_down: i32,
}

impl Route {
    pub fn new(account_id: i64) -> Self {
        Self {
            account_id,
            ..Default::default()
        }
    }

    /// Whether `field` holds data (differs from its default).
    pub fn has(&self, field: RouteField) -> bool {
        match field {
            RouteField::Geohashes => !self.geohashes.is_empty(),
            RouteField::ElevationsOriginal => !self.elevations_original.is_empty(),
            RouteField::ElevationsCorrected => !self.elevations_corrected.is_empty(),
            RouteField::Elevation => self.elevation != 0,
            RouteField::ElevationUp => self.elevation_up != 0,
            RouteField::ElevationDown => self.elevation_down != 0,
        }
    }

    /// Reset `field` to its default.
    pub fn unset(&mut self, field: RouteField) {
        match field {
            RouteField::Geohashes => self.geohashes.clear(),
            RouteField::ElevationsOriginal => self.elevations_original.clear(),
            RouteField::ElevationsCorrected => self.elevations_corrected.clear(),
            RouteField::Elevation => self.elevation = 0,
            RouteField::ElevationUp => self.elevation_up = 0,
            RouteField::ElevationDown => self.elevation_down = 0,
        }
    }

    /// True iff no data field is populated. An empty route row must not
    /// survive a commit; the remover deletes it.
    pub fn is_empty(&self) -> bool {
        RouteField::ALL.iter().all(|f| !self.has(*f))
    }
}
