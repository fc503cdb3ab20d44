//! Training-load (TRIMP) computation.
//!
//! The exact formula is a pluggable strategy: the data-series remover only
//! requires that the score is a pure function of the current heart-rate
//! series and is zero when that series is absent.

use crate::model::{Activity, TrackMetric, Trackdata};

/// Strategy for deriving the training-load score from recorded series.
pub trait TrimpCalculator {
    /// Compute the score for the activity given its current track-data.
    /// Must return 0.0 when no heart-rate series is present.
    fn compute(&self, activity: &Activity, trackdata: Option<&Trackdata>) -> f64;
}

/// Banister heart-rate-reserve TRIMP.
///
/// `trimp = minutes * hrr * 0.64 * e^(1.92 * hrr)` where `hrr` is the mean
/// fraction of heart-rate reserve over the series. Duration is taken from
/// the time series (cumulative seconds) when present, otherwise one sample
/// per second is assumed.
#[derive(Debug, Clone)]
pub struct HeartRateTrimp {
    pub rest_hr: f64,
    pub max_hr: f64,
}

impl Default for HeartRateTrimp {
    fn default() -> Self {
        Self {
            rest_hr: 60.0,
            max_hr: 200.0,
        }
    }
}

impl TrimpCalculator for HeartRateTrimp {
    fn compute(&self, _activity: &Activity, trackdata: Option<&Trackdata>) -> f64 {
        let Some(td) = trackdata else {
            return 0.0;
        };
        let Some(heartrate) = td.series(TrackMetric::Heartrate) else {
            return 0.0;
        };
        if heartrate.is_empty() {
            return 0.0;
        }

        let minutes = match td.series(TrackMetric::Time).and_then(|t| t.last()) {
            Some(last_secs) => last_secs / 60.0,
            None => heartrate.len() as f64 / 60.0,
        };
        if minutes <= 0.0 {
            return 0.0;
        }

        let avg_hr = heartrate.iter().sum::<f64>() / heartrate.len() as f64;
        let reserve = (self.max_hr - self.rest_hr).max(1.0);
        let hrr = ((avg_hr - self.rest_hr) / reserve).clamp(0.0, 1.0);

        minutes * hrr * 0.64 * (1.92 * hrr).exp()
    }
}
