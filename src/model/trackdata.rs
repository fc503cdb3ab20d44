//! Track-data record: per-sample metric series for one activity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Recorded metric kinds.
///
/// One column per metric in the `trackdata` table; absent metrics are NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMetric {
    Time,
    Distance,
    Heartrate,
    Temperature,
    Cadence,
    Power,
}

impl TrackMetric {
    /// All metrics, in column order.
    pub const ALL: [TrackMetric; 6] = [
        TrackMetric::Time,
        TrackMetric::Distance,
        TrackMetric::Heartrate,
        TrackMetric::Temperature,
        TrackMetric::Cadence,
        TrackMetric::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackMetric::Time => "time",
            TrackMetric::Distance => "distance",
            TrackMetric::Heartrate => "heartrate",
            TrackMetric::Temperature => "temperature",
            TrackMetric::Cadence => "cadence",
            TrackMetric::Power => "power",
        }
    }

    /// Parse a storage column name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == name)
            .ok_or_else(|| ModelError::validation(format!("unknown trackdata metric: {}", name)))
    }
}

/// Stored track-data record, one-to-one with an activity.
///
/// All present series must have the same length; index `i` across series
/// denotes the same sample. The length invariant is enforced when the
/// record is persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trackdata {
    /// Owning activity (also the row key)
    pub activity_id: i64,
    /// Owning account
    pub account_id: i64,
    /// Metric name -> ordered sample values
    pub series: BTreeMap<TrackMetric, Vec<f64>>,
}

impl Trackdata {
    pub fn new(account_id: i64) -> Self {
        Self {
            activity_id: 0,
            account_id,
            series: BTreeMap::new(),
        }
    }

    pub fn has(&self, metric: TrackMetric) -> bool {
        self.series.get(&metric).is_some_and(|s| !s.is_empty())
    }

    pub fn series(&self, metric: TrackMetric) -> Option<&[f64]> {
        self.series.get(&metric).map(|s| s.as_slice())
    }

    /// Replace the samples for `metric`. An empty vector unsets it.
    pub fn set_series(&mut self, metric: TrackMetric, samples: Vec<f64>) {
        if samples.is_empty() {
            self.series.remove(&metric);
        } else {
            self.series.insert(metric, samples);
        }
    }

    /// Drop the series for `metric`. Returns whether it was present.
    pub fn remove(&mut self, metric: TrackMetric) -> bool {
        self.series.remove(&metric).is_some()
    }

    /// True iff no metric series is present. An empty track-data row must
    /// not survive a commit; the remover deletes it.
    pub fn is_empty(&self) -> bool {
        self.series.values().all(|s| s.is_empty())
    }

    /// Check the shared-length invariant across all present series.
    pub fn validate_lengths(&self) -> Result<()> {
        let mut expected: Option<(TrackMetric, usize)> = None;
        for (metric, samples) in &self.series {
            match expected {
                None => expected = Some((*metric, samples.len())),
                Some((first, len)) if samples.len() != len => {
                    return Err(ModelError::validation(format!(
                        "trackdata series length mismatch: {} has {} samples, {} has {}",
                        first,
                        len,
                        metric,
                        samples.len()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TrackMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_name_round_trip() {
        for metric in TrackMetric::ALL {
            assert_eq!(TrackMetric::from_name(metric.as_str()).unwrap(), metric);
        }
        assert!(TrackMetric::from_name("vertical_oscillation").is_err());
    }

    #[test]
    fn test_set_and_remove() {
        let mut td = Trackdata::new(1);
        assert!(td.is_empty());

        td.set_series(TrackMetric::Time, vec![60.0, 120.0, 180.0]);
        td.set_series(TrackMetric::Heartrate, vec![140.0, 150.0, 145.0]);
        assert!(td.has(TrackMetric::Time));
        assert!(!td.is_empty());

        assert!(td.remove(TrackMetric::Heartrate));
        assert!(!td.remove(TrackMetric::Heartrate));
        assert!(!td.has(TrackMetric::Heartrate));

        assert!(td.remove(TrackMetric::Time));
        assert!(td.is_empty());
    }

    #[test]
    fn test_length_validation() {
        let mut td = Trackdata::new(1);
        td.set_series(TrackMetric::Time, vec![60.0, 120.0]);
        td.set_series(TrackMetric::Distance, vec![1.0, 2.0]);
        assert!(td.validate_lengths().is_ok());

        td.set_series(TrackMetric::Heartrate, vec![140.0]);
        let err = td.validate_lengths().unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn test_empty_series_counts_as_unset() {
        let mut td = Trackdata::new(1);
        td.set_series(TrackMetric::Power, Vec::new());
        assert!(!td.has(TrackMetric::Power));
        assert!(td.is_empty());
    }
}
