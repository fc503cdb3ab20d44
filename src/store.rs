//! SQLite store for training-log rows.
//!
//! Owns the database connection and the schema. Sequence-valued columns
//! (geohash paths, elevation profiles, metric series) are stored as JSON
//! text; summary scalars get their own columns. Every row carries an
//! `accountid` and every read here is filtered by it.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Activity, Route, TrackMetric, Trackdata};

/// Database handle.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        log::debug!("opened store at {}", path);
        Ok(Self { conn })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            -- Activity summary rows
            CREATE TABLE IF NOT EXISTS activity (
                id INTEGER PRIMARY KEY,
                accountid INTEGER NOT NULL,
                timestamp INTEGER NOT NULL,
                sportid INTEGER NOT NULL DEFAULT 0,
                routeid INTEGER NOT NULL DEFAULT 0,
                hravg INTEGER NOT NULL DEFAULT 0,
                trimp REAL NOT NULL DEFAULT 0,
                temperature REAL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );

            -- GPS path and elevation profile, referenced by activity.routeid
            CREATE TABLE IF NOT EXISTS route (
                id INTEGER PRIMARY KEY,
                accountid INTEGER NOT NULL,
                geohashes TEXT NOT NULL DEFAULT '[]',
                elevations_original TEXT NOT NULL DEFAULT '[]',
                elevations_corrected TEXT NOT NULL DEFAULT '[]',
                elevation INTEGER NOT NULL DEFAULT 0,
                elevation_up INTEGER NOT NULL DEFAULT 0,
                elevation_down INTEGER NOT NULL DEFAULT 0
            );

            -- Metric series, one row per activity, one column per metric
            -- (NULL = metric not recorded)
            CREATE TABLE IF NOT EXISTS trackdata (
                activityid INTEGER PRIMARY KEY,
                accountid INTEGER NOT NULL,
                time TEXT,
                distance TEXT,
                heartrate TEXT,
                temperature TEXT,
                cadence TEXT,
                power TEXT
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_activity_account ON activity(accountid);
            CREATE INDEX IF NOT EXISTS idx_route_account ON route(accountid);
            CREATE INDEX IF NOT EXISTS idx_trackdata_account ON trackdata(accountid);
        "#,
        )
    }

    /// Raw connection access for the persister family.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Start a storage transaction on the shared connection.
    ///
    /// Dropping the returned transaction without committing rolls it back,
    /// which is what the remover's all-or-nothing contract relies on.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // ========================================================================
    // Row loaders (account-filtered)
    // ========================================================================

    /// Load an activity row owned by `account_id`.
    pub fn load_activity(&self, account_id: i64, id: i64) -> Result<Option<Activity>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, accountid, timestamp, sportid, routeid, hravg, trimp, temperature
                 FROM activity WHERE id = ?1 AND accountid = ?2",
                params![id, account_id],
                |row| {
                    Ok(Activity {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        timestamp: row.get(2)?,
                        sport_id: row.get(3)?,
                        route_id: row.get(4)?,
                        hr_avg: row.get(5)?,
                        trimp: row.get(6)?,
                        temperature: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Load a route row owned by `account_id`.
    pub fn load_route(&self, account_id: i64, id: i64) -> Result<Option<Route>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, accountid, geohashes, elevations_original, elevations_corrected,
                        elevation, elevation_up, elevation_down
                 FROM route WHERE id = ?1 AND accountid = ?2",
                params![id, account_id],
                |row| {
                    Ok(Route {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        geohashes: decode_seq(row.get::<_, String>(2)?),
                        elevations_original: decode_seq(row.get::<_, String>(3)?),
                        elevations_corrected: decode_seq(row.get::<_, String>(4)?),
                        elevation: row.get(5)?,
                        elevation_up: row.get(6)?,
                        elevation_down: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Load the track-data row for an activity owned by `account_id`.
    pub fn load_trackdata(&self, account_id: i64, activity_id: i64) -> Result<Option<Trackdata>> {
        let row = self
            .conn
            .query_row(
                "SELECT activityid, accountid, time, distance, heartrate, temperature,
                        cadence, power
                 FROM trackdata WHERE activityid = ?1 AND accountid = ?2",
                params![activity_id, account_id],
                |row| {
                    let mut td = Trackdata {
                        activity_id: row.get(0)?,
                        account_id: row.get(1)?,
                        series: Default::default(),
                    };
                    // Columns 2.. follow TrackMetric::ALL order
                    for (i, metric) in TrackMetric::ALL.iter().enumerate() {
                        if let Some(json) = row.get::<_, Option<String>>(2 + i)? {
                            td.set_series(*metric, decode_seq(json));
                        }
                    }
                    Ok(td)
                },
            )
            .optional()?;
        Ok(row)
    }
}

/// Encode a sequence column as JSON text.
pub(crate) fn encode_seq<T: Serialize>(seq: &[T]) -> String {
    serde_json::to_string(seq).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON sequence column; malformed text decodes as empty.
pub(crate) fn decode_seq<T: DeserializeOwned>(json: String) -> Vec<T> {
    serde_json::from_str(&json).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let store = Store::in_memory().unwrap();
        // Re-running the schema on an initialized connection must not fail
        Store::init_schema(store.conn()).unwrap();
    }

    #[test]
    fn test_load_missing_rows() {
        let store = Store::in_memory().unwrap();
        assert!(store.load_activity(1, 42).unwrap().is_none());
        assert!(store.load_route(1, 42).unwrap().is_none());
        assert!(store.load_trackdata(1, 42).unwrap().is_none());
    }

    #[test]
    fn test_seq_codec() {
        let geohashes = vec!["u1xjhpfe7yvs".to_string(), "u1xjhzdtjx62".to_string()];
        let json = encode_seq(&geohashes);
        let back: Vec<String> = decode_seq(json);
        assert_eq!(back, geohashes);

        let empty: Vec<i32> = decode_seq("not json".to_string());
        assert!(empty.is_empty());
    }
}
