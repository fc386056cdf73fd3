//! Storage layer for gatelog.
//!
//! `SQLite`-based persistent storage for the access log and the per-unit
//! sensor readings. The operations mirror what the tool needs from a
//! hosted tabular store: single-record insert, ordered/limited selects,
//! batch upsert on a conflict key, and update-by-id.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::event::{AccessEvent, CodeType};
use crate::reading::{Derived, SensorReading, Unit, UnprocessedReading};

/// Storage engine for access events and sensor readings.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Access log ===

    /// Insert an access event and return its assigned id.
    ///
    /// The log is append-only and enforces no uniqueness on the code value;
    /// duplicate suppression happens upstream in the scan session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_event(&self, event: &AccessEvent) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO access_log (code_value, code_type, timestamp)
            VALUES (?1, ?2, ?3)
            ",
            params![
                event.code_value,
                event.code_type.to_string(),
                event.timestamp.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted access event with id {}", id);
        Ok(id)
    }

    /// Get the most recent access events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent_events(&self, limit: usize) -> Result<Vec<AccessEvent>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, code_value, code_type, timestamp
            FROM access_log ORDER BY timestamp DESC, id DESC LIMIT ?1
            ",
        )?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let events = stmt
            .query_map([limit_i64], Self::row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// Count access events.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_events(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM access_log", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Sensor readings ===

    /// Upsert a batch of readings keyed by `ts`, in a single transaction.
    ///
    /// Rows with a timestamp already present are overwritten in full
    /// (including their derived columns, which an upload resets to unset);
    /// new timestamps are inserted. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the transaction rolls back
    /// and nothing is written.
    pub fn upsert_readings(&mut self, unit: Unit, rows: &[SensorReading]) -> Result<usize> {
        let sql = format!(
            r"
            INSERT INTO {table} (ts, hp_mass_flow, lp_mass_flow, grs_mass_flow,
                                 hp_pressure, lp_pressure, hp_enthalpy, lp_enthalpy, inlet_energy)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(ts) DO UPDATE SET
                hp_mass_flow = excluded.hp_mass_flow,
                lp_mass_flow = excluded.lp_mass_flow,
                grs_mass_flow = excluded.grs_mass_flow,
                hp_pressure = excluded.hp_pressure,
                lp_pressure = excluded.lp_pressure,
                hp_enthalpy = excluded.hp_enthalpy,
                lp_enthalpy = excluded.lp_enthalpy,
                inlet_energy = excluded.inlet_energy
            ",
            table = unit.table()
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                stmt.execute(params![
                    row.ts.to_rfc3339(),
                    row.hp_mass_flow,
                    row.lp_mass_flow,
                    row.grs_mass_flow,
                    row.hp_pressure,
                    row.lp_pressure,
                    row.hp_enthalpy,
                    row.lp_enthalpy,
                    row.inlet_energy,
                ])?;
            }
        }
        tx.commit()?;

        info!("Upserted {} readings into {}", rows.len(), unit.table());
        Ok(rows.len())
    }

    /// Get a reading by its timestamp key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_reading(&self, unit: Unit, ts: &DateTime<Utc>) -> Result<Option<SensorReading>> {
        let sql = format!(
            r"
            SELECT ts, hp_mass_flow, lp_mass_flow, grs_mass_flow,
                   hp_pressure, lp_pressure, hp_enthalpy, lp_enthalpy, inlet_energy
            FROM {table} WHERE ts = ?1
            ",
            table = unit.table()
        );

        let result = self
            .conn
            .query_row(&sql, [ts.to_rfc3339()], Self::row_to_reading)
            .optional()?;
        Ok(result)
    }

    /// Fetch all unprocessed rows of a unit, projecting only the fields the
    /// batch processor needs. A row is unprocessed iff `inlet_energy` is
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn unprocessed_readings(&self, unit: Unit) -> Result<Vec<UnprocessedReading>> {
        let sql = format!(
            r"
            SELECT id, hp_mass_flow, lp_mass_flow, hp_pressure, lp_pressure
            FROM {table} WHERE inlet_energy IS NULL ORDER BY ts ASC
            ",
            table = unit.table()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UnprocessedReading {
                    id: row.get(0)?,
                    hp_mass_flow: row.get(1)?,
                    lp_mass_flow: row.get(2)?,
                    hp_pressure: row.get(3)?,
                    lp_pressure: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Write the derived values back to one row by its id.
    ///
    /// Returns `true` if a row was updated, `false` if the id was not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn apply_derived(&self, unit: Unit, id: i64, derived: &Derived) -> Result<bool> {
        let sql = format!(
            r"
            UPDATE {table}
            SET hp_enthalpy = ?1, lp_enthalpy = ?2, inlet_energy = ?3
            WHERE id = ?4
            ",
            table = unit.table()
        );

        let affected = self.conn.execute(
            &sql,
            params![derived.hp_enthalpy, derived.lp_enthalpy, derived.inlet_energy, id],
        )?;
        Ok(affected > 0)
    }

    /// Count all readings of a unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_readings(&self, unit: Unit) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}", table = unit.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count the unprocessed readings of a unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_unprocessed(&self, unit: Unit) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE inlet_energy IS NULL",
            table = unit.table()
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let access_events = self.count_events()?;
        let unit1 = UnitStats {
            total: self.count_readings(Unit::Unit1)?,
            unprocessed: self.count_unprocessed(Unit::Unit1)?,
        };
        let unit2 = UnitStats {
            total: self.count_readings(Unit::Unit2)?,
            unprocessed: self.count_unprocessed(Unit::Unit2)?,
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            access_events,
            unit1,
            unit2,
            db_size_bytes,
        })
    }

    /// Convert a database row to an access event.
    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<AccessEvent> {
        let id: i64 = row.get(0)?;
        let code_value: String = row.get(1)?;
        let code_type_str: String = row.get(2)?;
        let timestamp_str: String = row.get(3)?;

        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        let code_type = match code_type_str.as_str() {
            "QRCODE" => CodeType::Qr,
            _ => {
                warn!("Unknown code type: {}, defaulting to QRCODE", code_type_str);
                CodeType::Qr
            }
        };

        Ok(AccessEvent {
            id: Some(id),
            code_value,
            code_type,
            timestamp,
        })
    }

    /// Convert a database row to a sensor reading.
    fn row_to_reading(row: &rusqlite::Row) -> rusqlite::Result<SensorReading> {
        let ts_str: String = row.get(0)?;
        let ts = DateTime::parse_from_rfc3339(&ts_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(SensorReading {
            ts,
            hp_mass_flow: row.get(1)?,
            lp_mass_flow: row.get(2)?,
            grs_mass_flow: row.get(3)?,
            hp_pressure: row.get(4)?,
            lp_pressure: row.get(5)?,
            hp_enthalpy: row.get(6)?,
            lp_enthalpy: row.get(7)?,
            inlet_energy: row.get(8)?,
        })
    }
}

/// Per-unit reading counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Total readings stored.
    pub total: i64,
    /// Readings still awaiting the batch processor.
    pub unprocessed: i64,
}

/// Statistics about the storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Total access events stored.
    pub access_events: i64,
    /// Unit 1 reading counts.
    pub unit1: UnitStats,
    /// Unit 2 reading counts.
    pub unit2: UnitStats,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
