//! `SQLite` schema definitions for gatelog.
//!
//! SQL statements for creating and managing the database schema: the
//! access log plus one readings table per unit.

/// SQL statement to create the access log table.
pub const CREATE_ACCESS_LOG_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS access_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code_value TEXT NOT NULL,
    code_type TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on the access log timestamp.
pub const CREATE_ACCESS_LOG_TIMESTAMP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_access_log_timestamp ON access_log(timestamp DESC)
";

/// SQL statement to create the unit 1 readings table.
///
/// `ts` is the upsert conflict key; the three derived columns stay NULL
/// until the batch processor fills them in.
pub const CREATE_UNIT1_READINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS unit1_readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL UNIQUE,
    hp_mass_flow REAL NOT NULL,
    lp_mass_flow REAL NOT NULL,
    grs_mass_flow REAL NOT NULL,
    hp_pressure REAL NOT NULL,
    lp_pressure REAL NOT NULL,
    hp_enthalpy REAL,
    lp_enthalpy REAL,
    inlet_energy REAL
)
";

/// SQL statement to create the unit 2 readings table.
pub const CREATE_UNIT2_READINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS unit2_readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL UNIQUE,
    hp_mass_flow REAL NOT NULL,
    lp_mass_flow REAL NOT NULL,
    grs_mass_flow REAL NOT NULL,
    hp_pressure REAL NOT NULL,
    lp_pressure REAL NOT NULL,
    hp_enthalpy REAL,
    lp_enthalpy REAL,
    inlet_energy REAL
)
";

/// Partial index for the unit 1 unprocessed-rows scan.
pub const CREATE_UNIT1_UNPROCESSED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_unit1_readings_unprocessed
    ON unit1_readings(ts) WHERE inlet_energy IS NULL
";

/// Partial index for the unit 2 unprocessed-rows scan.
pub const CREATE_UNIT2_UNPROCESSED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_unit2_readings_unprocessed
    ON unit2_readings(ts) WHERE inlet_energy IS NULL
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ACCESS_LOG_TABLE,
    CREATE_ACCESS_LOG_TIMESTAMP_INDEX,
    CREATE_UNIT1_READINGS_TABLE,
    CREATE_UNIT2_READINGS_TABLE,
    CREATE_UNIT1_UNPROCESSED_INDEX,
    CREATE_UNIT2_UNPROCESSED_INDEX,
    CREATE_METADATA_TABLE,
];
