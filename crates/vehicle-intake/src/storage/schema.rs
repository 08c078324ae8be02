//! `SQLite` schema definitions for the vehicle store.

/// SQL statement to create the vehicles table.
///
/// `vehicle_number` carries a `UNIQUE` constraint so a duplicate can never be
/// committed even if the pre-insert check is bypassed.
pub const CREATE_VEHICLES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vehicle_number TEXT NOT NULL UNIQUE,
    unladen_weight TEXT NOT NULL,
    loaden_weight TEXT NOT NULL,
    insurance_expiry TEXT NOT NULL,
    fitness_expiry TEXT NOT NULL,
    pollution_expiry TEXT NOT NULL,
    permit_expiry TEXT NOT NULL,
    file_path TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `created_at` for ordered listing.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_vehicles_created_at ON vehicles(created_at)
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
    CREATE_VEHICLES_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_vehicles_table_has_unique_key() {
        assert!(CREATE_VEHICLES_TABLE.contains("vehicle_number TEXT NOT NULL UNIQUE"));
        assert!(CREATE_VEHICLES_TABLE.contains("file_path TEXT NOT NULL"));
        assert!(CREATE_VEHICLES_TABLE.contains("permit_expiry TEXT NOT NULL"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
