//! Tabular store for vehicle records.
//!
//! Records live in a single `vehicles` table of a `SQLite` database. The
//! store is append-only: there is no update or delete path. Appends are
//! single `INSERT`s guarded by a `UNIQUE` constraint on the vehicle number.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{ExpiryDates, VehicleRecord};

const SELECT_COLUMNS: &str = r"
    SELECT id, vehicle_number, unladen_weight, loaden_weight,
           insurance_expiry, fitness_expiry, pollution_expiry, permit_expiry,
           file_path, created_at
    FROM vehicles
";

/// Storage engine for vehicle records.
///
/// A `Storage` owns one connection and is not `Sync`; share it behind a
/// mutex so that every append runs under a single writer.
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
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
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

        // WAL keeps report reads from blocking behind an append.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Vehicle store opened at {}", path.display());
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

    /// Append a record to the store.
    ///
    /// Returns the assigned row id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateVehicle`] if the vehicle number is already
    /// stored, or a database error if the insert fails.
    pub fn append(&self, record: &VehicleRecord) -> Result<i64> {
        if self.exists(&record.vehicle_number)? {
            return Err(Error::DuplicateVehicle {
                vehicle_number: record.vehicle_number.clone(),
            });
        }

        let inserted = self.conn.execute(
            r"
            INSERT INTO vehicles (
                vehicle_number, unladen_weight, loaden_weight,
                insurance_expiry, fitness_expiry, pollution_expiry, permit_expiry,
                file_path, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                record.vehicle_number,
                record.unladen_weight,
                record.loaden_weight,
                record.expiry.insurance,
                record.expiry.fitness,
                record.expiry.pollution,
                record.expiry.permit,
                record.file_path,
                record.created_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                return Err(Error::DuplicateVehicle {
                    vehicle_number: record.vehicle_number.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        debug!("Appended vehicle {} as row {}", record.vehicle_number, id);
        Ok(id)
    }

    /// Check whether a vehicle number is already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn exists(&self, vehicle_number: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM vehicles WHERE vehicle_number = ?1",
            [vehicle_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get the first record stored under a vehicle number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, vehicle_number: &str) -> Result<Option<VehicleRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE vehicle_number = ?1 ORDER BY id ASC LIMIT 1");
        let record = self
            .conn
            .query_row(&sql, [vehicle_number], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Get every record stored under a vehicle number, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_all(&self, vehicle_number: &str) -> Result<Vec<VehicleRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE vehicle_number = ?1 ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([vehicle_number], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Get all records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all(&self) -> Result<Vec<VehicleRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Count stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vehicles", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_records = self.count()?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM vehicles",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let parse = |s: String| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_records,
            oldest_record: oldest.and_then(parse),
            newest_record: newest.and_then(parse),
            db_size_bytes,
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<VehicleRecord> {
        let created_at_str: String = row.get(9)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str).map_or_else(
            |_| {
                warn!("Unparseable created_at {created_at_str:?}, using epoch");
                DateTime::<Utc>::UNIX_EPOCH
            },
            |dt| dt.with_timezone(&Utc),
        );

        Ok(VehicleRecord {
            id: Some(row.get(0)?),
            vehicle_number: row.get(1)?,
            unladen_weight: row.get(2)?,
            loaden_weight: row.get(3)?,
            expiry: ExpiryDates {
                insurance: row.get(4)?,
                fitness: row.get(5)?,
                pollution: row.get(6)?,
                permit: row.get(7)?,
            },
            file_path: row.get(8)?,
            created_at,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Total number of records stored.
    pub total_records: i64,
    /// Timestamp of the oldest record.
    pub oldest_record: Option<DateTime<Utc>>,
    /// Timestamp of the newest record.
    pub newest_record: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// A [`Storage`] shared across request handlers.
///
/// Every caller goes through the same mutex, which makes the store a single
/// writer: a duplicate check and the append that follows it cannot interleave
/// with another submission.
#[derive(Debug, Clone)]
pub struct SharedStorage(Arc<Mutex<Storage>>);

impl SharedStorage {
    /// Wrap a storage for sharing.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self(Arc::new(Mutex::new(storage)))
    }

    /// Take the writer lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if a previous holder panicked.
    pub fn lock(&self) -> Result<MutexGuard<'_, Storage>> {
        self.0
            .lock()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }
}
