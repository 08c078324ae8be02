//! Error types for vehicle-intake.
//!
//! [`Error`] covers infrastructure failures (database, configuration, I/O,
//! workbook generation). [`IntakeError`] and [`ReportError`] are the
//! user-facing rejections whose `Display` text is shown back to the person
//! filling in the form.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for vehicle-intake operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The stored schema version is unreadable or newer than this build.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A record with this vehicle number is already stored.
    #[error("vehicle number already stored: {vehicle_number}")]
    DuplicateVehicle {
        /// The conflicting vehicle number.
        vehicle_number: String,
    },

    /// The store lock was poisoned by a panicking writer.
    #[error("record store is unavailable: {0}")]
    StoreUnavailable(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an uploaded document.
    #[error("failed to write document {path}: {source}")]
    DocumentWrite {
        /// Destination of the document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet generation failed.
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for vehicle-intake operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error is a uniqueness conflict on the vehicle number.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateVehicle { .. })
    }
}

/// Why an intake submission was rejected.
///
/// The `Display` text is the message shown in the form's alert banner.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// A text field of the form was not submitted at all.
    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    /// The vehicle number is already in the store.
    #[error("Vehicle Number already exists")]
    DuplicateKey {
        /// The rejected vehicle number.
        vehicle_number: String,
    },

    /// The vehicle number cannot be used as a document file name.
    #[error("Vehicle Number contains characters that cannot be used in a file name")]
    InvalidVehicleNumber,

    /// No file field was submitted.
    #[error("No file part")]
    MissingFile,

    /// The file field was submitted without a file name.
    #[error("No selected file")]
    EmptyFilename,

    /// The file is not a `.pdf` declared as `application/pdf`.
    #[error("Invalid file format")]
    InvalidFileType,

    /// The document is larger than the configured limit.
    #[error("File exceeds the maximum upload size of {limit} bytes")]
    UploadTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The multipart body could not be read.
    #[error("Malformed form submission: {0}")]
    MalformedForm(String),

    /// One or more expiry dates failed validation.
    #[error("All dates must be in yyyy-mm-dd format and not earlier than {min}")]
    InvalidDate {
        /// The earliest accepted date.
        min: NaiveDate,
        /// Form field names of the offending dates.
        fields: Vec<&'static str>,
    },

    /// Saving the document or appending the record failed.
    #[error("Error saving file: {0}")]
    StorageWriteFailure(String),
}

impl IntakeError {
    /// Wrap an infrastructure error as a storage write failure.
    #[must_use]
    pub fn storage(err: &Error) -> Self {
        Self::StorageWriteFailure(err.to_string())
    }

    /// Check if the rejection came from user input rather than the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::StorageWriteFailure(_))
    }
}

/// Why a report lookup produced no table.
#[derive(Error, Debug)]
pub enum ReportError {
    /// No vehicle number was supplied.
    #[error("Vehicle Number is required for report")]
    MissingVehicleNumber,

    /// The vehicle number is not in the store.
    #[error("Vehicle Number does not exist")]
    NotFound,

    /// The vehicle number exists but no row came back.
    #[error("No data found for the given Vehicle Number")]
    NoData,

    /// Reading the store failed.
    #[error("Error reading records: {0}")]
    Storage(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");

        let err = Error::DuplicateVehicle {
            vehicle_number: "MH12AB1234".to_string(),
        };
        assert!(err.to_string().contains("MH12AB1234"));
    }

    #[test]
    fn test_error_is_duplicate() {
        let err = Error::DuplicateVehicle {
            vehicle_number: "KA01".to_string(),
        };
        assert!(err.is_duplicate());
        assert!(!Error::internal("x").is_duplicate());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("max_upload_bytes must be greater than 0");
        assert!(err.to_string().contains("max_upload_bytes"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_document_write_error_display() {
        let err = Error::DocumentWrite {
            path: PathBuf::from("/srv/documents/KA01.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("KA01.pdf"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_intake_messages() {
        let dup = IntakeError::DuplicateKey {
            vehicle_number: "KA01".to_string(),
        };
        assert_eq!(dup.to_string(), "Vehicle Number already exists");
        assert_eq!(IntakeError::MissingFile.to_string(), "No file part");
        assert_eq!(IntakeError::EmptyFilename.to_string(), "No selected file");
        assert_eq!(IntakeError::InvalidFileType.to_string(), "Invalid file format");
    }

    #[test]
    fn test_invalid_date_message_is_aggregate() {
        let err = IntakeError::InvalidDate {
            min: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            fields: vec!["insuranceExpiry", "permitExpiry"],
        };
        assert_eq!(
            err.to_string(),
            "All dates must be in yyyy-mm-dd format and not earlier than 2024-01-01"
        );
    }

    #[test]
    fn test_storage_failure_carries_source_text() {
        let err = IntakeError::storage(&Error::internal("disk full"));
        assert!(err.to_string().starts_with("Error saving file:"));
        assert!(err.to_string().contains("disk full"));
        assert!(!err.is_client_error());
        assert!(IntakeError::MissingFile.is_client_error());
    }

    #[test]
    fn test_report_messages() {
        assert_eq!(
            ReportError::NotFound.to_string(),
            "Vehicle Number does not exist"
        );
        assert_eq!(
            ReportError::MissingVehicleNumber.to_string(),
            "Vehicle Number is required for report"
        );
    }
}
