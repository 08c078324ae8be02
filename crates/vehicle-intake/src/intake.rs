//! The intake pipeline and the report lookup.
//!
//! A submission moves `Received → Validated → Stored → Acknowledged`. Any
//! failure ends it in `Rejected` with a single [`IntakeError`]. The whole
//! pipeline runs while holding the store's writer lock, so two submissions
//! for the same vehicle number are serialized and the second one sees the
//! first one's row.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::documents::DocumentStore;
use crate::error::{IntakeError, ReportError};
use crate::record::{ExpiryDates, VehicleRecord};
use crate::storage::{SharedStorage, Storage};
use crate::validation::{
    validate_document, validate_expiry_dates, validate_vehicle_number, UploadedDocument,
};

/// A form submission as received, before any validation.
///
/// Text fields are `None` when the form did not include them at all.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// `vehicleNumber`
    pub vehicle_number: Option<String>,
    /// `unladenWeight`
    pub unladen_weight: Option<String>,
    /// `loadenWeight`
    pub loaden_weight: Option<String>,
    /// `insuranceExpiry`
    pub insurance_expiry: Option<String>,
    /// `fitnessExpiry`
    pub fitness_expiry: Option<String>,
    /// `pollutionExpiry`
    pub pollution_expiry: Option<String>,
    /// `permitExpiry`
    pub permit_expiry: Option<String>,
    /// `pdfFile`
    pub document: Option<UploadedDocument>,
}

/// Validates submissions and persists accepted ones.
#[derive(Debug, Clone)]
pub struct IntakeService {
    storage: SharedStorage,
    documents: DocumentStore,
    min_expiry: NaiveDate,
    max_upload_bytes: usize,
}

impl IntakeService {
    /// Create a service over a shared store and a document directory.
    #[must_use]
    pub fn new(
        storage: SharedStorage,
        documents: DocumentStore,
        min_expiry: NaiveDate,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            storage,
            documents,
            min_expiry,
            max_upload_bytes,
        }
    }

    /// The shared store this service writes to.
    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Settle a form that could not be read to the end.
    ///
    /// The duplicate check still comes first, so a known vehicle number read
    /// before the failure replaces the read error.
    #[must_use]
    pub fn reject_unreadable(&self, vehicle_number: Option<&str>, err: IntakeError) -> IntakeError {
        let Some(vehicle_number) = vehicle_number else {
            return err;
        };
        match self.storage.lock().and_then(|s| s.exists(vehicle_number)) {
            Ok(true) => IntakeError::DuplicateKey {
                vehicle_number: vehicle_number.to_string(),
            },
            Ok(false) => err,
            Err(e) => IntakeError::storage(&e),
        }
    }

    /// Run a submission through the pipeline.
    ///
    /// This blocks on file and database I/O; async callers should run it on
    /// a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns the reason the submission was rejected. Checks run in order:
    /// duplicate vehicle number, document, expiry dates, then storage.
    pub fn submit(&self, submission: Submission) -> Result<VehicleRecord, IntakeError> {
        let vehicle_number = required(submission.vehicle_number, "vehicleNumber")?;

        let storage = self
            .storage
            .lock()
            .map_err(|e| IntakeError::storage(&e))?;

        if storage
            .exists(&vehicle_number)
            .map_err(|e| IntakeError::storage(&e))?
        {
            return Err(IntakeError::DuplicateKey { vehicle_number });
        }
        validate_vehicle_number(&vehicle_number)?;

        let document = validate_document(submission.document, self.max_upload_bytes)?;

        let expiry = ExpiryDates {
            insurance: required(submission.insurance_expiry, "insuranceExpiry")?,
            fitness: required(submission.fitness_expiry, "fitnessExpiry")?,
            pollution: required(submission.pollution_expiry, "pollutionExpiry")?,
            permit: required(submission.permit_expiry, "permitExpiry")?,
        };
        validate_expiry_dates(&expiry, self.min_expiry)?;

        let unladen_weight = required(submission.unladen_weight, "unladenWeight")?;
        let loaden_weight = required(submission.loaden_weight, "loadenWeight")?;

        let path = self
            .documents
            .save(&vehicle_number, &document.bytes)
            .map_err(|e| {
                error!(vehicle_number = %vehicle_number, error = %e, "Failed to save document");
                IntakeError::storage(&e)
            })?;

        let mut record = VehicleRecord::new(
            vehicle_number,
            unladen_weight,
            loaden_weight,
            expiry,
            path.display().to_string(),
        );

        match storage.append(&record) {
            Ok(id) => record.id = Some(id),
            Err(e) => {
                error!(
                    vehicle_number = %record.vehicle_number,
                    error = %e,
                    "Failed to append record"
                );
                self.discard_document(&path);
                return Err(if e.is_duplicate() {
                    IntakeError::DuplicateKey {
                        vehicle_number: record.vehicle_number,
                    }
                } else {
                    IntakeError::storage(&e)
                });
            }
        }

        info!(
            vehicle_number = %record.vehicle_number,
            id = record.id,
            bytes = document.bytes.len(),
            "Vehicle record stored"
        );
        Ok(record)
    }

    /// Look up the record for a report.
    ///
    /// # Errors
    ///
    /// See [`lookup`].
    pub fn report(&self, vehicle_number: Option<&str>) -> Result<VehicleRecord, ReportError> {
        let storage = self.storage.lock()?;
        lookup(&storage, vehicle_number)
    }

    fn discard_document(&self, path: &Path) {
        if let Err(e) = self.documents.remove(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove orphaned document");
        }
    }
}

/// Find the record to show in a report.
///
/// # Errors
///
/// Returns [`ReportError::MissingVehicleNumber`] for an absent or empty
/// number, [`ReportError::NotFound`] when the store has no such vehicle, and
/// [`ReportError::NoData`] if the vehicle exists but no row comes back.
pub fn lookup(storage: &Storage, vehicle_number: Option<&str>) -> Result<VehicleRecord, ReportError> {
    let vehicle_number = vehicle_number
        .filter(|v| !v.is_empty())
        .ok_or(ReportError::MissingVehicleNumber)?;

    if !storage.exists(vehicle_number)? {
        return Err(ReportError::NotFound);
    }

    storage
        .find_all(vehicle_number)?
        .into_iter()
        .next()
        .ok_or(ReportError::NoData)
}

fn required(value: Option<String>, field: &'static str) -> Result<String, IntakeError> {
    value.ok_or(IntakeError::MissingField(field))
}
