//! Vehicle record types.
//!
//! A [`VehicleRecord`] is one row of the tabular store: the registration
//! fields submitted through the intake form plus the path of the stored
//! document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column labels of the tabular store, in display order.
pub const COLUMNS: [&str; 8] = [
    "Vehicle Number",
    "Unladen Weight",
    "Loaden Weight",
    "Insurance Expiry Date",
    "Fitness Expiry Date",
    "Pollution Expiry Date",
    "Permit Expiry Date",
    "File Path",
];

/// The four expiry dates carried by every record.
///
/// Values are kept exactly as submitted (`YYYY-MM-DD` once validated).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryDates {
    /// Insurance expiry date.
    pub insurance: String,
    /// Fitness certificate expiry date.
    pub fitness: String,
    /// Pollution certificate expiry date.
    pub pollution: String,
    /// Permit expiry date.
    pub permit: String,
}

impl ExpiryDates {
    /// Pair each date with the name of the form field it came from.
    #[must_use]
    pub fn by_field(&self) -> [(&'static str, &str); 4] {
        [
            ("insuranceExpiry", self.insurance.as_str()),
            ("fitnessExpiry", self.fitness.as_str()),
            ("pollutionExpiry", self.pollution.as_str()),
            ("permitExpiry", self.permit.as_str()),
        ]
    }
}

/// A stored vehicle submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// Row identifier (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// When the submission was accepted.
    pub created_at: DateTime<Utc>,

    /// Vehicle registration number, unique across the store.
    pub vehicle_number: String,

    /// Unladen weight as entered.
    pub unladen_weight: String,

    /// Laden weight as entered.
    pub loaden_weight: String,

    /// Certificate expiry dates.
    pub expiry: ExpiryDates,

    /// Path of the stored document.
    pub file_path: String,
}

impl VehicleRecord {
    /// Create a new record timestamped now.
    #[must_use]
    pub fn new(
        vehicle_number: String,
        unladen_weight: String,
        loaden_weight: String,
        expiry: ExpiryDates,
        file_path: String,
    ) -> Self {
        Self {
            id: None,
            created_at: Utc::now(),
            vehicle_number,
            unladen_weight,
            loaden_weight,
            expiry,
            file_path,
        }
    }

    /// Values in [`COLUMNS`] order, each paired with its label.
    #[must_use]
    pub fn columns(&self) -> [(&'static str, &str); 8] {
        [
            (COLUMNS[0], self.vehicle_number.as_str()),
            (COLUMNS[1], self.unladen_weight.as_str()),
            (COLUMNS[2], self.loaden_weight.as_str()),
            (COLUMNS[3], self.expiry.insurance.as_str()),
            (COLUMNS[4], self.expiry.fitness.as_str()),
            (COLUMNS[5], self.expiry.pollution.as_str()),
            (COLUMNS[6], self.expiry.permit.as_str()),
            (COLUMNS[7], self.file_path.as_str()),
        ]
    }
}
