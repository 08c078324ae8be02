//! Field validation for intake submissions.
//!
//! Weights are free text and are not checked. Dates must parse as
//! `YYYY-MM-DD` and fall on or after a configured minimum. Documents must be
//! named `*.pdf` and declared as `application/pdf`.

use chrono::NaiveDate;

use crate::error::IntakeError;
use crate::record::ExpiryDates;

/// Format accepted for expiry dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Content type a document must be declared with.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// File extension a document must carry.
pub const PDF_EXTENSION: &str = ".pdf";

/// The earliest expiry date accepted when none is configured.
#[must_use]
pub fn default_min_expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// An uploaded file as received from the form.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// File name supplied by the client.
    pub filename: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check a single date string.
///
/// Only ASCII digits and `-` are allowed, since chrono's parser skips
/// whitespace and accepts a sign before the year.
#[must_use]
pub fn is_valid_date(value: &str, min: NaiveDate) -> bool {
    let plain = !value.starts_with('-')
        && value.bytes().all(|b| b.is_ascii_digit() || b == b'-');

    plain && NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok_and(|date| date >= min)
}

/// Check all four expiry dates, reporting every failing field at once.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidDate`] if any date is malformed or earlier
/// than `min`.
pub fn validate_expiry_dates(dates: &ExpiryDates, min: NaiveDate) -> Result<(), IntakeError> {
    let fields: Vec<&'static str> = dates
        .by_field()
        .into_iter()
        .filter(|(_, value)| !is_valid_date(value, min))
        .map(|(field, _)| field)
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(IntakeError::InvalidDate { min, fields })
    }
}

/// Check the uploaded document and hand it back on success.
///
/// # Errors
///
/// Returns the first upload problem found: missing file, empty file name,
/// wrong extension or content type, or a body over `max_bytes`.
pub fn validate_document(
    document: Option<UploadedDocument>,
    max_bytes: usize,
) -> Result<UploadedDocument, IntakeError> {
    let document = document.ok_or(IntakeError::MissingFile)?;

    if document.filename.is_empty() {
        return Err(IntakeError::EmptyFilename);
    }

    if !has_pdf_extension(&document.filename)
        || !document.content_type.as_deref().is_some_and(is_pdf_content_type)
    {
        return Err(IntakeError::InvalidFileType);
    }

    if document.bytes.len() > max_bytes {
        return Err(IntakeError::UploadTooLarge { limit: max_bytes });
    }

    Ok(document)
}

/// Check that a vehicle number can name a file inside the upload directory.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidVehicleNumber`] for empty values, `.`/`..`,
/// and values containing path separators or control characters.
pub fn validate_vehicle_number(vehicle_number: &str) -> Result<(), IntakeError> {
    let unsafe_name = vehicle_number.trim().is_empty()
        || vehicle_number == "."
        || vehicle_number == ".."
        || vehicle_number
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());

    if unsafe_name {
        Err(IntakeError::InvalidVehicleNumber)
    } else {
        Ok(())
    }
}

fn has_pdf_extension(filename: &str) -> bool {
    filename.len() > PDF_EXTENSION.len()
        && filename
            .get(filename.len() - PDF_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

// Parameters such as `; name=...` are ignored, only the essence is compared.
fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}
