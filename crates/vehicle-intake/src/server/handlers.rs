//! HTTP request handlers.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::render;
use super::state::AppState;
use crate::error::{Error, IntakeError, ReportError, Result};
use crate::export::{to_xlsx_bytes, WORKBOOK_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::intake::Submission;
use crate::validation::UploadedDocument;

/// Banner text after an accepted submission.
pub const UPLOAD_SUCCESS: &str = "File and data successfully uploaded";

/// Name of the multipart field carrying the document.
pub const DOCUMENT_FIELD: &str = "pdfFile";

/// Query string of the index page.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Banner text carried over from a redirect.
    pub message: Option<String>,
}

/// Query string of the report page.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// The vehicle to report on.
    #[serde(rename = "vehicleNumber")]
    pub vehicle_number: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the store answered.
    pub status: &'static str,
    /// Number of stored records.
    pub records: i64,
}

/// GET /
pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Html<String> {
    Html(render::index_page(
        query.message.as_deref(),
        state.config.intake.max_upload_bytes,
    ))
}

/// POST /upload
///
/// Always answers with a redirect back to the form, carrying either the
/// success banner or the rejection reason.
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Redirect {
    let limit = state.config.intake.max_upload_bytes;

    let outcome = match multipart {
        Ok(multipart) => {
            let intake = state.intake.clone();
            let mut submission = Submission::default();
            let read = read_submission(multipart, limit, &mut submission).await;
            let result = match read {
                Ok(()) => blocking(move || intake.submit(submission).map(|_| ())).await,
                Err(e) => {
                    let vehicle_number = submission.vehicle_number;
                    blocking(move || Err(intake.reject_unreadable(vehicle_number.as_deref(), e)))
                        .await
                }
            };
            result.unwrap_or_else(|e| Err(IntakeError::storage(&e)))
        }
        Err(rejection) => Err(IntakeError::MalformedForm(rejection.body_text())),
    };

    match outcome {
        Ok(()) => redirect_with_message(UPLOAD_SUCCESS),
        Err(e) => {
            if e.is_client_error() {
                warn!(error = %e, "Submission rejected");
            }
            redirect_with_message(&e.to_string())
        }
    }
}

/// GET /report
pub async fn report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> Response {
    let intake = state.intake.clone();
    let outcome = blocking(move || intake.report(query.vehicle_number.as_deref()))
        .await
        .map_err(ReportError::from)
        .and_then(|result| result);

    match outcome {
        Ok(record) => Html(render::report_page(&record)).into_response(),
        Err(e) => {
            if let ReportError::Storage(ref source) = e {
                error!(error = %source, "Report lookup failed");
            }
            redirect_with_message(&e.to_string()).into_response()
        }
    }
}

/// GET /export.xlsx
pub async fn export(State(state): State<AppState>) -> Result<Response> {
    let storage = state.storage().clone();
    let bytes = blocking(move || -> Result<Vec<u8>> {
        let records = storage.lock()?.all()?;
        to_xlsx_bytes(&records)
    })
    .await??;

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{WORKBOOK_FILE_NAME}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let storage = state.storage().clone();
    let records = blocking(move || -> Result<i64> {
        let count = storage.lock()?.count()?;
        Ok(count)
    })
    .await??;

    Ok(Json(HealthResponse {
        status: "ok",
        records,
    }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Redirect to the form with a banner message.
#[must_use]
pub fn redirect_with_message(message: &str) -> Redirect {
    Redirect::to(&format!(
        "/?message={}",
        utf8_percent_encode(message, NON_ALPHANUMERIC)
    ))
}

/// Collect the multipart fields into `submission`.
///
/// Only the first occurrence of a field counts. A `pdfFile` part without a
/// `filename` parameter is not a file and is ignored. On error, the fields
/// read so far stay in `submission`.
async fn read_submission(
    mut multipart: Multipart,
    limit: usize,
    submission: &mut Submission,
) -> std::result::Result<(), IntakeError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, limit))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == DOCUMENT_FIELD {
            let Some(filename) = field.file_name().map(str::to_owned) else {
                continue;
            };
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(&e, limit))?;
            if submission.document.is_none() {
                submission.document = Some(UploadedDocument {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let slot = match name.as_str() {
            "vehicleNumber" => &mut submission.vehicle_number,
            "unladenWeight" => &mut submission.unladen_weight,
            "loadenWeight" => &mut submission.loaden_weight,
            "insuranceExpiry" => &mut submission.insurance_expiry,
            "fitnessExpiry" => &mut submission.fitness_expiry,
            "pollutionExpiry" => &mut submission.pollution_expiry,
            "permitExpiry" => &mut submission.permit_expiry,
            _ => continue,
        };
        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(&e, limit))?;
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    Ok(())
}

fn multipart_error(err: &MultipartError, limit: usize) -> IntakeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::UploadTooLarge { limit }
    } else {
        IntakeError::MalformedForm(err.body_text())
    }
}

/// Run store I/O on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::internal(format!("blocking task failed: {e}")))
}
