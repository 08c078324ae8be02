//! Shared helpers for the HTTP integration tests.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use percent_encoding::percent_decode_str;
use tempfile::TempDir;
use tower::ServiceExt;
use vehicle_intake::{create_router, AppState, Config};

const BOUNDARY: &str = "vintake-test-boundary";

/// A router over a temporary database and document directory.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: AppState,
    temp_dir: TempDir,
}

/// A fully buffered response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The banner message carried by a redirect to `/`.
    pub fn redirect_message(&self) -> String {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "expected a redirect");
        let location = self.headers[header::LOCATION]
            .to_str()
            .expect("Location is not ASCII");
        let encoded = location
            .strip_prefix("/?message=")
            .expect("redirect does not target the form");
        percent_decode_str(encoded)
            .decode_utf8()
            .expect("message is not UTF-8")
            .into_owned()
    }
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut Config),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = Config::default();
        config.server.bind = "127.0.0.1:0".to_string();
        config.storage.database_path = Some(temp_dir.path().join("vehicles.db"));
        config.storage.upload_dir = Some(temp_dir.path().join("documents"));
        modifier(&mut config);

        let state = AppState::open(config).expect("Failed to open stores");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            temp_dir,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.temp_dir.path().join("documents")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn upload(&self, form: &MultipartForm) -> TestResponse {
        self.send(form.request()).await
    }
}

enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: Option<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Builder for a `multipart/form-data` body.
#[allow(dead_code)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

#[allow(dead_code)]
impl MultipartForm {
    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    /// Every field of the intake form, with valid values and a small PDF.
    pub fn valid(vehicle_number: &str) -> Self {
        Self::empty()
            .text("vehicleNumber", vehicle_number)
            .text("unladenWeight", "7200")
            .text("loadenWeight", "16000")
            .text("insuranceExpiry", "2025-06-30")
            .text("fitnessExpiry", "2026-01-15")
            .text("pollutionExpiry", "2024-11-01")
            .text("permitExpiry", "2027-03-31")
            .file("registration.pdf", Some("application/pdf"), b"%PDF-1.4\n%test\n")
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.retain(|p| !matches!(p, Part::Text { name: n, .. } if n == name));
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Replace the `pdfFile` part.
    pub fn file(self, filename: &str, content_type: Option<&str>, bytes: &[u8]) -> Self {
        self.raw_file(Some(filename), content_type, bytes)
    }

    /// Replace the `pdfFile` part; `filename: None` omits the parameter.
    pub fn raw_file(mut self, filename: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> Self {
        self = self.without("pdfFile");
        self.parts.push(Part::File {
            name: "pdfFile".to_string(),
            filename: filename.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        });
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.parts.retain(|p| match p {
            Part::Text { name: n, .. } | Part::File { name: n, .. } => n != name,
        });
        self
    }

    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    filename,
                    content_type,
                    bytes,
                } => {
                    let mut disposition = format!("Content-Disposition: form-data; name=\"{name}\"");
                    if let Some(filename) = filename {
                        disposition.push_str(&format!("; filename=\"{filename}\""));
                    }
                    body.extend_from_slice(disposition.as_bytes());
                    body.extend_from_slice(b"\r\n");
                    if let Some(content_type) = content_type {
                        body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
                    }
                    body.extend_from_slice(b"\r\n");
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub fn request(&self) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body()))
            .unwrap()
    }
}
