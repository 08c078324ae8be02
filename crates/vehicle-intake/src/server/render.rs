//! HTML pages.
//!
//! Page templates are static markup; every dynamic value is interpolated
//! through [`Escaped`], so user-supplied text can never become markup.

use std::fmt::{self, Display, Write as _};

use crate::record::VehicleRecord;

const STYLESHEET: &str = "https://stackpath.bootstrapcdn.com/bootstrap/4.3.1/css/bootstrap.min.css";

/// Display wrapper that HTML-escapes its contents.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            f.write_str(match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#x27;",
            })?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

/// Human-readable size for the upload label, e.g. `5MB`.
#[must_use]
pub fn size_label(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    const KIB: usize = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// The intake and report-lookup forms, with an optional alert banner.
#[must_use]
pub fn index_page(message: Option<&str>, max_upload_bytes: usize) -> String {
    let alert = message
        .filter(|m| !m.is_empty())
        .map(|m| {
            format!(
                r#"<div class="alert alert-danger mt-3" role="alert">{}</div>"#,
                Escaped(m)
            )
        })
        .unwrap_or_default();

    let mut fields = String::new();
    for (id, label, kind) in [
        ("vehicleNumber", "Vehicle Number", "text"),
        ("unladenWeight", "Unladen Weight", "text"),
        ("loadenWeight", "Loaden Weight", "text"),
        ("insuranceExpiry", "Insurance Expiry Date", "date"),
        ("fitnessExpiry", "Fitness Expiry Date", "date"),
        ("pollutionExpiry", "Pollution Expiry Date", "date"),
        ("permitExpiry", "Permit Expiry Date", "date"),
    ] {
        let _ = write!(
            fields,
            r#"
                <div class="form-group">
                    <label for="{id}">{label}:</label>
                    <input type="{kind}" class="form-control" id="{id}" name="{id}" required>
                </div>"#
        );
    }

    layout(
        "Vehicle Data Entry",
        &format!(
            r#"
            <h2 class="text-center">Vehicle Data Entry</h2>
            <form method="post" enctype="multipart/form-data" action="/upload">{fields}
                <div class="form-group">
                    <label for="pdfFile">Upload PDF (max {limit}):</label>
                    <input type="file" class="form-control-file" id="pdfFile" name="pdfFile" accept="application/pdf" required>
                </div>
                <button type="submit" class="btn btn-success btn-block">Submit</button>
                {alert}
            </form>

            <h2 class="text-center mt-5">Generate Report</h2>
            <form method="get" action="/report">
                <div class="form-group">
                    <label for="reportVehicleNumber">Vehicle Number:</label>
                    <input type="text" class="form-control" id="reportVehicleNumber" name="vehicleNumber" required>
                </div>
                <button type="submit" class="btn btn-primary btn-block">Generate Report</button>
            </form>
            <p class="text-center mt-3"><a href="/export.xlsx">Download all records (.xlsx)</a></p>"#,
            limit = size_label(max_upload_bytes),
        ),
    )
}

/// A key/value table of one record.
#[must_use]
pub fn report_page(record: &VehicleRecord) -> String {
    let mut rows = String::new();
    for (label, value) in record.columns() {
        let _ = write!(
            rows,
            "\n                <tr><th>{label}</th><td>{}</td></tr>",
            Escaped(value)
        );
    }

    layout(
        "Vehicle Report",
        &format!(
            r#"
            <h2 class="text-center">Vehicle Report</h2>
            <table class="table table-bordered">{rows}
            </table>
            <a href="/" class="btn btn-primary">Back</a>"#
        ),
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="{STYLESHEET}">
</head>
<body>
    <div class="container mt-5">{body}
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ExpiryDates;

    #[test]
    fn test_escaped() {
        assert_eq!(
            Escaped(r#"<script>alert("x&y")</script>"#).to_string(),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(Escaped("it's").to_string(), "it&#x27;s");
        assert_eq!(Escaped("plain text").to_string(), "plain text");
        assert_eq!(Escaped("").to_string(), "");
        assert_eq!(Escaped("ŗ<ŗ").to_string(), "ŗ&lt;ŗ");
    }

    #[test]
    fn test_size_label() {
        assert_eq!(size_label(5 * 1024 * 1024), "5MB");
        assert_eq!(size_label(512 * 1024), "512KB");
        assert_eq!(size_label(100), "100 bytes");
    }

    #[test]
    fn test_index_page_without_message() {
        let html = index_page(None, 5 * 1024 * 1024);
        assert!(html.contains(r#"action="/upload""#));
        assert!(html.contains(r#"name="permitExpiry""#));
        assert!(html.contains("Upload PDF (max 5MB)"));
        assert!(!html.contains("alert-danger"));
    }

    #[test]
    fn test_index_page_escapes_message() {
        let html = index_page(Some("<img src=x onerror=alert(1)>"), 1024);
        assert!(html.contains("alert-danger"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_report_page_escapes_values() {
        let record = VehicleRecord::new(
            "TN<b>07</b>".to_string(),
            "7000".to_string(),
            "15000".to_string(),
            ExpiryDates {
                insurance: "2025-01-01".to_string(),
                fitness: "2025-02-02".to_string(),
                pollution: "2025-03-03".to_string(),
                permit: "2025-04-04".to_string(),
            },
            "/docs/x.pdf".to_string(),
        );

        let html = report_page(&record);
        assert!(html.contains("<tr><th>Vehicle Number</th><td>TN&lt;b&gt;07&lt;/b&gt;</td></tr>"));
        assert!(html.contains("<tr><th>Permit Expiry Date</th><td>2025-04-04</td></tr>"));
        assert!(html.contains(r#"<a href="/" class="btn btn-primary">Back</a>"#));
    }
}
