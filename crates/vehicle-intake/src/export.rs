//! Spreadsheet export of the vehicle store.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::error::Result;
use crate::record::{VehicleRecord, COLUMNS};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Vehicles";

/// File name used when exporting next to the stored documents.
pub const WORKBOOK_FILE_NAME: &str = "vehicle_data.xlsx";

/// MIME type of an `.xlsx` workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build a workbook with a header row and one row per record.
///
/// # Errors
///
/// Returns an error if a cell cannot be written.
pub fn build_workbook(records: &[VehicleRecord]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_vehicle_sheet(sheet, records)?;
    Ok(workbook)
}

/// Render the workbook to an in-memory `.xlsx` file.
///
/// # Errors
///
/// Returns an error if the workbook cannot be built or serialized.
pub fn to_xlsx_bytes(records: &[VehicleRecord]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(records)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the workbook to disk.
///
/// # Errors
///
/// Returns an error if the workbook cannot be built or saved.
pub fn save_xlsx(records: &[VehicleRecord], path: &Path) -> Result<()> {
    let mut workbook = build_workbook(records)?;
    workbook.save(path)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn write_vehicle_sheet(sheet: &mut Worksheet, records: &[VehicleRecord]) -> Result<()> {
    sheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (col, header) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(0, col, header, &header_format)?;
    }

    for (row, record) in (1u32..).zip(records) {
        for (col, (_, value)) in (0u16..).zip(record.columns()) {
            sheet.write_string(row, col, value)?;
        }
    }

    sheet.autofit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{open_workbook_from_rs, Reader, Xlsx};

    use super::*;
    use crate::record::ExpiryDates;

    fn record(vehicle_number: &str) -> VehicleRecord {
        VehicleRecord::new(
            vehicle_number.to_string(),
            "7000".to_string(),
            "15000".to_string(),
            ExpiryDates {
                insurance: "2025-01-01".to_string(),
                fitness: "2025-02-02".to_string(),
                pollution: "2025-03-03".to_string(),
                permit: "2025-04-04".to_string(),
            },
            format!("/docs/{vehicle_number}.pdf"),
        )
    }

    /// Sheet names and cell text of a rendered workbook.
    fn read_back(bytes: Vec<u8>) -> (Vec<String>, Vec<Vec<String>>) {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let names = workbook.sheet_names();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows = range
            .rows()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        (names, rows)
    }

    #[test]
    fn test_xlsx_bytes_are_a_zip_container() {
        let bytes = to_xlsx_bytes(&[record("A1"), record("B2")]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_workbook_has_header_and_one_row_per_record() {
        let bytes = to_xlsx_bytes(&[record("A1"), record("B2")]).unwrap();
        let (names, rows) = read_back(bytes);

        assert_eq!(names, vec![SHEET_NAME.to_string()]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], COLUMNS);
        assert_eq!(
            rows[1],
            [
                "A1",
                "7000",
                "15000",
                "2025-01-01",
                "2025-02-02",
                "2025-03-03",
                "2025-04-04",
                "/docs/A1.pdf"
            ]
        );
        assert_eq!(rows[2][0], "B2");
        assert_eq!(rows[2][7], "/docs/B2.pdf");
    }

    #[test]
    fn test_empty_store_still_has_header() {
        let (names, rows) = read_back(to_xlsx_bytes(&[]).unwrap());
        assert_eq!(names, vec![SHEET_NAME.to_string()]);
        assert_eq!(rows, vec![COLUMNS.map(String::from).to_vec()]);
    }

    #[test]
    fn test_numeric_looking_values_stay_text() {
        let mut leading_zero = record("007");
        leading_zero.unladen_weight = "0700".to_string();

        let (_, rows) = read_back(to_xlsx_bytes(&[leading_zero]).unwrap());
        assert_eq!(rows[1][0], "007");
        assert_eq!(rows[1][1], "0700");
    }

    #[test]
    fn test_save_xlsx_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(WORKBOOK_FILE_NAME);

        save_xlsx(&[record("MH12")], &path).unwrap();
        let (_, rows) = read_back(std::fs::read(&path).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "MH12");
    }
}
