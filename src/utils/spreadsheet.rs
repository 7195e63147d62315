use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AttendanceCount {
    pub employee_id: u64,
    pub display_name: String,
    pub attendance_count: i64,
}

const HEADERS: [&str; 3] = ["Employee ID", "Name", "Attendance Count"];

/// Renders the monthly attendance counts as an `.xlsx` workbook.
pub fn attendance_count_workbook(rows: &[AttendanceCount]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Attendance")?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_number(r, 0, row.employee_id as f64)?;
        sheet.write_string(r, 1, &row.display_name)?;
        sheet.write_number(r, 2, row.attendance_count as f64)?;
    }

    workbook.save_to_buffer()
}
