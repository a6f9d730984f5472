use actix_web::{HttpResponse, http::header};
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// One output column: a header and how to render a row's cell.
pub struct Column<T> {
    pub header: &'static str,
    pub cell: fn(&T) -> String,
}

impl<T> Column<T> {
    pub fn new(header: &'static str, cell: fn(&T) -> String) -> Self {
        Self { header, cell }
    }
}

/// Renders `rows` as CSV with a single header row.
pub fn render_csv<T>(columns: &[Column<T>], rows: &[T]) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);

    wtr.write_record(columns.iter().map(|c| c.header))
        .map_err(|e| AppError::Internal(format!("csv header: {e}")))?;

    for row in rows {
        wtr.write_record(columns.iter().map(|c| (c.cell)(row)))
            .map_err(|e| AppError::Internal(format!("csv row: {e}")))?;
    }

    wtr.into_inner()
        .map_err(|e| AppError::Internal(format!("csv flush: {e}")))
}

pub fn csv_attachment(filename: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={filename}"),
        ))
        .body(body)
}

pub fn time_cell(instant: Option<DateTime<Utc>>) -> String {
    instant
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn hours_cell(hours: Option<f64>) -> String {
    hours.map(|h| h.to_string()).unwrap_or_default()
}

pub fn text_cell(text: Option<&str>) -> String {
    text.unwrap_or_default().to_string()
}
