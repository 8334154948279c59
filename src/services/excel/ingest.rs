use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use tracing::{debug, error, info, warn};

use super::utils::{cell_value, header_text, unique_header};
use crate::error::AppError;
use crate::models::{CellValue, Row, Sheet};

/// Parses an xlsx buffer into its sheets, in workbook order.
///
/// Sheets without a usable header row are skipped. Any container or
/// worksheet read failure aborts the whole workbook.
pub fn ingest_workbook(bytes: &[u8]) -> Result<Vec<Sheet>, AppError> {
    let start = std::time::Instant::now();

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| {
            error!("Failed to open Excel file: {}", e);
            AppError::Ingestion(format!("Failed to open Excel file: {}", e))
        })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            error!("Failed to read worksheet {}: {}", sheet_name, e);
            AppError::Ingestion(format!("Failed to read worksheet {}: {}", sheet_name, e))
        })?;

        match sheet_from_range(sheet_name, &range) {
            Some(sheet) => {
                debug!(
                    "Parsed sheet {} with {} columns and {} rows",
                    sheet_name,
                    sheet.headers.len(),
                    sheet.rows.len()
                );
                sheets.push(sheet);
            }
            None => warn!("Sheet '{}' is empty or has no header row. Skipping.", sheet_name),
        }
    }

    info!("Parsed {} of {} sheets in {:?}", sheets.len(), sheet_names.len(), start.elapsed());
    Ok(sheets)
}

/// Builds a [`Sheet`] from a worksheet range whose first spreadsheet row holds the headers.
pub(crate) fn sheet_from_range(name: &str, range: &Range<Data>) -> Option<Sheet> {
    // The used range must begin on row 1, otherwise there is no header row.
    let (start_row, _) = range.start()?;
    if start_row != 0 {
        return None;
    }

    let mut rows = range.rows();
    let header_cells = rows.next()?;

    let mut existing_names = HashSet::new();
    let mut offsets = Vec::new();
    let mut headers = Vec::new();
    for (offset, cell) in header_cells.iter().enumerate() {
        if let Some(text) = header_text(cell) {
            let header = unique_header(&text, &mut existing_names);
            if header != text {
                debug!("Duplicate header {:?} in sheet {} renamed to {:?}", text, name, header);
            }
            offsets.push(offset);
            headers.push(header);
        }
    }

    if headers.is_empty() {
        return None;
    }

    // A row is dropped only when none of its cells is populated, including
    // cells outside the header columns.
    let rows = rows
        .filter(|cells| cells.iter().any(|cell| cell_value(cell).is_some()))
        .map(|cells| {
            let values: Vec<Option<CellValue>> = offsets
                .iter()
                .map(|&offset| cells.get(offset).and_then(cell_value))
                .collect();
            Row::new(values)
        })
        .collect();

    Some(Sheet::new(name, headers, rows))
}
