use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::AppError;
use crate::models::{FinalOutput, FormattedChart, Sheet, SheetResult};
use crate::services::excel::ingest_workbook;
use crate::services::formatter::format_chart;
use crate::services::profiler::ColumnProfiler;
use crate::services::recommender::recommend_charts;

/// Full analysis of one uploaded workbook. Fails only when the buffer cannot
/// be read as a workbook; nothing partial is returned in that case.
pub fn analyze_workbook(
    bytes: &[u8],
    file_name: &str,
    config: &AnalysisConfig,
) -> Result<FinalOutput, AppError> {
    let start = std::time::Instant::now();
    info!("Starting analysis of {} ({}KB)", file_name, bytes.len() / 1024);

    let sheets = ingest_workbook(bytes)?;
    let output = analyze_sheets(&sheets, file_name, config);

    info!(
        "Analysis of {} completed in {:?}: {} sheets",
        file_name,
        start.elapsed(),
        output.sheets.len()
    );
    Ok(output)
}

pub fn analyze_sheets(sheets: &[Sheet], file_name: &str, config: &AnalysisConfig) -> FinalOutput {
    let profiler = ColumnProfiler::new(*config);

    FinalOutput {
        file_name: file_name.to_string(),
        sheets: sheets.iter().map(|sheet| analyze_sheet(sheet, &profiler)).collect(),
    }
}

fn analyze_sheet(sheet: &Sheet, profiler: &ColumnProfiler) -> SheetResult {
    let profiles = profiler.profile_sheet(sheet);
    let suggestions = recommend_charts(&profiles);

    let charts: Vec<FormattedChart> = suggestions
        .into_iter()
        .map(|suggestion| {
            let data = format_chart(sheet, &suggestion);
            if data.is_empty() {
                debug!("Chart '{}' in sheet {} has no data points", suggestion.title, sheet.name);
            }
            FormattedChart {
                title: suggestion.title,
                chart_type: suggestion.chart_type,
                data,
            }
        })
        .collect();

    info!(
        "Sheet {}: {} rows, {} columns, {} charts",
        sheet.name,
        sheet.rows.len(),
        sheet.headers.len(),
        charts.len()
    );

    SheetResult {
        sheet_name: sheet.name.clone(),
        charts,
    }
}
