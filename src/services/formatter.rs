use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::warn;

use crate::models::{
    ChartData, ChartSuggestion, ChartType, DatePoint, NameCount, NameValue, Sheet, ValueCounts,
    XyPoint,
};
use crate::services::excel::utils::as_datetime;

/// Reshapes a sheet into the payload a suggestion's chart type expects.
///
/// A suggestion that does not fit the sheet (unknown columns, or a column
/// count that does not match the chart type) gets an empty payload.
pub fn format_chart(sheet: &Sheet, suggestion: &ChartSuggestion) -> ChartData {
    let indices: Option<Vec<usize>> = suggestion
        .columns
        .iter()
        .map(|column| sheet.column_index(column))
        .collect();
    let Some(indices) = indices else {
        warn!(
            "Chart '{}' references columns missing from sheet {}: {:?}",
            suggestion.title, sheet.name, suggestion.columns
        );
        return ChartData::empty(suggestion.chart_type);
    };

    match (suggestion.chart_type, indices.as_slice()) {
        (ChartType::Bar, &[category, value]) => format_bar(sheet, category, value),
        (ChartType::Line, &[date, value]) => format_line(sheet, date, value),
        (ChartType::Scatter, &[x, y]) => format_scatter(sheet, x, y),
        (ChartType::Pie, &[category]) => format_pie(sheet, category),
        (chart_type, columns) => {
            warn!(
                "Cannot format {} chart '{}' over {} columns",
                chart_type,
                suggestion.title,
                columns.len()
            );
            ChartData::empty(chart_type)
        }
    }
}

/// Sums `value` per distinct `category`, groups in first-seen order.
/// Rows without a category are left out; non-numeric values add nothing.
fn format_bar(sheet: &Sheet, category: usize, value: usize) -> ChartData {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<NameValue> = Vec::new();

    for row in &sheet.rows {
        let Some(name) = row.get(category).map(|c| c.to_string()) else {
            continue;
        };
        let amount = row.get(value).and_then(|v| v.as_number()).unwrap_or(0.0);

        match positions.get(&name) {
            Some(&pos) => groups[pos].value += amount,
            None => {
                positions.insert(name.clone(), groups.len());
                groups.push(NameValue { name, value: amount });
            }
        }
    }

    ChartData::Bar(groups)
}

/// All rows, ascending by date. Rows whose date is missing or unparseable go last.
fn format_line(sheet: &Sheet, date: usize, value: usize) -> ChartData {
    let mut keyed: Vec<_> = sheet
        .rows
        .iter()
        .map(|row| {
            let key = row.get(date).and_then(as_datetime);
            let point = DatePoint {
                date: row.get(date).cloned(),
                value: row.get(value).cloned(),
            };
            (key, point)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ChartData::Line(keyed.into_iter().map(|(_, point)| point).collect())
}

fn format_scatter(sheet: &Sheet, x: usize, y: usize) -> ChartData {
    let points = sheet
        .rows
        .iter()
        .map(|row| XyPoint {
            x: row.get(x).cloned(),
            y: row.get(y).cloned(),
        })
        .collect();
    ChartData::Scatter(points)
}

fn format_pie(sheet: &Sheet, category: usize) -> ChartData {
    let counts = ValueCounts::tally(sheet.column_values(category).flatten());
    let slices = counts
        .iter()
        .map(|(name, value)| NameCount {
            name: name.to_string(),
            value,
        })
        .collect();
    ChartData::Pie(slices)
}
