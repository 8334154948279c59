use smallvec::smallvec;

use crate::models::{ChartSuggestion, ChartType, ColumnProfile, DataType};

/// Suggests charts for one sheet's profiles.
///
/// Rules run in a fixed order (Line, Bar, Scatter, Pie) and their results are
/// concatenated without de-duplication. Within a rule, columns are visited in
/// profile order.
pub fn recommend_charts(profiles: &[ColumnProfile]) -> Vec<ChartSuggestion> {
    let of_type = |data_type: DataType| -> Vec<&str> {
        profiles
            .iter()
            .filter(|p| p.data_type == data_type)
            .map(|p| p.column_name.as_str())
            .collect()
    };

    let numeric = of_type(DataType::Numeric);
    let categorical = of_type(DataType::Categorical);
    let datetime = of_type(DataType::DateTime);

    let mut suggestions = Vec::new();

    for date in &datetime {
        for value in &numeric {
            suggestions.push(ChartSuggestion {
                chart_type: ChartType::Line,
                columns: smallvec![date.to_string(), value.to_string()],
                title: format!("`{}` over Time (`{}`)", value, date),
            });
        }
    }

    for category in &categorical {
        for value in &numeric {
            suggestions.push(ChartSuggestion {
                chart_type: ChartType::Bar,
                columns: smallvec![category.to_string(), value.to_string()],
                title: format!("Total `{}` by `{}`", value, category),
            });
        }
    }

    for (i, x) in numeric.iter().enumerate() {
        for y in &numeric[i + 1..] {
            suggestions.push(ChartSuggestion {
                chart_type: ChartType::Scatter,
                columns: smallvec![x.to_string(), y.to_string()],
                title: format!("Relationship between `{}` and `{}`", x, y),
            });
        }
    }

    for category in &categorical {
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Pie,
            columns: smallvec![category.to_string()],
            title: format!("Distribution of `{}`", category),
        });
    }

    suggestions
}
