use std::collections::HashSet;

use polars::prelude::*;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::models::{CellValue, ColumnProfile, DataType, NumericSummary, Sheet, ValueCounts};
use crate::services::excel::utils::is_date_string;

/// Storage kind of a column, before any semantic inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Object,
    Other,
}

/// Infers a [`DataType`] and summary for every column of a sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnProfiler {
    config: AnalysisConfig,
}

impl ColumnProfiler {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// One profile per header, in header order.
    pub fn profile_sheet(&self, sheet: &Sheet) -> Vec<ColumnProfile> {
        sheet
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<&CellValue> = sheet.column_values(idx).flatten().collect();
                let profile = self.profile_column(name, &values);
                debug!(
                    "Column {} in sheet {}: {:?}, cardinality {}",
                    name, sheet.name, profile.data_type, profile.cardinality
                );
                profile
            })
            .collect()
    }

    /// Profiles the non-null values of one column, given in row order.
    pub fn profile_column(&self, name: &str, values: &[&CellValue]) -> ColumnProfile {
        if values.is_empty() {
            return ColumnProfile::unsummarized(name, DataType::Unsupported, 0);
        }

        let cardinality = values
            .iter()
            .map(|value| value.to_string())
            .collect::<HashSet<_>>()
            .len();

        match self.detect_column_kind(values) {
            ColumnKind::Numeric => {
                let numbers = values.iter().filter_map(|v| v.as_number()).collect();
                ColumnProfile::numeric(name, cardinality, numeric_summary(numbers))
            }
            ColumnKind::Object if self.looks_like_dates(values) => {
                ColumnProfile::unsummarized(name, DataType::DateTime, cardinality)
            }
            ColumnKind::Object if cardinality <= self.config.categorical_threshold => {
                ColumnProfile::categorical(name, cardinality, ValueCounts::tally(values.iter().copied()))
            }
            ColumnKind::Object => ColumnProfile::unsummarized(name, DataType::Text, cardinality),
            ColumnKind::Other => {
                ColumnProfile::unsummarized(name, DataType::Unsupported, cardinality)
            }
        }
    }

    fn detect_column_kind(&self, values: &[&CellValue]) -> ColumnKind {
        if values.iter().all(|v| matches!(v, CellValue::Number(_))) {
            ColumnKind::Numeric
        } else if values.iter().all(|v| matches!(v, CellValue::Bool(_))) {
            ColumnKind::Other
        } else {
            ColumnKind::Object
        }
    }

    /// Sample heuristic: only the leading `date_sample_size` values are
    /// inspected, and one non-date among them rejects the whole column.
    fn looks_like_dates(&self, values: &[&CellValue]) -> bool {
        values
            .iter()
            .take(self.config.date_sample_size)
            .all(|value| match value {
                CellValue::DateTime(_) => true,
                CellValue::Text(s) => is_date_string(s),
                _ => false,
            })
    }
}

fn numeric_summary(values: Vec<f64>) -> NumericSummary {
    let count = values.len();
    let ca = Float64Chunked::from_vec("values", values);

    NumericSummary {
        mean: ca.mean().unwrap_or(f64::NAN),
        median: ca.median().unwrap_or(f64::NAN),
        std: if count > 1 { ca.std(1) } else { None },
        min: ca.min().unwrap_or(f64::NAN),
        max: ca.max().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Row, StatisticalSummary};

    fn single_column(name: &str, values: Vec<Option<CellValue>>) -> Sheet {
        let rows = values.into_iter().map(|v| Row::new(vec![v])).collect();
        Sheet::new("Sheet1", vec![name.to_string()], rows)
    }

    fn numbers(values: &[f64]) -> Vec<Option<CellValue>> {
        values.iter().map(|n| Some(CellValue::Number(*n))).collect()
    }

    fn texts(values: impl IntoIterator<Item = String>) -> Vec<Option<CellValue>> {
        values.into_iter().map(|s| Some(CellValue::Text(s))).collect()
    }

    fn profile(sheet: &Sheet) -> ColumnProfile {
        ColumnProfiler::default().profile_sheet(sheet).remove(0)
    }

    #[test]
    fn test_numeric_summary() {
        let sheet = single_column("Units", numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let profile = profile(&sheet);

        assert_eq!(profile.data_type, DataType::Numeric);
        assert_eq!(profile.cardinality, 5);
        let StatisticalSummary::Numeric(summary) = profile.statistical_summary else {
            panic!("expected a numeric summary");
        };
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        // sample std of 1..=5 is sqrt(2.5)
        assert!((summary.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_single_value_has_no_std() {
        let sheet = single_column("Units", numbers(&[7.0]));
        let StatisticalSummary::Numeric(summary) = profile(&sheet).statistical_summary else {
            panic!("expected a numeric summary");
        };
        assert_eq!(summary.std, None);
        assert_eq!(summary.median, 7.0);
    }

    #[test]
    fn test_nulls_are_ignored() {
        let mut values = numbers(&[2.0, 4.0]);
        values.insert(1, None);
        let profile = profile(&single_column("Units", values));
        assert_eq!(profile.data_type, DataType::Numeric);
        assert_eq!(profile.cardinality, 2);
    }

    #[test]
    fn test_all_null_column_is_unsupported() {
        let profile = profile(&single_column("Blank", vec![None, None]));
        assert_eq!(profile.data_type, DataType::Unsupported);
        assert_eq!(profile.cardinality, 0);
        assert!(profile.statistical_summary.is_none());
    }

    #[test]
    fn test_categorical_threshold_is_inclusive() {
        let at_threshold = single_column("Code", texts((0..25).map(|i| format!("code-{}", i))));
        let profile_25 = profile(&at_threshold);
        assert_eq!(profile_25.data_type, DataType::Categorical);
        assert_eq!(profile_25.cardinality, 25);

        let over_threshold = single_column("Code", texts((0..26).map(|i| format!("code-{}", i))));
        let profile_26 = profile(&over_threshold);
        assert_eq!(profile_26.data_type, DataType::Text);
        assert!(profile_26.statistical_summary.is_none());
    }

    #[test]
    fn test_value_counts_cover_all_values() {
        let values: Vec<String> = ["N", "S", "N", "E", "N", "S"].iter().map(|s| s.to_string()).collect();
        let profile = profile(&single_column("Region", texts(values)));

        let StatisticalSummary::Categorical(summary) = profile.statistical_summary else {
            panic!("expected a categorical summary");
        };
        assert_eq!(summary.value_counts.get("N"), Some(3));
        assert_eq!(summary.value_counts.get("S"), Some(2));
        assert_eq!(summary.value_counts.get("E"), Some(1));
        assert_eq!(summary.value_counts.total(), 6);
    }

    #[test]
    fn test_date_column_detected_from_sample() {
        let values = texts((1..=20).map(|d| format!("2024-01-{:02}", d)));
        let profile = profile(&single_column("Day", values));
        assert_eq!(profile.data_type, DataType::DateTime);
        assert_eq!(profile.cardinality, 20);
        assert!(profile.statistical_summary.is_none());
    }

    #[test]
    fn test_one_non_date_in_sample_rejects_datetime() {
        let mut values: Vec<String> = (1..=9).map(|d| format!("2024-01-{:02}", d)).collect();
        values.insert(4, "pending".to_string());
        let profile = profile(&single_column("Day", texts(values)));
        assert_eq!(profile.data_type, DataType::Categorical);
    }

    #[test]
    fn test_non_date_after_sample_is_not_inspected() {
        let mut values: Vec<String> = (1..=10).map(|d| format!("2024-01-{:02}", d)).collect();
        values.push("pending".to_string());
        let profile = profile(&single_column("Day", texts(values)));
        assert_eq!(profile.data_type, DataType::DateTime);
    }

    #[test]
    fn test_injected_thresholds() {
        let profiler = ColumnProfiler::new(AnalysisConfig {
            categorical_threshold: 2,
            date_sample_size: 1,
        });
        let values = ["a", "b", "c"].iter().map(|s| CellValue::Text(s.to_string())).collect::<Vec<_>>();
        let refs: Vec<&CellValue> = values.iter().collect();
        assert_eq!(profiler.profile_column("Letters", &refs).data_type, DataType::Text);

        let dated = [CellValue::Text("2024-01-01".into()), CellValue::Text("soon".into())];
        let refs: Vec<&CellValue> = dated.iter().collect();
        assert_eq!(profiler.profile_column("When", &refs).data_type, DataType::DateTime);
    }

    #[test]
    fn test_bool_column_is_unsupported() {
        let values = vec![Some(CellValue::Bool(true)), Some(CellValue::Bool(false))];
        let profile = profile(&single_column("Flag", values));
        assert_eq!(profile.data_type, DataType::Unsupported);
        assert_eq!(profile.cardinality, 2);
    }

    #[test]
    fn test_mixed_numbers_and_text_are_categorical() {
        let values = vec![Some(CellValue::Number(1.0)), Some(CellValue::Text("n/a".into()))];
        let profile = profile(&single_column("Score", values));
        assert_eq!(profile.data_type, DataType::Categorical);
    }

    #[test]
    fn test_profiling_is_repeatable() {
        let sheet = Sheet::new(
            "Sheet1",
            vec!["Region".into(), "Units".into()],
            vec![
                Row::new(vec![Some(CellValue::Text("N".into())), Some(CellValue::Number(1.0))]),
                Row::new(vec![Some(CellValue::Text("S".into())), Some(CellValue::Number(2.0))]),
            ],
        );
        let profiler = ColumnProfiler::default();
        assert_eq!(profiler.profile_sheet(&sheet), profiler.profile_sheet(&sheet));
    }
}
