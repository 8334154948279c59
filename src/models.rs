use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use smallvec::SmallVec;

/// A populated spreadsheet cell. Absent cells are modelled as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) if dt.num_seconds_from_midnight() == 0 => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::DateTime(_) => serializer.collect_str(self),
        }
    }
}

/// One data row, positional against [`Sheet::headers`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Option<CellValue>>,
}

impl Row {
    pub fn new(values: Vec<Option<CellValue>>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&CellValue> {
        self.values.get(idx).and_then(Option::as_ref)
    }

    pub fn values(&self) -> &[Option<CellValue>] {
        &self.values
    }
}

/// One worksheet: ordered unique headers plus the rows below them.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Looks a cell up by header name.
    pub fn value<'a>(&self, row: &'a Row, header: &str) -> Option<&'a CellValue> {
        self.column_index(header).and_then(|idx| row.get(idx))
    }

    /// Every cell of one column in row order, `None` where the cell is absent.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = Option<&CellValue>> + '_ {
        self.rows.iter().map(move |row| row.get(idx))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Numeric,
    Categorical,
    DateTime,
    Text,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` below two values.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Distinct value → occurrence count, most frequent first, ties in first-seen order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueCounts(Vec<(String, usize)>);

impl ValueCounts {
    pub fn tally<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();

        for value in values {
            let key = value.to_string();
            match positions.get(&key) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    positions.insert(key.clone(), counts.len());
                    counts.push((key, 1));
                }
            }
        }

        // stable: equal counts keep first-seen order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Self(counts)
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for ValueCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalSummary {
    pub value_counts: ValueCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticalSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
    None,
}

impl StatisticalSummary {
    pub fn is_none(&self) -> bool {
        matches!(self, StatisticalSummary::None)
    }
}

/// Inferred type and statistics for one column. Built only through the
/// constructors so the summary always matches `data_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub column_name: String,
    pub data_type: DataType,
    pub cardinality: usize,
    #[serde(skip_serializing_if = "StatisticalSummary::is_none")]
    pub statistical_summary: StatisticalSummary,
}

impl ColumnProfile {
    pub fn numeric(name: &str, cardinality: usize, summary: NumericSummary) -> Self {
        Self {
            column_name: name.to_string(),
            data_type: DataType::Numeric,
            cardinality,
            statistical_summary: StatisticalSummary::Numeric(summary),
        }
    }

    pub fn categorical(name: &str, cardinality: usize, value_counts: ValueCounts) -> Self {
        Self {
            column_name: name.to_string(),
            data_type: DataType::Categorical,
            cardinality,
            statistical_summary: StatisticalSummary::Categorical(CategoricalSummary { value_counts }),
        }
    }

    /// DateTime, Text or Unsupported: types that carry no summary.
    pub fn unsummarized(name: &str, data_type: DataType, cardinality: usize) -> Self {
        debug_assert!(!matches!(data_type, DataType::Numeric | DataType::Categorical));
        Self {
            column_name: name.to_string(),
            data_type,
            cardinality,
            statistical_summary: StatisticalSummary::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartType {
    Bar,
    Line,
    Scatter,
    Pie,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
            ChartType::Scatter => "Scatter",
            ChartType::Pie => "Pie",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSuggestion {
    pub chart_type: ChartType,
    pub columns: SmallVec<[String; 2]>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatePoint {
    pub date: Option<CellValue>,
    pub value: Option<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XyPoint {
    pub x: Option<CellValue>,
    pub y: Option<CellValue>,
}

/// Chart-shaped payload; serializes as a bare JSON array of points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Bar(Vec<NameValue>),
    Line(Vec<DatePoint>),
    Scatter(Vec<XyPoint>),
    Pie(Vec<NameCount>),
}

impl ChartData {
    /// Payload with no points, shaped for `chart_type`.
    pub fn empty(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Bar => ChartData::Bar(Vec::new()),
            ChartType::Line => ChartData::Line(Vec::new()),
            ChartType::Scatter => ChartData::Scatter(Vec::new()),
            ChartType::Pie => ChartData::Pie(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Bar(points) => points.is_empty(),
            ChartData::Line(points) => points.is_empty(),
            ChartData::Scatter(points) => points.is_empty(),
            ChartData::Pie(points) => points.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedChart {
    pub title: String,
    pub chart_type: ChartType,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetResult {
    pub sheet_name: String,
    pub charts: Vec<FormattedChart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalOutput {
    pub file_name: String,
    pub sheets: Vec<SheetResult>,
}
