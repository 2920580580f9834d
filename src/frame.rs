//! In-memory tabular dataset.
//!
//! [`Frame`] is the crate's own implementation of the [`Dataset`]/[`Column`]
//! boundary: an ordered collection of typed columns with per-cell absence.
//! Columns are assembled programmatically through [`FrameBuilder`] or
//! ingested from CSV, where each column's dtype is inferred by candidate
//! elimination over the sampled values.
//!
//! Canonical dtype names line up with the claims of the built-in strategies:
//! `int64`, `float64`, `bool`, `datetime64[ns]`, `object`, and `category`
//! for columns explicitly reclassified via [`Frame::set_categorical`].

use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use log::debug;
use serde_json::{Number, Value as JsonValue};

use crate::column::{Column, Dataset, Dtype};

pub const DTYPE_INTEGER: &str = "int64";
pub const DTYPE_FLOAT: &str = "float64";
pub const DTYPE_BOOLEAN: &str = "bool";
pub const DTYPE_DATE: &str = "datetime64[ns]";
pub const DTYPE_TEXT: &str = "object";
pub const DTYPE_CATEGORY: &str = "category";

const BOOLEAN_TOKENS: &[&str] = &["true", "false", "t", "f", "yes", "no", "y", "n"];

/// One typed cell; a missing value is represented as `None` at the column
/// level.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    fn to_json(&self) -> JsonValue {
        match self {
            Cell::Integer(i) => JsonValue::Number((*i).into()),
            Cell::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Cell::Boolean(b) => JsonValue::Bool(*b),
            Cell::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Cell::Text(s) => JsonValue::String(s.clone()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameColumn {
    name: String,
    dtype: Dtype,
    cells: Vec<Option<Cell>>,
}

impl FrameColumn {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Option<Cell>] {
        &self.cells
    }
}

impl Column for FrameColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn dtype(&self) -> Dtype {
        self.dtype.clone()
    }

    fn is_fully_present(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    fn distinct_values(&self) -> Vec<JsonValue> {
        let mut seen = Vec::new();
        for cell in self.cells.iter().flatten() {
            let value = cell.to_json();
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen
    }

    fn numeric_min(&self) -> Option<f64> {
        self.cells
            .iter()
            .flatten()
            .filter_map(Cell::as_f64)
            .reduce(f64::min)
    }

    fn numeric_max(&self) -> Option<f64> {
        self.cells
            .iter()
            .flatten()
            .filter_map(Cell::as_f64)
            .reduce(f64::max)
    }
}

/// Ordered, named, typed columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<FrameColumn>,
}

impl Frame {
    pub fn builder() -> FrameBuilder {
        FrameBuilder::default()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, FrameColumn::len)
    }

    pub fn column(&self, name: &str) -> Option<&FrameColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Reclassifies a column as categorical so that option-deriving
    /// strategies pick it up through the `category` dtype. Derived options
    /// keep the column's first-seen row order, not a sorted category list.
    pub fn set_categorical(&mut self, name: &str) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| anyhow!("No column named '{name}'"))?;
        column.dtype = Dtype::named(DTYPE_CATEGORY);
        Ok(())
    }

    pub fn from_csv_path(path: &Path, delimiter: u8) -> Result<Frame> {
        let file = File::open(path).with_context(|| format!("Opening CSV file {path:?}"))?;
        Self::from_csv_reader(file, delimiter)
    }

    /// Reads an entire headered CSV stream, inferring each column's dtype by
    /// candidate elimination and parsing cells accordingly. Empty fields
    /// become missing values.
    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Frame> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .context("Reading CSV headers")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            for (idx, field) in record.iter().enumerate() {
                if let Some(column) = raw_columns.get_mut(idx) {
                    column.push(field.to_string());
                }
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, raw)| {
                let candidate = TypeCandidate::observe(&raw);
                let dtype = candidate.decide();
                debug!("Inferred dtype '{dtype}' for column '{name}'");
                build_column(name, dtype, &raw)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Frame { columns })
    }
}

impl Dataset for Frame {
    fn columns(&self) -> Vec<&dyn Column> {
        self.columns.iter().map(|c| c as &dyn Column).collect()
    }
}

#[derive(Debug, Default)]
pub struct FrameBuilder {
    columns: Vec<FrameColumn>,
}

impl FrameBuilder {
    pub fn integer_column(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<i64>>,
    ) -> Self {
        self.push(name, DTYPE_INTEGER, values, Cell::Integer)
    }

    pub fn float_column(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> Self {
        self.push(name, DTYPE_FLOAT, values, Cell::Float)
    }

    pub fn boolean_column(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<bool>>,
    ) -> Self {
        self.push(name, DTYPE_BOOLEAN, values, Cell::Boolean)
    }

    pub fn date_column(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<NaiveDate>>,
    ) -> Self {
        self.push(name, DTYPE_DATE, values, Cell::Date)
    }

    pub fn text_column<'a>(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Self {
        self.push(name, DTYPE_TEXT, values, |s: &str| Cell::Text(s.to_string()))
    }

    /// A column with an arbitrary dtype identifier, for exercising custom
    /// strategies or fallback behavior.
    pub fn opaque_column(
        mut self,
        name: impl Into<String>,
        dtype: impl Into<Dtype>,
        values: impl IntoIterator<Item = Option<Cell>>,
    ) -> Self {
        self.columns.push(FrameColumn {
            name: name.into(),
            dtype: dtype.into(),
            cells: values.into_iter().collect(),
        });
        self
    }

    fn push<T>(
        mut self,
        name: impl Into<String>,
        dtype: &str,
        values: impl IntoIterator<Item = Option<T>>,
        cell: impl Fn(T) -> Cell,
    ) -> Self {
        self.columns.push(FrameColumn {
            name: name.into(),
            dtype: Dtype::named(dtype),
            cells: values.into_iter().map(|v| v.map(&cell)).collect(),
        });
        self
    }

    /// Validates column-name uniqueness and equal column lengths.
    pub fn build(self) -> Result<Frame> {
        for (idx, column) in self.columns.iter().enumerate() {
            if self.columns[..idx].iter().any(|c| c.name == column.name) {
                bail!("Duplicate column name '{}'", column.name);
            }
        }
        if let Some(first) = self.columns.first() {
            let expected = first.len();
            for column in &self.columns[1..] {
                if column.len() != expected {
                    bail!(
                        "Column '{}' has {} row(s), expected {}",
                        column.name,
                        column.len(),
                        expected
                    );
                }
            }
        }
        Ok(Frame {
            columns: self.columns,
        })
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_boolean: bool,
    possible_integer: bool,
    possible_float: bool,
    possible_date: bool,
}

impl TypeCandidate {
    fn observe(values: &[String]) -> Self {
        let mut candidate = Self {
            possible_boolean: true,
            possible_integer: true,
            possible_float: true,
            possible_date: true,
        };
        for value in values {
            if value.is_empty() {
                continue;
            }
            if candidate.possible_boolean
                && !BOOLEAN_TOKENS.contains(&value.to_ascii_lowercase().as_str())
            {
                candidate.possible_boolean = false;
            }
            if candidate.possible_integer && value.parse::<i64>().is_err() {
                candidate.possible_integer = false;
            }
            if candidate.possible_float && value.parse::<f64>().is_err() {
                candidate.possible_float = false;
            }
            if candidate.possible_date && parse_naive_date(value).is_err() {
                candidate.possible_date = false;
            }
        }
        candidate
    }

    fn decide(&self) -> &'static str {
        if self.possible_boolean {
            DTYPE_BOOLEAN
        } else if self.possible_integer {
            DTYPE_INTEGER
        } else if self.possible_float {
            DTYPE_FLOAT
        } else if self.possible_date {
            DTYPE_DATE
        } else {
            DTYPE_TEXT
        }
    }
}

fn build_column(name: String, dtype: &'static str, raw: &[String]) -> Result<FrameColumn> {
    let cells = raw
        .iter()
        .map(|value| parse_cell(value, dtype).with_context(|| format!("Column '{name}'")))
        .collect::<Result<Vec<_>>>()?;
    Ok(FrameColumn {
        name,
        dtype: Dtype::named(dtype),
        cells,
    })
}

fn parse_cell(value: &str, dtype: &str) -> Result<Option<Cell>> {
    if value.is_empty() {
        return Ok(None);
    }
    let cell = match dtype {
        DTYPE_BOOLEAN => {
            let parsed = match value.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" => true,
                "false" | "f" | "no" | "n" => false,
                _ => bail!("Failed to parse '{value}' as boolean"),
            };
            Cell::Boolean(parsed)
        }
        DTYPE_INTEGER => {
            let parsed: i64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as integer"))?;
            Cell::Integer(parsed)
        }
        DTYPE_FLOAT => {
            let parsed: f64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as float"))?;
            Cell::Float(parsed)
        }
        DTYPE_DATE => Cell::Date(parse_naive_date(value)?),
        _ => Cell::Text(value.to_string()),
    };
    Ok(Some(cell))
}

pub(crate) fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}
