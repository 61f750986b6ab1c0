//! Tabular loader: turns an uploaded CSV/XLSX byte stream into an in-memory
//! column-oriented table.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;
use serde::Serialize;

use crate::types::{AppError, AppResult};

/// Scalar cell value. Numeric cells are parsed eagerly so the chart selector
/// and query engine never re-parse strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    fn from_cell(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Ordered set of named columns, rows aligned by position. All columns have
/// equal length; `parse` rejects input that would break that.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> AppResult<Self> {
        if let Some(first) = columns.first() {
            let len = first.values.len();
            if columns.iter().any(|c| c.values.len() != len) {
                return Err(AppError::Parse("columns have unequal lengths".to_string()));
            }
        }
        Ok(Self { columns })
    }

    /// Parse an uploaded file by its declared extension. Only `csv` and
    /// `xlsx` reach this point; the upload route rejects everything else.
    pub fn parse(bytes: &[u8], extension: &str) -> AppResult<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Self::from_csv(bytes),
            "xlsx" => Self::from_xlsx(bytes),
            other => Err(AppError::UploadFormat(format!(".{}", other))),
        }
    }

    fn from_csv(bytes: &[u8]) -> AppResult<Self> {
        let mut reader = ReaderBuilder::new().from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::Parse(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() {
            return Err(AppError::Parse("file has no columns".to_string()));
        }

        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column { name, values: Vec::new() })
            .collect();

        for record in reader.records() {
            let record = record.map_err(|e| AppError::Parse(e.to_string()))?;
            for (idx, column) in columns.iter_mut().enumerate() {
                let raw = record.get(idx).unwrap_or("");
                column.values.push(Value::from_cell(raw));
            }
        }

        Self::new(columns)
    }

    fn from_xlsx(bytes: &[u8]) -> AppResult<Self> {
        let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::Parse(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::Parse("workbook has no sheets".to_string()))?
            .map_err(|e| AppError::Parse(e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| AppError::Parse("sheet is empty".to_string()))?
            .iter()
            .map(|cell| cell.to_string())
            .collect();
        if headers.is_empty() {
            return Err(AppError::Parse("sheet has no columns".to_string()));
        }

        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column { name, values: Vec::new() })
            .collect();

        for row in rows {
            for (idx, column) in columns.iter_mut().enumerate() {
                let value = match row.get(idx) {
                    Some(Data::Int(n)) => Value::Number(*n as f64),
                    Some(Data::Float(n)) => Value::Number(*n),
                    Some(Data::Bool(b)) => Value::Text(b.to_string()),
                    Some(Data::Empty) | None => Value::Text(String::new()),
                    Some(other) => Value::Text(other.to_string()),
                };
                column.values.push(value);
            }
        }

        Self::new(columns)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Content hash over column names and cell values. Two tables with the
    /// same data share a fingerprint; any difference in schema or values
    /// changes it. Used to scope cached answers to the table they were
    /// computed against.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for column in &self.columns {
            column.name.hash(&mut hasher);
            for value in &column.values {
                match value {
                    Value::Number(n) => n.to_bits().hash(&mut hasher),
                    Value::Text(s) => s.hash(&mut hasher),
                }
            }
        }
        hasher.finish()
    }

    /// Row-major view of the first `limit` rows, used for prompt samples.
    pub fn sample_rows(&self, limit: usize) -> Vec<Vec<String>> {
        let count = self.row_count().min(limit);
        (0..count)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.values[row].to_string())
                    .collect()
            })
            .collect()
    }
}
