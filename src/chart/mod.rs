//! Chart selection: maps (chart kind, chosen axis columns) to a renderable
//! chart spec or a validation warning. Pure decision logic; rasterization
//! lives in [`render`].

pub mod render;

use serde::{Deserialize, Serialize};

use crate::table::{Table, Value};
use crate::types::{AppError, AppResult};

/// The four chart kinds offered by the UI. Exhaustive matching below means
/// there is no "unknown kind" fallthrough; anything else fails to
/// deserialize before reaching the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Pie,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "Bar Chart"),
            ChartKind::Line => write!(f, "Line Chart"),
            ChartKind::Scatter => write!(f, "Scatter Plot"),
            ChartKind::Pie => write!(f, "Pie Chart"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x_column: String,
    /// Insertion order is legend order. Duplicates are passed through.
    pub y_columns: Vec<String>,
}

/// One resolved data series, named after its Y column.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub x_values: Vec<Value>,
    pub series: Vec<Series>,
}

/// Either a renderable spec or a recoverable guidance message, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartResult {
    Chart(ChartSpec),
    Warning { warning: String },
}

impl ChartResult {
    fn warning(message: &str) -> Self {
        ChartResult::Warning { warning: message.to_string() }
    }
}

/// Deterministic and side-effect free. The empty-Y check comes before any
/// kind-specific validation.
pub fn select_chart(request: &ChartRequest, table: &Table) -> AppResult<ChartResult> {
    if table.is_empty() {
        return Err(AppError::InvalidInput("table has no columns".to_string()));
    }

    let x = table
        .column(&request.x_column)
        .ok_or_else(|| AppError::NotFound(format!("column '{}'", request.x_column)))?;

    if request.y_columns.is_empty() {
        return Ok(ChartResult::warning("Please select at least one Y-axis value."));
    }

    let mut series = Vec::with_capacity(request.y_columns.len());
    for name in &request.y_columns {
        let column = table
            .column(name)
            .ok_or_else(|| AppError::NotFound(format!("column '{}'", name)))?;
        series.push(Series { name: name.clone(), values: column.values.clone() });
    }

    if request.kind == ChartKind::Pie && series.len() != 1 {
        return Ok(ChartResult::warning(
            "For Pie Chart, please select only one Y-axis column.",
        ));
    }

    Ok(ChartResult::Chart(ChartSpec {
        kind: request.kind,
        title: request.kind.to_string(),
        x_label: request.x_column.clone(),
        x_values: x.values.clone(),
        series,
    }))
}
