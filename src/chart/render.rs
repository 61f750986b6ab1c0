//! Rasterizes a [`ChartSpec`](super::ChartSpec) to PNG bytes with plotters.
//!
//! The bitmap backend only encodes PNG through a file path, so rendering goes
//! through a uniquely named temp file that is removed after readback.

use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;

use crate::chart::{ChartKind, ChartSpec};
use crate::types::{AppError, AppResult};

const PIE_PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { width: 800, height: 600 }
    }
}

pub fn render_png(spec: &ChartSpec, options: &RenderOptions) -> AppResult<Vec<u8>> {
    if spec.x_values.is_empty() {
        return Err(AppError::InvalidInput("no rows to plot".to_string()));
    }

    let path = std::env::temp_dir().join(format!("tabular-chat-{}.png", uuid::Uuid::new_v4()));
    let outcome = draw(spec, &path, options);
    let bytes = outcome
        .and_then(|_| std::fs::read(&path).map_err(|e| e.into()))
        .map_err(|e| AppError::Internal(format!("chart rendering failed: {}", e)));
    let _ = std::fs::remove_file(&path);
    bytes
}

fn draw(
    spec: &ChartSpec,
    path: &Path,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    if spec.kind == ChartKind::Pie {
        return draw_pie(spec, &root, options);
    }

    let n = spec.x_values.len();
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for series in &spec.series {
        for value in &series.values {
            let v = value.as_f64().unwrap_or(0.0);
            min_y = min_y.min(v);
            max_y = max_y.max(v);
        }
    }
    if !min_y.is_finite() || !max_y.is_finite() {
        min_y = 0.0;
        max_y = 1.0;
    }
    if min_y == max_y {
        max_y = min_y + 1.0;
    }
    let pad = (max_y - min_y) * 0.05;
    let y_range = (min_y.min(0.0) - pad)..(max_y + pad);

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_range)?;

    let x_values = spec.x_values.clone();
    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .x_labels(n.min(12))
        .x_label_formatter(&move |x| {
            let idx = x.round() as i64;
            if idx < 0 {
                return String::new();
            }
            x_values.get(idx as usize).map(|v| v.to_string()).unwrap_or_default()
        })
        .draw()?;

    let series_count = spec.series.len().max(1);
    for (s_idx, series) in spec.series.iter().enumerate() {
        let color = Palette99::pick(s_idx).to_rgba();
        let points: Vec<(f64, f64)> = series
            .values
            .iter()
            .take(n)
            .enumerate()
            .map(|(i, v)| (i as f64, v.as_f64().unwrap_or(0.0)))
            .collect();

        match spec.kind {
            ChartKind::Line => {
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                    });
            }
            ChartKind::Scatter => {
                chart
                    .draw_series(
                        points.iter().map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
                    )?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
            }
            ChartKind::Bar => {
                // One bar slot per series inside each category.
                let slot = 0.8 / series_count as f64;
                let offset = -0.4 + s_idx as f64 * slot;
                chart
                    .draw_series(points.iter().map(|&(x, y)| {
                        Rectangle::new(
                            [(x + offset, 0.0), (x + offset + slot, y)],
                            color.filled(),
                        )
                    }))?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                    });
            }
            ChartKind::Pie => unreachable!(),
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_pie(
    spec: &ChartSpec,
    root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    // Selector guarantees exactly one series for Pie.
    let series = spec
        .series
        .first()
        .ok_or_else(|| AppError::InvalidInput("pie chart needs one series".to_string()))?;

    let mut sizes = Vec::new();
    let mut labels = Vec::new();
    let mut colors = Vec::new();
    for (idx, value) in series.values.iter().enumerate() {
        let v = value.as_f64().unwrap_or(0.0);
        if v <= 0.0 {
            continue;
        }
        sizes.push(v);
        labels.push(spec.x_values.get(idx).map(|x| x.to_string()).unwrap_or_default());
        colors.push(PIE_PALETTE[idx % PIE_PALETTE.len()]);
    }
    if sizes.is_empty() {
        return Err(Box::new(AppError::InvalidInput(
            "Pie chart requires at least one positive value".to_string(),
        )));
    }

    root.titled(&spec.title, ("sans-serif", 30))?;

    let center = (options.width as i32 / 2, options.height as i32 / 2);
    let radius = (options.width.min(options.height) as f64) * 0.35;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 16).into_font());
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{select_chart, ChartRequest, ChartResult};
    use crate::table::Table;

    fn spec_for(kind: ChartKind, y: &[&str]) -> ChartSpec {
        let table = Table::parse(
            b"Date,Sales,Returns\n2024-01-01,100,3\n2024-01-02,250,7\n2024-01-03,80,1\n",
            "csv",
        )
        .unwrap();
        let request = ChartRequest {
            kind,
            x_column: "Date".to_string(),
            y_columns: y.iter().map(|s| s.to_string()).collect(),
        };
        match select_chart(&request, &table).unwrap() {
            ChartResult::Chart(spec) => spec,
            ChartResult::Warning { .. } => panic!("expected a chart"),
        }
    }

    #[test]
    fn test_render_each_kind() {
        let options = RenderOptions::default();
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter] {
            let png = render_png(&spec_for(kind, &["Sales", "Returns"]), &options).unwrap();
            // PNG signature
            assert!(png.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']));
        }
        let png = render_png(&spec_for(ChartKind::Pie, &["Sales"]), &options).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_render_empty_spec_rejected() {
        let spec = ChartSpec {
            kind: ChartKind::Line,
            title: "Line Chart".to_string(),
            x_label: "x".to_string(),
            x_values: vec![],
            series: vec![],
        };
        assert!(render_png(&spec, &RenderOptions::default()).is_err());
    }
}
