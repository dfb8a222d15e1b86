//! Chart rendering over the plotters bitmap backend. PNGs are fixed at
//! 1200x800 and use the backend's built-in fonts so rendering works in
//! headless environments.

use std::path::Path;

use plotters::prelude::*;
use thiserror::Error;

use crate::models::LinearFit;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, ChartError>;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;

/// Scatter of 2014 against 2017 scores with the fitted regression line.
/// Both axes span the score domain [0, 1].
pub fn score_scatter(
    pairs: &[(f64, f64)],
    fit: Option<&LinearFit>,
    output_path: &Path,
) -> Result<()> {
    if pairs.is_empty() {
        return Err(ChartError::InvalidData(
            "no records carry a score for both years".to_string(),
        ));
    }

    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("LOI score, 2014 vs 2017", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("2014 score")
        .y_desc("2017 score")
        .x_label_style(("sans-serif", 25))
        .y_label_style(("sans-serif", 25))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .draw_series(
            pairs
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
        )
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    if let Some(fit) = fit {
        chart
            .draw_series(LineSeries::new(
                [(0.0, fit.intercept), (1.0, fit.slope + fit.intercept)],
                &RED,
            ))
            .map_err(|e| ChartError::Drawing(e.to_string()))?;
    }

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    Ok(())
}

/// Histogram of score changes in fixed-width bins.
pub fn change_histogram(changes: &[f64], output_path: &Path) -> Result<()> {
    if changes.is_empty() {
        return Err(ChartError::InvalidData(
            "no records carry a score change".to_string(),
        ));
    }

    const BIN_WIDTH: f64 = 0.05;

    let min = changes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = changes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low_bin = (min / BIN_WIDTH).floor() as i64;
    let high_bin = (max / BIN_WIDTH).floor() as i64;

    let mut counts = vec![0u32; (high_bin - low_bin + 1) as usize];
    for &change in changes {
        let bin = (change / BIN_WIDTH).floor() as i64 - low_bin;
        counts[bin as usize] += 1;
    }

    let x_low = low_bin as f64 * BIN_WIDTH;
    let x_high = (high_bin + 1) as f64 * BIN_WIDTH;
    let y_max = counts.iter().copied().max().unwrap_or(1) + 1;

    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Score change, 2014 to 2017", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(x_low..x_high, 0u32..y_max)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("score change")
        .y_desc("schools")
        .x_label_style(("sans-serif", 25))
        .y_label_style(("sans-serif", 25))
        .x_label_formatter(&|x| format!("{x:+.2}"))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .draw_series(counts.iter().enumerate().map(|(offset, &count)| {
            let x0 = (low_bin + offset as i64) as f64 * BIN_WIDTH;
            Rectangle::new([(x0, 0), (x0 + BIN_WIDTH, count)], BLUE.mix(0.4).filled())
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    Ok(())
}
