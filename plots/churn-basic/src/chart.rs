use std::path::Path;

use common::report::{SeriesReport, millis_label, thousands_label};
use eyre::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const SERIES_COLORS: [&RGBColor; 2] = [&BLUE, &RED];

/// Everything drawn on one chart, derived from a single report.
///
/// Building one is separate from rendering it so the conversion rules stay
/// testable without a drawing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: String,
    /// One x tick label per sample position, already in display form
    pub x_labels: Vec<String>,
    pub series: [SeriesSpec; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSpec {
    pub label: String,
    /// (sample position, milliseconds, annotation) per point; series longer
    /// than the amounts are cut off at the pairing
    pub points: Vec<(usize, i64, String)>,
}

impl ChartSpec {
    pub fn from_report(report: &SeriesReport) -> Self {
        let x_labels = report
            .amounts
            .iter()
            .copied()
            .map(thousands_label)
            .collect();
        let series = [0, 1].map(|s| SeriesSpec {
            label: report.series[s].label.clone(),
            points: report.series[s]
                .values
                .iter()
                .zip(&report.amounts)
                .enumerate()
                .map(|(i, (&micros, _))| (i, micros.div_euclid(1000), millis_label(micros)))
                .collect(),
        });
        Self {
            title: report.subject.clone(),
            x_labels,
            series,
        }
    }

    /// Draws the chart and writes it to `path` as a PNG of `size` pixels.
    pub fn render(&self, path: &Path, size: (u32, u32)) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let n = self.x_labels.len();
        let shown = self
            .series
            .iter()
            .flat_map(|series| series.points.iter().map(|&(_, ms, _)| ms));
        let max_ms = shown.clone().max().unwrap_or(0);
        let min_ms = shown.min().unwrap_or(0);
        // keep the axes non-degenerate for empty and single point charts,
        // with headroom above the top point for its annotation
        let x_end = n.saturating_sub(1).max(1) as i32;
        let y_start = min_ms.min(0);
        let y_end = max_ms + max_ms.abs() / 10 + 1;

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0i32..x_end, y_start..y_end)?;

        chart
            .configure_mesh()
            .x_labels(n.max(2))
            .x_label_formatter(&|x| {
                usize::try_from(*x)
                    .ok()
                    .and_then(|i| self.x_labels.get(i).cloned())
                    .unwrap_or_default()
            })
            .x_desc("Time of iterations")
            .y_desc("Time (milliseconds)")
            .draw()?;

        for (series, color) in self.series.iter().zip(SERIES_COLORS) {
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().map(|&(i, ms, _)| (i as i32, ms)),
                    color,
                ))?
                .label(series.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart.draw_series(PointSeries::of_element(
                series.points.iter().cloned(),
                3,
                color,
                &|(i, ms, annotation), s, st| {
                    EmptyElement::at((i as i32, ms))
                        + Circle::new((0, 0), s, st.filled())
                        + Text::new(annotation, (0, -5), annotation_style())
                },
            ))?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

fn annotation_style() -> TextStyle<'static> {
    TextStyle::from(("sans-serif", 15).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
}
