use anyhow::{Result, bail};
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use crate::report::HueReport;

const MAX_HUE: f64 = 360.0;

/// Bar chart of mean face hue per predicted race, with one standard
/// deviation drawn as an error bar.
pub fn plot_hue_by_race(report: &HueReport, path: &Path) -> Result<()> {
    if report.by_race.is_empty() {
        bail!("no faces in report, nothing to plot");
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let width = 200 + 120 * report.by_race.len() as u32;
    let root = BitMapBackend::new(path, (width, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let races: Vec<&str> = report.by_race.iter().map(|r| r.race.as_str()).collect();
    let label = |x: &f64| {
        let idx = x.floor() as usize;
        races.get(idx).map(|r| r.to_string()).unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(&root)
        .caption("Mean Face Hue by Predicted Race", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..races.len() as f64, 0f64..MAX_HUE)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(races.len() * 2 + 1)
        .x_label_formatter(&label)
        .y_desc("Hue (degrees)")
        .draw()?;

    for (i, race) in report.by_race.iter().enumerate() {
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x + 0.2, 0.0), (x + 0.8, race.mean_hue)],
            BLUE.filled(),
        )))?;

        let low = (race.mean_hue - race.std_dev).max(0.0);
        let high = (race.mean_hue + race.std_dev).min(MAX_HUE);
        chart.draw_series(std::iter::once(ErrorBar::new_vertical(
            x + 0.5,
            low,
            race.mean_hue,
            high,
            BLACK.filled(),
            10,
        )))?;
    }

    root.present()?;
    info!(path = %path.display(), races = races.len(), "Saved hue plot");
    Ok(())
}
