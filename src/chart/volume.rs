use std::path::Path;

use error_stack::Report;
use plotters::prelude::*;

use crate::chart::{Chart, color_setting, date_axis, draw_failed, next_day, title};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::model::TimeSeriesTable;

const FILE_NAME: &str = "volume.png";

/// One bar of traded volume per day.
pub struct VolumeChart;

impl Chart for VolumeChart {
    fn file_name(&self) -> &'static str {
        FILE_NAME
    }

    fn description(&self) -> &'static str {
        "Trading Volume"
    }

    fn render(
        &self,
        table: &TimeSeriesTable,
        config: &RenderConfig,
        path: &Path,
    ) -> Result<(), Report<RenderError>> {
        let color = color_setting(&config.volume_color, "render.volume_color")?
            .with_alpha(config.bar_alpha);

        // Bars grow from zero, so the axis starts there.
        let max_volume = table.volumes().into_iter().fold(0.0_f64, f64::max);
        let y_max = if max_volume > 0.0 {
            max_volume * 1.05
        } else {
            1.0
        };

        let root = BitMapBackend::new(path, config.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_failed(FILE_NAME, e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title(config, "Trading Volume"), ("sans-serif", 24).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(date_axis(table), 0.0..y_max)
            .map_err(|e| draw_failed(FILE_NAME, e))?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc("Date").y_desc("Volume");
        if !config.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(|e| draw_failed(FILE_NAME, e))?;

        chart
            .draw_series(table.rows().iter().map(|bar| {
                Rectangle::new(
                    [(bar.date, 0.0), (next_day(bar.date), bar.volume)],
                    color.filled(),
                )
            }))
            .map_err(|e| draw_failed(FILE_NAME, e))?;

        root.present().map_err(|e| draw_failed(FILE_NAME, e))?;
        Ok(())
    }
}
