use std::path::Path;

use error_stack::Report;
use plotters::prelude::*;

use crate::chart::{Chart, color_setting, date_axis, draw_failed, segments, title, value_axis};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::indicator::VOLATILITY_WINDOW;
use crate::model::TimeSeriesTable;

const FILE_NAME: &str = "volatility.png";

/// Annualized rolling volatility of daily returns.
pub struct VolatilityChart;

impl Chart for VolatilityChart {
    fn file_name(&self) -> &'static str {
        FILE_NAME
    }

    fn description(&self) -> &'static str {
        "Volatility"
    }

    fn render(
        &self,
        table: &TimeSeriesTable,
        config: &RenderConfig,
        path: &Path,
    ) -> Result<(), Report<RenderError>> {
        let color = color_setting(&config.volatility_color, "render.volatility_color")?
            .with_alpha(config.line_alpha);
        let runs = segments(&table.dates(), table.volatility());
        let y_axis = value_axis(runs.iter().flatten().map(|&(_, v)| v));

        let root = BitMapBackend::new(path, config.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_failed(FILE_NAME, e))?;

        let subject = format!("{VOLATILITY_WINDOW}-day Annualized Volatility");
        let mut chart = ChartBuilder::on(&root)
            .caption(title(config, &subject), ("sans-serif", 24).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(date_axis(table), y_axis)
            .map_err(|e| draw_failed(FILE_NAME, e))?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc("Date").y_desc("Volatility");
        if !config.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(|e| draw_failed(FILE_NAME, e))?;

        for run in runs {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(|e| draw_failed(FILE_NAME, e))?;
        }

        root.present().map_err(|e| draw_failed(FILE_NAME, e))?;
        Ok(())
    }
}
