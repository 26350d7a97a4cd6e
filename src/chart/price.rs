use std::path::Path;

use error_stack::Report;
use plotters::prelude::*;

use crate::chart::{Chart, color_setting, date_axis, draw_failed, segments, title, value_axis};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::model::TimeSeriesTable;

const FILE_NAME: &str = "price_moving_averages.png";

/// Close price overlaid with the 20- and 50-day simple moving averages.
pub struct PriceChart;

impl Chart for PriceChart {
    fn file_name(&self) -> &'static str {
        FILE_NAME
    }

    fn description(&self) -> &'static str {
        "Price with Moving Averages"
    }

    fn render(
        &self,
        table: &TimeSeriesTable,
        config: &RenderConfig,
        path: &Path,
    ) -> Result<(), Report<RenderError>> {
        let dates = table.dates();
        let closes: Vec<Option<f64>> = table.closes().into_iter().map(Some).collect();
        let lines = [
            ("Close Price", closes.as_slice()),
            ("20-day SMA", table.sma20()),
            ("50-day SMA", table.sma50()),
        ];

        if config.palette.len() < lines.len() {
            return Err(Report::new(RenderError::Config {
                field: format!("render.palette needs {} colors", lines.len()),
            }));
        }
        let colors = config
            .palette
            .iter()
            .enumerate()
            .take(lines.len())
            .map(|(i, raw)| color_setting(raw, &format!("render.palette[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let y_axis = value_axis(
            lines
                .iter()
                .flat_map(|(_, values)| values.iter().flatten().copied()),
        );

        let root = BitMapBackend::new(path, config.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_failed(FILE_NAME, e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                title(config, "Price with Moving Averages"),
                ("sans-serif", 24).into_font(),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(date_axis(table), y_axis)
            .map_err(|e| draw_failed(FILE_NAME, e))?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc("Date").y_desc("Price (USD)");
        if !config.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(|e| draw_failed(FILE_NAME, e))?;

        for ((label, values), rgb) in lines.iter().zip(&colors) {
            let color = rgb.with_alpha(config.line_alpha);
            let mut runs = segments(&dates, values).into_iter();

            // The first run carries the legend entry, so a column with no
            // defined values still shows up in the legend.
            let first = runs.next().unwrap_or_default();
            chart
                .draw_series(LineSeries::new(first, color.stroke_width(2)))
                .map_err(|e| draw_failed(FILE_NAME, e))?
                .label(*label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });

            for run in runs {
                chart
                    .draw_series(LineSeries::new(run, color.stroke_width(2)))
                    .map_err(|e| draw_failed(FILE_NAME, e))?;
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| draw_failed(FILE_NAME, e))?;

        root.present().map_err(|e| draw_failed(FILE_NAME, e))?;
        Ok(())
    }
}
