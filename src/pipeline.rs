use std::path::PathBuf;

use error_stack::{Report, ResultExt};
use tracing::{error, warn};

use crate::chart::{default_charts, render_all};
use crate::config::AppConfig;
use crate::error::{LoadError, PipelineError};
use crate::indicator::calculate_indicators;
use crate::loader::load_table;
use crate::report::{print_statistics, write_report};
use crate::stats::compute_statistics;

#[derive(Debug)]
pub enum PipelineOutcome {
    Completed {
        rows: usize,
        charts: Vec<PathBuf>,
        report: PathBuf,
    },
    /// The input could not be loaded; nothing was written.
    LoadFailed,
}

/// Load, calculate, render, report. A load failure is printed and ends the
/// run quietly; any later failure is returned to the caller.
pub fn run(config: &AppConfig) -> Result<PipelineOutcome, Report<PipelineError>> {
    let input = &config.input.path;
    let mut table = match load_table(input, config.input.duplicate_dates) {
        Ok(table) => table,
        Err(report) => {
            error!(path = %input.display(), error = ?report, "failed to load input");
            println!(
                "Error loading data: {} ({})",
                load_failure_message(&report),
                input.display()
            );
            return Ok(PipelineOutcome::LoadFailed);
        }
    };

    if table.is_empty() {
        warn!(path = %input.display(), "input has no rows; charts and report will be empty");
    }

    calculate_indicators(&mut table).change_context(PipelineError::Indicator)?;

    let out_dir = &config.output.dir;
    std::fs::create_dir_all(out_dir)
        .change_context(PipelineError::OutputDir)
        .attach_with(|| format!("output dir: {}", out_dir.display()))?;

    let charts = default_charts();
    let written = render_all(&charts, &table, &config.render, out_dir)
        .change_context(PipelineError::Render)?;

    // Computed once; the console block and the report file show the same numbers.
    let summary = compute_statistics(&table);
    print_statistics(&summary);

    let report_path = config.output.report_path();
    write_report(&report_path, &table, &summary, &charts).change_context(PipelineError::Report)?;

    Ok(PipelineOutcome::Completed {
        rows: table.len(),
        charts: written,
        report: report_path,
    })
}

/// The load error followed by its underlying I/O or CSV cause, if any.
fn load_failure_message(report: &Report<LoadError>) -> String {
    let context = report.current_context();
    match report
        .frames()
        .find_map(|frame| frame.downcast_ref::<csv::Error>())
    {
        Some(cause) => format!("{context}: {cause}"),
        None => context.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir, input: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.input.path = dir.path().join(input);
        config.output.dir = dir.path().join("out");
        config
    }

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir, "bitcoin_data.csv");

        let outcome = run(&config).unwrap();

        assert!(matches!(outcome, PipelineOutcome::LoadFailed));
        assert!(!config.output.dir.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    fn write_input(dir: &tempfile::TempDir, body: &str) {
        let content = format!("date,open,high,low,close,volume\n{body}");
        std::fs::write(dir.path().join("prices.csv"), content).unwrap();
    }

    #[test]
    fn missing_input_message_includes_cause() {
        let dir = tempfile::tempdir().unwrap();
        let report = load_table(&dir.path().join("absent.csv"), Default::default()).unwrap_err();

        let message = load_failure_message(&report);

        assert!(message.starts_with("failed to open input file: "), "{message}");
        assert!(message.contains("os error"), "{message}");
    }

    #[test]
    fn parse_error_message_is_context_only() {
        let dir = tempfile::tempdir().unwrap();
        write_input(&dir, "2024-13-45,1,1,1,1,1\n");
        let report = load_table(&dir.path().join("prices.csv"), Default::default()).unwrap_err();

        assert_eq!(
            load_failure_message(&report),
            "row 1: unparseable date \"2024-13-45\""
        );
    }

    #[test]
    fn unparseable_date_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_input(&dir, "2024-01-01,1,1,1,1,1\nnot-a-date,1,1,1,1,1\n");
        let config = config_in(&dir, "prices.csv");

        let outcome = run(&config).unwrap();

        assert!(matches!(outcome, PipelineOutcome::LoadFailed));
        assert!(!config.output.dir.exists());
    }

    #[test]
    fn full_run_writes_charts_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..60)
            .map(|i| {
                let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i);
                let close = 40_000.0 + (i % 9) as f64 * 150.0;
                format!(
                    "{},{close},{},{},{close},{}\n",
                    date.format("%Y-%m-%d"),
                    close + 200.0,
                    close - 200.0,
                    1_000 + i
                )
            })
            .collect();
        write_input(&dir, &body);
        let config = config_in(&dir, "prices.csv");
        std::fs::create_dir_all(&config.output.dir).unwrap();
        let stale = config.output.dir.join("price_moving_averages.png");
        std::fs::write(&stale, b"stale").unwrap();

        let PipelineOutcome::Completed { rows, charts, report } = run(&config).unwrap() else {
            panic!("expected a completed run");
        };
        assert_eq!(rows, 60);
        assert_eq!(charts.len(), 3);
        for chart in &charts {
            let bytes = std::fs::read(chart).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{}", chart.display());
        }
        assert!(charts.contains(&stale));
        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.contains("Analysis Period: 2024-01-01 to 2024-02-29"), "{text}");
        assert!(text.contains("Total Days: 60"), "{text}");
    }

    #[test]
    fn header_only_input_completes_with_no_data() {
        let dir = tempfile::tempdir().unwrap();
        write_input(&dir, "");
        let config = config_in(&dir, "prices.csv");

        let PipelineOutcome::Completed { rows, charts, report } = run(&config).unwrap() else {
            panic!("expected a completed run");
        };
        assert_eq!(rows, 0);
        assert!(charts.iter().all(|chart| chart.metadata().unwrap().len() > 0));
        let text = std::fs::read_to_string(report).unwrap();
        assert!(text.contains("Analysis Period: no data"), "{text}");
    }

    #[test]
    fn render_failure_stops_before_report() {
        let dir = tempfile::tempdir().unwrap();
        write_input(&dir, "2024-01-01,1,1,1,1,1\n");
        let mut config = config_in(&dir, "prices.csv");
        config.render.palette = vec!["not-a-color".into(); 3];

        let err = run(&config).unwrap_err();

        assert!(matches!(err.current_context(), PipelineError::Render));
        assert!(!config.output.report_path().exists());
    }
}
