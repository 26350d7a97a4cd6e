use std::path::Path;

use error_stack::{Report, ResultExt};
use tracing::info;

use crate::chart::Chart;
use crate::error::ReportError;
use crate::model::TimeSeriesTable;
use crate::stats::{StatValue, StatisticsSummary};

const REPORT_TITLE: &str = "Cryptocurrency Analysis Report";

fn statistic_lines(summary: &StatisticsSummary) -> Vec<String> {
    summary
        .entries()
        .iter()
        .map(|(label, value)| format!("{label}: {}", StatValue(*value)))
        .collect()
}

/// Print the "Basic Statistics:" block to stdout.
pub fn print_statistics(summary: &StatisticsSummary) {
    println!("\nBasic Statistics:");
    for line in statistic_lines(summary) {
        println!("{line}");
    }
}

fn period_line(table: &TimeSeriesTable) -> String {
    match table.date_range() {
        Some((first, last)) => format!(
            "Analysis Period: {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        None => "Analysis Period: no data".to_string(),
    }
}

/// Text of the summary report.
pub fn render_report(
    table: &TimeSeriesTable,
    summary: &StatisticsSummary,
    charts: &[Box<dyn Chart>],
) -> String {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        "=".repeat(30),
        String::new(),
        period_line(table),
        format!("Total Days: {}", table.len()),
        String::new(),
        "Key Statistics:".to_string(),
    ];
    lines.extend(statistic_lines(summary));
    lines.push(String::new());
    lines.push("Generated Visualizations:".to_string());
    lines.extend(
        charts
            .iter()
            .map(|chart| format!("- {} ({})", chart.description(), chart.file_name())),
    );

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Write the report to `path`, replacing any existing file.
pub fn write_report(
    path: &Path,
    table: &TimeSeriesTable,
    summary: &StatisticsSummary,
    charts: &[Box<dyn Chart>],
) -> Result<(), Report<ReportError>> {
    std::fs::write(path, render_report(table, summary, charts))
        .change_context(ReportError::Write)
        .attach_with(|| format!("path: {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::default_charts;
    use crate::indicator::calculate_indicators;
    use crate::model::tests::bars_from_closes;
    use crate::stats::compute_statistics;

    fn ramp_table(n: usize) -> TimeSeriesTable {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let mut table = TimeSeriesTable::new(bars_from_closes(&closes, 10.0));
        calculate_indicators(&mut table).unwrap();
        table
    }

    #[test]
    fn report_layout() {
        let table = ramp_table(25);
        let summary = compute_statistics(&table);
        let text = render_report(&table, &summary, &default_charts());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Cryptocurrency Analysis Report");
        assert_eq!(lines[1], "==============================");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Analysis Period: 2024-01-01 to 2024-01-25");
        assert_eq!(lines[4], "Total Days: 25");
        assert_eq!(lines[6], "Key Statistics:");
        assert_eq!(lines[7], "Mean Price: 112.00");
        assert_eq!(lines[12], "Total Volume: 250.00");
        assert_eq!(lines[14], "Generated Visualizations:");
        assert_eq!(
            lines[15..],
            [
                "- Price with Moving Averages (price_moving_averages.png)",
                "- Trading Volume (volume.png)",
                "- Volatility (volatility.png)",
            ]
        );
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn empty_table_reports_no_data() {
        let table = ramp_table(0);
        let summary = compute_statistics(&table);
        let text = render_report(&table, &summary, &default_charts());
        assert!(text.contains("Analysis Period: no data\n"));
        assert!(text.contains("Total Days: 0\n"));
        assert!(text.contains("Mean Price: n/a\n"));
        assert!(text.contains("Total Volume: 0.00\n"));
    }

    #[test]
    fn write_report_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "stale contents that are longer than nothing").unwrap();

        let table = ramp_table(3);
        let summary = compute_statistics(&table);
        write_report(&path, &table, &summary, &default_charts()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_report(&table, &summary, &default_charts()));
    }

    #[test]
    fn write_report_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let table = ramp_table(3);
        let summary = compute_statistics(&table);
        assert!(write_report(&path, &table, &summary, &default_charts()).is_err());
    }
}
