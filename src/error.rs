use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum LoadError {
    #[display("failed to open input file")]
    Open,
    #[display("failed to read input record")]
    Read,
    #[display("missing required column: {column}")]
    MissingColumn { column: String },
    #[display("row {row}: unparseable date \"{value}\"")]
    InvalidDate { row: usize, value: String },
    #[display("row {row}: invalid number in column {column}: \"{value}\"")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[display("duplicate date: {date}")]
    DuplicateDate { date: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum RenderError {
    #[display("failed to render {chart}")]
    Backend { chart: String },
    #[display("invalid render setting: {field}")]
    Config { field: String },
    #[display("failed to load bundled font for {family}")]
    Font { family: String },
}

#[derive(Debug, Display, Error)]
pub enum ReportError {
    #[display("failed to write report")]
    Write,
}

#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("indicator calculation failed")]
    Indicator,
    #[display("output directory unavailable")]
    OutputDir,
    #[display("chart rendering failed")]
    Render,
    #[display("report generation failed")]
    Report,
}
