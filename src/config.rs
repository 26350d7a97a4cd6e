use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::chart::Rgb;
use crate::error::ConfigError;
use crate::loader::DuplicatePolicy;

pub const DEFAULT_INPUT_PATH: &str = "bitcoin_data.csv";
pub const DEFAULT_REPORT_FILE: &str = "crypto_analysis_report.txt";

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_input_path() -> PathBuf {
    DEFAULT_INPUT_PATH.into()
}

fn default_output_dir() -> PathBuf {
    ".".into()
}

fn default_report_file() -> String {
    DEFAULT_REPORT_FILE.into()
}

fn default_asset_name() -> String {
    "Bitcoin".into()
}

fn default_width_in() -> f64 {
    12.0
}

fn default_height_in() -> f64 {
    6.0
}

fn default_dpi() -> u32 {
    100
}

/// Seaborn "deep" palette.
fn default_palette() -> Vec<String> {
    ["#4C72B0", "#DD8452", "#55A868", "#C44E52", "#8172B3", "#937860"]
        .map(String::from)
        .to_vec()
}

fn default_true() -> bool {
    true
}

fn default_line_alpha() -> f64 {
    0.8
}

fn default_bar_alpha() -> f64 {
    0.6
}

fn default_volume_color() -> String {
    "#4C72B0".into()
}

fn default_volatility_color() -> String {
    "#C44E52".into()
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub duplicate_dates: DuplicatePolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            duplicate_dates: DuplicatePolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            report_file: default_report_file(),
        }
    }
}

impl OutputConfig {
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }
}

/// Chart styling, passed explicitly to every renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Prefix for chart titles, e.g. "Bitcoin Trading Volume".
    #[serde(default = "default_asset_name")]
    pub asset_name: String,
    #[serde(default = "default_width_in")]
    pub width_in: f64,
    #[serde(default = "default_height_in")]
    pub height_in: f64,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// `#RRGGBB` colors assigned to line series in order.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default = "default_line_alpha")]
    pub line_alpha: f64,
    #[serde(default = "default_bar_alpha")]
    pub bar_alpha: f64,
    #[serde(default = "default_volume_color")]
    pub volume_color: String,
    #[serde(default = "default_volatility_color")]
    pub volatility_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            asset_name: default_asset_name(),
            width_in: default_width_in(),
            height_in: default_height_in(),
            dpi: default_dpi(),
            palette: default_palette(),
            grid: true,
            line_alpha: default_line_alpha(),
            bar_alpha: default_bar_alpha(),
            volume_color: default_volume_color(),
            volatility_color: default_volatility_color(),
        }
    }
}

impl RenderConfig {
    /// Image size in pixels: inches times dpi.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

/// Like [`load`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    load(path)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];
const MIN_PALETTE_COLORS: usize = 3;

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_output(config)?;
    validate_render(&config.render)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let format = config.general.log_format.as_str();
    if !VALID_LOG_FORMATS.contains(&format) {
        return Err(invalid(format!(
            "general.log_format \"{format}\" is not valid"
        )));
    }
    Ok(())
}

fn validate_output(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.output.report_file.trim().is_empty() {
        return Err(invalid("output.report_file must not be empty".into()));
    }
    Ok(())
}

fn validate_render(render: &RenderConfig) -> Result<(), Report<ConfigError>> {
    if !(render.width_in > 0.0 && render.height_in > 0.0) {
        return Err(invalid(
            "render.width_in and render.height_in must be > 0".into(),
        ));
    }
    if !(10..=1200).contains(&render.dpi) {
        return Err(invalid(format!(
            "render.dpi {} is outside 10..=1200",
            render.dpi
        )));
    }
    for (name, alpha) in [
        ("line_alpha", render.line_alpha),
        ("bar_alpha", render.bar_alpha),
    ] {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(invalid(format!("render.{name} {alpha} is outside 0..=1")));
        }
    }
    if render.palette.len() < MIN_PALETTE_COLORS {
        return Err(invalid(format!(
            "render.palette needs at least {MIN_PALETTE_COLORS} colors"
        )));
    }

    let colors = render
        .palette
        .iter()
        .chain([&render.volume_color, &render.volatility_color]);
    for color in colors {
        if Rgb::parse_hex(color).is_none() {
            return Err(invalid(format!("render color \"{color}\" is not #RRGGBB")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse failed")
    }

    #[test]
    fn valid_full_config_parses() {
        let toml = r##"
[general]
log_level = "debug"
log_format = "json"

[input]
path = "data/eth.csv"
duplicate_dates = "reject"

[output]
dir = "out"
report_file = "eth_report.txt"

[render]
asset_name = "Ethereum"
width_in = 10.0
height_in = 5.0
dpi = 80
palette = ["#000000", "#FF0000", "#00FF00"]
grid = false
line_alpha = 1.0
bar_alpha = 0.5
volume_color = "#123456"
volatility_color = "#abcdef"
"##;
        let config = parse(toml);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.input.path, PathBuf::from("data/eth.csv"));
        assert_eq!(config.input.duplicate_dates, DuplicatePolicy::Reject);
        assert_eq!(config.output.report_path(), Path::new("out").join("eth_report.txt"));
        assert_eq!(config.render.pixel_size(), (800, 400));
        assert!(!config.render.grid);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn defaults_applied_when_fields_omitted() {
        let config = parse("");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.input.path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(config.input.duplicate_dates, DuplicatePolicy::KeepLast);
        assert_eq!(config.output.report_file, DEFAULT_REPORT_FILE);
        assert_eq!(config.render.asset_name, "Bitcoin");
        assert_eq!(config.render.pixel_size(), (1200, 600));
        assert_eq!(config.render.palette.len(), 6);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn parsed_defaults_match_default_impl() {
        let parsed = parse("[render]\n");
        let built = AppConfig::default();
        assert_eq!(parsed.render.palette, built.render.palette);
        assert_eq!(parsed.render.dpi, built.render.dpi);
        assert_eq!(parsed.output.dir, built.output.dir);
    }

    #[test]
    fn invalid_log_format_rejected() {
        let config = parse("[general]\nlog_format = \"xml\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn invalid_color_rejected() {
        let config = parse("[render]\nvolume_color = \"blue\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn short_palette_rejected() {
        let config = parse("[render]\npalette = [\"#000000\"]\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn out_of_range_alpha_rejected() {
        let config = parse("[render]\nline_alpha = 1.5\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_duplicate_policy_fails_to_parse() {
        let result: Result<AppConfig, _> = toml::from_str("[input]\nduplicate_dates = \"merge\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_default_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.render.asset_name, "Bitcoin");
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.toml")).is_err());
    }
}
