use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};
use crate::models::FilterSelection;

/// Default number of filtered records shown in the tabular preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Clean energy-meter CSV exports and summarise them by year, month, day and hour
#[derive(Parser, Debug, Clone)]
#[command(
    name = "energy-dashboard",
    about = "Clean energy-meter CSV exports and summarise them by year, month, day and hour",
    version
)]
pub struct Settings {
    /// CSV files or directories containing CSV files
    pub paths: Vec<PathBuf>,

    /// Restrict to one year (switches the chart to months)
    #[arg(long)]
    pub year: Option<i32>,

    /// Restrict to one month of the selected year (switches the chart to days)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Restrict to one day of the selected month (switches the chart to hours)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    pub day: Option<u32>,

    /// Restrict to hours of the day (repeatable)
    #[arg(long = "hour", value_parser = clap::value_parser!(u32).range(0..=23))]
    pub hours: Vec<u32>,

    /// Restrict to meter columns (repeatable; default: all)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Drop a meter column before processing (repeatable, adds to the config denylist)
    #[arg(long = "exclude-column")]
    pub exclude_columns: Vec<String>,

    /// Subtract a night-time idle baseline from every meter
    #[arg(long)]
    pub baseline: bool,

    /// Seed for the baseline day sample
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of days sampled for the baseline
    #[arg(long)]
    pub sample_days: Option<usize>,

    /// Number of records in the preview table
    #[arg(long)]
    pub preview_rows: Option<usize>,

    /// Print the result as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Configuration file (default: ~/.energy-dashboard/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the resolved configuration back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Filter selection described by the command line.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection {
            categories: self.categories.iter().cloned().collect(),
            year: self.year,
            month: self.month,
            day: self.day,
            hours: if self.hours.is_empty() {
                None
            } else {
                Some(self.hours.iter().copied().collect())
            },
        }
    }

    /// Log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// File the configuration is read from and saved to.
    pub fn config_file(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(DashboardConfig::config_path)
    }

    /// Load the config file and overlay command-line values.
    pub fn resolve_config(&self) -> Result<DashboardConfig> {
        self.resolve_config_at(&DashboardConfig::config_path())
    }

    /// Same as [`resolve_config`](Self::resolve_config) with an explicit
    /// default path, so tests can redirect to a temporary directory.
    ///
    /// A file named with `--config` must exist; the default file is optional.
    pub fn resolve_config_at(&self, default_path: &Path) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load_from(path)?,
            None => DashboardConfig::load_or_default(default_path)?,
        };

        for column in &self.exclude_columns {
            if !config.denylist.contains(column) {
                config.denylist.push(column.clone());
            }
        }
        if self.baseline {
            config.baseline.enabled = true;
        }
        if let Some(seed) = self.seed {
            config.baseline.seed = seed;
        }
        if let Some(days) = self.sample_days {
            config.baseline.sample_days = days;
        }
        if let Some(rows) = self.preview_rows {
            config.preview_rows = rows;
        }

        config.validate()?;
        Ok(config)
    }
}

// ── BaselineConfig ─────────────────────────────────────────────────────────────

/// Options for the idle-baseline subtraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub enabled: bool,
    /// Seed of the pseudo-random day sample.
    pub seed: u64,
    /// Maximum number of distinct dates sampled.
    pub sample_days: usize,
    /// First hour (inclusive) of the low-activity window.
    pub window_start_hour: u32,
    /// Last hour (inclusive) of the low-activity window.
    pub window_end_hour: u32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            seed: 42,
            sample_days: 5,
            window_start_hour: 0,
            window_end_hour: 4,
        }
    }
}

// ── DashboardConfig ────────────────────────────────────────────────────────────

/// Deployment-specific pipeline configuration, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Meter columns removed before processing, matched by exact name.
    pub denylist: Vec<String>,
    pub baseline: BaselineConfig,
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            denylist: Vec::new(),
            baseline: BaselineConfig::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl DashboardConfig {
    /// Default config file location: `~/.energy-dashboard/config.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".energy-dashboard").join("config.json")
    }

    /// Load from `path`, failing when the file is absent or invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, or return the defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Atomically write the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Reject option combinations the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        let b = &self.baseline;
        if b.window_start_hour > 23 || b.window_end_hour > 23 {
            return Err(DashboardError::Config(
                "baseline window hours must be within 0-23".to_string(),
            ));
        }
        if b.window_start_hour > b.window_end_hour {
            return Err(DashboardError::Config(format!(
                "baseline window start {} is after end {}",
                b.window_start_hour, b.window_end_hour
            )));
        }
        if b.sample_days == 0 {
            return Err(DashboardError::Config(
                "baseline sample_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
