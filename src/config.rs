use crate::error::{DashboardError, Result};
use crate::evaluator::PeriodAlignment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_DATA_PATH: &str = "data/dashboard.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

pub const ENV_DATA: &str = "DASHBOARD_DATA";
pub const ENV_BIND: &str = "DASHBOARD_BIND";
pub const ENV_ALIGNMENT: &str = "DASHBOARD_ALIGNMENT";

/// Half-open window over the forecast period axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    #[serde(default)]
    pub from: usize,
    /// Exclusive end; `None` runs to the end of the axis.
    #[serde(default)]
    pub to: Option<usize>,
}

impl Default for ForecastWindow {
    fn default() -> Self {
        ForecastWindow { from: 0, to: None }
    }
}

impl ForecastWindow {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.from..self.to.unwrap_or(usize::MAX)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    /// Optional CSV of forecast series that replaces the dataset's own forecast.
    pub forecast_path: Option<PathBuf>,
    pub bind_addr: String,
    pub forecast_window: ForecastWindow,
    pub alignment: PeriodAlignment,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            forecast_path: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            forecast_window: ForecastWindow::default(),
            alignment: PeriodAlignment::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads a JSON config file; missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: DashboardConfig = serde_json::from_str(&text)?;
        log::debug!("read config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Config file (if any) followed by environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `DASHBOARD_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data) = lookup(ENV_DATA) {
            self.data_path = PathBuf::from(data);
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_addr = bind;
        }
        if let Some(alignment) = lookup(ENV_ALIGNMENT) {
            self.alignment = alignment.parse().map_err(DashboardError::Config)?;
        }
        Ok(self)
    }
}
