use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MIN_SUP: usize = 3;
/// 15 minutes in angle units.
pub const DEFAULT_TIME_ERR: f64 = 3.75;
pub const DEFAULT_NUM_ERR: f64 = 3.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("min_sup must be at least 1, got {0}")]
    MinSup(usize),
    #[error("{name} must be a finite, non-negative tolerance, got {value}")]
    Tolerance { name: &'static str, value: f64 },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Mining thresholds shared by every stage of one run.
///
/// Fields are private and only set through validated constructors, so a
/// config cannot change while a mining pass is using it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct MiningConfig {
    min_sup: usize,
    time_err: f64,
    num_err: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    min_sup: usize,
    time_err: f64,
    num_err: f64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self { min_sup: DEFAULT_MIN_SUP, time_err: DEFAULT_TIME_ERR, num_err: DEFAULT_NUM_ERR }
    }
}

impl TryFrom<RawConfig> for MiningConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        MiningConfig::new(raw.min_sup, raw.time_err, raw.num_err)
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self { min_sup: DEFAULT_MIN_SUP, time_err: DEFAULT_TIME_ERR, num_err: DEFAULT_NUM_ERR }
    }
}

impl MiningConfig {
    pub fn new(min_sup: usize, time_err: f64, num_err: f64) -> Result<Self, ConfigError> {
        if min_sup == 0 {
            return Err(ConfigError::MinSup(min_sup));
        }
        check_tolerance("time_err", time_err)?;
        check_tolerance("num_err", num_err)?;
        Ok(Self { min_sup, time_err, num_err })
    }

    /// Missing fields fall back to the defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Returns a new config with any provided value replaced.
    pub fn with_overrides(
        &self,
        min_sup: Option<usize>,
        time_err: Option<f64>,
        num_err: Option<f64>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            min_sup.unwrap_or(self.min_sup),
            time_err.unwrap_or(self.time_err),
            num_err.unwrap_or(self.num_err),
        )
    }

    pub fn min_sup(&self) -> usize { self.min_sup }

    /// Chaining tolerance for time values, in angle units.
    pub fn time_err(&self) -> f64 { self.time_err }

    pub fn num_err(&self) -> f64 { self.num_err }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Tolerance { name, value })
    }
}
