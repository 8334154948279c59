use std::str::FromStr;

use dotenvy::dotenv;

use crate::error::AppError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_WORKER_CONCURRENCY: usize = 5;
pub const CATEGORICAL_THRESHOLD: usize = 25;
pub const DATE_SAMPLE_SIZE: usize = 10;

/// Knobs of the column classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Highest cardinality at which a string column is still Categorical.
    pub categorical_threshold: usize,
    /// Leading non-null values that must all be dates for a DateTime column.
    pub date_sample_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: CATEGORICAL_THRESHOLD,
            date_sample_size: DATE_SAMPLE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    pub worker_concurrency: usize,
    pub log_json: bool,
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
            log_json: false,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Config::default();

        let worker_concurrency: usize =
            parse_var(&lookup, "WORKER_CONCURRENCY", defaults.worker_concurrency)?;
        if worker_concurrency == 0 {
            return Err(AppError::Config("WORKER_CONCURRENCY must be at least 1".to_string()));
        }

        Ok(Config {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            max_file_size: parse_var(&lookup, "MAX_FILE_SIZE", defaults.max_file_size)?,
            worker_concurrency,
            log_json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            analysis: AnalysisConfig {
                categorical_threshold: parse_var(
                    &lookup,
                    "CATEGORICAL_THRESHOLD",
                    defaults.analysis.categorical_threshold,
                )?,
                date_sample_size: parse_var(
                    &lookup,
                    "DATE_SAMPLE_SIZE",
                    defaults.analysis.date_sample_size,
                )?,
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    Ok(Config::from_env()?)
}
