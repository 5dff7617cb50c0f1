use std::path::{Path, PathBuf};

use complaint_common::advisory::AdvisoryConfig;
use complaint_common::config::{env_var, parse_var};
use complaint_common::routing::{RouterSettings, DEFAULT_FALLBACK_INSTITUTION};
use complaint_engine::DEFAULT_LIMIT;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub institutions_path: Option<PathBuf>,
    pub result_limit: usize,
    pub fallback_institution: String,
    pub redis_url: Option<String>,
    pub advisory: Option<AdvisoryConfig>,
}

impl Config {
    /// Optional:
    /// - `INSTITUTIONS_PATH` (must exist when set; default: built-in catalog)
    /// - `RESULT_LIMIT` (default 8)
    /// - `FALLBACK_INSTITUTION`
    /// - `REDIS_URL`, `ADVISORY_*`
    pub fn from_env() -> Result<Self, AppError> {
        let institutions_path = env_var("INSTITUTIONS_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        if let Some(path) = &institutions_path {
            if !Path::new(path).exists() {
                return Err(AppError::Config(format!(
                    "INSTITUTIONS_PATH not found: {}",
                    path.display()
                )));
            }
        }

        let result_limit: usize = parse_var(&env_var, "RESULT_LIMIT", DEFAULT_LIMIT)?;
        if result_limit == 0 {
            return Err(AppError::Config("RESULT_LIMIT must be at least 1".to_string()));
        }

        Ok(Self {
            institutions_path,
            result_limit,
            fallback_institution: env_var("FALLBACK_INSTITUTION")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FALLBACK_INSTITUTION.to_string()),
            redis_url: env_var("REDIS_URL").filter(|s| !s.trim().is_empty()),
            advisory: AdvisoryConfig::from_env()?,
        })
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            limit: self.result_limit,
            fallback_institution: self.fallback_institution.clone(),
            catalog_path: self.institutions_path.clone(),
        }
    }
}
