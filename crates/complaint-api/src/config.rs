use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use complaint_common::advisory::AdvisoryConfig;
use complaint_common::config::{env_var, parse_var};
use complaint_common::routing::{RouterSettings, DEFAULT_FALLBACK_INSTITUTION};
use complaint_engine::DEFAULT_LIMIT;

use crate::error::AppError;

/// HTTP service configuration, read from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// JSON catalog to load. `None` uses the catalog compiled into the binary.
    pub institutions_path: Option<PathBuf>,
    pub result_limit: usize,
    pub fallback_institution: String,
    /// Requests per second across all clients. `None` disables rate limiting.
    pub rate_limit_rps: Option<u32>,
    pub max_body_kb: usize,
    pub redis_url: Option<String>,
    pub advisory: Option<AdvisoryConfig>,
}

impl Config {
    /// All variables are optional:
    /// - `PORT` (default 10000), `BIND_ADDR` (default "0.0.0.0")
    /// - `INSTITUTIONS_PATH`: catalog JSON; must exist when set
    /// - `RESULT_LIMIT` (default 8, at least 1)
    /// - `FALLBACK_INSTITUTION`
    /// - `RATE_LIMIT_RPS`, `MAX_BODY_KB` (default 64)
    /// - `REDIS_URL`, `ADVISORY_*`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(env_var)
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let port: u16 = parse_var(&var, "PORT", 10000)?;
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());

        let institutions_path = var("INSTITUTIONS_PATH")
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

        let result_limit: usize = parse_var(&var, "RESULT_LIMIT", DEFAULT_LIMIT)?;
        if result_limit == 0 {
            return Err(AppError::Config("RESULT_LIMIT must be at least 1".to_string()));
        }

        let fallback_institution = var("FALLBACK_INSTITUTION")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FALLBACK_INSTITUTION.to_string());

        let rate_limit_rps = parse_var::<u32, _>(&var, "RATE_LIMIT_RPS", 0)?;
        let max_body_kb: usize = parse_var(&var, "MAX_BODY_KB", 64)?;

        Ok(Self {
            bind_addr,
            port,
            institutions_path,
            result_limit,
            fallback_institution,
            rate_limit_rps: (rate_limit_rps > 0).then_some(rate_limit_rps),
            max_body_kb,
            redis_url: var("REDIS_URL").filter(|s| !s.trim().is_empty()),
            advisory: AdvisoryConfig::from_vars(&var)?,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid listen address: {e}")))
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            limit: self.result_limit,
            fallback_institution: self.fallback_institution.clone(),
            catalog_path: self.institutions_path.clone(),
        }
    }
}
