//! Environment helpers shared by the service `Config` types.

use std::str::FromStr;

use crate::error::CommonError;

/// Read a process environment variable, treating unset and non-UTF-8 alike.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parse an optional variable, falling back to `default` when it is unset
/// or blank. A present but unparsable value is a config error.
pub fn parse_var<T, F>(var: &F, name: &str, default: T) -> Result<T, CommonError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name).filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| CommonError::Config(format!("{name} has invalid value: {raw}"))),
        None => Ok(default),
    }
}
