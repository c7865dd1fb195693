//! Configuration helpers for environment variables
//!
//! Poll settings bound to CLI flags are read by `clap` directly; these helpers
//! cover the variables read outside of argument parsing (logging).

use std::str::FromStr;

/// Get an environment variable, treating an empty value as unset
pub fn get_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Get an environment variable with fallback to a second name
///
/// # Arguments
/// * `primary` - The preferred environment variable name
/// * `fallback` - The name consulted when `primary` is unset
///
/// # Returns
/// * `Some(value)` - The first variable that is set
/// * `None` - Neither variable is set
pub fn get_env_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    get_env(primary).or_else(|| get_env(fallback))
}

/// Get an environment variable parsed to a specific type
///
/// Returns `default` when the variable is unset or cannot be parsed.
pub fn get_env_parse<T: FromStr>(name: &str, default: T) -> T {
    get_env(name)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
