//! # Environment variable naming and snapshots.
//!
//! Variable names are built from a prefix and a key and normalized to the
//! conventional `UPPER_SNAKE` form:
//!
//! ```text
//! env_name("MYAPP", "LOG_LEVEL")      → "MYAPP_LOG_LEVEL"
//! env_name("", "CONFIG_PATH")         → "SERVICE_CONFIG_PATH"
//! env_name("0APP", "config")          → "_0APP_CONFIG"
//! ```
//!
//! [`EnvSnapshot`] captures the process environment once, when a run's
//! execution context is built. Services read it through the context instead of
//! calling `std::env` mid-run.

use std::collections::BTreeMap;

use super::ConfigError;

/// Prefix used when none is given.
pub const DEFAULT_ENV_PREFIX: &str = "SERVICE_";

/// Builds a normalized variable name from `prefix` and `name`.
///
/// An empty prefix becomes [`DEFAULT_ENV_PREFIX`]; a missing trailing `_` is added.
pub fn env_name(prefix: &str, name: &str) -> String {
    let mut full = if prefix.is_empty() {
        DEFAULT_ENV_PREFIX.to_string()
    } else if prefix.ends_with('_') {
        prefix.to_string()
    } else {
        format!("{prefix}_")
    };
    full.push_str(name);
    normalize_env_name(&full)
}

/// Normalizes `name` into a valid variable name.
///
/// Uppercases, replaces anything outside `[A-Z0-9_]` with `_`, collapses runs of
/// `_`, trims leading/trailing `_`, and prefixes `_` when the result starts with a digit.
///
/// ```
/// use servicevisor::config::normalize_env_name;
///
/// assert_eq!(normalize_env_name("my-config"), "MY_CONFIG");
/// assert_eq!(normalize_env_name("test@123"), "TEST_123");
/// assert_eq!(normalize_env_name("1st-place"), "_1ST_PLACE");
/// assert_eq!(normalize_env_name("hello__world"), "HELLO_WORLD");
/// ```
pub fn normalize_env_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for c in name.chars().flat_map(char::to_uppercase) {
        let c = if c.is_ascii_uppercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Immutable copy of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment (non-unicode entries are skipped).
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Raw lookup by exact variable name.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Looks up `env_name(prefix, name)`.
    pub fn lookup(&self, prefix: &str, name: &str) -> Option<&str> {
        self.var(&env_name(prefix, name))
    }

    /// Like [`lookup`](Self::lookup), empty string when unset.
    pub fn get(&self, prefix: &str, name: &str) -> &str {
        self.lookup(prefix, name).unwrap_or("")
    }

    /// Like [`lookup`](Self::lookup), `default` when unset.
    pub fn get_or<'a>(&'a self, prefix: &str, name: &str, default: &'a str) -> &'a str {
        self.lookup(prefix, name).unwrap_or(default)
    }

    /// Like [`lookup`](Self::lookup), but a missing variable is an error.
    pub fn require(&self, prefix: &str, name: &str) -> Result<&str, ConfigError> {
        let key = env_name(prefix, name);
        self.var(&key)
            .ok_or(ConfigError::MissingEnv { name: key })
    }

    /// All variables whose name starts with `prefix`, with the prefix stripped.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.vars
            .iter()
            .filter_map(move |(k, v)| Some((k.strip_prefix(prefix)?, v.as_str())))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_name_prefix_handling() {
        assert_eq!(env_name("MYAPP", "LOG_LEVEL"), "MYAPP_LOG_LEVEL");
        assert_eq!(env_name("", "CONFIG_PATH"), "SERVICE_CONFIG_PATH");
        assert_eq!(env_name("MYAPP_", "0config-dtest"), "MYAPP_0CONFIG_DTEST");
        assert_eq!(env_name("0APP", "config"), "_0APP_CONFIG");
    }

    #[test]
    fn test_normalize_edge_cases() {
        assert_eq!(normalize_env_name(""), "");
        assert_eq!(normalize_env_name("__a--b__"), "A_B");
        assert_eq!(normalize_env_name("flowseer.example"), "FLOWSEER_EXAMPLE");
    }

    #[test]
    fn test_snapshot_lookups() {
        let env: EnvSnapshot = [("APP_PORT", "8080"), ("OTHER", "x")].into_iter().collect();
        assert_eq!(env.lookup("app", "port"), Some("8080"));
        assert_eq!(env.get("app", "missing"), "");
        assert_eq!(env.get_or("app", "missing", "dflt"), "dflt");
        assert!(matches!(
            env.require("app", "missing"),
            Err(ConfigError::MissingEnv { name }) if name == "APP_MISSING"
        ));
        let scoped: Vec<_> = env.with_prefix("APP_").collect();
        assert_eq!(scoped, vec![("PORT", "8080")]);
    }
}
