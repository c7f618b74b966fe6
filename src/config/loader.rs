//! # Layered configuration resolution.
//!
//! ```text
//! ConfigOptions ─┬─► files  (json / toml / yaml) ──► file layer  (priority p_f)
//!                └─► EnvSnapshot {PREFIX}_A__B=v ──► env layer   (priority p_e)
//!
//! layers sorted by priority, highest first ──► deep merge ──► ResolvedConfig
//! ```
//!
//! ## Rules
//! - Lower priority value wins: that layer is merged last
//! - Objects merge key by key; any other value replaces the previous one
//! - Env keys: prefix stripped, lowercased, `__` separates nesting levels
//! - Env values are parsed as JSON when possible (`8080`, `true`, `[1,2]`), else kept as strings

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{ConfigError, ConfigOptions, DEFAULT_ENV_PREFIX, EnvSnapshot, env_name};

/// Configuration resolved once for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    value: Value,
}

impl ResolvedConfig {
    /// Wraps an already merged value.
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// Resolves all layers described by `opts` for the service `service_name`.
    pub fn load(
        opts: &ConfigOptions,
        service_name: &str,
        env: &EnvSnapshot,
    ) -> Result<Self, ConfigError> {
        let mut layers: Vec<(i32, Value)> = Vec::with_capacity(2);

        if opts.env_vars {
            let prefix = env_prefix(opts, service_name);
            layers.push((opts.env_vars_priority, env_layer(env, &prefix)));
        }

        let mut files = Value::Object(Map::new());
        for path in &opts.files {
            match read_file(path) {
                Ok(v) => merge(&mut files, v),
                Err(e) if opts.files_required => return Err(e),
                Err(e) => tracing::debug!(error = %e, "skipping optional config file"),
            }
        }
        layers.push((opts.files_priority, files));

        // stable: equal priorities keep insertion order
        layers.sort_by(|a, b| b.0.cmp(&a.0));

        let mut value = Value::Object(Map::new());
        for (_, layer) in layers {
            merge(&mut value, layer);
        }
        Ok(Self { value })
    }

    /// Deserializes the whole configuration into `T`.
    pub fn get<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    /// Looks up a dotted path (`"db.host"`).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.value, |cur, key| cur.as_object()?.get(key))
    }

    /// The merged value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }
}

/// `{PREFIX}_` for the env layer; [`DEFAULT_ENV_PREFIX`] when the name normalizes to nothing.
fn env_prefix(opts: &ConfigOptions, service_name: &str) -> String {
    let raw = opts.env_vars_prefix.as_deref().unwrap_or(service_name);
    match env_name(raw, "") {
        name if name.is_empty() => DEFAULT_ENV_PREFIX.to_string(),
        name => format!("{name}_"),
    }
}

fn env_layer(env: &EnvSnapshot, prefix: &str) -> Value {
    let mut root = Map::new();
    for (key, raw) in env.with_prefix(prefix) {
        let path: Vec<String> = key
            .split("__")
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase)
            .collect();
        let parsed =
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        set_path(&mut root, &path, parsed);
    }
    Value::Object(root)
}

fn set_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                set_path(inner, rest, value);
            }
        }
    }
}

fn read_file(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parsers: &[Format] = match ext.as_deref() {
        Some("json") => &[Format::Json],
        Some("toml") => &[Format::Toml],
        Some("yaml" | "yml") => &[Format::Yaml],
        _ => &[Format::Yaml, Format::Toml, Format::Json],
    };

    let mut reasons = Vec::new();
    for format in parsers {
        match format.parse(&text) {
            Ok(v @ Value::Object(_)) => return Ok(v),
            Ok(Value::Null) => return Ok(Value::Object(Map::new())),
            Ok(_) => reasons.push(format!("{}: top level is not a mapping", format.name())),
            Err(e) => reasons.push(format!("{}: {e}", format.name())),
        }
    }
    Err(ConfigError::Parse {
        path: path.to_path_buf(),
        reason: reasons.join("; "),
    })
}

#[derive(Clone, Copy)]
enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Yaml => "yaml",
        }
    }

    fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Deep merge: objects merge recursively, anything else overwrites.
fn merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(t), Value::Object(s)) => {
            for (key, sv) in s {
                match t.get_mut(&key) {
                    Some(tv) => merge(tv, sv),
                    None => {
                        t.insert(key, sv);
                    }
                }
            }
        }
        (t, s) => *t = s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Db {
        host: String,
        port: u16,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct AppConfig {
        name: String,
        db: Db,
    }

    fn file_with(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("tempfile");
        f.write_all(body.as_bytes()).expect("write");
        f
    }

    #[test]
    fn test_env_layer_nests_and_parses_scalars() {
        let env: EnvSnapshot = [
            ("MY_SVC_NAME", "demo"),
            ("MY_SVC_DB__HOST", "localhost"),
            ("MY_SVC_DB__PORT", "5432"),
            ("UNRELATED", "x"),
        ]
        .into_iter()
        .collect();

        let cfg = ResolvedConfig::load(&ConfigOptions::default(), "my-svc", &env).unwrap();
        let app: AppConfig = cfg.get().unwrap();
        assert_eq!(
            app,
            AppConfig {
                name: "demo".into(),
                db: Db {
                    host: "localhost".into(),
                    port: 5432
                }
            }
        );
        assert_eq!(cfg.lookup("db.port"), Some(&Value::from(5432)));
    }

    #[test]
    fn test_files_override_env_by_default() {
        let file = file_with(".toml", "name = \"from-file\"\n[db]\nport = 1\n");
        let env: EnvSnapshot = [
            ("SVC_NAME", "from-env"),
            ("SVC_DB__HOST", "env-host"),
            ("SVC_DB__PORT", "2"),
        ]
        .into_iter()
        .collect();

        let opts = ConfigOptions::default().with_file(file.path());
        let app: AppConfig = ResolvedConfig::load(&opts, "svc", &env).unwrap().get().unwrap();
        assert_eq!(app.name, "from-file");
        assert_eq!(app.db.host, "env-host");
        assert_eq!(app.db.port, 1);

        let opts = opts.with_env_vars_priority(10);
        let app: AppConfig = ResolvedConfig::load(&opts, "svc", &env).unwrap().get().unwrap();
        assert_eq!(app.name, "from-env");
        assert_eq!(app.db.port, 2);
    }

    #[test]
    fn test_later_files_override_earlier() {
        let a = file_with(".json", r#"{"name": "a", "db": {"host": "h", "port": 1}}"#);
        let b = file_with(".yaml", "db:\n  port: 2\n");
        let opts = ConfigOptions::default()
            .with_env_vars(false)
            .with_file(a.path())
            .with_file(b.path());
        let app: AppConfig = ResolvedConfig::load(&opts, "svc", &EnvSnapshot::default())
            .unwrap()
            .get()
            .unwrap();
        assert_eq!(app.name, "a");
        assert_eq!(app.db.port, 2);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let opts = ConfigOptions::default().with_file("/definitely/not/here.toml");
        let err = ResolvedConfig::load(&opts, "svc", &EnvSnapshot::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let opts = opts.with_files_required(false);
        let cfg = ResolvedConfig::load(&opts, "svc", &EnvSnapshot::default()).unwrap();
        assert_eq!(cfg, ResolvedConfig::default());
    }

    #[test]
    fn test_unknown_extension_tries_every_parser() {
        let f = file_with(".conf", "[db]\nhost = \"h\"\nport = 7\n");
        let opts = ConfigOptions::default().with_env_vars(false).with_file(f.path());
        let cfg = ResolvedConfig::load(&opts, "svc", &EnvSnapshot::default()).unwrap();
        assert_eq!(cfg.lookup("db.port"), Some(&Value::from(7)));

        let bad = file_with(".conf", "just some words");
        let opts = ConfigOptions::default().with_env_vars(false).with_file(bad.path());
        let err = ResolvedConfig::load(&opts, "svc", &EnvSnapshot::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_name_without_ascii_uses_default_prefix() {
        let env: EnvSnapshot = [
            ("_UNRELATED", "1"),
            ("__CF_USER_TEXT_ENCODING", "x"),
            ("SERVICE_DB__HOST", "h"),
        ]
        .into_iter()
        .collect();

        for name in ["サービス", "---"] {
            let cfg = ResolvedConfig::load(&ConfigOptions::default(), name, &env).unwrap();
            assert_eq!(cfg.value(), &serde_json::json!({"db": {"host": "h"}}));
        }
    }

    #[test]
    fn test_explicit_prefix() {
        let env: EnvSnapshot = [("CUSTOM_DB__HOST", "x")].into_iter().collect();
        let opts = ConfigOptions::default().with_env_vars_prefix("custom");
        let cfg = ResolvedConfig::load(&opts, "svc", &env).unwrap();
        assert_eq!(cfg.lookup("db.host"), Some(&Value::from("x")));
    }
}
