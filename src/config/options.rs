//! # Options for layered configuration loading.
//!
//! Two layer kinds exist: config **files** and **environment variables**.
//! Each kind has a priority; the lower value takes precedence and is merged last.
//!
//! ## Defaults
//! - `files = []`, `files_priority = 100`, `files_required = true`
//! - `env_vars = true`, `env_vars_priority = 1000`
//! - `env_vars_prefix = None` → normalized service name (e.g. `my-svc` → `MY_SVC_`)
//!
//! With the defaults, file values override environment values.

use std::path::PathBuf;

/// How a run's configuration is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOptions {
    /// Config files, in order; later files override earlier ones.
    pub files: Vec<PathBuf>,
    /// Priority of the file layer (lower wins).
    pub files_priority: i32,
    /// Fail when a listed file cannot be read or parsed.
    pub files_required: bool,
    /// Read environment variables.
    pub env_vars: bool,
    /// Priority of the environment layer (lower wins).
    pub env_vars_priority: i32,
    /// Prefix for environment variables; `None` derives it from the service name.
    pub env_vars_prefix: Option<String>,
}

impl ConfigOptions {
    /// Appends a config file.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Sets the file layer priority.
    pub fn with_files_priority(mut self, priority: i32) -> Self {
        self.files_priority = priority;
        self
    }

    /// Sets whether unreadable files are fatal.
    pub fn with_files_required(mut self, required: bool) -> Self {
        self.files_required = required;
        self
    }

    /// Enables or disables the environment layer.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.env_vars = enabled;
        self
    }

    /// Sets the environment layer priority.
    pub fn with_env_vars_priority(mut self, priority: i32) -> Self {
        self.env_vars_priority = priority;
        self
    }

    /// Sets an explicit environment prefix. Empty strings are ignored.
    pub fn with_env_vars_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.env_vars_prefix = Some(prefix);
        }
        self
    }
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            files_priority: 100,
            files_required: true,
            env_vars: true,
            env_vars_priority: 1000,
            env_vars_prefix: None,
        }
    }
}
