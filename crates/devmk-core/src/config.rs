use std::collections::HashMap;
use std::env;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_VENV_DIR: &str = ".venv";
pub const DEFAULT_LINTER: &str = "pylint";
pub const DEFAULT_INDEX_URL: &str = "https://upload.pypi.org/legacy/";
pub const DEFAULT_LINT_PACKAGE: &str = ".";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Explicit overrides, typically sourced from CLI flags. An override wins
/// over the corresponding `DEVMK_*` environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub interpreter: Option<String>,
    pub venv_dir: Option<String>,
    pub linter: Option<String>,
    pub lint_package: Option<String>,
    pub index_url: Option<String>,
}

/// Fixed string substitutions consumed by the target table. Values are not
/// validated beyond being non-empty; tool resolution is left to `PATH`.
#[derive(Debug, Clone)]
pub struct Config {
    interpreter: String,
    venv_dir: Utf8PathBuf,
    linter: String,
    lint_package: String,
    index_url: String,
}

impl Config {
    #[must_use]
    pub fn from_env(overrides: &ConfigOverrides) -> Self {
        Self::from_snapshot(&EnvSnapshot::capture(), overrides)
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot, overrides: &ConfigOverrides) -> Self {
        let pick = |flag: &Option<String>, key: &str, default: &str| -> String {
            flag.as_deref()
                .or_else(|| snapshot.var(key))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            interpreter: pick(&overrides.interpreter, "DEVMK_PYTHON", DEFAULT_INTERPRETER),
            venv_dir: Utf8PathBuf::from(pick(&overrides.venv_dir, "DEVMK_VENV", DEFAULT_VENV_DIR)),
            linter: pick(&overrides.linter, "DEVMK_LINT", DEFAULT_LINTER),
            lint_package: pick(
                &overrides.lint_package,
                "DEVMK_LINT_PACKAGE",
                DEFAULT_LINT_PACKAGE,
            ),
            index_url: pick(&overrides.index_url, "DEVMK_INDEX_URL", DEFAULT_INDEX_URL),
        }
    }

    #[must_use]
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    #[must_use]
    pub fn venv_dir(&self) -> &str {
        self.venv_dir.as_str()
    }

    /// Interpreter inside the managed virtual environment. Dependent targets
    /// invoke this directly instead of sourcing an activation script.
    #[must_use]
    pub fn venv_python(&self) -> Utf8PathBuf {
        if cfg!(windows) {
            self.venv_dir.join("Scripts").join("python.exe")
        } else {
            self.venv_dir.join("bin").join("python")
        }
    }

    #[must_use]
    pub fn linter(&self) -> &str {
        &self.linter
    }

    #[must_use]
    pub fn lint_package(&self) -> &str {
        &self.lint_package
    }

    #[must_use]
    pub fn index_url(&self) -> &str {
        &self.index_url
    }
}
