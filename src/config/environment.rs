use std::env;
use std::path::PathBuf;

use super::constants::ENV_BROWSER_TIMEOUT;
use super::error::{Cause, ConfigError, Result};

/// Host facts the resolver consults: environment variables, the current
/// directory and the default locale.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    fn current_dir(&self) -> Result<PathBuf>;

    fn locale(&self) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(val) => Some(val),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                tracing::warn!("{key} contains invalid UTF-8 and was ignored");
                None
            }
        }
    }

    fn current_dir(&self) -> Result<PathBuf> {
        env::current_dir().map_err(|err| {
            ConfigError::not_found("Could not determine the current directory")
                .with_cause(Cause::io(&err))
        })
    }

    fn locale(&self) -> Option<String> {
        locale_from_vars(self)
    }
}

/// Deterministic environment for tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    pub vars: std::collections::HashMap<String, String>,
    pub cwd: PathBuf,
    pub locale: Option<String>,
}

#[cfg(test)]
impl FixedEnvironment {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            vars: Default::default(),
            cwd: cwd.into(),
            locale: Some("en-US".to_string()),
        }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_locale(mut self, locale: Option<&str>) -> Self {
        self.locale = locale.map(str::to_string);
        self
    }
}

#[cfg(test)]
impl Environment for FixedEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }
}

/// First usable language tag among `LC_ALL`, `LC_MESSAGES` and `LANG`.
pub fn locale_from_vars(env: &dyn Environment) -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| env.var(key))
        .find_map(|raw| language_tag(&raw))
}

/// Converts a POSIX locale such as `en_US.UTF-8` into a language tag (`en-US`).
pub fn language_tag(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Browser timeout override in milliseconds. Unparsable values are ignored.
pub fn env_browser_timeout(env: &dyn Environment) -> Option<u64> {
    let raw = env.var(ENV_BROWSER_TIMEOUT)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            tracing::debug!("Ignoring {ENV_BROWSER_TIMEOUT}={raw:?}: not an integer");
            None
        }
    }
}
