//! Error types for configuration resolution

use std::fmt;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Broad category of a fatal resolution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidValue,
    ParseFailure,
    EnvironmentLimitation,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    NotFound(Failure),

    #[error("{0}")]
    InvalidValue(Failure),

    #[error("{0}")]
    ParseFailure(Failure),

    #[error("{0}")]
    EnvironmentLimitation(Failure),
}

impl ConfigError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ConfigError::NotFound(Failure::new(message))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::InvalidValue(Failure::new(message))
    }

    pub fn parse(message: impl Into<String>, cause: Cause, path: &Path) -> Self {
        ConfigError::ParseFailure(Failure::new(message).with_cause(cause).at(path))
    }

    pub fn limitation(message: impl Into<String>, path: &Path) -> Self {
        ConfigError::EnvironmentLimitation(Failure::new(message).at(path))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::NotFound(_) => ErrorKind::NotFound,
            ConfigError::InvalidValue(_) => ErrorKind::InvalidValue,
            ConfigError::ParseFailure(_) => ErrorKind::ParseFailure,
            ConfigError::EnvironmentLimitation(_) => ErrorKind::EnvironmentLimitation,
        }
    }

    /// Attach an underlying cause, keeping the error kind.
    pub fn with_cause(self, cause: Cause) -> Self {
        self.map(|f| f.with_cause(cause))
    }

    pub fn at(self, path: &Path) -> Self {
        self.map(|f| f.at(path))
    }

    /// Suggest what the user can do instead.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.map(|f| f.with_hint(hint))
    }

    fn map(self, update: impl FnOnce(Failure) -> Failure) -> Self {
        match self {
            ConfigError::NotFound(f) => ConfigError::NotFound(update(f)),
            ConfigError::InvalidValue(f) => ConfigError::InvalidValue(update(f)),
            ConfigError::ParseFailure(f) => ConfigError::ParseFailure(update(f)),
            ConfigError::EnvironmentLimitation(f) => ConfigError::EnvironmentLimitation(update(f)),
        }
    }
}

/// The user-facing payload of a [`ConfigError`].
///
/// Renders as one line: `message (CauseName: cause message) [path] hint`,
/// where everything after the message only appears when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub cause: Option<Cause>,
    pub path: Option<PathBuf>,
    pub hint: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            path: None,
            hint: None,
        }
    }

    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn at(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub fn with_hint(mut self, hint: String) -> Self {
        self.hint = Some(hint);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", single_line(&self.message))?;
        if let Some(cause) = &self.cause {
            write!(f, " ({}: {})", cause.name, single_line(&cause.message))?;
        }
        if let Some(path) = &self.path {
            write!(f, " [{}]", path.display())?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " {}", single_line(hint))?;
        }
        Ok(())
    }
}

/// Identifying name and message of an underlying error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    pub name: String,
    pub message: String,
}

impl Cause {
    pub fn new(name: impl Into<String>, message: impl ToString) -> Self {
        Self {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::new(format!("{:?}", err.kind()), err)
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
