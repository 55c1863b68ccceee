//! Theme loading and theme set assembly.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use walkdir::WalkDir;

use super::error::{Cause, ConfigError, Result};
use super::types::ThemeReference;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip)]
    pub css: String,
}

/// Themes addressable by the conversion pipeline, unique by file path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThemeSet {
    themes: Vec<Theme>,
}

impl ThemeSet {
    pub fn new(initial: Vec<Theme>) -> Self {
        let mut set = Self::default();
        for theme in initial {
            set.add(theme);
        }
        set
    }

    /// Returns `false` when a theme from the same file is already present.
    pub fn add(&mut self, theme: Theme) -> bool {
        if self.themes.iter().any(|existing| existing.path == theme.path) {
            return false;
        }
        self.themes.push(theme);
        true
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|theme| theme.name.as_str())
    }
}

#[derive(Debug)]
pub enum ThemeLoadError {
    IsDirectory,
    NotFound,
    Other(Cause),
}

/// Loads a single theme file.
#[async_trait]
pub trait ThemeLoader: Send + Sync {
    async fn load(&self, path: &Path) -> std::result::Result<Theme, ThemeLoadError>;
}

/// Gathers themes from files and directories on top of already loaded ones.
#[async_trait]
pub trait ThemeSetLoader: Send + Sync {
    async fn load(&self, paths: &[PathBuf], initial: Vec<Theme>) -> Result<ThemeSet>;
}

/// Reads CSS files and takes the theme name from their `@theme` annotation.
#[derive(Debug, Default, Clone, Copy)]
pub struct CssThemeLoader;

#[async_trait]
impl ThemeLoader for CssThemeLoader {
    async fn load(&self, path: &Path) -> std::result::Result<Theme, ThemeLoadError> {
        let meta = tokio::fs::metadata(path).await.map_err(|err| match err.kind() {
            IoErrorKind::NotFound => ThemeLoadError::NotFound,
            _ => ThemeLoadError::Other(Cause::io(&err)),
        })?;
        if meta.is_dir() {
            return Err(ThemeLoadError::IsDirectory);
        }

        let css = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| ThemeLoadError::Other(Cause::io(&err)))?;
        let name = theme_name(&css).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(Theme {
            name,
            path: path.to_path_buf(),
            css,
        })
    }
}

/// Walks directories for `*.css` files and loads them with a [`ThemeLoader`].
pub struct FsThemeSetLoader<L> {
    loader: L,
}

impl<L: ThemeLoader> FsThemeSetLoader<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl<L: ThemeLoader> ThemeSetLoader for FsThemeSetLoader<L> {
    async fn load(&self, paths: &[PathBuf], initial: Vec<Theme>) -> Result<ThemeSet> {
        let mut set = ThemeSet::new(initial);

        for file in css_files(paths) {
            match self.loader.load(&file).await {
                Ok(theme) => {
                    set.add(theme);
                }
                Err(ThemeLoadError::Other(cause)) => {
                    return Err(ConfigError::invalid("Could not load theme")
                        .with_cause(cause)
                        .at(&file));
                }
                Err(ThemeLoadError::NotFound | ThemeLoadError::IsDirectory) => {}
            }
        }

        Ok(set)
    }
}

fn css_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
            })
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

/// Extracts `name` from a `/* @theme name */` annotation.
pub fn theme_name(css: &str) -> Option<String> {
    css.lines().find_map(|line| {
        let (_, rest) = line.split_once("@theme")?;
        let name = rest
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '*')
            .next()?;
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Outcome of resolving the single selected theme.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeChoice {
    Loaded(Theme),
    /// The value did not name a file, so it is passed on as a built-in theme name.
    Builtin(String),
}

impl ThemeChoice {
    pub fn name(&self) -> &str {
        match self {
            ThemeChoice::Loaded(theme) => &theme.name,
            ThemeChoice::Builtin(name) => name,
        }
    }
}

pub async fn resolve_theme(
    reference: &ThemeReference,
    loader: &dyn ThemeLoader,
) -> Result<ThemeChoice> {
    match loader.load(&reference.path).await {
        Ok(theme) => Ok(ThemeChoice::Loaded(theme)),
        Err(ThemeLoadError::NotFound) => {
            tracing::debug!(
                theme = %reference.name,
                layer = %reference.layer,
                "theme file not found; using built-in theme name"
            );
            Ok(ThemeChoice::Builtin(reference.name.clone()))
        }
        Err(ThemeLoadError::IsDirectory) => Err(ConfigError::invalid(format!(
            "Theme path from {} is a directory",
            reference.layer
        ))
        .at(&reference.path)
        .with_hint("Use --theme-set (or themeSet) to load every theme in a directory.")),
        Err(ThemeLoadError::Other(cause)) => Err(ConfigError::invalid("Could not load theme")
            .with_cause(cause)
            .at(&reference.path)),
    }
}
