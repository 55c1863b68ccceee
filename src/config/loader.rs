//! Configuration file discovery and parsing.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dirs::home_dir;

use super::constants::PACKAGE_JSON_KEY;
use super::error::{Cause, ConfigError, Result};
use super::types::RawFileConfig;

/// File names probed in every directory during discovery, in order.
pub const CONFIG_CANDIDATES: &[&str] = &[
    "package.json",
    ".mdeckrc",
    ".mdeckrc.json",
    ".mdeckrc.yaml",
    ".mdeckrc.yml",
    ".mdeckrc.toml",
    "mdeck.config.js",
    "mdeck.config.mjs",
    "mdeck.config.cjs",
    "mdeck.config.ts",
];

/// A parsed configuration file and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub filepath: PathBuf,
    pub config: RawFileConfig,
}

impl LoadedConfig {
    /// Directory that relative paths inside the file are anchored at.
    pub fn base_dir(&self) -> &Path {
        self.filepath.parent().unwrap_or_else(|| Path::new("/"))
    }
}

#[async_trait]
pub trait ConfigFileLoader: Send + Sync {
    /// Loads an explicitly named file. `Ok(None)` when it does not exist.
    async fn load(&self, path: &Path) -> Result<Option<LoadedConfig>>;

    /// Looks for a configuration file in `start_dir` and its ancestors.
    async fn search(&self, start_dir: &Path) -> Result<Option<LoadedConfig>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Toml,
    PackageJson,
    Script,
}

impl Format {
    fn of(path: &Path) -> Self {
        if path.file_name().is_some_and(|name| name == "package.json") {
            return Format::PackageJson;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Format::Json,
            "toml" => Format::Toml,
            "js" | "mjs" | "cjs" | "ts" => Format::Script,
            // YAML also accepts JSON, so extension-less rc files go here.
            _ => Format::Yaml,
        }
    }
}

/// Reads JSON, YAML and TOML files from disk.
#[derive(Debug, Clone)]
pub struct FsConfigLoader {
    stop_dir: Option<PathBuf>,
}

impl Default for FsConfigLoader {
    fn default() -> Self {
        Self {
            stop_dir: home_dir(),
        }
    }
}

impl FsConfigLoader {
    /// Discovery stops after visiting `stop_dir` (or at the filesystem root).
    #[cfg(test)]
    pub fn with_stop_dir(stop_dir: Option<PathBuf>) -> Self {
        Self { stop_dir }
    }

    async fn read(path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == IoErrorKind::IsADirectory => Ok(None),
            Err(err) => Err(ConfigError::invalid("Could not read configuration file")
                .with_cause(Cause::io(&err))
                .at(path)),
        }
    }
}

#[async_trait]
impl ConfigFileLoader for FsConfigLoader {
    async fn load(&self, path: &Path) -> Result<Option<LoadedConfig>> {
        if Format::of(path) == Format::Script {
            return Err(script_unsupported(path));
        }
        let Some(contents) = Self::read(path).await? else {
            return Ok(None);
        };
        let config = parse(path, &contents)?.unwrap_or_default();
        Ok(Some(LoadedConfig {
            filepath: path.to_path_buf(),
            config,
        }))
    }

    async fn search(&self, start_dir: &Path) -> Result<Option<LoadedConfig>> {
        for dir in start_dir.ancestors() {
            for candidate in CONFIG_CANDIDATES {
                let path = dir.join(candidate);
                let exists = tokio::fs::try_exists(&path).await.map_err(|err| {
                    ConfigError::invalid("Could not access configuration file")
                        .with_cause(Cause::io(&err))
                        .at(&path)
                })?;
                if !exists {
                    continue;
                }
                if Format::of(&path) == Format::Script {
                    return Err(script_unsupported(&path));
                }
                let Some(contents) = Self::read(&path).await? else {
                    continue;
                };
                // package.json only counts when it carries our key
                if let Some(config) = parse(&path, &contents)? {
                    tracing::debug!("Discovered configuration file {}", path.display());
                    return Ok(Some(LoadedConfig {
                        filepath: path,
                        config,
                    }));
                }
            }

            if self.stop_dir.as_deref() == Some(dir) {
                break;
            }
        }
        Ok(None)
    }
}

/// Parses file contents. `None` means the file holds no configuration for us
/// (an empty file, or a package.json without an `mdeck` key).
pub fn parse(path: &Path, contents: &str) -> Result<Option<RawFileConfig>> {
    let format = Format::of(path);
    if contents.trim().is_empty() {
        return Ok(match format {
            Format::PackageJson => None,
            _ => Some(RawFileConfig::default()),
        });
    }

    let parsed = match format {
        Format::Json => serde_json::from_str(contents)
            .map_err(|err| parse_error(path, Cause::new("JsonError", err)))?,
        Format::Yaml => serde_yaml::from_str::<Option<RawFileConfig>>(contents)
            .map_err(|err| parse_error(path, Cause::new("YamlError", err)))?
            .unwrap_or_default(),
        Format::Toml => toml::from_str(contents)
            .map_err(|err| parse_error(path, Cause::new("TomlError", err)))?,
        Format::PackageJson => {
            let manifest: serde_json::Value = serde_json::from_str(contents)
                .map_err(|err| parse_error(path, Cause::new("JsonError", err)))?;
            let Some(section) = manifest.get(PACKAGE_JSON_KEY) else {
                return Ok(None);
            };
            serde_json::from_value(section.clone())
                .map_err(|err| parse_error(path, Cause::new("JsonError", err)))?
        }
        Format::Script => return Err(script_unsupported(path)),
    };
    Ok(Some(parsed))
}

fn parse_error(path: &Path, cause: Cause) -> ConfigError {
    ConfigError::parse("Could not parse configuration file", cause, path)
}

fn script_unsupported(path: &Path) -> ConfigError {
    ConfigError::limitation("Script configuration files cannot be evaluated", path).with_hint(
        "Rewrite it as .mdeckrc.json, .mdeckrc.yaml or .mdeckrc.toml.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorKind;
    use crate::config::types::{OneOrMany, Parallelism, PdfOutlinesInput};
    use std::fs;
    use tempfile::TempDir;

    fn loader(stop: &Path) -> FsConfigLoader {
        FsConfigLoader::with_stop_dir(Some(stop.to_path_buf()))
    }

    #[tokio::test]
    async fn search_finds_rc_in_ancestor() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join(".mdeckrc.yml"), "pdf: true\nthemeSet: themes\n").unwrap();

        let loaded = loader(tmp.path()).search(&nested).await.unwrap().unwrap();
        assert_eq!(loaded.filepath, tmp.path().join(".mdeckrc.yml"));
        assert_eq!(loaded.base_dir(), tmp.path());
        assert_eq!(loaded.config.pdf, Some(true));
        assert_eq!(loaded.config.theme_set, Some(OneOrMany::One(PathBuf::from("themes"))));
    }

    #[tokio::test]
    async fn search_stops_at_stop_dir() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(tmp.path().join(".mdeckrc.json"), "{\"pdf\": true}").unwrap();

        assert!(loader(&project).search(&project).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn package_json_without_key_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), "{\"name\": \"deck\"}").unwrap();
        fs::write(tmp.path().join(".mdeckrc.toml"), "parallel = 3\n").unwrap();

        let loaded = loader(tmp.path()).search(tmp.path()).await.unwrap().unwrap();
        assert_eq!(loaded.filepath, tmp.path().join(".mdeckrc.toml"));
        assert_eq!(loaded.config.parallel, Some(Parallelism::Degree(3.0)));
    }

    #[tokio::test]
    async fn package_json_section_is_used() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "deck", "mdeck": {"pdfOutlines": {"pages": false}, "browser": ["chrome", "edge"]}}"#,
        )
        .unwrap();

        let loaded = loader(tmp.path()).search(tmp.path()).await.unwrap().unwrap();
        assert_eq!(
            loaded.config.pdf_outlines,
            Some(PdfOutlinesInput::Options { pages: Some(false), headings: None })
        );
        assert_eq!(
            loaded.config.browser,
            Some(OneOrMany::Many(vec!["chrome".into(), "edge".into()]))
        );
    }

    #[tokio::test]
    async fn explicit_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let result = loader(tmp.path()).load(&tmp.path().join("nope.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn malformed_file_reports_parser_and_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".mdeckrc.json");
        fs::write(&path, "{ pdf: ").unwrap();

        let err = loader(tmp.path()).load(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        let rendered = err.to_string();
        assert!(rendered.contains("(JsonError: "), "{rendered}");
        assert!(rendered.ends_with(&format!("[{}]", path.display())), "{rendered}");
    }

    #[tokio::test]
    async fn script_config_is_an_environment_limitation() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mdeck.config.mjs"), "export default {}").unwrap();

        let err = loader(tmp.path()).search(tmp.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EnvironmentLimitation);
        assert!(err.to_string().contains(".mdeckrc.json"));
    }

    #[tokio::test]
    async fn inaccessible_candidate_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let not_a_dir = tmp.path().join("deck.md");
        fs::write(&not_a_dir, "# Deck").unwrap();

        // looking up `deck.md/package.json` fails with something other than NotFound
        let err = loader(tmp.path()).search(&not_a_dir).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(err.to_string().contains(&not_a_dir.join("package.json").display().to_string()));
    }

    #[test]
    fn empty_files_yield_defaults() {
        let parsed = parse(Path::new(".mdeckrc"), "  \n").unwrap();
        assert_eq!(parsed, Some(RawFileConfig::default()));

        let parsed = parse(Path::new("package.json"), "").unwrap();
        assert_eq!(parsed, None);
    }
}
