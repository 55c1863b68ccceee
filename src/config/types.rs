use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ConfigError;
use super::precedence::Layer;
use super::theme::ThemeSet;

/// Invocation options as typed by the command line. `None` means the option
/// was not given; `Some(false)` is an explicit disablement.
#[derive(Debug, Clone, Default)]
pub struct RawArguments {
    pub inputs: Vec<String>,
    pub config_file: Option<PathBuf>,
    pub no_config_file: bool,

    pub input_dir: Option<PathBuf>,
    pub output: Option<String>,
    pub server: Option<bool>,
    pub preview: Option<bool>,
    pub watch: Option<bool>,
    pub clean_urls: Option<bool>,
    pub stdin: Option<bool>,
    pub allow_local_files: Option<bool>,

    pub pdf: Option<bool>,
    pub pdf_notes: Option<bool>,
    pub pdf_outlines: Option<bool>,
    pub pdf_outlines_pages: Option<bool>,
    pub pdf_outlines_headings: Option<bool>,
    pub pptx: Option<bool>,
    pub pptx_editable: Option<bool>,
    pub notes: Option<bool>,
    pub image: Option<String>,
    pub images: Option<String>,
    pub image_scale: Option<f64>,
    pub jpeg_quality: Option<i64>,
    pub parallel: Option<Parallelism>,

    pub browser: Option<OneOrMany<String>>,
    pub browser_path: Option<PathBuf>,
    pub browser_protocol: Option<String>,
    pub browser_timeout: Option<f64>,

    pub theme: Option<String>,
    pub theme_set: Option<Vec<PathBuf>>,
    pub template: Option<String>,
    pub bespoke: BespokeOptions,
    pub engine: Option<String>,
    pub html: Option<bool>,
    pub lang: Option<String>,

    pub author: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub keywords: Option<OneOrMany<String>>,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Options read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFileConfig {
    pub input_dir: Option<PathBuf>,
    pub output: Option<String>,
    pub server: Option<bool>,
    pub preview: Option<bool>,
    pub watch: Option<bool>,
    pub clean_urls: Option<bool>,
    pub stdin: Option<bool>,
    pub allow_local_files: Option<bool>,

    pub pdf: Option<bool>,
    pub pdf_notes: Option<bool>,
    pub pdf_outlines: Option<PdfOutlinesInput>,
    pub pptx: Option<bool>,
    pub pptx_editable: Option<bool>,
    pub notes: Option<bool>,
    pub image: Option<String>,
    pub images: Option<String>,
    pub image_scale: Option<Value>,
    pub jpeg_quality: Option<i64>,
    pub parallel: Option<Parallelism>,

    pub browser: Option<OneOrMany<String>>,
    pub browser_path: Option<PathBuf>,
    pub browser_protocol: Option<String>,
    pub browser_timeout: Option<f64>,

    pub theme: Option<String>,
    pub theme_set: Option<OneOrMany<PathBuf>>,
    pub template: Option<String>,
    pub bespoke: Option<BespokeOptions>,
    pub engine: Option<String>,
    pub html: Option<Value>,
    pub options: Option<Map<String, Value>>,
    pub lang: Option<String>,

    pub author: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub keywords: Option<OneOrMany<String>>,
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Parallelism {
    Flag(bool),
    Degree(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PdfOutlinesInput {
    Enabled(bool),
    Options {
        #[serde(default)]
        pages: Option<bool>,
        #[serde(default)]
        headings: Option<bool>,
    },
}

/// Sub-options of the `bespoke` template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BespokeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateOptions {
    pub bespoke: BespokeOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Html,
    Pdf,
    Pptx,
    Png,
    Jpeg,
    Notes,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutputKind::Html => "html",
            OutputKind::Pdf => "pdf",
            OutputKind::Pptx => "pptx",
            OutputKind::Png => "png",
            OutputKind::Jpeg => "jpeg",
            OutputKind::Notes => "notes",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl std::str::FromStr for ImageFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            other => Err(ConfigError::invalid(format!(
                "Unknown image format '{other}' (expected png or jpeg)"
            ))),
        }
    }
}

/// Where converted output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "camelCase")]
pub enum OutputTarget {
    /// Next to each input, named after it.
    Derived,
    File(PathBuf),
    Stdout,
    /// Server mode: nothing is written.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Edge,
    Firefox,
}

impl BrowserKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" => Some(BrowserKind::Chrome),
            "edge" => Some(BrowserKind::Edge),
            "firefox" => Some(BrowserKind::Firefox),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "finders", rename_all = "camelCase")]
pub enum BrowserSelection {
    /// Let the browser collaborator pick.
    #[default]
    Auto,
    Preferred(Vec<BrowserKind>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BrowserProtocol {
    #[default]
    #[serde(rename = "cdp")]
    Cdp,
    #[serde(rename = "webDriverBiDi")]
    WebDriverBiDi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PdfOutlines {
    pub pages: bool,
    pub headings: bool,
}

/// Metadata applied to every converted deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDirectives {
    pub author: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub theme: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "camelCase")]
pub enum EngineSource {
    Builtin,
    Module(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineHandle {
    pub id: String,
    pub source: EngineSource,
}

/// A theme name or path together with the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeReference {
    pub name: String,
    pub path: PathBuf,
    pub layer: Layer,
}

/// The fully resolved configuration handed to the conversion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfiguration {
    pub config_file: Option<PathBuf>,
    pub inputs: Vec<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub output: OutputTarget,
    pub kind: OutputKind,
    pub pages: bool,

    pub server: bool,
    pub preview: bool,
    pub watch: bool,
    pub clean_urls: bool,
    pub stdin: bool,
    pub allow_local_files: bool,

    pub pdf_notes: bool,
    pub pdf_outlines: Option<PdfOutlines>,
    pub pptx_editable: bool,
    pub image_scale: f64,
    pub jpeg_quality: u8,
    pub parallel: u32,

    pub browser: BrowserSelection,
    pub browser_path: Option<PathBuf>,
    pub browser_protocol: BrowserProtocol,
    /// Milliseconds; `None` means no limit.
    pub browser_timeout: Option<u64>,

    pub engine: EngineHandle,
    pub html: Option<Value>,
    pub options: Map<String, Value>,
    pub lang: Option<String>,
    pub template: String,
    pub template_options: TemplateOptions,
    pub themes: ThemeSet,
    pub global_directives: GlobalDirectives,
}

/// A non-fatal problem that was corrected while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!("{message}");
        Self { message }
    }
}

/// A resolved configuration plus the warnings collected on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub config: ResolvedConfiguration,
    pub diagnostics: Vec<Diagnostic>,
}
