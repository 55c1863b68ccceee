use std::path::{Path, PathBuf};

use serde_json::{Number, Value};

use super::builder::ResolverBuilder;
use super::constants::{
    AUTO_BROWSER, DEFAULT_ENGINE, DEFAULT_JPEG_QUALITY, DEFAULT_TEMPLATE, ENV_BROWSER_PATH,
    STDOUT_SENTINEL,
};
use super::derive::{self, OutputIntent};
use super::engine::EngineResolver;
use super::environment::{Environment, env_browser_timeout};
use super::error::{ConfigError, Result};
use super::precedence::{Chain, sub_key};
use super::theme::{ThemeChoice, ThemeLoader, ThemeSetLoader, resolve_theme};
use super::types::{
    BespokeOptions, Diagnostic, GlobalDirectives, ImageFormat, OneOrMany, OutputTarget,
    RawArguments, RawFileConfig, Resolution, ResolvedConfiguration, TemplateOptions,
    ThemeReference,
};
use super::validation::{self, absolutize};

/// Resolves one invocation's options into a [`ResolvedConfiguration`].
///
/// The configuration file is read once when the resolver is built; each call to
/// [`resolve`](Self::resolve) re-runs validation and derivation over the cached
/// values without touching the file again.
pub struct ConfigResolver {
    pub(super) args: RawArguments,
    pub(super) file: RawFileConfig,
    pub(super) config_path: Option<PathBuf>,
    pub(super) config_dir: Option<PathBuf>,
    pub(super) cwd: PathBuf,
    pub(super) env: Box<dyn Environment>,
    pub(super) themes: Box<dyn ThemeLoader>,
    pub(super) theme_sets: Box<dyn ThemeSetLoader>,
    pub(super) engines: Box<dyn EngineResolver>,
}

enum Timeout {
    Seconds(f64),
    Millis(u64),
}

impl ConfigResolver {
    pub fn builder(args: RawArguments) -> ResolverBuilder {
        ResolverBuilder::new(args)
    }

    /// Relative paths from the config file are anchored here.
    fn config_dir(&self) -> &Path {
        self.config_dir.as_deref().unwrap_or(&self.cwd)
    }

    fn from_cwd(&self, path: impl AsRef<Path>) -> PathBuf {
        absolutize(&self.cwd, path.as_ref())
    }

    fn from_config(&self, path: impl AsRef<Path>) -> PathBuf {
        absolutize(self.config_dir(), path.as_ref())
    }

    pub async fn resolve(&self) -> Result<Resolution> {
        let args = &self.args;
        let conf = &self.file;
        let mut diagnostics = Vec::new();

        let server = flag("server", args.server, conf.server, false);
        let input_dir = self.input_dir(server).await?;
        let output = self.output(server);

        let mut preview = flag("preview", args.preview, conf.preview, false);
        if preview && server {
            diagnostics.push(Diagnostic::warning(
                "Preview is not available in server mode and has been turned off",
            ));
            preview = false;
        }
        let watch = derive::watch(
            Chain::new("watch").argument(args.watch).config_file(conf.watch).value(),
            preview,
            server,
        );

        let theme = match self.theme_reference() {
            Some(reference) => {
                Some(resolve_theme(&reference, self.themes.as_ref()).await?)
            }
            None => None,
        };
        let themes = {
            let initial: Vec<_> = match &theme {
                Some(ThemeChoice::Loaded(loaded)) => vec![loaded.clone()],
                _ => Vec::new(),
            };
            let initial_count = initial.len();
            let requested = self.theme_set_paths();
            let search: Vec<PathBuf> = input_dir
                .iter()
                .cloned()
                .chain(requested.iter().cloned())
                .collect();

            let set = self.theme_sets.load(&search, initial).await?;
            if set.len() <= initial_count && !requested.is_empty() {
                diagnostics.push(Diagnostic::warning(
                    "No additional themes found in the theme set",
                ));
            }
            set
        };

        let pdf = Chain::new("pdf").argument(args.pdf).config_file(conf.pdf).value();
        let pptx = Chain::new("pptx").argument(args.pptx).config_file(conf.pptx).value();
        let notes = Chain::new("notes").argument(args.notes).config_file(conf.notes).value();
        let pdf_notes = flag("pdfNotes", args.pdf_notes, conf.pdf_notes, false);
        let pdf_outlines = derive::pdf_outlines(
            args.pdf_outlines,
            args.pdf_outlines_pages,
            args.pdf_outlines_headings,
            conf.pdf_outlines.as_ref(),
        );
        let pptx_editable = flag("pptxEditable", args.pptx_editable, conf.pptx_editable, false);
        let (image, pages) = self.image_request()?;

        let output_file = match &output {
            OutputTarget::File(path) => path.file_name().and_then(|name| name.to_str()),
            _ => None,
        };
        let kind = derive::output_kind(&OutputIntent {
            pdf,
            pptx,
            notes,
            image,
            output_file,
            pdf_notes,
            pdf_outlines: pdf_outlines.is_some(),
            pptx_editable,
        });

        let image_scale = {
            let arg = args
                .image_scale
                .map(|scale| Number::from_f64(scale).map_or(Value::Null, Value::Number));
            let raw = Chain::new("imageScale")
                .argument(arg)
                .config_file(conf.image_scale.clone())
                .value();
            match raw {
                Some(value) => validation::image_scale(&value, &mut diagnostics)?,
                None => derive::default_image_scale(kind),
            }
        };
        let jpeg_quality = validation::jpeg_quality(
            Chain::new("jpegQuality")
                .argument(args.jpeg_quality)
                .config_file(conf.jpeg_quality)
                .or_default(i64::from(DEFAULT_JPEG_QUALITY))
                .value,
        )?;
        let parallel = validation::parallelism(
            Chain::new("parallel").argument(args.parallel).config_file(conf.parallel).value(),
        );

        let browser = validation::browser_selection(
            Chain::new("browser")
                .argument(args.browser.clone())
                .config_file(conf.browser.clone())
                .or_else(|| OneOrMany::One(AUTO_BROWSER.to_string()))
                .value,
        )?;
        let browser_path = Chain::new("browserPath")
            .argument(args.browser_path.as_ref().map(|p| self.from_cwd(p)))
            .config_file(conf.browser_path.as_ref().map(|p| self.from_config(p)))
            .environment(|| self.env.var(ENV_BROWSER_PATH).map(|p| self.from_cwd(p)))
            .value();
        let browser_protocol = Chain::new("browserProtocol")
            .argument(args.browser_protocol.as_deref())
            .config_file(conf.browser_protocol.as_deref())
            .value()
            .map(validation::browser_protocol)
            .transpose()?
            .unwrap_or_default();
        let browser_timeout = match Chain::new("browserTimeout")
            .argument(args.browser_timeout.map(Timeout::Seconds))
            .config_file(conf.browser_timeout.map(Timeout::Seconds))
            .environment(|| env_browser_timeout(self.env.as_ref()).map(Timeout::Millis))
            .value()
        {
            Some(Timeout::Seconds(seconds)) => Some(validation::browser_timeout_ms(seconds)?),
            Some(Timeout::Millis(ms)) => Some(ms),
            None => None,
        };

        let engine = {
            let (id, base) = Chain::new("engine")
                .argument(args.engine.as_deref().map(|id| (id, self.cwd.as_path())))
                .config_file(conf.engine.as_deref().map(|id| (id, self.config_dir())))
                .or_default((DEFAULT_ENGINE, self.cwd.as_path()))
                .value;
            self.engines.resolve(id, base).await?
        };

        let global_directives = GlobalDirectives {
            author: text("author", args.author.as_deref(), conf.author.as_deref()),
            description: text(
                "description",
                args.description.as_deref(),
                conf.description.as_deref(),
            ),
            image: text("ogImage", args.og_image.as_deref(), conf.og_image.as_deref()),
            keywords: Chain::new("keywords")
                .argument(args.keywords.clone())
                .config_file(conf.keywords.clone())
                .value()
                .map(derive::keywords),
            theme: theme.as_ref().map(|choice| choice.name().to_string()),
            title: text("title", args.title.as_deref(), conf.title.as_deref()),
            url: text("url", args.url.as_deref(), conf.url.as_deref()),
        };

        let config = ResolvedConfiguration {
            config_file: self.config_path.clone(),
            inputs: if server {
                Vec::new()
            } else {
                args.inputs.iter().map(|input| self.from_cwd(input)).collect()
            },
            input_dir,
            output,
            kind,
            pages,
            server,
            preview,
            watch,
            clean_urls: flag("cleanUrls", args.clean_urls, conf.clean_urls, false),
            stdin: flag("stdin", args.stdin, conf.stdin, true),
            allow_local_files: flag(
                "allowLocalFiles",
                args.allow_local_files,
                conf.allow_local_files,
                false,
            ),
            pdf_notes,
            pdf_outlines,
            pptx_editable,
            image_scale,
            jpeg_quality,
            parallel,
            browser,
            browser_path,
            browser_protocol,
            browser_timeout,
            engine,
            html: Chain::new("html")
                .argument(args.html.map(Value::Bool))
                .config_file(conf.html.clone())
                .value(),
            options: conf.options.clone().unwrap_or_default(),
            lang: text("lang", args.lang.as_deref(), conf.lang.as_deref())
                .or_else(|| self.env.locale()),
            template: Chain::new("template")
                .argument(args.template.clone())
                .config_file(conf.template.clone())
                .or_else(|| DEFAULT_TEMPLATE.to_string())
                .value,
            template_options: TemplateOptions {
                bespoke: self.bespoke_options(),
            },
            themes,
            global_directives,
        };

        tracing::debug!(kind = %config.kind, parallel = config.parallel, "configuration resolved");
        Ok(Resolution {
            config,
            diagnostics,
        })
    }

    async fn input_dir(&self, server: bool) -> Result<Option<PathBuf>> {
        let configured = Chain::new("inputDir")
            .argument(self.args.input_dir.as_ref().map(|dir| self.from_cwd(dir)))
            .config_file(self.file.input_dir.as_ref().map(|dir| self.from_config(dir)))
            .value();

        let dir = match configured {
            Some(dir) => dir,
            None if server => match self.args.inputs.as_slice() {
                [] => self.cwd.clone(),
                [only] => self.from_cwd(only),
                many => {
                    return Err(ConfigError::invalid(format!(
                        "Server mode requires just one directory, but {} inputs were given",
                        many.len()
                    )));
                }
            },
            None => return Ok(None),
        };

        validation::input_dir(&dir).await.map(Some)
    }

    fn output(&self, server: bool) -> OutputTarget {
        if server {
            return OutputTarget::Disabled;
        }
        let target = |raw: &str, base: &Path| {
            if raw == STDOUT_SENTINEL {
                OutputTarget::Stdout
            } else {
                OutputTarget::File(absolutize(base, Path::new(raw)))
            }
        };
        Chain::new("output")
            .argument(self.args.output.as_deref().map(|raw| target(raw, &self.cwd)))
            .config_file(self.file.output.as_deref().map(|raw| target(raw, self.config_dir())))
            .or_default(OutputTarget::Derived)
            .value
    }

    /// `images` asks for one file per page and outranks `image` in the same layer.
    fn image_request(&self) -> Result<(Option<ImageFormat>, bool)> {
        let pick = |images: &Option<String>, image: &Option<String>| {
            images
                .clone()
                .map(|format| (format, true))
                .or_else(|| image.clone().map(|format| (format, false)))
        };
        let requested = Chain::new("image")
            .argument(pick(&self.args.images, &self.args.image))
            .config_file(pick(&self.file.images, &self.file.image))
            .value();

        match requested {
            Some((format, pages)) => Ok((Some(format.parse()?), pages)),
            None => Ok((None, false)),
        }
    }

    fn theme_reference(&self) -> Option<ThemeReference> {
        let sourced = Chain::new("theme")
            .argument(self.args.theme.as_deref().map(|name| (name, self.cwd.as_path())))
            .config_file(self.file.theme.as_deref().map(|name| (name, self.config_dir())))
            .resolve()?;
        let (name, base) = sourced.value;
        Some(ThemeReference {
            name: name.to_string(),
            path: absolutize(base, Path::new(name)),
            layer: sourced.layer,
        })
    }

    fn theme_set_paths(&self) -> Vec<PathBuf> {
        Chain::new("themeSet")
            .argument(self.args.theme_set.as_ref().map(|paths| {
                paths.iter().map(|p| self.from_cwd(p)).collect::<Vec<_>>()
            }))
            .config_file(self.file.theme_set.clone().map(|paths| {
                paths.into_vec().iter().map(|p| self.from_config(p)).collect()
            }))
            .value()
            .unwrap_or_default()
    }

    fn bespoke_options(&self) -> BespokeOptions {
        let arg = Some(&self.args.bespoke);
        let file = self.file.bespoke.as_ref();
        BespokeOptions {
            osc: sub_key("bespoke.osc", arg, file, |b: &BespokeOptions| b.osc),
            progress: sub_key("bespoke.progress", arg, file, |b: &BespokeOptions| b.progress),
            transition: sub_key("bespoke.transition", arg, file, |b: &BespokeOptions| b.transition),
        }
    }
}

fn flag(option: &'static str, argument: Option<bool>, config_file: Option<bool>, default: bool) -> bool {
    Chain::new(option)
        .argument(argument)
        .config_file(config_file)
        .or_default(default)
        .value
}

fn text(option: &'static str, argument: Option<&str>, config_file: Option<&str>) -> Option<String> {
    Chain::new(option)
        .argument(argument)
        .config_file(config_file)
        .value()
        .map(str::to_string)
}
