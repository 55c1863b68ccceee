use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::{BespokeOptions, OneOrMany, Parallelism, RawArguments};

use super::commands;

/// Entry point for the `mdeck` command-line interface.
///
/// Boolean toggles accept an optional value (`--pdf`, `--pdf=false`) so that an
/// explicit `false` can override the configuration file.
#[derive(Debug, Parser)]
#[command(
    name = "mdeck",
    about = "Convert Markdown slide decks to HTML, PDF, PPTX and images",
    version,
    long_about = None
)]
pub struct Cli {
    /// Markdown files to convert (or the directory to serve in server mode)
    pub inputs: Vec<String>,

    /// Enable verbose logging of configuration resolution
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Use this configuration file instead of searching for one
    #[arg(short = 'c', long = "config-file", conflicts_with = "no_config_file")]
    pub config_file: Option<PathBuf>,

    /// Do not look for a configuration file
    #[arg(long = "no-config-file")]
    pub no_config_file: bool,

    /// Directory of Markdown files to convert
    #[arg(short = 'I', long = "input-dir")]
    pub input_dir: Option<PathBuf>,

    /// Output file path, or `-` for standard output
    #[arg(short = 'o', long = "output", allow_hyphen_values = true)]
    pub output: Option<String>,

    /// Serve the input directory over HTTP
    #[arg(short = 's', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub server: Option<bool>,

    /// Open a preview window
    #[arg(short = 'p', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub preview: Option<bool>,

    /// Watch inputs and rebuild on change
    #[arg(short = 'w', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub watch: Option<bool>,

    /// Strip `.html` and `index.html` from served URLs
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub clean_urls: Option<bool>,

    /// Read Markdown from standard input when no files are given
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub stdin: Option<bool>,

    /// Let the browser read local files referenced by the deck
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub allow_local_files: Option<bool>,

    /// Convert to PDF
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pdf: Option<bool>,

    /// Add presenter notes to the PDF as annotations
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pdf_notes: Option<bool>,

    /// Add an outline (bookmarks) to the PDF
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pdf_outlines: Option<bool>,

    /// Include slide pages in the PDF outline
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pdf_outlines_pages: Option<bool>,

    /// Include Markdown headings in the PDF outline
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pdf_outlines_headings: Option<bool>,

    /// Convert to PowerPoint
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pptx: Option<bool>,

    /// Produce an editable PowerPoint document
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pptx_editable: Option<bool>,

    /// Extract presenter notes to a text file
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub notes: Option<bool>,

    /// Convert the first slide to an image (png or jpeg)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "png")]
    pub image: Option<String>,

    /// Convert every slide to an image (png or jpeg)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "png")]
    pub images: Option<String>,

    /// Scale factor for rendered images
    #[arg(long, allow_negative_numbers = true)]
    pub image_scale: Option<f64>,

    /// JPEG quality (0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub jpeg_quality: Option<i64>,

    /// Number of files converted concurrently (`--parallel=false` for one at a time)
    #[arg(
        short = 'P',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_parallelism
    )]
    pub parallel: Option<Parallelism>,

    /// Preferred browsers, comma separated (auto, chrome, edge, firefox)
    #[arg(long, value_delimiter = ',')]
    pub browser: Option<Vec<String>>,

    /// Path to a browser executable
    #[arg(long)]
    pub browser_path: Option<PathBuf>,

    /// Browser control protocol (cdp or webdriver-bidi)
    #[arg(long)]
    pub browser_protocol: Option<String>,

    /// Seconds to wait for the browser; 0 disables the limit
    #[arg(long, allow_negative_numbers = true)]
    pub browser_timeout: Option<f64>,

    /// Theme name or path to a CSS file
    #[arg(long)]
    pub theme: Option<String>,

    /// Additional theme files or directories
    #[arg(long, num_args = 1..)]
    pub theme_set: Option<Vec<PathBuf>>,

    /// HTML template
    #[arg(long)]
    pub template: Option<String>,

    /// Show the on-screen controller (bespoke template)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub bespoke_osc: Option<bool>,

    /// Show a progress bar (bespoke template)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub bespoke_progress: Option<bool>,

    /// Enable slide transitions (bespoke template)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub bespoke_transition: Option<bool>,

    /// Conversion engine: `builtin` or a path to an engine module
    #[arg(long)]
    pub engine: Option<String>,

    /// Allow raw HTML in Markdown
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub html: Option<bool>,

    /// Document language
    #[arg(long)]
    pub lang: Option<String>,

    /// Author of the deck
    #[arg(long)]
    pub author: Option<String>,

    /// Description of the deck
    #[arg(long)]
    pub description: Option<String>,

    /// Comma separated keywords
    #[arg(long)]
    pub keywords: Option<String>,

    /// Open Graph image URL
    #[arg(long)]
    pub og_image: Option<String>,

    /// Title of the deck
    #[arg(long)]
    pub title: Option<String>,

    /// Canonical URL of the deck
    #[arg(long)]
    pub url: Option<String>,
}

/// `true`/`false` toggle concurrency; anything else is a degree.
fn parse_parallelism(raw: &str) -> std::result::Result<Parallelism, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Parallelism::Flag(true)),
        "false" => Ok(Parallelism::Flag(false)),
        other => other
            .parse::<f64>()
            .map(Parallelism::Degree)
            .map_err(|_| format!("expected true, false or a number, got '{raw}'")),
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        commands::run(self).await
    }

    /// Moves parsed options into the resolver's input shape.
    pub fn into_raw_arguments(self) -> RawArguments {
        RawArguments {
            inputs: self.inputs,
            config_file: self.config_file,
            no_config_file: self.no_config_file,
            input_dir: self.input_dir,
            output: self.output,
            server: self.server,
            preview: self.preview,
            watch: self.watch,
            clean_urls: self.clean_urls,
            stdin: self.stdin,
            allow_local_files: self.allow_local_files,
            pdf: self.pdf,
            pdf_notes: self.pdf_notes,
            pdf_outlines: self.pdf_outlines,
            pdf_outlines_pages: self.pdf_outlines_pages,
            pdf_outlines_headings: self.pdf_outlines_headings,
            pptx: self.pptx,
            pptx_editable: self.pptx_editable,
            notes: self.notes,
            image: self.image,
            images: self.images,
            image_scale: self.image_scale,
            jpeg_quality: self.jpeg_quality,
            parallel: self.parallel,
            // A lone name keeps single-browser semantics (`auto`, unknown name errors)
            browser: self.browser.map(|mut names| match names.len() {
                1 => OneOrMany::One(names.remove(0)),
                _ => OneOrMany::Many(names),
            }),
            browser_path: self.browser_path,
            browser_protocol: self.browser_protocol,
            browser_timeout: self.browser_timeout,
            theme: self.theme,
            theme_set: self.theme_set,
            template: self.template,
            bespoke: BespokeOptions {
                osc: self.bespoke_osc,
                progress: self.bespoke_progress,
                transition: self.bespoke_transition,
            },
            engine: self.engine,
            html: self.html,
            lang: self.lang,
            author: self.author,
            description: self.description,
            og_image: self.og_image,
            keywords: self.keywords.map(OneOrMany::One),
            title: self.title,
            url: self.url,
        }
    }
}
