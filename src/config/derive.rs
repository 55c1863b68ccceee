//! Values computed from other resolved values rather than read directly.

use std::path::Path;

use super::constants::{DEFAULT_IMAGE_SCALE, DEFAULT_PPTX_IMAGE_SCALE};
use super::precedence::Chain;
use super::types::{ImageFormat, OneOrMany, OutputKind, PdfOutlines, PdfOutlinesInput};

/// Everything the output kind depends on.
#[derive(Debug, Clone, Default)]
pub struct OutputIntent<'a> {
    pub pdf: Option<bool>,
    pub pptx: Option<bool>,
    pub notes: Option<bool>,
    pub image: Option<ImageFormat>,
    pub output_file: Option<&'a str>,
    pub pdf_notes: bool,
    pub pdf_outlines: bool,
    pub pptx_editable: bool,
}

/// Rules are ordered and the first match wins. An explicit `false` for the
/// PDF or PPTX flag blocks the sub-option rules for that format.
pub fn output_kind(intent: &OutputIntent<'_>) -> OutputKind {
    if intent.pdf == Some(true) {
        return OutputKind::Pdf;
    }
    if intent.pptx == Some(true) {
        return OutputKind::Pptx;
    }
    if intent.notes == Some(true) {
        return OutputKind::Notes;
    }

    match intent.image {
        Some(ImageFormat::Png) => return OutputKind::Png,
        Some(ImageFormat::Jpeg) => return OutputKind::Jpeg,
        None => {}
    }

    if let Some(kind) = intent.output_file.and_then(kind_from_extension) {
        return kind;
    }

    if intent.pdf != Some(false) && (intent.pdf_notes || intent.pdf_outlines) {
        return OutputKind::Pdf;
    }
    if intent.pptx != Some(false) && intent.pptx_editable {
        return OutputKind::Pptx;
    }

    OutputKind::Html
}

fn kind_from_extension(file: &str) -> Option<OutputKind> {
    let ext = Path::new(file).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => Some(OutputKind::Html),
        "pdf" => Some(OutputKind::Pdf),
        "png" => Some(OutputKind::Png),
        "pptx" => Some(OutputKind::Pptx),
        "jpg" | "jpeg" => Some(OutputKind::Jpeg),
        "txt" => Some(OutputKind::Notes),
        _ => None,
    }
}

/// Outline options. Enabling outlines turns on both sub-keys unless the config
/// file object or the per-key arguments say otherwise; ending with both off
/// disables outlines altogether.
pub fn pdf_outlines(
    flag: Option<bool>,
    pages: Option<bool>,
    headings: Option<bool>,
    file: Option<&PdfOutlinesInput>,
) -> Option<PdfOutlines> {
    let enabled = Chain::new("pdfOutlines")
        .argument(flag)
        .config_file(file.map(|input| !matches!(input, PdfOutlinesInput::Enabled(false))))
        .value()
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    let (file_pages, file_headings) = match file {
        Some(PdfOutlinesInput::Options { pages, headings }) => (*pages, *headings),
        _ => (None, None),
    };
    let outlines = PdfOutlines {
        pages: Chain::new("pdfOutlines.pages")
            .argument(pages)
            .config_file(file_pages)
            .or_default(true)
            .value,
        headings: Chain::new("pdfOutlines.headings")
            .argument(headings)
            .config_file(file_headings)
            .or_default(true)
            .value,
    };

    (outlines.pages || outlines.headings).then_some(outlines)
}

pub fn watch(watch: Option<bool>, preview: bool, server: bool) -> bool {
    watch.unwrap_or(false) || preview || server
}

/// A delimited string is split on commas; a list passes through unchanged.
pub fn keywords(value: OneOrMany<String>) -> Vec<String> {
    match value {
        OneOrMany::One(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect(),
        OneOrMany::Many(list) => list,
    }
}

pub fn default_image_scale(kind: OutputKind) -> f64 {
    match kind {
        OutputKind::Pptx => DEFAULT_PPTX_IMAGE_SCALE,
        _ => DEFAULT_IMAGE_SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_take_priority_in_order() {
        let intent = OutputIntent {
            pdf: Some(true),
            pptx: Some(true),
            image: Some(ImageFormat::Png),
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Pdf);

        let intent = OutputIntent {
            pptx: Some(true),
            notes: Some(true),
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Pptx);

        let intent = OutputIntent {
            notes: Some(true),
            output_file: Some("deck.pdf"),
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Notes);
    }

    #[test]
    fn image_request_beats_extension() {
        let intent = OutputIntent {
            image: Some(ImageFormat::Jpeg),
            output_file: Some("deck.png"),
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Jpeg);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let cases = [
            ("deck.PDF", OutputKind::Pdf),
            ("deck.Htm", OutputKind::Html),
            ("deck.html", OutputKind::Html),
            ("slides/deck.PNG", OutputKind::Png),
            ("deck.pptx", OutputKind::Pptx),
            ("deck.JPG", OutputKind::Jpeg),
            ("deck.jpeg", OutputKind::Jpeg),
            ("notes.txt", OutputKind::Notes),
        ];
        for (file, expected) in cases {
            let intent = OutputIntent {
                output_file: Some(file),
                ..Default::default()
            };
            assert_eq!(output_kind(&intent), expected, "{file}");
        }
    }

    #[test]
    fn html_extension_wins_over_pdf_sub_options() {
        let intent = OutputIntent {
            output_file: Some("deck.html"),
            pdf_notes: true,
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Html);
    }

    #[test]
    fn pdf_sub_options_imply_pdf_unless_disabled() {
        let intent = OutputIntent {
            pdf_outlines: true,
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Pdf);

        let intent = OutputIntent {
            pdf: Some(false),
            pdf_outlines: true,
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Html);
    }

    #[test]
    fn pptx_editable_implies_pptx_unless_disabled() {
        let intent = OutputIntent {
            pptx_editable: true,
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Pptx);

        let intent = OutputIntent {
            pptx: Some(false),
            pptx_editable: true,
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Html);
    }

    #[test]
    fn dotfile_name_has_no_extension() {
        for file in [".pdf", ".PPTX", "slides/.png"] {
            let intent = OutputIntent {
                output_file: Some(file),
                ..Default::default()
            };
            assert_eq!(output_kind(&intent), OutputKind::Html, "{file}");
        }
    }

    #[test]
    fn unknown_extension_defaults_to_html() {
        let intent = OutputIntent {
            output_file: Some("deck.md.out"),
            ..Default::default()
        };
        assert_eq!(output_kind(&intent), OutputKind::Html);
        assert_eq!(output_kind(&OutputIntent::default()), OutputKind::Html);
    }

    #[test]
    fn outlines_defaults_and_overrides() {
        assert_eq!(pdf_outlines(None, None, None, None), None);
        assert_eq!(
            pdf_outlines(Some(true), None, None, None),
            Some(PdfOutlines { pages: true, headings: true })
        );

        let file = PdfOutlinesInput::Options { pages: Some(false), headings: None };
        assert_eq!(
            pdf_outlines(None, None, None, Some(&file)),
            Some(PdfOutlines { pages: false, headings: true })
        );
        assert_eq!(
            pdf_outlines(None, Some(true), Some(false), Some(&file)),
            Some(PdfOutlines { pages: true, headings: false })
        );
        assert_eq!(pdf_outlines(None, Some(false), Some(false), Some(&file)), None);
        assert_eq!(pdf_outlines(Some(false), None, None, Some(&file)), None);
        assert_eq!(
            pdf_outlines(None, None, None, Some(&PdfOutlinesInput::Enabled(false))),
            None
        );
    }

    #[test]
    fn watch_follows_preview_and_server() {
        assert!(!watch(None, false, false));
        assert!(!watch(Some(false), false, false));
        assert!(watch(Some(true), false, false));
        assert!(watch(Some(false), true, false));
        assert!(watch(None, false, true));
    }

    #[test]
    fn keywords_split_strings_and_keep_lists() {
        assert_eq!(
            keywords(OneOrMany::One("rust, slides,,  config ".into())),
            vec!["rust", "slides", "config"]
        );
        assert_eq!(
            keywords(OneOrMany::Many(vec!["a, b".into()])),
            vec!["a, b"]
        );
    }

    #[test]
    fn image_scale_default_depends_on_kind() {
        assert_eq!(default_image_scale(OutputKind::Pptx), 2.0);
        assert_eq!(default_image_scale(OutputKind::Png), 1.0);
    }
}
