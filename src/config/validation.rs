//! Range, type and membership checks applied after precedence resolution,
//! plus path normalization.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use super::constants::{AUTO_BROWSER, DEFAULT_PARALLEL, MAX_IMAGE_SCALE};
use super::error::{Cause, ConfigError, Result};
use super::types::{BrowserKind, BrowserProtocol, BrowserSelection, Diagnostic, OneOrMany, Parallelism};

/// Scale must be a positive number. Anything above the maximum is capped with a
/// warning instead of failing.
pub fn image_scale(value: &Value, diagnostics: &mut Vec<Diagnostic>) -> Result<f64> {
    let Some(scale) = value.as_f64() else {
        return Err(ConfigError::invalid(format!(
            "Image scale must be a number, got {value}"
        )));
    };

    if scale <= 0.0 {
        return Err(ConfigError::invalid(format!(
            "Image scale must be greater than 0, got {scale}"
        )));
    }

    if scale > MAX_IMAGE_SCALE {
        diagnostics.push(Diagnostic::warning(format!(
            "Image scale {scale} is too large; it has been clamped to {MAX_IMAGE_SCALE}"
        )));
        return Ok(MAX_IMAGE_SCALE);
    }

    Ok(scale)
}

pub fn parallelism(value: Option<Parallelism>) -> u32 {
    match value {
        None | Some(Parallelism::Flag(true)) => DEFAULT_PARALLEL,
        Some(Parallelism::Flag(false)) => 1,
        Some(Parallelism::Degree(degree)) if degree.is_nan() => 1,
        Some(Parallelism::Degree(degree)) => degree.floor().clamp(1.0, u32::MAX as f64) as u32,
    }
}

/// Seconds from the command line or config file become whole milliseconds.
pub fn browser_timeout_ms(seconds: f64) -> Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ConfigError::invalid(format!(
            "Browser timeout must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok((seconds * 1000.0).floor() as u64)
}

pub fn jpeg_quality(value: i64) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|quality| *quality <= 100)
        .ok_or_else(|| {
            ConfigError::invalid(format!("JPEG quality must be between 0 and 100, got {value}"))
        })
}

pub fn browser_selection(value: OneOrMany<String>) -> Result<BrowserSelection> {
    match value {
        OneOrMany::One(name) if name.trim().eq_ignore_ascii_case(AUTO_BROWSER) => {
            Ok(BrowserSelection::Auto)
        }
        OneOrMany::One(name) => BrowserKind::parse(&name)
            .map(|kind| BrowserSelection::Preferred(vec![kind]))
            .ok_or_else(|| ConfigError::invalid(format!("Unknown browser '{name}'"))),
        OneOrMany::Many(names) if names.is_empty() => Ok(BrowserSelection::Auto),
        OneOrMany::Many(names) => {
            let mut kinds = Vec::new();
            for name in &names {
                match BrowserKind::parse(name) {
                    Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
                    Some(_) => {}
                    None => tracing::debug!("Ignoring unknown browser '{name}'"),
                }
            }
            if kinds.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "No available browsers in [{}]",
                    names.join(", ")
                )));
            }
            Ok(BrowserSelection::Preferred(kinds))
        }
    }
}

pub fn browser_protocol(value: &str) -> Result<BrowserProtocol> {
    match value {
        "cdp" => Ok(BrowserProtocol::Cdp),
        "webdriver-bidi" | "webDriverBiDi" => Ok(BrowserProtocol::WebDriverBiDi),
        other => Err(ConfigError::invalid(format!(
            "Unknown browser protocol '{other}' (expected cdp or webdriver-bidi)"
        ))),
    }
}

/// The input directory must exist and be a directory.
pub async fn input_dir(path: &Path) -> Result<PathBuf> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(path.to_path_buf()),
        Ok(_) => Err(ConfigError::invalid(format!(
            "Input directory {} is not a directory",
            path.display()
        ))),
        Err(err) if err.kind() == IoErrorKind::NotFound => Err(ConfigError::not_found(format!(
            "Input directory {} does not exist",
            path.display()
        ))),
        Err(err) => Err(ConfigError::invalid(format!(
            "Cannot read input directory {}",
            path.display()
        ))
        .with_cause(Cause::io(&err))),
    }
}

/// Anchors `path` at `base` when relative and removes `.`/`..` lexically.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn scale_above_maximum_is_clamped_with_warning() {
        let mut diagnostics = Vec::new();
        assert_eq!(image_scale(&json!(15), &mut diagnostics).unwrap(), 10.0);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("clamped to 10"));

        let mut diagnostics = Vec::new();
        assert_eq!(image_scale(&json!(2.5), &mut diagnostics).unwrap(), 2.5);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn scale_zero_negative_or_non_numeric_is_invalid() {
        for value in [json!(0), json!(-1), json!("big"), json!(null)] {
            let err = image_scale(&value, &mut Vec::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidValue, "{value}");
        }
    }

    #[test]
    fn parallelism_rules() {
        assert_eq!(parallelism(Some(Parallelism::Flag(true))), 5);
        assert_eq!(parallelism(Some(Parallelism::Flag(false))), 1);
        assert_eq!(parallelism(Some(Parallelism::Degree(-3.0))), 1);
        assert_eq!(parallelism(Some(Parallelism::Degree(0.0))), 1);
        assert_eq!(parallelism(Some(Parallelism::Degree(3.7))), 3);
        assert_eq!(parallelism(None), 5);
    }

    #[test]
    fn timeout_seconds_floor_to_milliseconds() {
        assert_eq!(browser_timeout_ms(1.5).unwrap(), 1500);
        assert_eq!(browser_timeout_ms(0.0004).unwrap(), 0);
        assert_eq!(browser_timeout_ms(-1.0).unwrap_err().kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn jpeg_quality_bounds() {
        assert_eq!(jpeg_quality(0).unwrap(), 0);
        assert_eq!(jpeg_quality(100).unwrap(), 100);
        assert!(jpeg_quality(101).is_err());
        assert!(jpeg_quality(-1).is_err());
    }

    #[test]
    fn browser_selection_filters_lists() {
        assert_eq!(
            browser_selection(OneOrMany::One("auto".into())).unwrap(),
            BrowserSelection::Auto
        );
        assert_eq!(
            browser_selection(OneOrMany::One("firefox".into())).unwrap(),
            BrowserSelection::Preferred(vec![BrowserKind::Firefox])
        );
        assert_eq!(
            browser_selection(OneOrMany::Many(vec!["opera".into(), "edge".into()])).unwrap(),
            BrowserSelection::Preferred(vec![BrowserKind::Edge])
        );

        let err = browser_selection(OneOrMany::One("opera".into())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let err = browser_selection(OneOrMany::Many(vec!["opera".into(), "safari".into()]))
            .unwrap_err();
        assert!(err.to_string().contains("No available browsers"));
    }

    #[test]
    fn protocol_membership() {
        assert_eq!(browser_protocol("cdp").unwrap(), BrowserProtocol::Cdp);
        assert_eq!(browser_protocol("webdriver-bidi").unwrap(), BrowserProtocol::WebDriverBiDi);
        assert!(browser_protocol("marionette").is_err());
    }

    #[tokio::test]
    async fn input_dir_must_exist_and_be_directory() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(input_dir(tmp.path()).await.unwrap(), tmp.path());

        let missing = tmp.path().join("missing");
        assert_eq!(input_dir(&missing).await.unwrap_err().kind(), ErrorKind::NotFound);

        let file = tmp.path().join("deck.md");
        std::fs::write(&file, "# deck").unwrap();
        assert_eq!(input_dir(&file).await.unwrap_err().kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn absolutize_resolves_against_base() {
        let base = Path::new("/work/project");
        assert_eq!(absolutize(base, Path::new("slides")), Path::new("/work/project/slides"));
        assert_eq!(absolutize(base, Path::new("../themes/./a.css")), Path::new("/work/themes/a.css"));
        assert_eq!(absolutize(base, Path::new("/abs/out.pdf")), Path::new("/abs/out.pdf"));
    }
}
