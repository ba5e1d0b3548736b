//! Configuration types for both conversion pipelines.
//!
//! HTML → Markdown has a single knob, so [`Html2MdConfig`] is a plain struct
//! with a [`Default`]. Markdown → PDF carries browser and page settings and is
//! built through [`PdfConfigBuilder`], which validates before handing out a
//! [`PdfConfig`].

use crate::error::MdPressError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata keys every Markdown document must carry before it can be printed.
pub const REQUIRED_FIELDS: &[&str] = &["title", "version", "date_modified", "pdf_filename"];

/// Configuration for HTML → Markdown conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Html2MdConfig {
    /// Directory prefix written into every rewritten `<img src>`. Default: `images`.
    pub image_dir: String,
}

impl Default for Html2MdConfig {
    fn default() -> Self {
        Self {
            image_dir: "images".to_string(),
        }
    }
}

/// Configuration for Markdown → PDF conversion.
///
/// # Example
/// ```rust
/// use mdpress::{PageFormat, PdfConfig};
///
/// let config = PdfConfig::builder()
///     .page_format(PageFormat::A4)
///     .timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Chrome/Chromium executable. If None, discovered via `chrome-locate`.
    pub chrome_executable: Option<PathBuf>,

    /// Directory that relative resources (images, stylesheets) and the output
    /// `pdf_filename` resolve against. If None, the current working directory.
    pub base_dir: Option<PathBuf>,

    /// Metadata keys that must be present and non-empty. Default: [`REQUIRED_FIELDS`].
    pub required_fields: Vec<String>,

    /// Paper size. Default: [`PageFormat::Css`].
    pub page_format: PageFormat,

    /// Landscape orientation. Default: false.
    pub landscape: bool,

    /// Print CSS backgrounds. Default: true.
    pub print_background: bool,

    /// Upper bound on browser launch + load + print, in seconds. Default: 60.
    pub timeout_secs: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            base_dir: None,
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            page_format: PageFormat::default(),
            landscape: false,
            print_background: true,
            timeout_secs: 60,
        }
    }
}

impl PdfConfig {
    /// Create a new builder for `PdfConfig`.
    pub fn builder() -> PdfConfigBuilder {
        PdfConfigBuilder {
            config: Self::default(),
        }
    }

    /// The directory relative paths resolve against.
    pub fn resolve_base_dir(&self) -> Result<PathBuf, MdPressError> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir()
                .map_err(|e| MdPressError::Internal(format!("current directory: {e}"))),
        }
    }
}

/// Builder for [`PdfConfig`].
#[derive(Debug)]
pub struct PdfConfigBuilder {
    config: PdfConfig,
}

impl PdfConfigBuilder {
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = Some(dir.into());
        self
    }

    pub fn required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.config.page_format = format;
        self
    }

    pub fn landscape(mut self, v: bool) -> Self {
        self.config.landscape = v;
        self
    }

    pub fn print_background(mut self, v: bool) -> Self {
        self.config.print_background = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PdfConfig, MdPressError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(MdPressError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if !c.required_fields.iter().any(|f| f == "pdf_filename") {
            return Err(MdPressError::InvalidConfig(
                "required fields must include 'pdf_filename' (it names the output file)".into(),
            ));
        }
        if let Some(dir) = &c.base_dir {
            if !dir.is_dir() {
                return Err(MdPressError::InvalidConfig(format!(
                    "base directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size used when printing.
///
/// `Css` defers to the template's `@page { size: … }` rule, which is how a
/// template controls margins and page numbering. The fixed sizes override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    /// Use the template's `@page` size; Chrome falls back to Letter. (default)
    #[default]
    Css,
    /// ISO A4, 210 × 297 mm.
    A4,
    /// US Letter, 8.5 × 11 in.
    Letter,
}

impl PageFormat {
    /// Paper (width, height) in inches, or None to honour the CSS page size.
    pub fn dimensions_in(&self) -> Option<(f64, f64)> {
        match self {
            PageFormat::Css => None,
            PageFormat::A4 => Some((8.27, 11.69)),
            PageFormat::Letter => Some((8.5, 11.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PdfConfig::default();
        assert_eq!(c.required_fields, REQUIRED_FIELDS);
        assert_eq!(c.page_format, PageFormat::Css);
        assert!(c.print_background);
        assert_eq!(Html2MdConfig::default().image_dir, "images");
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = PdfConfig::builder().timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, MdPressError::InvalidConfig(_)));
    }

    #[test]
    fn required_fields_must_name_output() {
        assert!(PdfConfig::builder()
            .required_fields(["title"])
            .build()
            .is_err());
        let c = PdfConfig::builder()
            .required_fields(["title", "pdf_filename"])
            .build()
            .unwrap();
        assert_eq!(c.required_fields, vec!["title", "pdf_filename"]);
    }

    #[test]
    fn missing_base_dir_rejected() {
        assert!(PdfConfig::builder()
            .base_dir("/definitely/not/a/dir")
            .build()
            .is_err());
    }

    #[test]
    fn page_format_dimensions() {
        assert_eq!(PageFormat::Css.dimensions_in(), None);
        assert_eq!(PageFormat::Letter.dimensions_in(), Some((8.5, 11.0)));
    }
}
