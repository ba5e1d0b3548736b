//! PDF printing: rendered HTML page → PDF via headless Chrome.
//!
//! ## Why a file:// page?
//!
//! Templates and documents reference images and stylesheets by relative
//! path. The page is written to a temporary `.html` file and carries a
//! `<base href>` pointing at the base directory, so Chrome resolves those
//! paths exactly as a browser opening the project folder would.
//!
//! ## Lifecycle
//!
//! Each call launches one browser with a throwaway profile directory, prints
//! one page, and closes the browser. The whole launch → load → print sequence
//! runs under a single `tokio::time::timeout`; if it expires, the browser is
//! dropped (which kills the child process) and nothing is written.

use crate::config::PdfConfig;
use crate::error::MdPressError;
use crate::output::PdfOutput;
use crate::pipeline::input::write_atomic;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use url::Url;

static RE_BASE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<base[\s>/]").unwrap());
static RE_HEAD_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").unwrap());

/// Insert `<base href="file:///…/">` for `base_dir` right after `<head>`.
///
/// A template that already declares a `<base>` is left alone. A page without a
/// `<head>` gets the tag prepended, which every browser accepts.
pub fn inject_base_href(html: &str, base_dir: &Path) -> Result<String, MdPressError> {
    if RE_BASE_TAG.is_match(html) {
        return Ok(html.to_string());
    }

    let dir = std::path::absolute(base_dir)
        .map_err(|e| MdPressError::Internal(format!("resolve '{}': {e}", base_dir.display())))?;
    let href = Url::from_directory_path(&dir).map_err(|()| {
        MdPressError::Internal(format!("'{}' cannot be expressed as a file URL", dir.display()))
    })?;
    let tag = format!("<base href=\"{}\">", html_escape::encode_double_quoted_attribute(href.as_str()));

    Ok(match RE_HEAD_OPEN.find(html) {
        Some(m) => format!("{}{}{}", &html[..m.end()], tag, &html[m.end()..]),
        None => format!("{tag}{html}"),
    })
}

/// Print `html` to a PDF at `output`.
pub async fn render_pdf(
    html: &str,
    config: &PdfConfig,
    output: &Path,
) -> Result<PdfOutput, MdPressError> {
    let start = Instant::now();
    let base_dir = config.resolve_base_dir()?;
    let page_html = inject_base_href(html, &base_dir)?;

    let chrome = match &config.chrome_executable {
        Some(path) => path.clone(),
        None => chrome_locate::find_chrome()?,
    };
    debug!("Using browser at {}", chrome.display());

    let mut page_file = tempfile::Builder::new()
        .prefix("md2pdf-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| MdPressError::Internal(format!("create temp page: {e}")))?;
    page_file
        .write_all(page_html.as_bytes())
        .and_then(|()| page_file.flush())
        .map_err(|e| MdPressError::Internal(format!("write temp page: {e}")))?;
    let url = Url::from_file_path(page_file.path()).map_err(|()| {
        MdPressError::Internal(format!("'{}' is not an absolute path", page_file.path().display()))
    })?;

    let secs = config.timeout_secs;
    let pdf = tokio::time::timeout(
        Duration::from_secs(secs),
        print_with_chrome(&chrome, url.as_str(), config),
    )
    .await
    .map_err(|_| MdPressError::PdfTimeout { secs })??;

    write_atomic(output, &pdf)?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Printed {} ({} bytes) in {}ms",
        output.display(),
        pdf.len(),
        duration_ms
    );

    Ok(PdfOutput {
        path: output.to_path_buf(),
        bytes: pdf.len(),
        duration_ms,
    })
}

fn render_failed(detail: impl Into<String>) -> MdPressError {
    MdPressError::PdfRenderFailed {
        detail: detail.into(),
    }
}

/// Launch a browser, print the page at `url`, and shut the browser down.
async fn print_with_chrome(
    chrome: &Path,
    url: &str,
    config: &PdfConfig,
) -> Result<Vec<u8>, MdPressError> {
    let profile = tempfile::Builder::new()
        .prefix("md2pdf-profile-")
        .tempdir()
        .map_err(|e| MdPressError::Internal(format!("create browser profile dir: {e}")))?;

    let browser_config = BrowserConfig::builder()
        .chrome_executable(chrome)
        .user_data_dir(profile.path())
        .request_timeout(Duration::from_secs(config.timeout_secs))
        .arg("--no-sandbox")
        .arg("--disable-gpu")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--allow-file-access-from-files")
        .build()
        .map_err(|e| render_failed(format!("invalid browser configuration: {e}")))?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| render_failed(format!("could not launch '{}': {e}", chrome.display())))?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                // Unrecognised CDP events surface here and are harmless.
                trace!("Browser handler: {e}");
            }
        }
    });

    let result = print_page(&browser, url, config).await;

    if let Err(e) = browser.close().await {
        warn!("Failed to close browser: {e}");
    }
    if let Err(e) = browser.wait().await {
        warn!("Failed to wait for browser exit: {e}");
    }
    handler_task.abort();

    result
}

async fn print_page(browser: &Browser, url: &str, config: &PdfConfig) -> Result<Vec<u8>, MdPressError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| render_failed(format!("could not open page: {e}")))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| render_failed(format!("page did not finish loading: {e}")))?;

    let params = print_params(config);
    debug!("Printing with {:?}", params);
    page.pdf(params)
        .await
        .map_err(|e| render_failed(format!("print failed: {e}")))
}

/// CDP print parameters for the configured paper and background settings.
fn print_params(config: &PdfConfig) -> PrintToPdfParams {
    let (paper_width, paper_height) = match config.page_format.dimensions_in() {
        Some((w, h)) => (Some(w), Some(h)),
        None => (None, None),
    };
    PrintToPdfParams {
        landscape: Some(config.landscape),
        print_background: Some(config.print_background),
        prefer_css_page_size: Some(paper_width.is_none()),
        paper_width,
        paper_height,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageFormat;

    #[test]
    fn base_href_after_head() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<html><head><title>t</title></head><body></body></html>";
        let out = inject_base_href(html, dir.path()).unwrap();
        let expected = Url::from_directory_path(dir.path()).unwrap();
        assert!(
            out.starts_with(&format!("<html><head><base href=\"{expected}\"><title>")),
            "got: {out}"
        );
        assert!(expected.as_str().ends_with('/'));
    }

    #[test]
    fn base_href_with_head_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let out = inject_base_href("<HEAD lang=\"en\"><header>x</header>", dir.path()).unwrap();
        assert!(out.starts_with("<HEAD lang=\"en\"><base href=\"file://"));
        assert!(out.ends_with("<header>x</header>"));
    }

    #[test]
    fn base_href_without_head_is_prepended() {
        let dir = tempfile::tempdir().unwrap();
        let out = inject_base_href("<header>x</header><p>body</p>", dir.path()).unwrap();
        assert!(out.starts_with("<base href=\"file://"));
        assert!(out.ends_with("<header>x</header><p>body</p>"));
    }

    #[test]
    fn existing_base_is_kept() {
        let html = "<head><base href=\"https://cdn.example.org/\"></head>";
        let out = inject_base_href(html, Path::new("/tmp")).unwrap();
        assert_eq!(out, html);
    }

    #[test]
    fn print_params_css_size() {
        let p = print_params(&PdfConfig::default());
        assert_eq!(p.prefer_css_page_size, Some(true));
        assert_eq!(p.print_background, Some(true));
        assert_eq!(p.paper_width, None);
    }

    #[test]
    fn print_params_fixed_size() {
        let config = PdfConfig::builder()
            .page_format(PageFormat::A4)
            .landscape(true)
            .print_background(false)
            .build()
            .unwrap();
        let p = print_params(&config);
        assert_eq!(p.prefer_css_page_size, Some(false));
        assert_eq!(p.paper_width, Some(8.27));
        assert_eq!(p.paper_height, Some(11.69));
        assert_eq!(p.landscape, Some(true));
        assert_eq!(p.print_background, Some(false));
    }

    #[tokio::test]
    async fn missing_chrome_executable_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let config = PdfConfig::builder()
            .chrome_executable(dir.path().join("no-such-chrome"))
            .base_dir(dir.path())
            .timeout_secs(10)
            .build()
            .unwrap();
        let err = render_pdf("<html><body>x</body></html>", &config, &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MdPressError::PdfRenderFailed { .. }), "got: {err}");
        assert!(!output.exists());
    }
}
