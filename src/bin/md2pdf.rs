//! CLI binary: Markdown with YAML frontmatter → PDF.
//!
//! A thin shim over the library crate that maps CLI flags to `PdfConfig`,
//! shows a spinner while Chrome prints, and reports the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mdpress::{convert_markdown_to_html, convert_markdown_to_pdf, inspect, PageFormat, PdfConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print input.md through template.html; the PDF name comes from pdf_filename
  md2pdf template.html input.md

  # Force A4 landscape, allow slow pages
  md2pdf --format a4 --landscape --timeout 120 template.html input.md

  # Check the frontmatter without printing
  md2pdf --inspect-only template.html input.md

  # Write the rendered HTML page to debug the template
  md2pdf --html-only page.html template.html input.md

INPUT FORMAT:
  ---
  title: Release notes
  version: 1.0
  date_modified: 2024-12-04
  pdf_filename: release-notes.pdf
  ---
  # Release notes
  ...

  All four keys are required and must be non-empty. The body must contain
  at least one heading.

TEMPLATE VARIABLES:
  {{ content }}   Rendered body HTML (headings carry id attributes)
  {{ toc }}       <div class="toc"> list linking every heading
  {{ title }} …   Every frontmatter key

ENVIRONMENT VARIABLES:
  CHROME_PATH          Chrome/Chromium executable (skips discovery)
  MDPRESS_CHROME       Same as --chrome
  MDPRESS_BASE_DIR     Same as --base-dir
  MDPRESS_TIMEOUT      Same as --timeout
  RUST_LOG             Log filter (overrides -v / -q)
"#;

/// Convert a Markdown file with YAML frontmatter to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert a YAML-frontmatter Markdown file to PDF through an HTML template",
    long_about = "Parse a Markdown file's YAML frontmatter, check the required metadata, render \
the body to HTML with a linked table of contents, apply a Jinja-style HTML/CSS template and print \
a paginated PDF with headless Chrome.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTML/CSS template file.
    template: PathBuf,

    /// Markdown file with YAML frontmatter.
    markdown: PathBuf,

    /// Chrome/Chromium executable. Discovered automatically if not set.
    #[arg(long, env = "MDPRESS_CHROME")]
    chrome: Option<PathBuf>,

    /// Directory for relative image paths and the output PDF. Default: current directory.
    #[arg(long, env = "MDPRESS_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Paper size; `css` honours the template's @page rule.
    #[arg(long, env = "MDPRESS_FORMAT", value_enum, default_value = "css")]
    format: FormatArg,

    /// Landscape orientation.
    #[arg(long, env = "MDPRESS_LANDSCAPE")]
    landscape: bool,

    /// Do not print CSS backgrounds.
    #[arg(long, env = "MDPRESS_NO_BACKGROUND")]
    no_background: bool,

    /// Seconds allowed for launching Chrome and printing.
    #[arg(long, env = "MDPRESS_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Write the rendered HTML page here and stop (no PDF).
    #[arg(long, env = "MDPRESS_HTML_ONLY", conflicts_with = "inspect_only")]
    html_only: Option<PathBuf>,

    /// Print the frontmatter and check results as JSON and stop.
    #[arg(long)]
    inspect_only: bool,

    /// Show debug logs.
    #[arg(short, long, env = "MDPRESS_VERBOSE")]
    verbose: bool,

    /// Print nothing but errors.
    #[arg(short, long, env = "MDPRESS_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Css,
    A4,
    Letter,
}

impl From<FormatArg> for PageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Css => PageFormat::Css,
            FormatArg::A4 => PageFormat::A4,
            FormatArg::Letter => PageFormat::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback while printing; INFO logs would tear it.
    let printing = !cli.inspect_only && cli.html_only.is_none();
    let show_spinner = printing && !cli.quiet && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.markdown, &config)
            .with_context(|| format!("Failed to inspect {}", cli.markdown.display()))?;
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialise metadata")?
        );
        return Ok(());
    }

    // ── HTML-only mode ───────────────────────────────────────────────────
    if let Some(html_path) = &cli.html_only {
        let written = convert_markdown_to_html(&cli.template, &cli.markdown, html_path, &config)
            .with_context(|| format!("Failed to render {}", cli.markdown.display()))?;
        if !cli.quiet {
            eprintln!("{} HTML written to {}", green("✓"), bold(&written.display().to_string()));
        }
        return Ok(());
    }

    // ── Print ────────────────────────────────────────────────────────────
    let spinner = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Printing");
        bar.set_message(cli.markdown.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = convert_markdown_to_pdf(&cli.template, &cli.markdown, &config).await;
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }

    match result {
        Ok(output) => {
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✓"),
                    bold(&output.path.display().to_string()),
                    dim(&format!(
                        "{:.1} KB in {}ms",
                        output.bytes as f64 / 1024.0,
                        output.duration_ms
                    )),
                );
            }
            Ok(())
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("{} {}", red("✗"), cli.markdown.display());
            }
            Err(e).with_context(|| format!("Failed to convert {}", cli.markdown.display()))
        }
    }
}

/// Map CLI args to `PdfConfig`.
fn build_config(cli: &Cli) -> Result<PdfConfig> {
    let mut builder = PdfConfig::builder()
        .page_format(cli.format.clone().into())
        .landscape(cli.landscape)
        .print_background(!cli.no_background)
        .timeout_secs(cli.timeout);

    if let Some(chrome) = &cli.chrome {
        builder = builder.chrome_executable(chrome);
    }
    if let Some(dir) = &cli.base_dir {
        builder = builder.base_dir(dir);
    }

    builder.build().context("Invalid configuration")
}
