//! CLI binary: HTML → Markdown.
//!
//! A thin shim over [`mdpress::convert_html_file`] that maps flags to
//! `Html2MdConfig` and reports where the Markdown was written.

use anyhow::{Context, Result};
use clap::Parser;
use mdpress::{convert_html_file, Html2MdConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert an exported document; writes export.md next to it
  html2md export.html

  # Write somewhere else
  html2md export.html -o docs/guide.md

  # Reference images from a different folder
  html2md --image-dir assets/img export.html

WHAT IS CHANGED:
  <img src="Export_files/a/photo.png">      →  ![](images/photo.png)
  <a href="https://google.com/url?q=URL&…">  →  [text](URL)
  <p>soft\nwrapped</p>                      →  soft wrapped
  # Heading                                 →  ## Heading
  Word[link](url)                           →  Word [link](url)

ENVIRONMENT VARIABLES:
  MDPRESS_IMAGE_DIR   Default for --image-dir
  RUST_LOG            Log filter (overrides -v / -q)
"#;

/// Convert an HTML file to clean Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "html2md",
    version,
    about = "Convert an HTML file to Markdown",
    long_about = "Convert an exported HTML document to Markdown: image paths are rewritten to a \
local folder, redirect-wrapped links are unwrapped, soft line breaks inside paragraphs are \
joined, and every heading is demoted one level.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTML file to convert.
    input: PathBuf,

    /// Write Markdown here instead of <input>.md.
    #[arg(short, long, env = "MDPRESS_OUTPUT")]
    output: Option<PathBuf>,

    /// Folder prefix for rewritten image sources.
    #[arg(long, env = "MDPRESS_IMAGE_DIR", default_value = "images")]
    image_dir: String,

    /// Show debug logs.
    #[arg(short, long, env = "MDPRESS_VERBOSE")]
    verbose: bool,

    /// Print nothing but errors.
    #[arg(short, long, env = "MDPRESS_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Html2MdConfig {
        image_dir: cli.image_dir.clone(),
    };
    let written = convert_html_file(&cli.input, cli.output.as_deref(), &config)
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    if !cli.quiet {
        println!("Markdown file created at: {}", written.display());
    }
    Ok(())
}
