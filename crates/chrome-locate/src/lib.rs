//! # chrome-locate
//!
//! Find a local Chrome or Chromium executable so a headless browser can be
//! launched for HTML → PDF printing, without asking users to pass a path on
//! every invocation.
//!
//! ## How it works
//!
//! On the first call to [`find_chrome`]:
//!
//! 1. `CHROME_PATH` is honoured if set. If it points at nothing the call fails
//!    instead of silently picking a different browser.
//! 2. Well-known per-platform install locations are checked (with `~`
//!    expanded to the user's home directory).
//! 3. Every directory on `PATH` is scanned for the usual binary names
//!    (`google-chrome`, `chromium`, `chromium-browser`, `chrome`).
//!
//! The resolved path is memoised for the rest of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! let chrome = chrome_locate::find_chrome().expect("no Chrome installed");
//! println!("printing with {}", chrome.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `CHROME_PATH` — path to an existing Chrome/Chromium executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides executable discovery.
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

/// Binary names probed on `PATH`, in preference order.
pub const BINARY_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate operations.
#[derive(Error, Debug)]
pub enum ChromeLocateError {
    /// `CHROME_PATH` is set but does not name an existing file.
    #[error("{var} points to '{path}', which does not exist")]
    EnvPathMissing { var: &'static str, path: PathBuf },

    /// Nothing was found in the install locations or on `PATH`.
    #[error(
        "No Chrome/Chromium executable found.\n\
Install Google Chrome or Chromium, or set {CHROME_PATH_ENV}=/path/to/chrome."
    )]
    NotFound,
}

// ── Internal: platform metadata ──────────────────────────────────────────────

/// Install locations for the current platform. Entries starting with `~/` are
/// relative to the home directory.
fn platform_candidates() -> &'static [&'static str] {
    match std::env::consts::OS {
        "macos" => &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ],
        "windows" => &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ],
        _ => &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ],
    }
}

fn expand_home(candidate: &str) -> Option<PathBuf> {
    match candidate.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(candidate)),
    }
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the path to a Chrome/Chromium executable.
///
/// # Thread safety
///
/// Safe to call from multiple threads; discovery runs at most a handful of
/// times and the first result wins.
pub fn find_chrome() -> Result<PathBuf, ChromeLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve(
        std::env::var_os(CHROME_PATH_ENV),
        std::env::var_os("PATH"),
    )?;

    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` if [`find_chrome`] would succeed.
pub fn is_chrome_available() -> bool {
    find_chrome().is_ok()
}

/// Scans the directories of a `PATH`-style value for the first known binary.
pub fn search_path(path_var: &OsString) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        BINARY_NAMES.iter().find_map(|name| {
            let candidate = dir.join(executable_name(name));
            is_executable_file(&candidate).then_some(candidate)
        })
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve(
    env_override: Option<OsString>,
    path_var: Option<OsString>,
) -> Result<PathBuf, ChromeLocateError> {
    // 1. Environment variable override.
    if let Some(raw) = env_override.filter(|v| !v.is_empty()) {
        let p = PathBuf::from(raw);
        if p.exists() {
            return Ok(p);
        }
        return Err(ChromeLocateError::EnvPathMissing {
            var: CHROME_PATH_ENV,
            path: p,
        });
    }

    // 2. Well-known install locations.
    if let Some(p) = platform_candidates()
        .iter()
        .filter_map(|c| expand_home(c))
        .find(|p| is_executable_file(p))
    {
        return Ok(p);
    }

    // 3. PATH scan.
    path_var
        .as_ref()
        .and_then(search_path)
        .ok_or(ChromeLocateError::NotFound)
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
