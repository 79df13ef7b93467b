use std::path::{Path, PathBuf};

use anyhow::Context;
use bikeshare_core::catalog::Catalog;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map one of the `--log-level` names (`WARNING`, `CRITICAL`, ...) onto a
/// tracing level directive. Anything else falls back to `info`.
fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::new(filter_directive(log_level));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("logging was already initialised")?;

    Ok(())
}

// ── Data-dir discovery ─────────────────────────────────────────────────────────

/// Locate the directory holding the per-city trip files.
///
/// Checks in order and returns the first that applies:
/// 1. `explicit` (`--data-dir` or `$BIKESHARE_DATA_DIR`), used as given
/// 2. `./data`
/// 3. `~/.bikeshare/data`
///
/// Falls back to the current directory.
pub fn discover_data_dir(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let home = dirs::home_dir();
    discover_from(explicit, &cwd, home.as_deref())
}

fn discover_from(explicit: Option<&Path>, cwd: &Path, home: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    let mut candidates = vec![cwd.join("data")];
    if let Some(home) = home {
        candidates.push(home.join(".bikeshare").join("data"));
    }

    match candidates.into_iter().find(|p| p.is_dir()) {
        Some(found) => {
            debug!("Discovered data directory {}", found.display());
            found
        }
        None => cwd.to_path_buf(),
    }
}

// ── Catalog ────────────────────────────────────────────────────────────────────

/// The catalog from `--catalog-dir`, or the built-in tables.
pub fn load_catalog(catalog_dir: Option<&Path>) -> anyhow::Result<Catalog> {
    match catalog_dir {
        Some(dir) => Catalog::from_dir(dir)
            .with_context(|| format!("failed to load catalog from {}", dir.display())),
        None => Ok(Catalog::builtin()),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
