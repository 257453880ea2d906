//! Installer
//!
//! Links the SecondBrain executables into the local bin directory and makes
//! sure the shell rc file puts that directory on `PATH`. Running it again is
//! a no-op: correct links are left alone and the `PATH` line is never
//! duplicated.

#![allow(clippy::result_large_err)]

use sb_core::errors::SecondBrainError;
use sb_core::{log_op_end, log_op_error, log_op_start, Settings};
use sb_store::errors::{io_error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Executables are linked when their name starts with this
pub const DEFAULT_PREFIX: &str = "sb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Directory holding the executables to link
    pub source_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub rc_file: PathBuf,
    pub prefix: String,
    /// Exact line the rc file must contain
    pub path_line: String,
}

impl InstallPlan {
    pub fn from_settings(settings: &Settings, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            bin_dir: settings.bin_dir.clone(),
            rc_file: settings.rc_file.clone(),
            prefix: DEFAULT_PREFIX.to_string(),
            path_line: path_line(&settings.home, &settings.bin_dir),
        }
    }
}

/// `export PATH=...` line for `bin_dir`, spelled with `$HOME` when under it
pub fn path_line(home: &Path, bin_dir: &Path) -> String {
    let dir = match bin_dir.strip_prefix(home) {
        Ok(rel) => format!("$HOME/{}", rel.display()),
        Err(_) => bin_dir.display().to_string(),
    };
    format!("export PATH=\"{}:$PATH\"", dir)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Links created or repointed
    pub linked: Vec<PathBuf>,
    /// Links already pointing at the right file
    pub unchanged: Vec<PathBuf>,
    pub rc_updated: bool,
}

/// Apply an install plan
pub fn install(plan: &InstallPlan) -> Result<InstallReport> {
    log_op_start!(
        "install",
        source_dir = %plan.source_dir.display(),
        bin_dir = %plan.bin_dir.display()
    );
    let start = std::time::Instant::now();

    match install_impl(plan) {
        Ok(report) => {
            log_op_end!(
                "install",
                duration_ms = start.elapsed().as_millis() as u64,
                linked = report.linked.len(),
                unchanged = report.unchanged.len(),
                rc_updated = report.rc_updated
            );
            Ok(report)
        }
        Err(e) => {
            log_op_error!(
                "install",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(e)
        }
    }
}

fn install_impl(plan: &InstallPlan) -> Result<InstallReport> {
    let mut report = InstallReport::default();

    fs::create_dir_all(&plan.bin_dir).map_err(|e| io_error("create_bin_dir", e))?;

    for source in executables(&plan.source_dir, &plan.prefix)? {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = plan.bin_dir.join(name);
        if ensure_link(&source, &target)? {
            report.linked.push(target);
        } else {
            report.unchanged.push(target);
        }
    }

    report.rc_updated = ensure_line(&plan.rc_file, &plan.path_line)?;
    Ok(report)
}

/// Absolute paths of the files to link, sorted by name
fn executables(source_dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let source_dir = fs::canonicalize(source_dir).map_err(|e| io_error("read_source_dir", e))?;
    let entries = fs::read_dir(&source_dir).map_err(|e| io_error("read_source_dir", e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error("read_source_dir", e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with('.') || !name.starts_with(prefix) {
            continue;
        }
        let path = source_dir.join(name);
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Make `target` a symlink to `source`; returns whether anything changed
fn ensure_link(source: &Path, target: &Path) -> Result<bool> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let current = fs::read_link(target).map_err(|e| io_error("read_link", e))?;
            if current == source {
                return Ok(false);
            }
            fs::remove_file(target).map_err(|e| io_error("remove_stale_link", e))?;
        }
        Ok(_) => {
            return Err(SecondBrainError::InstallTargetOccupied {
                path: target.display().to_string(),
            }
            .into());
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_error("stat_link", e)),
    }

    symlink(source, target).map_err(|e| io_error("create_link", e))?;
    tracing::debug!(source = %source.display(), target = %target.display(), "linked");
    Ok(true)
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(not(unix))]
fn symlink(_source: &Path, _target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        ErrorKind::Unsupported,
        "symlink install is only supported on unix",
    ))
}

/// Append `line` to `file` unless a line equal to it (ignoring surrounding
/// whitespace) is already there; returns whether the file was written
fn ensure_line(file: &Path, line: &str) -> Result<bool> {
    let existing = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_error("read_rc_file", e)),
    };

    if existing.lines().any(|l| l.trim() == line.trim()) {
        return Ok(false);
    }

    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(|e| io_error("open_rc_file", e))?;
    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    writeln!(f, "{}{}", separator, line).map_err(|e| io_error("write_rc_file", e))?;
    Ok(true)
}
