//! Staging of bundled artifacts into the process-local cache directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dsr_core::EngineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Marker written once preparation completes.
pub const PREPARED_MARKER: &str = ".prepared";

/// A bundled artifact directory required at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    /// Per-page render data.
    Data,
    /// Render entry points and document template.
    PageSsr,
    /// Page index.
    QueryEngine,
}

impl Subsystem {
    /// Every subsystem, in staging order.
    pub const ALL: [Subsystem; 3] = [Self::Data, Self::PageSsr, Self::QueryEngine];

    /// Directory name under the source and cache roots.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::PageSsr => "page-ssr",
            Self::QueryEngine => "query-engine",
        }
    }
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Outcome of a preparation run.
#[derive(Debug, Clone, Serialize)]
pub struct PrepareReport {
    /// Cache root the subsystems were staged into.
    pub cache_dir: PathBuf,
    /// Subsystems copied by this run.
    pub staged: Vec<Subsystem>,
    /// Subsystems that were already in place.
    pub already_present: Vec<Subsystem>,
    /// When preparation finished.
    pub prepared_at: DateTime<Utc>,
}

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stage `subsystems` from `source` into `cache`.
///
/// Each subsystem is copied into a temporary sibling and renamed into place,
/// so a concurrent process never sees a partially copied directory. Already
/// staged subsystems are left untouched.
pub fn prepare_filesystem(
    source: &Path,
    cache: &Path,
    subsystems: &[Subsystem],
) -> Result<PrepareReport, EngineError> {
    fs::create_dir_all(cache).map_err(|e| EngineError::io(cache, e))?;

    let mut staged = Vec::new();
    let mut already_present = Vec::new();

    for &subsystem in subsystems {
        let target = cache.join(subsystem.dir_name());
        if target.exists() {
            debug!(subsystem = %subsystem, "subsystem already staged");
            already_present.push(subsystem);
            continue;
        }

        let origin = source.join(subsystem.dir_name());
        if !origin.is_dir() {
            return Err(EngineError::MissingSubsystem(subsystem.to_string()));
        }

        let staging = cache.join(format!(
            ".{}.tmp-{}-{}",
            subsystem.dir_name(),
            std::process::id(),
            STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = copy_dir_recursive(&origin, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        match fs::rename(&staging, &target) {
            Ok(()) => {
                debug!(subsystem = %subsystem, target = %target.display(), "subsystem staged");
                staged.push(subsystem);
            }
            Err(_) if target.exists() => {
                // Lost the race to another preparer.
                let _ = fs::remove_dir_all(&staging);
                already_present.push(subsystem);
            }
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(EngineError::io(&target, e));
            }
        }
    }

    let prepared_at = Utc::now();
    let marker = cache.join(PREPARED_MARKER);
    fs::write(&marker, prepared_at.to_rfc3339()).map_err(|e| EngineError::io(&marker, e))?;

    info!(
        cache_dir = %cache.display(),
        staged = staged.len(),
        already_present = already_present.len(),
        "filesystem prepared"
    );

    Ok(PrepareReport {
        cache_dir: cache.to_path_buf(),
        staged,
        already_present,
        prepared_at,
    })
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(to).map_err(|e| EngineError::io(to, e))?;

    let entries = fs::read_dir(from).map_err(|e| EngineError::io(from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::io(from, e))?;
        let path = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| EngineError::io(&path, e))?;

        if file_type.is_dir() {
            copy_dir_recursive(&path, &dest)?;
        } else {
            fs::copy(&path, &dest).map_err(|e| EngineError::io(&path, e))?;
        }
    }

    Ok(())
}
