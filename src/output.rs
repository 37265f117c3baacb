//! Output tree materialization.
//!
//! Rendered files are written into a staging directory next to the output
//! root and swapped in with directory renames. A failed compilation never
//! leaves a half-written tree, and stale files from a previous run cannot
//! survive a rerun.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::emit::RenderedFile;
use crate::error::{Error, Result};

/// Write all rendered files under `output_dir`, replacing any previous tree.
pub fn write_output(output_dir: &Path, files: &[RenderedFile]) -> Result<()> {
    let parent = match output_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|e| Error::io(parent, e))?;

    for file in files {
        let target = staging.path().join(&file.path);
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        fs::write(&target, &file.content).map_err(|e| Error::io(&target, e))?;
    }

    let staging_path = staging.keep();
    let backup = parent.join(".previous-output");
    if backup.exists() {
        fs::remove_dir_all(&backup).map_err(|e| Error::io(&backup, e))?;
    }
    let had_previous = output_dir.exists();
    if had_previous {
        fs::rename(output_dir, &backup).map_err(|e| Error::io(output_dir, e))?;
    }
    if let Err(e) = fs::rename(&staging_path, output_dir) {
        if had_previous {
            // Try to put the previous tree back before reporting.
            let _ = fs::rename(&backup, output_dir);
        }
        return Err(Error::io(output_dir, e));
    }
    if had_previous {
        fs::remove_dir_all(&backup).map_err(|e| Error::io(&backup, e))?;
    }

    info!(files = files.len(), output = %output_dir.display(), "output written");
    Ok(())
}
