//! Filesystem utilities.
//!
//! Crash-tolerant file writes for artifacts this crate owns (settings file,
//! export artifacts). A partial write must never be left looking like a
//! complete file, so all writes go through a sibling temp file followed by a
//! rename.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::CoreResult;

/// Write bytes to `path` using a temp-file-and-rename replace pattern.
///
/// The parent directory is created if missing. On any failure after the temp
/// file was created, the temp file is removed before the error is returned.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    let write_result: std::io::Result<()> = (|| {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Write a value as pretty-printed JSON atomically.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

/// Returns the sibling temp path for an atomic write of `path`.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tmp".to_string());
    tmp.set_file_name(format!(".{file_name}.tmp"));
    tmp
}

// =============================================================================
// Tests
// =============================================================================
