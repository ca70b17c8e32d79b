//! Enumerate archive files into deletion candidates.

use std::fs;
use std::path::Path;

use crate::cleaner::FileRef;
use crate::error::Result;

/// Collect every regular file under `dir` matching the glob `pattern`.
///
/// Entries that vanish or cannot be read while walking are skipped with a
/// warning. A missing or unreadable `dir` and a bad pattern are errors.
pub fn collect_files(dir: &Path, pattern: &str) -> Result<Vec<FileRef>> {
    fs::read_dir(dir)?;
    let full_pattern = dir.join(pattern);
    let mut files = Vec::new();

    for entry in glob::glob(&full_pattern.to_string_lossy())? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Skipping unreadable entry {}: {}", e.path().display(), e.error());
                continue;
            }
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(FileRef::new(path, meta.len())),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    log::debug!("Found {} files under {}", files.len(), dir.display());
    Ok(files)
}
