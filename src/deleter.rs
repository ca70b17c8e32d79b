//! The delete collaborator consumed by the cleaner.
//!
//! Workers only ever see `dyn FileDeleter`; which storage actually backs the
//! archive is up to the caller.

use std::fs;
use std::io;
use std::path::Path;

/// Removes one file from the archive.
///
/// `Ok(false)` means nothing was deleted (e.g. the file is already gone).
/// Errors are treated as a failed deletion by the worker and never retried.
pub trait FileDeleter: Send + Sync {
    fn delete(&self, path: &Path) -> io::Result<bool>;
}

impl<F> FileDeleter for F
where
    F: Fn(&Path) -> io::Result<bool> + Send + Sync,
{
    fn delete(&self, path: &Path) -> io::Result<bool> {
        self(path)
    }
}

/// Deletes files on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFsDeleter;

impl LocalFsDeleter {
    pub fn new() -> Self {
        Self
    }
}

impl FileDeleter for LocalFsDeleter {
    fn delete(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
