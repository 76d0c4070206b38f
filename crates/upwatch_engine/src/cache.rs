use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory missing or not writable: {0}")]
    Dir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the cache directory exists; create if missing. Idempotent.
pub fn ensure_cache_dir(dir: &Path) -> Result<(), CacheError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| CacheError::Dir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(CacheError::Dir(format!("{} is not a directory", dir.display())));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| CacheError::Dir(e.to_string()))?;
    }
    Ok(())
}

/// File name for a cached url: `://` and `/` become `_`, as do characters
/// that are not allowed in file names.
pub fn cache_key(url: &str) -> String {
    url.replace("://", "_")
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

/// Raw page bodies keyed by url, one file each. Entries are never
/// invalidated; replaying stale pages is the point.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    /// `Ok(None)` on a miss.
    pub fn read(&self, url: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(url)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Atomically store `bytes` for `url` by writing a temp file then renaming.
    pub fn write(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        ensure_cache_dir(&self.dir)?;

        let target = self.path_for(url);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| CacheError::Io(e.error))?;
        Ok(target)
    }
}
