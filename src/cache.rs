//! On-disk store for search results
//!
//! Each entry is a JSON file named after its key. With a time to live set,
//! an entry whose file was last written longer ago than the TTL reads as
//! absent and is overwritten by the next search.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors of the search result store
#[derive(Debug, Error)]
pub enum CacheError {
    /// The platform has no per-user cache location
    #[error("No cache directory available for this user")]
    NoCacheDirectory,

    #[error("Cannot use cache directory {path}: {source}")]
    Directory { path: PathBuf, source: io::Error },

    /// Reading or writing an entry failed
    #[error("Cannot access cache entry {path}: {source}")]
    Entry { path: PathBuf, source: io::Error },

    /// An entry exists but is not valid JSON for the stored type
    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Keyed JSON store for one kind of value
pub struct CacheStorage<T> {
    cache_dir: PathBuf,
    /// `None` keeps entries forever
    ttl: Option<Duration>,
    _value: PhantomData<T>,
}

impl<T> CacheStorage<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Opens the store `name` in the user's cache directory, creating it if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoCacheDirectory` when the platform has no cache
    /// location and `CacheError::Directory` when it cannot be created.
    pub fn open(name: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let dirs = directories::ProjectDirs::from("org", "subscout", "subscout")
            .ok_or(CacheError::NoCacheDirectory)?;

        Self::open_in(dirs.cache_dir(), name, ttl)
    }

    /// Opens the store `name` below `base_dir`.
    pub fn open_in(base_dir: &Path, name: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let cache_dir = base_dir.join(file_stem(name));
        fs::create_dir_all(&cache_dir).map_err(|source| CacheError::Directory {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self {
            cache_dir,
            ttl,
            _value: PhantomData,
        })
    }

    /// Value stored under `key`, `None` when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Entry` if an existing entry cannot be read and
    /// `CacheError::Corrupt` if it does not decode.
    pub fn load(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.entry_path(key);
        if !path.is_file() || self.is_expired(&path) {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|source| CacheError::Entry {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { path, source })
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn store(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let json = serde_json::to_string_pretty(value)?;

        fs::write(&path, json).map_err(|source| CacheError::Entry { path, source })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut path = self.cache_dir.join(file_stem(key));
        path.set_extension("json");
        path
    }

    fn is_expired(&self, path: &Path) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };

        // unreadable timestamps count as expired
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_none_or(|age| age >= ttl)
    }
}

/// Lowercase `key` with everything but ASCII letters, digits and `-`
/// replaced by `_`.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Simple"), "simple");
        assert_eq!(file_stem("Show.S02E05 720p"), "show_s02e05_720p");
        assert_eq!(file_stem("With-Hyphens"), "with-hyphens");
        assert_eq!(file_stem("eng+fra/zho"), "eng_fra_zho");
        assert_eq!(file_stem("https://subscene.com"), "https___subscene_com");
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Vec<String>> = CacheStorage::open_in(dir.path(), "Searches", None).unwrap();

        assert!(cache.load("missing").unwrap().is_none());

        let data = vec!["a".to_string(), "b".to_string()];
        cache.store("Show.S02E05", &data).unwrap();
        assert_eq!(cache.load("Show.S02E05").unwrap(), Some(data));
        assert!(cache.cache_dir().ends_with("searches"));
        assert!(cache.cache_dir().join("show_s02e05.json").is_file());
    }

    #[test]
    fn test_expired_entries_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<u32> =
            CacheStorage::open_in(dir.path(), "searches", Some(Duration::ZERO)).unwrap();

        cache.store("entry", &7).unwrap();
        assert_eq!(cache.load("entry").unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<u32> = CacheStorage::open_in(dir.path(), "searches", None).unwrap();

        fs::write(cache.cache_dir().join("entry.json"), "not json").unwrap();
        assert!(matches!(cache.load("entry"), Err(CacheError::Corrupt { .. })));
    }
}
