//! Disk-backed store
//!
//! Keeps the feed snapshot in a single JSON file and each image blob in its
//! own file named after a hash of the image URL. All files are replaced via
//! write-to-temp then rename, so a crash never leaves a partial file behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use url::Url;

use super::{FeedStore, ImageStore, StoreError};
use crate::data::{FeedRecord, FeedSnapshot};

/// File holding the feed snapshot
const FEED_FILE: &str = "feed-store.json";

/// Directory holding image blobs
const IMAGES_DIR: &str = "images";

/// Borrowed form of [`FeedSnapshot`] so inserts don't clone the items
#[derive(Serialize)]
struct SnapshotRef<'a> {
    items: &'a [FeedRecord],
    timestamp: DateTime<Utc>,
}

/// Store that persists to a cache directory
///
/// Reads share the lock; every insert or delete holds it exclusively, so a
/// reader sees either the state before a write or after it, never a mix.
#[derive(Debug)]
pub struct FileStore {
    /// Directory where cache files are stored
    root: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    /// Creates a store in the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/feedkeeper/` on Linux, or the platform equivalent.
    /// Returns `None` if the cache directory cannot be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "feedkeeper")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a store rooted at `root`
    ///
    /// The directory is created on first write.
    pub fn with_dir(root: PathBuf) -> Self {
        Self {
            root,
            lock: RwLock::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn feed_path(&self) -> PathBuf {
        self.root.join(FEED_FILE)
    }

    fn image_path(&self, url: &Url) -> PathBuf {
        let digest = Sha256::digest(url.as_str().as_bytes());
        self.root.join(IMAGES_DIR).join(format!("{:x}.bin", digest))
    }

    /// Writes `bytes` next to `path` and renames over it
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cache path has no parent"))?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        Ok(())
    }

    /// Reads a whole file, mapping "does not exist" to `None`
    fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl FeedStore for FileStore {
    fn retrieve(&self) -> Result<Option<FeedSnapshot>, StoreError> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);

        match Self::read_optional(&self.feed_path())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, items: &[FeedRecord], timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let json = serde_json::to_vec(&SnapshotRef { items, timestamp })?;

        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let path = self.feed_path();
        tracing::debug!(path = %path.display(), items = items.len(), "writing feed snapshot");
        Self::write_atomic(&path, &json)
    }

    fn delete(&self) -> Result<(), StoreError> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        match fs::remove_file(self.feed_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ImageStore for FileStore {
    fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        Self::read_optional(&self.image_path(url))
    }

    fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let path = self.image_path(url);
        tracing::debug!(%url, path = %path.display(), bytes = data.len(), "writing image data");
        Self::write_atomic(&path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    fn unique_items(count: usize) -> Vec<FeedRecord> {
        (0..count)
            .map(|i| {
                FeedRecord::new(
                    Uuid::new_v4(),
                    Some(format!("description {}", i)),
                    None,
                    Url::parse(&format!("https://example.com/{}.jpg", i)).unwrap(),
                )
            })
            .collect()
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_retrieve_returns_none_on_empty_cache() {
        let (store, _temp_dir) = create_test_store();

        assert!(store.retrieve().expect("Retrieve should succeed").is_none());
        assert!(store.retrieve().expect("Retrieve should succeed").is_none());
    }

    #[test]
    fn test_insert_then_retrieve_returns_snapshot() {
        let (store, _temp_dir) = create_test_store();
        let items = unique_items(2);

        store.insert(&items, timestamp()).expect("Insert should succeed");

        let snapshot = store.retrieve().unwrap().expect("Snapshot should exist");
        assert_eq!(snapshot, FeedSnapshot::new(items, timestamp()));
    }

    #[test]
    fn test_insert_overrides_previous_snapshot() {
        let (store, _temp_dir) = create_test_store();
        let later = timestamp() + Duration::hours(1);

        store.insert(&unique_items(1), timestamp()).unwrap();
        let latest = unique_items(3);
        store.insert(&latest, later).unwrap();

        let snapshot = store.retrieve().unwrap().unwrap();
        assert_eq!(snapshot.items, latest);
        assert_eq!(snapshot.timestamp, later);
    }

    #[test]
    fn test_retrieve_fails_on_corrupt_file() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join(FEED_FILE), "invalid data").unwrap();

        let result = store.retrieve();

        assert!(matches!(result, Err(StoreError::Codec(_))));
    }

    #[test]
    fn test_insert_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = FileStore::with_dir(blocker);

        let result = store.insert(&unique_items(1), timestamp());

        assert!(result.is_err(), "Insert into a file path should fail");
    }

    #[test]
    fn test_insert_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("cache");
        let store = FileStore::with_dir(nested_path.clone());

        store.insert(&unique_items(1), timestamp()).unwrap();

        assert!(nested_path.join(FEED_FILE).exists(), "Feed file should exist");
    }

    #[test]
    fn test_insert_leaves_no_temp_files() {
        let (store, temp_dir) = create_test_store();

        store.insert(&unique_items(2), timestamp()).unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(FEED_FILE)]);
    }

    #[test]
    fn test_delete_on_empty_cache_succeeds() {
        let (store, _temp_dir) = create_test_store();

        store.delete().expect("Delete should succeed");
        assert!(store.retrieve().unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_snapshot() {
        let (store, _temp_dir) = create_test_store();
        store.insert(&unique_items(1), timestamp()).unwrap();

        store.delete().expect("Delete should succeed");

        assert!(store.retrieve().unwrap().is_none());
    }

    #[test]
    fn test_image_data_roundtrip() {
        let (store, _temp_dir) = create_test_store();
        let url = Url::parse("https://example.com/image.png").unwrap();

        store.insert_data(b"image bytes", &url).unwrap();

        assert_eq!(
            store.retrieve_data(&url).unwrap().as_deref(),
            Some(&b"image bytes"[..])
        );
    }

    #[test]
    fn test_image_data_missing_url_returns_none() {
        let (store, _temp_dir) = create_test_store();
        let stored = Url::parse("https://example.com/a.png").unwrap();
        let other = Url::parse("https://example.com/b.png").unwrap();
        store.insert_data(b"a", &stored).unwrap();

        assert!(store.retrieve_data(&other).unwrap().is_none());
    }

    #[test]
    fn test_image_data_insert_overwrites() {
        let (store, _temp_dir) = create_test_store();
        let url = Url::parse("https://example.com/image.png").unwrap();

        store.insert_data(b"first", &url).unwrap();
        store.insert_data(b"second", &url).unwrap();

        assert_eq!(store.retrieve_data(&url).unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileStore::new() {
            let path_str = store.root().to_string_lossy();
            assert!(
                path_str.contains("feedkeeper"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let (store, _temp_dir) = create_test_store();
        let store = Arc::new(store);
        let small = unique_items(1);
        let large = unique_items(200);
        store.insert(&small, timestamp()).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let (small, large) = (small.clone(), large.clone());
            thread::spawn(move || {
                for i in 0..50 {
                    let items = if i % 2 == 0 { &large } else { &small };
                    store.insert(items, timestamp()).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let (small, large) = (small.clone(), large.clone());
                thread::spawn(move || {
                    for _ in 0..50 {
                        let snapshot = store.retrieve().unwrap().unwrap();
                        assert!(snapshot.items == small || snapshot.items == large);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_concurrent_readers_see_whole_blobs() {
        let (store, _temp_dir) = create_test_store();
        let store = Arc::new(store);
        let url = Url::parse("https://example.com/image.png").unwrap();
        let small = vec![1u8; 1];
        let large = vec![2u8; 100_000];
        store.insert_data(&small, &url).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let url = url.clone();
            let (small, large) = (small.clone(), large.clone());
            thread::spawn(move || {
                for i in 0..50 {
                    let data = if i % 2 == 0 { &large } else { &small };
                    store.insert_data(data, &url).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let url = url.clone();
                let (small, large) = (small.clone(), large.clone());
                thread::spawn(move || {
                    for _ in 0..50 {
                        let data = store.retrieve_data(&url).unwrap().unwrap();
                        assert!(
                            data == small || data == large,
                            "torn read of {} bytes",
                            data.len()
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
