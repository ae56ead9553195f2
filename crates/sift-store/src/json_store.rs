//! JSON-file state store.
//!
//! One document per concern so clearing progress never touches the trash
//! set or the count cache. Writes go to a temp file in the same directory
//! and rename over the target, so a crash mid-write leaves the old
//! document intact.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sift_core::{EngineError, ItemId};
use sift_engine::{CountRecord, ProgressRecord, StateStore};

const PROGRESS_FILE: &str = "progress.json";
const TRASH_FILE: &str = "trash.json";
const COUNT_FILE: &str = "count.json";

/// State store backed by JSON documents under a data directory.
pub struct JsonStateStore {
    dir: PathBuf,
}

impl JsonStateStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| EngineError::Persistence(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_doc<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, EngineError> {
        let path = self.path(file);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EngineError::Persistence(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| EngineError::Persistence(format!("parse {}: {e}", path.display())))
    }

    fn write_doc<T: Serialize>(&self, file: &str, value: &T) -> Result<(), EngineError> {
        let path = self.path(file);
        let raw = serde_json::to_string(value)
            .map_err(|e| EngineError::Persistence(format!("encode {file}: {e}")))?;
        write_atomic(&path, raw.as_bytes())
            .map_err(|e| EngineError::Persistence(format!("write {}: {e}", path.display())))
    }

    fn remove_doc(&self, file: &str) -> Result<(), EngineError> {
        let path = self.path(file);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Persistence(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, EngineError> {
        self.read_doc(PROGRESS_FILE)
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), EngineError> {
        self.write_doc(PROGRESS_FILE, record)
    }

    async fn clear_progress(&self) -> Result<(), EngineError> {
        tracing::debug!("Clearing persisted progress");
        self.remove_doc(PROGRESS_FILE)
    }

    async fn load_trash(&self) -> Result<HashSet<ItemId>, EngineError> {
        Ok(self.read_doc(TRASH_FILE)?.unwrap_or_default())
    }

    async fn save_trash(&self, trash: &HashSet<ItemId>) -> Result<(), EngineError> {
        self.write_doc(TRASH_FILE, trash)
    }

    async fn load_count(&self) -> Result<Option<CountRecord>, EngineError> {
        self.read_doc(COUNT_FILE)
    }

    async fn save_count(&self, record: &CountRecord) -> Result<(), EngineError> {
        self.write_doc(COUNT_FILE, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::Cursor;

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    fn temp_store() -> (JsonStateStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_progress_roundtrip() {
        let (store, _dir) = temp_store();
        assert!(store.load_progress().await.unwrap().is_none());

        let record = ProgressRecord {
            position: 42,
            buffer: vec![id("a"), id("b")],
            cursor: Some(Cursor::from("tok")),
        };
        store.save_progress(&record).await.unwrap();
        assert_eq!(store.load_progress().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_clear_progress_removes_only_progress() {
        let (store, _dir) = temp_store();
        store
            .save_progress(&ProgressRecord::default())
            .await
            .unwrap();
        store.save_trash(&[id("x")].into()).await.unwrap();

        store.clear_progress().await.unwrap();
        assert!(store.load_progress().await.unwrap().is_none());
        assert!(store.load_trash().await.unwrap().contains(&id("x")));

        // Clearing again is fine
        store.clear_progress().await.unwrap();
    }

    #[tokio::test]
    async fn test_trash_roundtrip_defaults_empty() {
        let (store, _dir) = temp_store();
        assert!(store.load_trash().await.unwrap().is_empty());

        let trash: HashSet<ItemId> = [id("a"), id("b")].into();
        store.save_trash(&trash).await.unwrap();
        assert_eq!(store.load_trash().await.unwrap(), trash);
    }

    #[tokio::test]
    async fn test_count_roundtrip() {
        let (store, _dir) = temp_store();
        assert!(store.load_count().await.unwrap().is_none());

        let record = CountRecord {
            value: 1234,
            computed_at_secs: 99,
        };
        store.save_count(&record).await.unwrap();
        assert_eq!(store.load_count().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error_not_a_panic() {
        let (store, dir) = temp_store();
        std::fs::write(dir.path().join("progress.json"), "not json").unwrap();

        assert!(matches!(
            store.load_progress().await,
            Err(EngineError::Persistence(_))
        ));
    }
}
