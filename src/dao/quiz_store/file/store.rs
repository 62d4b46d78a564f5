use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::warn;
use uuid::Uuid;

use crate::dao::{
    models::QuizEntity,
    quiz_store::QuizStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::FileStoreConfig,
    error::{FileStoreError, FileStoreResult},
};

const DOCUMENT_EXTENSION: &str = "json";

/// Quiz store writing one pretty-printed JSON document per quiz.
#[derive(Clone)]
pub struct FileQuizStore {
    inner: Arc<FileInner>,
}

struct FileInner {
    directory: PathBuf,
    // Serialises writers so a rename never races another write of the same quiz.
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl FileQuizStore {
    /// Open the store, creating the directory when missing.
    pub async fn open(config: FileStoreConfig) -> FileStoreResult<Self> {
        fs::create_dir_all(&config.directory)
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: config.directory.clone(),
                source,
            })?;

        Ok(Self {
            inner: Arc::new(FileInner {
                directory: config.directory,
                write_lock: Mutex::new(()),
                closed: AtomicBool::new(false),
            }),
        })
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn document_path(&self, id: Uuid) -> PathBuf {
        self.inner
            .directory
            .join(format!("{}.{DOCUMENT_EXTENSION}", id.simple()))
    }

    async fn read_document(path: &Path) -> FileStoreResult<Option<QuizEntity>> {
        let contents = match fs::read(path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FileStoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|source| FileStoreError::Deserialize {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write_document(&self, quiz: &QuizEntity) -> FileStoreResult<()> {
        let path = self.document_path(quiz.id);
        let tmp_path = path.with_extension("json.tmp");
        let payload = serde_json::to_vec_pretty(quiz).map_err(|source| {
            FileStoreError::Serialize {
                id: quiz.id,
                source,
            }
        })?;

        let _guard = self.inner.write_lock.lock().await;
        fs::write(&tmp_path, payload)
            .await
            .map_err(|source| FileStoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| FileStoreError::Write { path, source })
    }

    async fn remove_document(&self, id: Uuid) -> FileStoreResult<bool> {
        let path = self.document_path(id);
        let _guard = self.inner.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(FileStoreError::Delete { path, source }),
        }
    }

    async fn read_all(&self) -> FileStoreResult<Vec<QuizEntity>> {
        let directory = &self.inner.directory;
        let mut entries = fs::read_dir(directory)
            .await
            .map_err(|source| FileStoreError::Read {
                path: directory.clone(),
                source,
            })?;

        let mut quizzes = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|source| FileStoreError::Read {
                    path: directory.clone(),
                    source,
                })?;
            let Some(entry) = entry else {
                break;
            };

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }

            match Self::read_document(&path).await {
                Ok(Some(quiz)) => quizzes.push(quiz),
                Ok(None) => {}
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable quiz document"),
            }
        }

        quizzes.sort_by_key(|quiz| quiz.created_at);
        Ok(quizzes)
    }
}

impl QuizStore for FileQuizStore {
    fn get(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            let path = store.document_path(id);
            Self::read_document(&path).await.map_err(Into::into)
        })
    }

    fn put(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            store.write_document(&quiz).await.map_err(Into::into)
        })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            store.remove_document(id).await.map_err(Into::into)
        })
    }

    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            store.read_all().await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            let directory = store.inner.directory.clone();
            match fs::metadata(&directory).await {
                Ok(meta) if meta.is_dir() => Ok(()),
                Ok(_) => Err(FileStoreError::DirectoryUnavailable {
                    path: directory,
                    source: std::io::Error::other("not a directory"),
                }
                .into()),
                Err(source) => Err(FileStoreError::DirectoryUnavailable {
                    path: directory,
                    source,
                }
                .into()),
            }
        })
    }

    fn close(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            // Wait for any in-flight write before flipping the flag.
            let _guard = store.inner.write_lock.lock().await;
            store.inner.closed.store(true, Ordering::Release);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::quiz_store::memory::tests::sample_entity;

    #[tokio::test]
    async fn documents_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQuizStore::open(FileStoreConfig::new(dir.path()))
            .await
            .unwrap();
        let quiz = sample_entity("persisted");
        store.put(quiz.clone()).await.unwrap();
        store.close().await.unwrap();

        let reopened = FileQuizStore::open(FileStoreConfig::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(reopened.get(quiz.id).await.unwrap(), Some(quiz.clone()));
        assert_eq!(reopened.list_all().await.unwrap(), vec![quiz]);
    }

    #[tokio::test]
    async fn delete_reports_missing_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQuizStore::open(FileStoreConfig::new(dir.path()))
            .await
            .unwrap();
        let quiz = sample_entity("short-lived");

        assert!(!store.delete(quiz.id).await.unwrap());
        store.put(quiz.clone()).await.unwrap();
        assert!(store.delete(quiz.id).await.unwrap());
        assert_eq!(store.get(quiz.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_documents_are_skipped_in_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQuizStore::open(FileStoreConfig::new(dir.path()))
            .await
            .unwrap();
        std::fs::write(dir.path().join("garbage.json"), b"{not json").unwrap();
        store.put(sample_entity("valid")).await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "valid");
    }
}
