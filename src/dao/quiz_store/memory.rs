//! In-process quiz store used when no durable backend is configured.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::QuizEntity,
    quiz_store::QuizStore,
    storage::{StorageError, StorageResult},
};

/// Process-local quiz store, lost on restart.
#[derive(Clone, Default)]
pub struct MemoryQuizStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    quizzes: DashMap<Uuid, QuizEntity>,
    closed: AtomicBool,
}

impl MemoryQuizStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl QuizStore for MemoryQuizStore {
    fn get(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            Ok(store.inner.quizzes.get(&id).map(|entry| entry.clone()))
        })
    }

    fn put(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            store.inner.quizzes.insert(quiz.id, quiz);
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            Ok(store.inner.quizzes.remove(&id).is_some())
        })
    }

    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_open()?;
            let mut quizzes: Vec<QuizEntity> = store
                .inner
                .quizzes
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            quizzes.sort_by_key(|quiz| quiz.created_at);
            Ok(quizzes)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_open() })
    }

    fn close(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.closed.store(true, Ordering::Release);
            Ok(())
        })
    }
}
