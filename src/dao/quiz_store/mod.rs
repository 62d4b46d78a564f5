#[cfg(feature = "file-store")]
pub mod file;
pub mod memory;

use crate::dao::models::QuizEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for quizzes, keyed by quiz id.
///
/// Players and their ledgers are embedded in the stored quiz document.
pub trait QuizStore: Send + Sync {
    fn get(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    fn put(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Returns whether a document was removed.
    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Flush and stop accepting operations.
    fn close(&self) -> BoxFuture<'static, StorageResult<()>>;
}
