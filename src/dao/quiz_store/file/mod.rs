mod config;
mod error;
mod store;

pub use config::FileStoreConfig;
pub use error::{FileStoreError, FileStoreResult};
pub use store::FileQuizStore;
