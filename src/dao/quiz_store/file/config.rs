use std::path::PathBuf;

/// Runtime configuration describing where quiz documents live on disk.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    pub directory: PathBuf,
}

impl FileStoreConfig {
    /// Construct a configuration rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}
