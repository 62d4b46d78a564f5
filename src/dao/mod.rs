/// Database model definitions.
pub mod models;
/// Quiz persistence backends.
pub mod quiz_store;
/// Storage abstraction layer for persistence operations.
pub mod storage;
