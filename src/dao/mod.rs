/// Transactional league store and its backends.
pub mod league_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
