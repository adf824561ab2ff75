pub mod file_validator;
pub mod persistence;

pub use file_validator::{validate, FileValidation};
pub use persistence::{FileStorage, MemoryStorage, Persistence, StoragePort};
