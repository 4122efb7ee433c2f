mod file_store;

pub use file_store::{FileStore, DEFAULT_FILE};
