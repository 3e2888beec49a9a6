//! Pobieranie i przechowywanie danych NMT

pub mod manager;
pub mod storage;

pub use manager::{DownloadManager, DownloadProgress, ProgressCallback, ASC_EXT};
pub use storage::FileStorage;
