//! # kartograf
//!
//! Pobieranie polskich danych NMT (Numeryczny Model Terenu) z usług GUGiK
//! po godle arkusza mapy.
//!
//! ## Features
//!
//! - Pobieranie pojedynczych arkuszy i całych hierarchii (ASC z OpenData)
//! - Pobieranie po bounding boxie (GeoTIFF/PNG/JPEG z WCS, tylko 1m)
//! - Hierarchiczny magazyn plików z sumami kontrolnymi blake3
//! - Eksport siatek arkuszy do GeoJSON
//! - CLI proste w użyciu
//!
//! ## Usage CLI
//!
//! ```bash
//! # Informacje o godle
//! kartograf parse N-34-130-D --hierarchy
//!
//! # Zasięg arkusza
//! kartograf bbox N-34-130-D-d-2-4 --crs EPSG:2180
//!
//! # Pobranie hierarchii do 1:10000
//! kartograf download N-34-130-D --scale 1:10000 --output ./data
//!
//! # Siatka arkuszy jako GeoJSON
//! kartograf grid N-34 --scale 1:100000 --output siatka.geojson
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod export;
pub mod providers;
pub mod report;

pub use config::Config;
pub use download::{DownloadManager, FileStorage};
pub use providers::{DownloadError, GugikProvider, Provider};
pub use report::{DownloadReport, DownloadStatus};
