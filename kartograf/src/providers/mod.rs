//! Dostawcy danych NMT
//!
//! Dostawca odpowiada za pobranie danych dla arkusza (po godle) lub dla
//! dowolnego obszaru (po bounding boxie). Menedżer pobierania pracuje na
//! tym traicie, więc testy mogą podstawić dostawcę zapisującego dane
//! lokalnie, bez sieci.

pub mod gugik;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use godlo::{BBox, Godlo};
use thiserror::Error;

pub use gugik::GugikProvider;

/// Błędy pobierania danych z usług zewnętrznych
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Błąd I/O przy zapisie pliku
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Odpowiedź HTTP ze statusem błędu
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Błąd transportu (timeout, DNS, połączenie)
    #[error("Network error: {0}")]
    Network(String),

    /// Usługa nie zwróciła pliku dla arkusza
    #[error("No data found for sheet {godlo}: {reason}")]
    NoSheetFound { godlo: String, reason: String },

    /// Operacja niedostępna w bieżącej konfiguracji
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Bounding box w złym układzie odniesienia
    #[error("Invalid bbox: {0}")]
    InvalidBbox(String),

    /// Pobieranie nie powiodło się po wyczerpaniu prób
    #[error("Download failed after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },
}

/// Format rastrowy dla pobrań po bounding boxie (WCS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    GTiff,
    Png,
    Jpeg,
}

impl RasterFormat {
    /// Typ MIME żądany od usługi WCS
    pub fn mime(self) -> &'static str {
        match self {
            RasterFormat::GTiff => "image/tiff",
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
        }
    }

    /// Rozszerzenie pliku wynikowego (z kropką)
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::GTiff => ".tif",
            RasterFormat::Png => ".png",
            RasterFormat::Jpeg => ".jpg",
        }
    }
}

impl FromStr for RasterFormat {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GTiff" => Ok(RasterFormat::GTiff),
            "PNG" => Ok(RasterFormat::Png),
            "JPEG" => Ok(RasterFormat::Jpeg),
            other => Err(DownloadError::Unsupported(format!(
                "unknown raster format: '{other}'. Supported: GTiff, PNG, JPEG"
            ))),
        }
    }
}

/// Źródło danych NMT
pub trait Provider: Send + Sync {
    /// Nazwa dostawcy do logów i raportów
    fn name(&self) -> &str;

    /// Bazowy URL usługi
    fn base_url(&self) -> &str;

    /// Pobiera dane dla arkusza do wskazanego pliku.
    ///
    /// Operacja blokująca: w kodzie async wywoływana przez `spawn_blocking`.
    fn download(&self, arkusz: &Godlo, output_path: &Path) -> Result<PathBuf, DownloadError>;

    /// Pobiera dane dla bounding boxa. Nie każdy dostawca to wspiera.
    fn download_bbox(
        &self,
        _bbox: &BBox,
        _output_path: &Path,
        _format: RasterFormat,
    ) -> Result<PathBuf, DownloadError> {
        Err(DownloadError::Unsupported(format!(
            "{} does not support bbox downloads",
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_format_parse() {
        assert_eq!("GTiff".parse::<RasterFormat>().unwrap(), RasterFormat::GTiff);
        assert_eq!("PNG".parse::<RasterFormat>().unwrap(), RasterFormat::Png);
        assert!("BMP".parse::<RasterFormat>().is_err());
    }

    #[test]
    fn test_raster_format_extension() {
        assert_eq!(RasterFormat::GTiff.extension(), ".tif");
        assert_eq!(RasterFormat::Jpeg.extension(), ".jpg");
        assert_eq!(RasterFormat::Png.mime(), "image/png");
    }
}
