//! Dostawca GUGiK: pobieranie danych NMT z usług geoportalu
//!
//! Dwa tryby pobierania zależnie od wejścia:
//! - godło → OpenData (format ASC), po adres pliku pytamy WMS GetFeatureInfo
//!   w punkcie środkowym arkusza
//! - bounding box → WCS GetCoverage (GeoTIFF/PNG/JPEG), tylko rozdzielczość 1m
//!
//! Obsługiwane układy wysokościowe: PL-EVRF2007-NH (domyślny) i starszy
//! PL-KRON86-NH. Rozdzielczość 5m istnieje wyłącznie dla EVRF2007.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use godlo::{BBox, Crs, Godlo};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::{DownloadError, Provider, RasterFormat};

/// Bazowy URL usług GUGiK
pub const BASE_URL: &str = "https://mapy.geoportal.gov.pl";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF_BASE: u64 = 2;

/// Bufor wokół punktu środkowego arkusza przy zapytaniu WMS (metry)
const QUERY_BUFFER: f64 = 10.0;

/// Układ wysokościowy danych NMT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalCrs {
    /// PL-EVRF2007-NH (European Vertical Reference Frame 2007)
    #[default]
    #[serde(rename = "EVRF2007")]
    Evrf2007,
    /// PL-KRON86-NH (Kronsztadt 86, starszy)
    #[serde(rename = "KRON86")]
    Kron86,
}

impl VerticalCrs {
    pub fn as_str(self) -> &'static str {
        match self {
            VerticalCrs::Evrf2007 => "EVRF2007",
            VerticalCrs::Kron86 => "KRON86",
        }
    }
}

impl FromStr for VerticalCrs {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EVRF2007" => Ok(VerticalCrs::Evrf2007),
            "KRON86" => Ok(VerticalCrs::Kron86),
            other => Err(DownloadError::Unsupported(format!(
                "unknown vertical CRS: '{other}'. Supported: EVRF2007, KRON86"
            ))),
        }
    }
}

/// Rozdzielczość siatki NMT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Siatka 1m, dostępna dla EVRF2007 i KRON86
    #[default]
    #[serde(rename = "1m")]
    R1m,
    /// Siatka 5m, tylko EVRF2007, bez WCS
    #[serde(rename = "5m")]
    R5m,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::R1m => "1m",
            Resolution::R5m => "5m",
        }
    }
}

impl FromStr for Resolution {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Resolution::R1m),
            "5m" => Ok(Resolution::R5m),
            other => Err(DownloadError::Unsupported(format!(
                "unknown resolution: '{other}'. Supported: 1m, 5m"
            ))),
        }
    }
}

/// Warstwy skorowidzów do odpytania, od najnowszej do najstarszej
fn wms_layers(resolution: Resolution, vertical_crs: VerticalCrs) -> &'static [&'static str] {
    match (resolution, vertical_crs) {
        (Resolution::R1m, VerticalCrs::Kron86) => &[
            "SkorowidzeNMT2019",
            "SkorowidzeNMT2018",
            "SkorowidzeNMT2017iStarsze",
        ],
        (Resolution::R1m, VerticalCrs::Evrf2007) => &[
            "SkorowidzeNMT2025",
            "SkorowidzeNMT2024",
            "SkorowidzeNMT2023",
            "SkorowidzeNMT2022iStarsze",
        ],
        (Resolution::R5m, VerticalCrs::Evrf2007) => &[
            "SkorowidzeNMT2024",
            "SkorowidzeNMT2023",
            "SkorowidzeNMT2022",
            "SkorowidzeNMT2021iStarsze",
        ],
        (Resolution::R5m, VerticalCrs::Kron86) => &[],
    }
}

fn opendata_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"url:"(https://opendata[^"]+\.asc)""#).expect("wzorzec URL OpenData")
    })
}

/// Dostawca danych NMT z GUGiK
pub struct GugikProvider {
    vertical_crs: VerticalCrs,
    resolution: Resolution,
    base_url: String,
    max_retries: u32,
    agent: ureq::Agent,
}

impl GugikProvider {
    /// Tworzy dostawcę dla podanego układu wysokościowego i rozdzielczości.
    ///
    /// # Errors
    ///
    /// `DownloadError::Unsupported` dla kombinacji 5m + KRON86.
    pub fn new(vertical_crs: VerticalCrs, resolution: Resolution) -> Result<Self, DownloadError> {
        Self::with_settings(
            vertical_crs,
            resolution,
            BASE_URL.to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_MAX_RETRIES,
        )
    }

    /// Tworzy dostawcę z pełną kontrolą nad ustawieniami sieciowymi.
    pub fn with_settings(
        vertical_crs: VerticalCrs,
        resolution: Resolution,
        base_url: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, DownloadError> {
        if resolution == Resolution::R5m && vertical_crs != VerticalCrs::Evrf2007 {
            return Err(DownloadError::Unsupported(format!(
                "resolution 5m is only available for EVRF2007, got {}",
                vertical_crs.as_str()
            )));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .build();

        Ok(Self {
            vertical_crs,
            resolution,
            base_url,
            max_retries,
            agent,
        })
    }

    /// Tworzy dostawcę na podstawie konfiguracji aplikacji.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, DownloadError> {
        Self::with_settings(
            config.vertical_crs,
            config.resolution,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    pub fn vertical_crs(&self) -> VerticalCrs {
        self.vertical_crs
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Czy pobieranie po bounding boxie (WCS) jest dostępne.
    /// WCS istnieje tylko dla rozdzielczości 1m.
    pub fn is_wcs_available(&self) -> bool {
        self.resolution == Resolution::R1m
    }

    /// Endpoint WCS dla bieżącej konfiguracji (tylko 1m)
    fn wcs_endpoint(&self) -> Option<String> {
        if self.resolution != Resolution::R1m {
            return None;
        }
        let suffix = match self.vertical_crs {
            VerticalCrs::Kron86 => "DigitalTerrainModelFormatTIFF",
            VerticalCrs::Evrf2007 => "DigitalTerrainModelFormatTIFFEVRF2007",
        };
        Some(format!(
            "{}/wss/service/PZGIK/NMT/GRID1/WCS/{}",
            self.base_url, suffix
        ))
    }

    /// Endpoint WMS skorowidzów dla bieżącej konfiguracji
    fn wms_endpoint(&self) -> Option<String> {
        let suffix = match (self.resolution, self.vertical_crs) {
            (Resolution::R1m, VerticalCrs::Kron86) => "SkorowidzeUkladKRON86",
            (Resolution::R1m, VerticalCrs::Evrf2007) => "SkorowidzeUkladEVRF2007",
            (Resolution::R5m, VerticalCrs::Evrf2007) => "SheetsGrid5mEVRF2007",
            (Resolution::R5m, VerticalCrs::Kron86) => return None,
        };
        Some(format!(
            "{}/wss/service/PZGIK/NMT/WMS/{}",
            self.base_url, suffix
        ))
    }

    fn coverage_id(&self) -> &'static str {
        match self.vertical_crs {
            VerticalCrs::Kron86 => "DTM_PL-KRON86-NH_TIFF",
            VerticalCrs::Evrf2007 => "DTM_PL-EVRF2007-NH_TIFF",
        }
    }

    /// Znajduje URL pliku ASC w OpenData przez WMS GetFeatureInfo.
    fn opendata_url(&self, arkusz: &Godlo) -> Result<String, DownloadError> {
        let bbox = arkusz.bbox(Crs::Epsg2180);
        let query_bbox = center_query_bbox(&bbox, QUERY_BUFFER);

        let endpoint = self.wms_endpoint().ok_or_else(|| {
            DownloadError::Unsupported(format!(
                "no WMS endpoint for resolution={}, vertical_crs={}",
                self.resolution.as_str(),
                self.vertical_crs.as_str()
            ))
        })?;

        let layers = wms_layers(self.resolution, self.vertical_crs);
        if layers.is_empty() {
            return Err(DownloadError::Unsupported(format!(
                "no WMS layers for resolution={}, vertical_crs={}",
                self.resolution.as_str(),
                self.vertical_crs.as_str()
            )));
        }

        // Warstwy od najnowszej do najstarszej
        for layer in layers {
            let url = build_feature_info_url(&endpoint, layer, &query_bbox)?;
            debug!(godlo = arkusz.godlo(), layer, "querying WMS index");

            let body = match self.fetch(&url) {
                Ok(response) => match response.into_string() {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(layer, "failed to read WMS response: {e}");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(layer, "WMS query failed: {e}");
                    continue;
                }
            };

            let urls = scrape_opendata_urls(&body);
            if urls.is_empty() {
                continue;
            }

            // Preferuj URL zawierający nasze godło
            if let Some(found) = urls.iter().find(|u| u.contains(arkusz.godlo())) {
                debug!(url = found.as_str(), "found OpenData URL");
                return Ok(found.clone());
            }
            debug!(url = urls[0].as_str(), "found OpenData URL (no exact match)");
            return Ok(urls[0].clone());
        }

        Err(DownloadError::NoSheetFound {
            godlo: arkusz.godlo().to_string(),
            reason: format!(
                "no ASC file in any WMS layer (resolution={}, vertical_crs={})",
                self.resolution.as_str(),
                self.vertical_crs.as_str()
            ),
        })
    }

    /// URL WCS GetCoverage dla bounding boxa
    fn wcs_url(&self, bbox: &BBox, format: RasterFormat) -> Result<String, DownloadError> {
        let endpoint = self.wcs_endpoint().ok_or_else(|| {
            DownloadError::Unsupported(
                "WCS download is not available for 5m resolution".to_string(),
            )
        })?;

        let mut url = Url::parse(&endpoint)
            .map_err(|e| DownloadError::Unsupported(format!("invalid WCS endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("SERVICE", "WCS")
            .append_pair("VERSION", "2.0.1")
            .append_pair("REQUEST", "GetCoverage")
            .append_pair("COVERAGEID", self.coverage_id())
            .append_pair("FORMAT", format.mime())
            .append_pair("SUBSET", &format!("x({:.2},{:.2})", bbox.min_x, bbox.max_x))
            .append_pair("SUBSET", &format!("y({:.2},{:.2})", bbox.min_y, bbox.max_y));

        Ok(url.into())
    }

    fn fetch(&self, url: &str) -> Result<ureq::Response, DownloadError> {
        match self.agent.get(url).call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, _)) => Err(DownloadError::Http {
                status,
                url: url.to_string(),
            }),
            Err(e) => Err(DownloadError::Network(e.to_string())),
        }
    }

    /// Pobiera URL do pliku, z ponawianiem i wykładniczym odstępem.
    fn download_with_retry(
        &self,
        url: &str,
        output_path: &Path,
        description: &str,
    ) -> Result<PathBuf, DownloadError> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            debug!(description, attempt, max = self.max_retries, "downloading");

            match self.fetch(url) {
                Ok(response) => {
                    save_response_atomic(response, output_path)?;
                    info!(description, path = %output_path.display(), "downloaded");
                    return Ok(output_path.to_path_buf());
                }
                Err(DownloadError::Io(e)) => return Err(DownloadError::Io(e)),
                Err(e) => {
                    warn!(description, attempt, "download failed: {e}");
                    last_error = e.to_string();
                }
            }

            if attempt < self.max_retries {
                let wait = RETRY_BACKOFF_BASE.pow(attempt);
                debug!("retrying in {wait}s");
                std::thread::sleep(Duration::from_secs(wait));
            }
        }

        Err(DownloadError::RetriesExhausted {
            attempts: self.max_retries,
            reason: last_error,
        })
    }
}

impl Provider for GugikProvider {
    fn name(&self) -> &str {
        "GUGiK"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pobiera dane NMT arkusza z OpenData. Zawsze format ASC: to natywny
    /// format pobrań po godle.
    fn download(&self, arkusz: &Godlo, output_path: &Path) -> Result<PathBuf, DownloadError> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = self.opendata_url(arkusz)?;
        self.download_with_retry(&url, output_path, &format!("{} (OpenData)", arkusz.godlo()))
    }

    /// Pobiera dane NMT dla bounding boxa z WCS (tylko 1m, EPSG:2180).
    fn download_bbox(
        &self,
        bbox: &BBox,
        output_path: &Path,
        format: RasterFormat,
    ) -> Result<PathBuf, DownloadError> {
        if !self.is_wcs_available() {
            return Err(DownloadError::Unsupported(
                "WCS download is not available for 5m resolution; use a godlo download instead"
                    .to_string(),
            ));
        }
        if bbox.crs != Crs::Epsg2180 {
            return Err(DownloadError::InvalidBbox(format!(
                "bbox must be in EPSG:2180, got {}",
                bbox.crs
            )));
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = self.wcs_url(bbox, format)?;
        let description = format!(
            "bbox ({:.0},{:.0})-({:.0},{:.0})",
            bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
        );
        self.download_with_retry(&url, output_path, &description)
    }
}

/// Mały bbox wokół środka arkusza w porządku osi WMS 1.3.0 dla EPSG:2180
/// (najpierw y, potem x).
fn center_query_bbox(bbox: &BBox, buffer: f64) -> String {
    let (center_x, center_y) = bbox.center();
    format!(
        "{},{},{},{}",
        center_y - buffer,
        center_x - buffer,
        center_y + buffer,
        center_x + buffer
    )
}

fn build_feature_info_url(
    endpoint: &str,
    layer: &str,
    query_bbox: &str,
) -> Result<String, DownloadError> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| DownloadError::Unsupported(format!("invalid WMS endpoint: {e}")))?;
    url.query_pairs_mut()
        .append_pair("SERVICE", "WMS")
        .append_pair("VERSION", "1.3.0")
        .append_pair("REQUEST", "GetFeatureInfo")
        .append_pair("LAYERS", layer)
        .append_pair("QUERY_LAYERS", layer)
        .append_pair("INFO_FORMAT", "text/html")
        .append_pair("CRS", "EPSG:2180")
        .append_pair("BBOX", query_bbox)
        .append_pair("WIDTH", "100")
        .append_pair("HEIGHT", "100")
        .append_pair("I", "50")
        .append_pair("J", "50");
    Ok(url.into())
}

/// Wyciąga adresy plików ASC z odpowiedzi HTML skorowidza
fn scrape_opendata_urls(body: &str) -> Vec<String> {
    opendata_url_regex()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Zapisuje odpowiedź HTTP do pliku atomowo (plik tymczasowy + rename).
fn save_response_atomic(response: ureq::Response, output_path: &Path) -> Result<(), DownloadError> {
    let file_name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    let temp_path = output_path.with_file_name(format!("{file_name}.tmp"));

    let result = (|| -> Result<(), DownloadError> {
        let mut file = File::create(&temp_path)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
        std::fs::rename(&temp_path, output_path)?;
        Ok(())
    })();

    if result.is_err() && temp_path.exists() {
        let _ = std::fs::remove_file(&temp_path);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_and_vertical_crs_parse() {
        assert_eq!("1m".parse::<Resolution>().unwrap(), Resolution::R1m);
        assert_eq!("5m".parse::<Resolution>().unwrap(), Resolution::R5m);
        assert!("10m".parse::<Resolution>().is_err());

        assert_eq!(
            "EVRF2007".parse::<VerticalCrs>().unwrap(),
            VerticalCrs::Evrf2007
        );
        assert_eq!("KRON86".parse::<VerticalCrs>().unwrap(), VerticalCrs::Kron86);
        assert!("KRON85".parse::<VerticalCrs>().is_err());
    }

    #[test]
    fn test_new_rejects_5m_kron86() {
        assert!(GugikProvider::new(VerticalCrs::Kron86, Resolution::R5m).is_err());
        assert!(GugikProvider::new(VerticalCrs::Evrf2007, Resolution::R5m).is_ok());
        assert!(GugikProvider::new(VerticalCrs::Kron86, Resolution::R1m).is_ok());
    }

    #[test]
    fn test_wms_endpoint_per_config() {
        let provider = GugikProvider::new(VerticalCrs::Evrf2007, Resolution::R1m).unwrap();
        assert_eq!(
            provider.wms_endpoint().unwrap(),
            "https://mapy.geoportal.gov.pl/wss/service/PZGIK/NMT/WMS/SkorowidzeUkladEVRF2007"
        );

        let provider = GugikProvider::new(VerticalCrs::Kron86, Resolution::R1m).unwrap();
        assert_eq!(
            provider.wms_endpoint().unwrap(),
            "https://mapy.geoportal.gov.pl/wss/service/PZGIK/NMT/WMS/SkorowidzeUkladKRON86"
        );

        let provider = GugikProvider::new(VerticalCrs::Evrf2007, Resolution::R5m).unwrap();
        assert_eq!(
            provider.wms_endpoint().unwrap(),
            "https://mapy.geoportal.gov.pl/wss/service/PZGIK/NMT/WMS/SheetsGrid5mEVRF2007"
        );
    }

    #[test]
    fn test_wms_layers_newest_first() {
        let layers = wms_layers(Resolution::R1m, VerticalCrs::Evrf2007);
        assert_eq!(layers[0], "SkorowidzeNMT2025");
        assert_eq!(layers.len(), 4);

        assert!(wms_layers(Resolution::R5m, VerticalCrs::Kron86).is_empty());
    }

    #[test]
    fn test_wcs_url() {
        let provider = GugikProvider::new(VerticalCrs::Evrf2007, Resolution::R1m).unwrap();
        let bbox = BBox::new(450000.0, 550000.0, 460000.0, 560000.0, Crs::Epsg2180);
        let url = provider.wcs_url(&bbox, RasterFormat::GTiff).unwrap();

        assert!(url.starts_with(
            "https://mapy.geoportal.gov.pl/wss/service/PZGIK/NMT/GRID1/WCS/DigitalTerrainModelFormatTIFFEVRF2007?"
        ));
        assert!(url.contains("SERVICE=WCS"));
        assert!(url.contains("VERSION=2.0.1"));
        assert!(url.contains("REQUEST=GetCoverage"));
        assert!(url.contains("COVERAGEID=DTM_PL-EVRF2007-NH_TIFF"));
        assert!(url.contains("SUBSET=x%28450000.00%2C460000.00%29"));
        assert!(url.contains("SUBSET=y%28550000.00%2C560000.00%29"));
    }

    #[test]
    fn test_wcs_unavailable_for_5m() {
        let provider = GugikProvider::new(VerticalCrs::Evrf2007, Resolution::R5m).unwrap();
        assert!(!provider.is_wcs_available());

        let bbox = BBox::new(450000.0, 550000.0, 460000.0, 560000.0, Crs::Epsg2180);
        let result =
            provider.download_bbox(&bbox, Path::new("/tmp/area.tif"), RasterFormat::GTiff);
        assert!(matches!(result, Err(DownloadError::Unsupported(_))));
    }

    #[test]
    fn test_download_bbox_rejects_wgs84() {
        let provider = GugikProvider::new(VerticalCrs::Evrf2007, Resolution::R1m).unwrap();
        let bbox = BBox::new(18.0, 52.0, 24.0, 56.0, Crs::Epsg4326);
        let result =
            provider.download_bbox(&bbox, Path::new("/tmp/area.tif"), RasterFormat::GTiff);
        assert!(matches!(result, Err(DownloadError::InvalidBbox(_))));
    }

    #[test]
    fn test_feature_info_url_axis_order() {
        // WMS 1.3.0 z EPSG:2180 wymaga porządku osi y,x
        let bbox = BBox::new(400000.0, 500000.0, 400020.0, 500020.0, Crs::Epsg2180);
        let query = center_query_bbox(&bbox, 10.0);
        assert_eq!(query, "500000,400000,500020,400020");

        let url = build_feature_info_url(
            "https://mapy.geoportal.gov.pl/wss/service/PZGIK/NMT/WMS/SkorowidzeUkladEVRF2007",
            "SkorowidzeNMT2025",
            &query,
        )
        .unwrap();
        assert!(url.contains("REQUEST=GetFeatureInfo"));
        assert!(url.contains("LAYERS=SkorowidzeNMT2025"));
        assert!(url.contains("QUERY_LAYERS=SkorowidzeNMT2025"));
        assert!(url.contains("CRS=EPSG%3A2180"));
        assert!(url.contains("BBOX=500000%2C400000%2C500020%2C400020"));
        assert!(url.contains("I=50"));
    }

    #[test]
    fn test_scrape_opendata_urls() {
        let body = r#"
            <html><script>
            var a = {url:"https://opendata.geoportal.gov.pl/NMT/N-34-130-D-d-2-4.asc"};
            var b = {url:"https://opendata.geoportal.gov.pl/NMT/N-34-130-D-d-2-3.asc"};
            var c = {url:"https://example.com/not-opendata.asc"};
            </script></html>
        "#;
        let urls = scrape_opendata_urls(body);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with("N-34-130-D-d-2-4.asc"));
    }

    #[test]
    fn test_scrape_empty_body() {
        assert!(scrape_opendata_urls("<html>nothing here</html>").is_empty());
    }
}
