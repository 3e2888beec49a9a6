//! Konfiguracja aplikacji
//!
//! Wartości domyślne odpowiadają publicznym usługom GUGiK. Konfigurację
//! można nadpisać plikiem JSON oraz zmiennymi środowiskowymi `KARTOGRAF_*`
//! (ładowanymi także z `.env`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::providers::gugik::{self, Resolution, VerticalCrs};

/// Konfiguracja pobierania
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Katalog bazowy na pobrane pliki
    pub output_dir: PathBuf,

    /// Rozdzielczość siatki NMT
    pub resolution: Resolution,

    /// Układ wysokościowy
    pub vertical_crs: VerticalCrs,

    /// Timeout pojedynczego żądania HTTP w sekundach
    pub timeout_secs: u64,

    /// Maksymalna liczba prób pobrania
    pub max_retries: u32,

    /// Bazowy URL usług (do testów i instancji lustrzanych)
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
            resolution: Resolution::default(),
            vertical_crs: VerticalCrs::default(),
            timeout_secs: 30,
            max_retries: 3,
            base_url: gugik::BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Ładuje konfigurację z pliku JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Konfiguracja domyślna z nałożonymi zmiennymi środowiskowymi
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Nakłada zmienne środowiskowe `KARTOGRAF_*` na bieżące wartości
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("KARTOGRAF_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(value) = std::env::var("KARTOGRAF_RESOLUTION") {
            match value.parse() {
                Ok(resolution) => self.resolution = resolution,
                Err(e) => warn!("KARTOGRAF_RESOLUTION ignored: {e}"),
            }
        }
        if let Ok(value) = std::env::var("KARTOGRAF_VERTICAL_CRS") {
            match value.parse() {
                Ok(vertical_crs) => self.vertical_crs = vertical_crs,
                Err(e) => warn!("KARTOGRAF_VERTICAL_CRS ignored: {e}"),
            }
        }
        if let Ok(value) = std::env::var("KARTOGRAF_TIMEOUT") {
            match value.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!("KARTOGRAF_TIMEOUT ignored: not a number"),
            }
        }
        if let Ok(value) = std::env::var("KARTOGRAF_MAX_RETRIES") {
            match value.parse() {
                Ok(retries) => self.max_retries = retries,
                Err(_) => warn!("KARTOGRAF_MAX_RETRIES ignored: not a number"),
            }
        }
        if let Ok(url) = std::env::var("KARTOGRAF_BASE_URL") {
            self.base_url = url;
        }
    }

    /// Wymusza spójność ustawień: 5m istnieje tylko dla EVRF2007.
    pub fn normalize(&mut self) {
        if self.resolution == Resolution::R5m && self.vertical_crs != VerticalCrs::Evrf2007 {
            warn!(
                "resolution 5m only supports EVRF2007, changing vertical_crs from {}",
                self.vertical_crs.as_str()
            );
            self.vertical_crs = VerticalCrs::Evrf2007;
        }
    }
}
