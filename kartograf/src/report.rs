//! Raport pobierania z graceful degradation
//!
//! Pojedyncze nieudane arkusze nie przerywają pobierania hierarchii;
//! raport zbiera wyniki per arkusz i status końcowy całej operacji.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

/// Status końcowy operacji pobierania
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DownloadStatus {
    /// Wszystkie arkusze pobrane lub pominięte
    Success,
    /// Część arkuszy pobrana, część w błędzie
    PartialSuccess,
    /// Żaden arkusz nie został pobrany
    Failed,
}

/// Wynik pojedynczego arkusza
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SheetStatus {
    /// Pobrany w tej operacji
    Downloaded,
    /// Pominięty, plik już istniał
    Skipped,
    /// Pobieranie nie powiodło się
    Failed,
}

/// Zapis wyniku dla jednego arkusza
#[derive(Debug, Clone, Serialize)]
pub struct SheetOutcome {
    /// Godło arkusza
    pub godlo: String,
    /// Wynik operacji
    pub status: SheetStatus,
    /// Ścieżka pliku (dla pobranych i pominiętych)
    pub path: Option<PathBuf>,
    /// Komunikat błędu (dla nieudanych)
    pub message: Option<String>,
}

/// Raport z pobierania arkuszy
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    /// Godło startowe
    pub godlo: String,
    /// Skala docelowa (brak dla pojedynczego arkusza)
    pub target_scale: Option<String>,
    /// Czas trwania operacji
    pub duration_secs: f64,
    /// Status końcowy
    pub status: DownloadStatus,

    /// Liczba wszystkich arkuszy
    pub total: usize,
    /// Liczba pobranych
    pub downloaded: usize,
    /// Liczba pominiętych (już istniały)
    pub skipped: usize,
    /// Liczba nieudanych
    pub failed: usize,

    /// Wyniki per arkusz
    pub outcomes: Vec<SheetOutcome>,
}

impl DownloadReport {
    /// Tworzy pusty raport dla godła startowego
    pub fn new(godlo: &str, target_scale: Option<&str>) -> Self {
        Self {
            godlo: godlo.to_string(),
            target_scale: target_scale.map(str::to_string),
            duration_secs: 0.0,
            status: DownloadStatus::Success,
            total: 0,
            downloaded: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    /// Zapisuje wynik arkusza i aktualizuje liczniki
    pub fn record(&mut self, outcome: SheetOutcome) {
        self.total += 1;
        match outcome.status {
            SheetStatus::Downloaded => self.downloaded += 1,
            SheetStatus::Skipped => self.skipped += 1,
            SheetStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Ustala status końcowy na podstawie liczników
    pub fn finalize(&mut self) {
        let succeeded = self.downloaded + self.skipped;
        self.status = if self.failed == 0 {
            DownloadStatus::Success
        } else if succeeded > 0 {
            DownloadStatus::PartialSuccess
        } else {
            DownloadStatus::Failed
        };
    }

    /// Ścieżki plików dostępnych po operacji (pobranych i pominiętych)
    pub fn paths(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter(|o| o.status != SheetStatus::Failed)
            .filter_map(|o| o.path.as_ref())
            .collect()
    }

    /// Wyświetla raport na konsoli
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        match &self.target_scale {
            Some(scale) => println!("DOWNLOAD REPORT - {} -> {}", self.godlo, scale),
            None => println!("DOWNLOAD REPORT - {}", self.godlo),
        }
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "Sheets: {} total, {} downloaded, {} skipped, {} failed",
            self.total, self.downloaded, self.skipped, self.failed
        );

        let failures: Vec<&SheetOutcome> = self
            .outcomes
            .iter()
            .filter(|o| o.status == SheetStatus::Failed)
            .collect();

        if !failures.is_empty() {
            println!("\n--- FAILURES ({}) ---", failures.len());
            for outcome in failures.iter().take(20) {
                println!(
                    "  {}: {}",
                    outcome.godlo,
                    outcome.message.as_deref().unwrap_or("unknown error")
                );
            }
            if failures.len() > 20 {
                println!("  ... and {} more", failures.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Zapisuje raport do pliku JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Zwięzłe podsumowanie jednolinijkowe
    pub fn summary(&self) -> String {
        format!(
            "{}: {} downloaded, {} skipped, {} failed",
            self.godlo, self.downloaded, self.skipped, self.failed
        )
    }
}
