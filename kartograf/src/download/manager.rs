//! Koordynacja pobierania arkuszy
//!
//! Menedżer spina dostawcę danych, magazyn plików i nawigację po hierarchii
//! godeł. Pobieranie hierarchii działa współbieżnie z ograniczeniem liczby
//! równoległych pobrań; pojedyncze błędy trafiają do raportu zamiast
//! przerywać całość.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use godlo::{Godlo, Scale};
use tracing::{info, warn};

use crate::download::storage::FileStorage;
use crate::providers::{DownloadError, Provider};
use crate::report::{DownloadReport, SheetOutcome, SheetStatus};

/// Rozszerzenie plików pobieranych po godle (natywny format OpenData)
pub const ASC_EXT: &str = ".asc";

/// Postęp pobierania hierarchii, przekazywany do callbacku po każdym arkuszu
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Liczba przetworzonych arkuszy (łącznie z bieżącym)
    pub current: usize,
    /// Liczba wszystkich arkuszy
    pub total: usize,
    /// Godło bieżącego arkusza
    pub godlo: String,
    /// Wynik bieżącego arkusza
    pub status: SheetStatus,
    /// Szczegóły (komunikat błędu przy niepowodzeniu)
    pub message: Option<String>,
}

impl DownloadProgress {
    /// Postęp w procentach (0-100)
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.current as f64 / self.total as f64) * 100.0
    }
}

/// Callback postępu wywoływany współbieżnie z wielu zadań
pub type ProgressCallback = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;

/// Menedżer pobierania danych NMT
#[derive(Clone)]
pub struct DownloadManager {
    provider: Arc<dyn Provider>,
    storage: FileStorage,
}

impl DownloadManager {
    pub fn new(provider: Arc<dyn Provider>, storage: FileStorage) -> Self {
        Self { provider, storage }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Pobiera pojedynczy arkusz (operacja blokująca).
    ///
    /// Przy `skip_existing` istniejący plik jest pomijany, chyba że jego
    /// suma kontrolna nie zgadza się z sidecarem: wtedy pobieramy ponownie.
    pub fn download_sheet(
        &self,
        arkusz: &Godlo,
        skip_existing: bool,
    ) -> Result<SheetOutcome, DownloadError> {
        let target = self.storage.path_for(arkusz, ASC_EXT);

        if skip_existing && target.exists() {
            match self.storage.verify_checksum(&target) {
                Some(false) => {
                    warn!(
                        godlo = arkusz.godlo(),
                        path = %target.display(),
                        "checksum mismatch, re-downloading"
                    );
                }
                _ => {
                    info!(godlo = arkusz.godlo(), "already exists, skipping");
                    return Ok(SheetOutcome {
                        godlo: arkusz.godlo().to_string(),
                        status: SheetStatus::Skipped,
                        path: Some(target),
                        message: None,
                    });
                }
            }
        }

        info!(godlo = arkusz.godlo(), "downloading");
        let path = self.provider.download(arkusz, &target)?;

        if let Err(e) = self.storage.write_checksum(&path) {
            warn!(godlo = arkusz.godlo(), "failed to write checksum sidecar: {e}");
        }

        Ok(SheetOutcome {
            godlo: arkusz.godlo().to_string(),
            status: SheetStatus::Downloaded,
            path: Some(path),
            message: None,
        })
    }

    /// Pobiera wszystkie arkusze potomne do zadanej skali.
    ///
    /// Zwraca raport z wynikami per arkusz; błędy pojedynczych pobrań nie
    /// przerywają operacji. Błąd zwracany jest tylko dla nieprawidłowej
    /// skali docelowej.
    pub async fn download_hierarchy(
        &self,
        start: &Godlo,
        target_scale: Scale,
        skip_existing: bool,
        jobs: usize,
        on_progress: Option<ProgressCallback>,
    ) -> Result<DownloadReport, godlo::GodloError> {
        let descendants = start.descendants(target_scale)?;
        let total = descendants.len();
        let started = Instant::now();

        info!(
            godlo = start.godlo(),
            target = %target_scale,
            sheets = total,
            jobs,
            "starting hierarchy download"
        );

        let processed = Arc::new(AtomicUsize::new(0));

        let outcomes: Vec<SheetOutcome> = stream::iter(descendants)
            .map(|arkusz| {
                let manager = self.clone();
                let processed = Arc::clone(&processed);
                let on_progress = on_progress.clone();

                async move {
                    let code = arkusz.godlo().to_string();
                    let result = tokio::task::spawn_blocking(move || {
                        manager.download_sheet(&arkusz, skip_existing)
                    })
                    .await;

                    let outcome = match result {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(e)) => SheetOutcome {
                            godlo: code.clone(),
                            status: SheetStatus::Failed,
                            path: None,
                            message: Some(e.to_string()),
                        },
                        Err(e) => SheetOutcome {
                            godlo: code.clone(),
                            status: SheetStatus::Failed,
                            path: None,
                            message: Some(format!("task join error: {e}")),
                        },
                    };

                    let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(callback) = &on_progress {
                        callback(&DownloadProgress {
                            current,
                            total,
                            godlo: outcome.godlo.clone(),
                            status: outcome.status,
                            message: outcome.message.clone(),
                        });
                    }

                    outcome
                }
            })
            .buffer_unordered(jobs.max(1))
            .collect()
            .await;

        let mut report = DownloadReport::new(start.godlo(), Some(target_scale.as_str()));
        for outcome in outcomes {
            if outcome.status == SheetStatus::Failed {
                warn!(
                    godlo = outcome.godlo.as_str(),
                    "download failed: {}",
                    outcome.message.as_deref().unwrap_or("unknown")
                );
            }
            report.record(outcome);
        }
        report.set_duration(started.elapsed());
        report.finalize();

        info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            "hierarchy download complete"
        );

        Ok(report)
    }

    /// Arkusze hierarchii, których nie ma jeszcze w magazynie
    pub fn missing_sheets(
        &self,
        start: &Godlo,
        target_scale: Scale,
    ) -> Result<Vec<Godlo>, godlo::GodloError> {
        let descendants = start.descendants(target_scale)?;
        Ok(descendants
            .into_iter()
            .filter(|arkusz| !self.storage.exists(arkusz, ASC_EXT))
            .collect())
    }

    /// Liczba arkuszy hierarchii w skali docelowej
    pub fn count_sheets(
        &self,
        start: &Godlo,
        target_scale: Scale,
    ) -> Result<usize, godlo::GodloError> {
        Ok(start.descendants(target_scale)?.len())
    }
}
