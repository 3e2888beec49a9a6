//! Testy integracyjne pobierania z dostawcą zastępczym (bez sieci)

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use godlo::{Godlo, Scale};
use kartograf::download::{DownloadManager, FileStorage};
use kartograf::providers::gugik::Resolution;
use kartograf::providers::{DownloadError, Provider};
use kartograf::report::DownloadStatus;

/// Dostawca zapisujący sztuczną zawartość ASC, licząc wywołania
struct FakeProvider {
    calls: AtomicUsize,
    /// Godła, dla których pobranie ma się nie udać
    failing: Vec<String>,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: Vec::new(),
        }
    }

    fn failing_on(godla: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: godla.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn base_url(&self) -> &str {
        "http://localhost"
    }

    fn download(&self, arkusz: &Godlo, output_path: &Path) -> Result<PathBuf, DownloadError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.failing.iter().any(|g| g == arkusz.godlo()) {
            return Err(DownloadError::Http {
                status: 500,
                url: format!("http://localhost/{}", arkusz.godlo()),
            });
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, format!("ncols 100\n# {}\n", arkusz.godlo()))?;
        Ok(output_path.to_path_buf())
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kartograf_it_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[tokio::test]
async fn test_hierarchy_download_creates_sheet_tree() {
    let dir = temp_dir("tree");
    let provider = Arc::new(FakeProvider::new());
    let manager = DownloadManager::new(
        provider.clone(),
        FileStorage::new(&dir, Resolution::R1m),
    );

    let start = godlo::parse("N-34-130-D-d").unwrap();
    let report = manager
        .download_hierarchy(&start, Scale::S10k, true, 4, None)
        .await
        .unwrap();

    assert_eq!(report.total, 16);
    assert_eq!(report.downloaded, 16);
    assert_eq!(report.status, DownloadStatus::Success);
    assert_eq!(provider.calls(), 16);

    // Układ katalogów odzwierciedla składowe godła
    let expected = dir.join("1m/N-34/130/D/d/1/1/N-34-130-D-d-1-1.asc");
    assert!(expected.exists(), "{}", expected.display());

    // Sidecar z sumą kontrolną obok pliku
    let sidecar = dir.join("1m/N-34/130/D/d/1/1/N-34-130-D-d-1-1.asc.b3sum");
    assert!(sidecar.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let dir = temp_dir("rerun");
    let provider = Arc::new(FakeProvider::new());
    let manager = DownloadManager::new(
        provider.clone(),
        FileStorage::new(&dir, Resolution::R1m),
    );

    let start = godlo::parse("N-34-130-D-d-2").unwrap();
    manager
        .download_hierarchy(&start, Scale::S10k, true, 2, None)
        .await
        .unwrap();
    assert_eq!(provider.calls(), 4);

    let report = manager
        .download_hierarchy(&start, Scale::S10k, true, 2, None)
        .await
        .unwrap();
    assert_eq!(report.skipped, 4);
    assert_eq!(report.downloaded, 0);
    // Dostawca nie był odpytywany ponownie
    assert_eq!(provider.calls(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_partial_failure_is_reported_not_fatal() {
    let dir = temp_dir("partial");
    let provider = Arc::new(FakeProvider::failing_on(&["N-34-130-D-d-2-2"]));
    let manager = DownloadManager::new(provider, FileStorage::new(&dir, Resolution::R1m));

    let start = godlo::parse("N-34-130-D-d-2").unwrap();
    let report = manager
        .download_hierarchy(&start, Scale::S10k, true, 2, None)
        .await
        .unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.downloaded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.status, DownloadStatus::PartialSuccess);

    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.status == kartograf::report::SheetStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].godlo, "N-34-130-D-d-2-2");
    assert!(failed[0].message.as_deref().unwrap_or("").contains("500"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_progress_callback_sees_every_sheet() {
    let dir = temp_dir("progress");
    let manager = DownloadManager::new(
        Arc::new(FakeProvider::new()),
        FileStorage::new(&dir, Resolution::R1m),
    );

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_cb = Arc::clone(&seen);

    let start = godlo::parse("N-34-130-D-d-2").unwrap();
    let report = manager
        .download_hierarchy(
            &start,
            Scale::S10k,
            true,
            2,
            Some(Arc::new(move |progress| {
                seen_cb.fetch_add(1, Ordering::Relaxed);
                assert!(progress.current >= 1 && progress.current <= progress.total);
                assert_eq!(progress.total, 4);
            })),
        )
        .await
        .unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(seen.load(Ordering::Relaxed), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_report_json_roundtrip() {
    let dir = temp_dir("reportjson");
    let manager = DownloadManager::new(
        Arc::new(FakeProvider::new()),
        FileStorage::new(&dir, Resolution::R1m),
    );

    let start = godlo::parse("N-34-130-D-d-2").unwrap();
    let report = manager
        .download_hierarchy(&start, Scale::S10k, true, 2, None)
        .await
        .unwrap();

    let report_path = dir.join("report.json");
    report.save_to_file(&report_path).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(parsed["total"], 4);
    assert_eq!(parsed["status"], "Success");
    assert_eq!(parsed["outcomes"].as_array().unwrap().len(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}
