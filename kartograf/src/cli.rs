//! Definicja i implementacja poleceń CLI
//!
//! Polecenia:
//! - `parse`: informacje o godle, hierarchia, dzieci, potomkowie
//! - `bbox`: zasięg arkusza w EPSG:2180 lub EPSG:4326
//! - `download`: pobieranie NMT z GUGiK (pojedynczy arkusz lub hierarchia)
//! - `grid`: eksport siatki arkuszy do GeoJSON
//! - `missing`: arkusze hierarchii nieobecne w magazynie

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use godlo::{Crs, Godlo, Scale, Uklad};
use rayon::prelude::*;
use tracing::info;

use crate::config::Config;
use crate::download::{DownloadManager, DownloadProgress, FileStorage, ProgressCallback};
use crate::providers::GugikProvider;
use crate::report::{DownloadStatus, SheetStatus};

/// Domyślna liczba równoległych pobrań
const DEFAULT_JOBS: usize = 4;

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and display information about a map sheet
    Parse {
        /// Map sheet identifier (e.g., N-34-130-D, N-34-130-D-d-2-4)
        godlo: String,

        /// Coordinate system of the sheet (1992 or 2000)
        #[arg(long, default_value = "1992")]
        uklad: String,

        /// Display the full hierarchy from this sheet up to 1:1000000
        #[arg(long)]
        hierarchy: bool,

        /// Display direct children of this sheet
        #[arg(long)]
        children: bool,

        /// Display all descendants down to target scale (e.g., 1:10000)
        #[arg(long, value_name = "SCALE")]
        descendants: Option<String>,
    },

    /// Compute the bounding box of a map sheet
    Bbox {
        /// Map sheet identifier
        godlo: String,

        /// Target CRS: EPSG:2180 or EPSG:4326
        #[arg(long, default_value = "EPSG:2180")]
        crs: String,
    },

    /// Download NMT data from GUGiK OpenData as ASC files
    Download {
        /// Map sheet identifier
        godlo: String,

        /// Download all descendants down to target scale (e.g., 1:10000)
        #[arg(long, value_name = "SCALE")]
        scale: Option<String>,

        /// Output directory (default: ./data or KARTOGRAF_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Re-download files that already exist
        #[arg(long)]
        force: bool,

        /// Grid resolution: 1m or 5m (5m only for EVRF2007)
        #[arg(long)]
        resolution: Option<String>,

        /// Vertical CRS: EVRF2007 or KRON86
        #[arg(long)]
        vertical_crs: Option<String>,

        /// Maximum number of concurrent downloads
        #[arg(long)]
        jobs: Option<usize>,

        /// Write a JSON report to this path
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Export a sheet grid as GeoJSON polygons
    Grid {
        /// Map sheet identifier of the grid root
        godlo: String,

        /// Target scale of grid cells (e.g., 1:10000)
        #[arg(long, value_name = "SCALE")]
        scale: String,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// CRS of exported geometries
        #[arg(long, default_value = "EPSG:4326")]
        crs: String,
    },

    /// List sheets of a hierarchy that are not downloaded yet
    Missing {
        /// Map sheet identifier of the hierarchy root
        godlo: String,

        /// Target scale to check (e.g., 1:10000)
        #[arg(long, value_name = "SCALE")]
        scale: String,

        /// Output directory to check (default: ./data)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Grid resolution subdirectory: 1m or 5m
        #[arg(long)]
        resolution: Option<String>,
    },
}

/// Wykonuje polecenie parse
pub fn cmd_parse(
    code: &str,
    uklad: &str,
    hierarchy: bool,
    children: bool,
    descendants: Option<&str>,
) -> Result<()> {
    let uklad: Uklad = uklad.parse()?;
    let arkusz = godlo::parse_with_uklad(code, uklad)?;

    println!("Godlo: {}", arkusz.godlo());
    println!("Scale: {}", arkusz.scale());
    println!("Uklad: {}", arkusz.uklad());
    println!("Components:");
    for (name, value) in arkusz.components().as_pairs() {
        println!("  {name}: {value}");
    }

    if hierarchy {
        println!("\nHierarchy up:");
        for ancestor in arkusz.hierarchy_up()? {
            println!("  {} ({})", ancestor.godlo(), ancestor.scale());
        }
    }

    if children {
        let list = arkusz.children()?;
        println!("\nChildren: {}", list.len());
        for child in &list {
            println!("  {} ({})", child.godlo(), child.scale());
        }
    }

    if let Some(scale_str) = descendants {
        let target: Scale = scale_str.parse()?;
        let list = arkusz.descendants(target)?;
        println!("\nDescendants at {}: {}", target, list.len());
        for descendant in &list {
            println!("  {}", descendant.godlo());
        }
    }

    Ok(())
}

/// Wykonuje polecenie bbox
pub fn cmd_bbox(code: &str, crs: &str) -> Result<()> {
    let arkusz = godlo::parse(code)?;
    let crs: Crs = crs.parse()?;
    let bbox = arkusz.bbox(crs);

    println!("Godlo: {} ({})", arkusz.godlo(), arkusz.scale());
    println!("CRS: {}", bbox.crs);
    println!("min_x: {}", bbox.min_x);
    println!("min_y: {}", bbox.min_y);
    println!("max_x: {}", bbox.max_x);
    println!("max_y: {}", bbox.max_y);
    println!("SW corner: ({}, {})", bbox.min_x, bbox.min_y);
    println!("NE corner: ({}, {})", bbox.max_x, bbox.max_y);

    Ok(())
}

/// Wykonuje polecenie download
#[allow(clippy::too_many_arguments)]
pub async fn cmd_download(
    code: &str,
    scale: Option<&str>,
    output: Option<PathBuf>,
    force: bool,
    resolution: Option<&str>,
    vertical_crs: Option<&str>,
    jobs: Option<usize>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    if let Some(value) = resolution {
        config.resolution = value.parse()?;
    }
    if let Some(value) = vertical_crs {
        config.vertical_crs = value.parse()?;
    }
    config.normalize();

    let arkusz = godlo::parse(code)?;
    let provider = Arc::new(GugikProvider::from_config(&config)?);
    let storage = FileStorage::new(config.output_dir.clone(), config.resolution);
    let manager = DownloadManager::new(provider, storage);
    let skip_existing = !force;

    match scale {
        Some(scale_str) => {
            let target: Scale = scale_str.parse()?;
            let jobs = jobs.unwrap_or(DEFAULT_JOBS);
            let total = manager.count_sheets(&arkusz, target)?;

            println!("=== Download {} -> {} ===", arkusz.godlo(), target);
            println!("Output: {}", config.output_dir.display());
            println!("Resolution: {}", config.resolution.as_str());
            println!("Vertical CRS: {}", config.vertical_crs.as_str());
            println!("Sheets: {total}");
            println!("Jobs: {jobs}");

            let on_progress: ProgressCallback = Arc::new(|progress: &DownloadProgress| {
                println!(
                    "[{}/{}] {} {}",
                    progress.current,
                    progress.total,
                    progress.godlo,
                    status_label(progress.status)
                );
            });

            let report = manager
                .download_hierarchy(&arkusz, target, skip_existing, jobs, Some(on_progress))
                .await?;

            report.display();

            if let Some(path) = report_path {
                report.save_to_file(&path)?;
                println!("Report saved to {}", path.display());
            }

            if report.status == DownloadStatus::Failed {
                anyhow::bail!("all {} downloads failed", report.failed);
            }
        }
        None => {
            let task_manager = manager.clone();
            let task_arkusz = arkusz.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                task_manager.download_sheet(&task_arkusz, skip_existing)
            })
            .await
            .context("download task failed")??;

            let path = outcome
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            match outcome.status {
                SheetStatus::Downloaded => println!("Downloaded {} to {}", outcome.godlo, path),
                SheetStatus::Skipped => println!("{} already exists at {}", outcome.godlo, path),
                SheetStatus::Failed => anyhow::bail!(
                    "download failed: {}",
                    outcome.message.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }

    Ok(())
}

/// Wykonuje polecenie grid
pub fn cmd_grid(code: &str, scale: &str, output: &Path, crs: &str) -> Result<()> {
    let arkusz = godlo::parse(code)?;
    let target: Scale = scale.parse()?;
    let crs: Crs = crs.parse()?;

    let descendants = arkusz.descendants(target)?;
    info!(sheets = descendants.len(), "computing grid extents");

    // Zasięgi liczone równolegle: pełne rozwinięcia bywają duże
    let sheets: Vec<(Godlo, godlo::BBox)> = descendants
        .into_par_iter()
        .map(|g| {
            let bbox = g.bbox(crs);
            (g, bbox)
        })
        .collect();

    crate::export::geojson::export_grid(&sheets, crs, output)?;

    println!(
        "Exported {} sheets to {} (EPSG:{})",
        sheets.len(),
        output.display(),
        crs.epsg()
    );

    Ok(())
}

/// Wykonuje polecenie missing
pub fn cmd_missing(
    code: &str,
    scale: &str,
    output: Option<PathBuf>,
    resolution: Option<&str>,
) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    if let Some(value) = resolution {
        config.resolution = value.parse()?;
    }
    config.normalize();

    let arkusz = godlo::parse(code)?;
    let target: Scale = scale.parse()?;

    let storage = FileStorage::new(config.output_dir.clone(), config.resolution);
    let descendants = arkusz.descendants(target)?;
    let total = descendants.len();

    let missing: Vec<Godlo> = descendants
        .into_iter()
        .filter(|g| !storage.exists(g, crate::download::ASC_EXT))
        .collect();

    for sheet in &missing {
        println!("{}", sheet.godlo());
    }
    println!("Missing: {}/{} sheets", missing.len(), total);

    Ok(())
}

/// Etykieta statusu do wyświetlania postępu
fn status_label(status: SheetStatus) -> &'static str {
    match status {
        SheetStatus::Downloaded => "downloaded",
        SheetStatus::Skipped => "skipped (exists)",
        SheetStatus::Failed => "FAILED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(SheetStatus::Downloaded), "downloaded");
        assert_eq!(status_label(SheetStatus::Skipped), "skipped (exists)");
        assert_eq!(status_label(SheetStatus::Failed), "FAILED");
    }

    #[test]
    fn test_cmd_parse_rejects_bad_uklad() {
        assert!(cmd_parse("N-34", "1965", false, false, None).is_err());
    }

    #[test]
    fn test_cmd_parse_ok() {
        assert!(cmd_parse("N-34-130-D", "1992", true, true, Some("1:25000")).is_ok());
    }

    #[test]
    fn test_cmd_bbox_rejects_bad_crs() {
        assert!(cmd_bbox("N-34", "EPSG:3857").is_err());
        assert!(cmd_bbox("N-34", "EPSG:4326").is_ok());
    }

    #[test]
    fn test_cmd_grid_writes_file() {
        let output = std::env::temp_dir().join("test_cli_grid.geojson");
        cmd_grid("N-34-130-D-d", "1:10000", &output, "EPSG:4326").unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains(r#""id":"N-34-130-D-d-1-1""#));
        std::fs::remove_file(output).ok();
    }
}
