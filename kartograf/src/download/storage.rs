//! Hierarchiczne przechowywanie pobranych plików
//!
//! Pliki układane są w katalogi według rozdzielczości i składowych godła,
//! np. `data/1m/N-34/130/D/d/2/4/N-34-130-D-d-2-4.asc`. Zapisy są atomowe
//! (plik tymczasowy + rename), a obok pliku trafia sidecar `.b3sum`
//! z sumą blake3 używaną przy pomijaniu istniejących plików.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use godlo::Godlo;
use tracing::warn;

use crate::providers::gugik::Resolution;

/// Magazyn plików z danymi NMT
#[derive(Debug, Clone)]
pub struct FileStorage {
    output_dir: PathBuf,
    resolution: Resolution,
}

impl FileStorage {
    pub fn new(output_dir: impl Into<PathBuf>, resolution: Resolution) -> Self {
        Self {
            output_dir: output_dir.into(),
            resolution,
        }
    }

    /// Katalog bazowy magazynu
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Ścieżka pliku dla godła i rozszerzenia.
    ///
    /// Pierwsze dwie składowe tworzą katalog bazowy (`N-34`), kolejne
    /// schodzą w podkatalogi.
    pub fn path_for(&self, arkusz: &Godlo, ext: &str) -> PathBuf {
        let mut dir = self.output_dir.join(self.resolution.as_str());

        let parts: Vec<&str> = arkusz.godlo().split('-').collect();
        if parts.len() >= 2 {
            dir = dir.join(format!("{}-{}", parts[0], parts[1]));
            for part in &parts[2..] {
                dir = dir.join(part);
            }
        }

        dir.join(format!("{}{}", arkusz.godlo(), ext))
    }

    /// Czy plik dla godła istnieje
    pub fn exists(&self, arkusz: &Godlo, ext: &str) -> bool {
        self.path_for(arkusz, ext).exists()
    }

    /// Tworzy katalog dla godła i zwraca jego ścieżkę
    pub fn ensure_dir(&self, arkusz: &Godlo, ext: &str) -> std::io::Result<PathBuf> {
        let path = self.path_for(arkusz, ext);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Zapisuje zawartość atomowo (plik tymczasowy + rename)
    pub fn write_atomic(
        &self,
        arkusz: &Godlo,
        content: &[u8],
        ext: &str,
    ) -> std::io::Result<PathBuf> {
        let target = self.ensure_dir(arkusz, ext)?;
        let temp = temp_path(&target);

        let result = std::fs::write(&temp, content).and_then(|_| std::fs::rename(&temp, &target));

        if result.is_err() && temp.exists() {
            let _ = std::fs::remove_file(&temp);
        }
        result.map(|_| target)
    }

    /// Zapisuje sidecar `.b3sum` z sumą kontrolną pliku
    pub fn write_checksum(&self, path: &Path) -> std::io::Result<()> {
        let checksum = compute_file_checksum(path)?;
        std::fs::write(checksum_path(path), checksum)
    }

    /// Weryfikuje plik względem sidecara.
    ///
    /// `None` gdy sidecar nie istnieje, `Some(false)` przy niezgodności.
    pub fn verify_checksum(&self, path: &Path) -> Option<bool> {
        let sidecar = checksum_path(path);
        let expected = std::fs::read_to_string(&sidecar).ok()?;

        match compute_file_checksum(path) {
            Ok(actual) => Some(actual == expected.trim()),
            Err(e) => {
                warn!(path = %path.display(), "checksum failed: {e}");
                Some(false)
            }
        }
    }

    /// Zbiera rekurencyjnie pliki o danym rozszerzeniu w katalogu magazynu
    pub fn collect_files(&self, ext: &str) -> std::io::Result<Vec<PathBuf>> {
        let root = self.output_dir.join(self.resolution.as_str());
        let mut files = Vec::new();
        if root.exists() {
            collect_files_into(&root, ext.trim_start_matches('.'), &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

fn collect_files_into(dir: &Path, ext: &str, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files_into(&path, ext, out)?;
        } else if path.extension().map_or(false, |e| e == ext) {
            out.push(path);
        }
    }
    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    target.with_file_name(format!("{file_name}.tmp"))
}

fn checksum_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    target.with_file_name(format!("{file_name}.b3sum"))
}

/// Suma blake3 pliku, zapisywana heksadecymalnie
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize().as_bytes()))
}
