// src/manifest.rs
//! Snapshot editované session jako JSON (obsah + původní geometrie + otisk zdroje).

use std::{
    fs,
    path::Path,
};

use chrono::Local;
use serde::Serialize;

use crate::blake3::compute_blake3;
use crate::error::ExportError;
use crate::region::ImageSize;
use crate::session::DocumentSession;

/// Informace o zdrojovém souboru
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String, // plná filesystem cesta
    pub size: u64,
    pub blake3: String,
}

/// Jeden region ve snapshotu
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RegionEntry {
    pub index: usize,
    pub content: String,
    pub coordinates: Vec<Vec<f64>>,
    /// false = vadná geometrie, ve vieweru se nevykresluje
    pub renderable: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SessionManifest {
    pub source: Option<FileInfo>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub image_size: ImageSize,
    pub exported_at: String,
    pub region_count: usize,
    pub regions: Vec<RegionEntry>,
}

/// Postaví manifest z aktuálního stavu session.
pub fn build_session_manifest(
    session: &DocumentSession,
    source: Option<&Path>,
) -> Result<SessionManifest, ExportError> {
    let source = source.map(file_info).transpose()?;

    let regions: Vec<RegionEntry> = session
        .regions()
        .regions()
        .iter()
        .enumerate()
        .map(|(index, r)| RegionEntry {
            index,
            content: r.content.clone(),
            coordinates: r.coordinates.clone(),
            renderable: r.quad().is_ok(),
        })
        .collect();

    Ok(SessionManifest {
        source,
        doc_type: session.doc_type().to_string(),
        image_size: session.image_size(),
        exported_at: Local::now().to_rfc3339(),
        region_count: regions.len(),
        regions,
    })
}

/// Spočítá FileInfo pro daný soubor
fn file_info(path: &Path) -> Result<FileInfo, ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = fs::metadata(path).map_err(io_err)?.len();
    let hash = compute_blake3(path).map_err(io_err)?;
    Ok(FileInfo {
        path: path.to_string_lossy().to_string(),
        size,
        blake3: hash,
    })
}

/// Zapíše manifest jako pretty JSON.
pub fn write_manifest(manifest: &SessionManifest, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
