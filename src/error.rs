// src/error.rs
//! Chybové typy jádra. Binárka nad nimi používá `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

/// Chyby modelu regionů.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("Region {index} neexistuje (dokument má {len} regionů)")]
    OutOfRange { index: usize, len: usize },
}

/// Důvody, proč region nelze vykreslit. Nikdy nejsou fatální.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("očekávány 4 rohy, nalezeno {0}")]
    CornerCount(usize),

    #[error("roh {corner} má {len} složek místo 2")]
    PointArity { corner: usize, len: usize },

    #[error("roh {corner} obsahuje nekonečnou nebo NaN souřadnici")]
    NonFinite { corner: usize },

    #[error("neplatná velikost zdrojového obrázku {width}×{height}")]
    EmptySource { width: f64, height: f64 },
}

/// Chyby externí extrakce (OCR backend, uložená JSON odpověď).
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Soubor `{}` neexistuje", .0.display())]
    NotFound(PathBuf),

    #[error("Nelze načíst `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Nelze parsovat odpověď extrakce `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Extrakce selhala: {0}")]
    Upstream(String),

    #[error("Nelze zjistit rozměry obrázku `{}`: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Nelze spustit Tesseract `{}`: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tesseract selhal s exit code {code}: {stderr}")]
    Tool { code: i32, stderr: String },
}

/// Chyby exportu.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(
        "Export do formátu {format} není podporován. Použij export do textu (s) nebo JSON (j)."
    )]
    Unsupported { format: &'static str },

    #[error("Nelze zapsat `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Nelze serializovat export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Chyby životního cyklu workspace (autentizace, otevřený dokument).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("Nepřihlášeno – nejprve zadej přístupový token")]
    NotAuthenticated,

    #[error("Prázdný token nelze použít")]
    EmptyToken,

    #[error("Žádný dokument není otevřen")]
    NoDocument,
}

/// Nahrání dokumentu: buď zamčený workspace, nebo chyba extrakce.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
