// src/export.rs
//! Export editovaného obsahu.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ExportError;
use crate::manifest::{build_session_manifest, write_manifest};
use crate::region::Region;
use crate::session::DocumentSession;

/// Oddělovač regionů v textovém exportu (prázdný řádek).
pub const REGION_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
    /// Věrný export stránky – není implementován.
    Pdf,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Text => "edited-document.txt",
            ExportFormat::Json => "edited-document.json",
            ExportFormat::Pdf => "edited-document.pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Text => "TXT",
            ExportFormat::Json => "JSON",
            ExportFormat::Pdf => "PDF",
        }
    }
}

/// Obsah všech regionů v pořadí, oddělený prázdným řádkem. Geometrie se zahazuje.
pub fn plain_text(regions: &[Region]) -> String {
    regions
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join(REGION_SEPARATOR)
}

/// Zapíše export do `out_dir` a vrátí cestu k vytvořenému souboru.
pub fn export_session(
    session: &DocumentSession,
    format: ExportFormat,
    out_dir: &Path,
    source: Option<&Path>,
) -> Result<PathBuf, ExportError> {
    if format == ExportFormat::Pdf {
        warn!("rich-format export requested but not supported");
        return Err(ExportError::Unsupported {
            format: format.label(),
        });
    }

    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let target = out_dir.join(format.file_name());

    if format == ExportFormat::Json {
        let manifest = build_session_manifest(session, source)?;
        write_manifest(&manifest, &target)?;
    } else {
        fs::write(&target, session.plain_text()).map_err(|source| ExportError::Io {
            path: target.clone(),
            source,
        })?;
    }

    info!(format = format.label(), path = %target.display(), "export written");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionResult;
    use crate::region::{ImageSize, Quad};

    fn session() -> DocumentSession {
        DocumentSession::new(ExtractionResult {
            content: vec![
                Region::with_quad("Invoice 2024", Quad::from_rect(0.0, 0.0, 100.0, 20.0)),
                Region::with_quad("Total: 500", Quad::from_rect(0.0, 30.0, 100.0, 20.0)),
            ],
            image_size: ImageSize::new(200, 100),
            doc_type: "Document".to_string(),
        })
    }

    #[test]
    fn plain_text_joins_with_blank_line() {
        assert_eq!(session().plain_text(), "Invoice 2024\n\nTotal: 500");
        assert_eq!(plain_text(&[]), "");
    }

    #[test]
    fn text_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_session(&session(), ExportFormat::Text, dir.path(), None).unwrap();
        assert_eq!(path.file_name().unwrap(), "edited-document.txt");
        assert_eq!(fs::read(&path).unwrap(), b"Invoice 2024\n\nTotal: 500");
    }

    #[test]
    fn pdf_export_is_unsupported_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_session(&session(), ExportFormat::Pdf, dir.path(), None).unwrap_err();
        assert!(matches!(err, ExportError::Unsupported { format: "PDF" }));
        assert!(err.to_string().contains("není podporován"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
