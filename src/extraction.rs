// src/extraction.rs
//! Rozhraní k externí extrakci (OCR / layout analýza).
//!
//! Jádro dostane jen plochý seznam regionů, rozměr zdrojového obrázku a typ
//! dokumentu. Samotný dokument nikdy neparsuje.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExtractionError;
use crate::region::{ImageSize, Region};
use crate::tesseract::TesseractExtractor;

pub const DEFAULT_DOC_TYPE: &str = "Document";

fn default_doc_type() -> String {
    DEFAULT_DOC_TYPE.to_string()
}

/// Úspěšná odpověď extrakce: `{content, image_size, type}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub content: Vec<Region>,
    #[serde(default)]
    pub image_size: ImageSize,
    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,
}

/// Jedno volání extrakce pro jeden soubor.
pub trait Extractor {
    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError>;
}

/// Rozparsuje odpověď backendu. `{"error": "..."}` se vrací jako `Upstream`.
pub fn parse_response(text: &str, path: &Path) -> Result<ExtractionResult, ExtractionError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| ExtractionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(err) = value.get("error") {
        let msg = err
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(ExtractionError::Upstream(msg));
    }

    serde_json::from_value(value).map_err(|source| ExtractionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Načte uloženou JSON odpověď extrakčního backendu.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl Extractor for JsonExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let result = parse_response(&text, path)?;
        info!(
            path = %path.display(),
            regions = result.content.len(),
            "extraction result loaded"
        );
        Ok(result)
    }
}

/// `.json` → uložená odpověď, cokoliv jiného → obrázek pro Tesseract.
pub struct AutoExtractor {
    pub json: JsonExtractor,
    pub tesseract: TesseractExtractor,
}

impl AutoExtractor {
    pub fn new(tesseract: TesseractExtractor) -> Self {
        Self {
            json: JsonExtractor,
            tesseract,
        }
    }
}

pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl Extractor for AutoExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        if is_json_path(path) {
            self.json.extract(path)
        } else {
            self.tesseract.extract(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::error::GeometryError;

    #[test]
    fn parses_success_shape() {
        let text = r#"{
            "image_size": {"width": 200, "height": 100},
            "content": [
                {"content": "Invoice 2024", "coordinates": [[0,0],[100,0],[100,20],[0,20]]},
                {"content": "Total: 500", "coordinates": [[0,30],[100,30],[100,50],[0,50]]}
            ],
            "type": "Facture"
        }"#;
        let r = parse_response(text, Path::new("x.json")).unwrap();
        assert_eq!(r.content.len(), 2);
        assert_eq!(r.image_size, ImageSize::new(200, 100));
        assert_eq!(r.doc_type, "Facture");
    }

    #[test]
    fn missing_size_and_type_use_defaults() {
        let r = parse_response(r#"{"content": []}"#, Path::new("x.json")).unwrap();
        assert_eq!(r.image_size, ImageSize::new(596, 842));
        assert_eq!(r.doc_type, DEFAULT_DOC_TYPE);
    }

    #[test]
    fn malformed_region_does_not_reject_document() {
        let text = r#"{"content": [
            {"content": "ok", "coordinates": [[0,0],[1,0],[1,1],[0,1]]},
            {"content": "bad", "coordinates": [[0,0]]}
        ], "image_size": {"width": 10, "height": 10}}"#;
        let r = parse_response(text, Path::new("x.json")).unwrap();
        assert_eq!(r.content.len(), 2);
        assert!(r.content[1].quad().is_err());
    }

    #[test]
    fn non_numeric_coordinates_reject_only_their_region() {
        let text = r#"{"content": [
            {"content": "ok", "coordinates": [[0,0],[1,0],[1,1],[0,1]]},
            {"content": "null", "coordinates": null},
            {"content": "text", "coordinates": [[0,0],["x",0],[1,1],[0,1]]},
            {"content": "object", "coordinates": [[0,0],[1,0],{"x": 1, "y": 1},[0,1]]},
            {"content": null, "coordinates": 7}
        ], "image_size": {"width": 10, "height": 10}}"#;
        let r = parse_response(text, Path::new("x.json")).unwrap();
        assert_eq!(r.content.len(), 5);

        assert!(r.content[0].quad().is_ok());
        assert_eq!(r.content[1].quad(), Err(GeometryError::CornerCount(0)));
        assert_eq!(r.content[2].quad(), Err(GeometryError::NonFinite { corner: 1 }));
        assert_eq!(
            r.content[3].quad(),
            Err(GeometryError::PointArity { corner: 2, len: 0 })
        );
        assert_eq!(r.content[4].content, "");
        assert_eq!(r.content[4].quad(), Err(GeometryError::CornerCount(0)));
    }

    #[test]
    fn upstream_error_is_surfaced() {
        let err = parse_response(r#"{"error": "OCR failed"}"#, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, ExtractionError::Upstream(ref m) if m == "OCR failed"));
        assert_eq!(err.to_string(), "Extrakce selhala: OCR failed");
    }

    #[test]
    fn json_extractor_reads_file() {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, r#"{{"content": [{{"content": "a", "coordinates": []}}], "type": "Lettre"}}"#).unwrap();
        let r = JsonExtractor.extract(f.path()).unwrap();
        assert_eq!(r.doc_type, "Lettre");
        assert!(is_json_path(f.path()));
    }

    #[test]
    fn json_extractor_reports_missing_file() {
        let err = JsonExtractor
            .extract(Path::new("/nonexistent/response.json"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(_)));
    }
}
