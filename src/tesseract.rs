// src/tesseract.rs
//! Lokální extrakce přes Tesseract (TSV výstup) – náhrada za vzdálený OCR backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::error::ExtractionError;
use crate::extraction::{DEFAULT_DOC_TYPE, ExtractionResult, Extractor};
use crate::region::{ImageSize, Quad, Region};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Ok(String),
    Error(String),
}

/// Nastavení Tesseractu z příkazové řádky.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Cesta / název binárky, "auto" = hledat.
    pub tess_bin: String,
    pub force_local: bool,
    pub tessdata_dir: Option<PathBuf>,
    pub lang: String,
    /// Typ dokumentu, který se přiřadí výsledku (klasifikace není součástí).
    pub doc_type: Option<String>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            tess_bin: "auto".to_string(),
            force_local: false,
            tessdata_dir: None,
            lang: "eng".to_string(),
            doc_type: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    path: PathBuf,
    source: String,
    tessdata_dir: Option<PathBuf>,
    lang: String,
    doc_type: String,
}

impl TesseractExtractor {
    pub fn resolve(cfg: &TesseractConfig) -> Self {
        let (path, source) = resolve_tesseract_path(&cfg.tess_bin, cfg.force_local);
        let tessdata_dir = cfg
            .tessdata_dir
            .clone()
            .or_else(|| find_tessdata_parent_dir(&path));
        Self {
            path,
            source,
            tessdata_dir,
            lang: cfg.lang.clone(),
            doc_type: cfg
                .doc_type
                .clone()
                .unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Odkud binárka pochází (explicitní, lokální složka, PATH…).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tessdata_dir(&self) -> Option<&Path> {
        self.tessdata_dir.as_deref()
    }

    pub fn check(&self) -> ToolStatus {
        check_tesseract(&self.path)
    }

    fn command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.path);

        if let Some(dir) = &self.tessdata_dir {
            let tessdata_subdir = dir.join("tessdata");
            if tessdata_subdir.is_dir() {
                cmd.env("TESSDATA_PREFIX", dir);
                cmd.arg("--tessdata-dir").arg(&tessdata_subdir);
            } else if dir.exists() {
                cmd.env("TESSDATA_PREFIX", dir.parent().unwrap_or(dir));
                cmd.arg("--tessdata-dir").arg(dir);
            }
        }

        cmd.arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .arg("tsv");
        cmd
    }
}

impl Extractor for TesseractExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }

        let (width, height) =
            image::image_dimensions(path).map_err(|source| ExtractionError::Image {
                path: path.to_path_buf(),
                source,
            })?;

        let mut cmd = self.command(path);
        info!(command = %command_to_string("Tesseract", &cmd), "running extraction");

        let output = cmd.output().map_err(|source| ExtractionError::Spawn {
            path: self.path.clone(),
            source,
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Tool {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.lines().next().unwrap_or("").to_string(),
            });
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let content = regions_from_tsv(&tsv);
        info!(regions = content.len(), width, height, "tesseract extraction done");

        Ok(ExtractionResult {
            content,
            image_size: ImageSize::new(width, height),
            doc_type: self.doc_type.clone(),
        })
    }
}

#[derive(Debug)]
struct LineAcc {
    words: Vec<String>,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

/// Převede TSV výstup Tesseractu na regiony – jeden region na řádek textu.
///
/// Slova (level 5) se seskupí podle (block, par, line) v pořadí prvního výskytu;
/// geometrie řádku je obálka jeho slov.
pub fn regions_from_tsv(tsv: &str) -> Vec<Region> {
    let mut order: Vec<(u32, u32, u32)> = Vec::new();
    let mut lines: HashMap<(u32, u32, u32), LineAcc> = HashMap::new();

    for (n, row) in tsv.lines().enumerate() {
        if n == 0 && row.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11..].join("\t");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let nums: Option<Vec<f64>> = cols[1..10].iter().map(|c| c.trim().parse().ok()).collect();
        let Some(nums) = nums else {
            warn!(row = n, "unparsable tesseract TSV row");
            continue;
        };
        // page, block, par, line, word, left, top, width, height
        let key = (nums[1] as u32, nums[2] as u32, nums[3] as u32);
        let (left, top, w, h) = (nums[5], nums[6], nums[7], nums[8]);

        let acc = lines.entry(key).or_insert_with(|| {
            order.push(key);
            LineAcc {
                words: Vec::new(),
                left,
                top,
                right: left + w,
                bottom: top + h,
            }
        });
        acc.words.push(text.to_string());
        acc.left = acc.left.min(left);
        acc.top = acc.top.min(top);
        acc.right = acc.right.max(left + w);
        acc.bottom = acc.bottom.max(top + h);
    }

    order
        .into_iter()
        .filter_map(|key| lines.remove(&key))
        .map(|acc| {
            Region::with_quad(
                acc.words.join(" "),
                Quad::from_rect(acc.left, acc.top, acc.right - acc.left, acc.bottom - acc.top),
            )
        })
        .collect()
}

pub fn command_to_string(label: &str, cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    format!("[{label}] {program} {}", args.join(" "))
}

/// Hledá Tesseract v PATH (bez which crate)
fn find_tesseract_in_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let exe = if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    };
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(exe))
        .find(|p| p.exists())
}

/// Najde Tesseract binárku podle priority:
/// 1) explicitní cesta, 2) `./tesseract` vedle programu, 3) standardní
/// instalace na Windows, 4) PATH, 5) holý název.
pub fn resolve_tesseract_path(tess_bin: &str, force_local: bool) -> (PathBuf, String) {
    if tess_bin != "auto" {
        return (PathBuf::from(tess_bin), "explicitní".to_string());
    }

    let exe_name = if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    };

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        let tess_dir = exe_dir.join("tesseract");
        let candidate = tess_dir.join("bin").join(exe_name);
        if candidate.exists() {
            return (candidate, "lokální-složka/bin".to_string());
        }
        let candidate = tess_dir.join(exe_name);
        if candidate.exists() {
            return (candidate, "lokální-složka".to_string());
        }
    }

    if force_local {
        return (PathBuf::from(exe_name), "lokální-nenalezen".to_string());
    }

    if cfg!(windows) {
        for (dir, label) in [
            (r"C:\Program Files\Tesseract-OCR\tesseract.exe", "windows-instalace"),
            (r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe", "windows-instalace-x86"),
        ] {
            let candidate = PathBuf::from(dir);
            if candidate.exists() {
                return (candidate, label.to_string());
            }
        }
    }

    if let Some(path_tess) = find_tesseract_in_path() {
        return (path_tess, "path".to_string());
    }

    (PathBuf::from(exe_name), "path-fallback".to_string())
}

/// Najde nadřazený adresář obsahující tessdata složku
pub fn find_tessdata_parent_dir(tesseract_path: &Path) -> Option<PathBuf> {
    if let Some(parent) = tesseract_path.parent() {
        // vedle binárky
        if parent.join("tessdata").is_dir() {
            return Some(parent.to_path_buf());
        }

        // ./tesseract/bin/tesseract -> ./tesseract/tessdata, případně share/tessdata
        if let Some(grandparent) = parent.parent() {
            if grandparent.join("tessdata").is_dir() {
                return Some(grandparent.to_path_buf());
            }
            let share = grandparent.join("share");
            if share.join("tessdata").is_dir() {
                return Some(share);
            }
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if current_dir.join("tessdata").is_dir() {
            return Some(current_dir);
        }
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        if prefix.join("tessdata").is_dir() {
            return Some(prefix);
        }
    }

    None
}

fn check_tesseract(path: &Path) -> ToolStatus {
    match Command::new(path).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            ToolStatus::Ok(stdout.lines().next().unwrap_or("").to_string())
        }
        Ok(output) => {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first = stderr.lines().next().unwrap_or("");
            ToolStatus::Error(format!("exit {code}: {first}"))
        }
        Err(e) => ToolStatus::Error(format!("nelze spustit: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t200\t100\t-1\t
5\t1\t1\t1\t1\t1\t10\t5\t40\t12\t95.1\tInvoice
5\t1\t1\t1\t1\t2\t55\t4\t30\t14\t93.0\t2024
4\t1\t1\t1\t2\t0\t10\t30\t60\t12\t-1\t
5\t1\t1\t1\t2\t1\t10\t30\t35\t12\t91.2\tTotal:
5\t1\t1\t1\t2\t2\t48\t31\t22\t11\t90.0\t500
5\t1\t1\t1\t2\t3\t80\t31\t5\t11\t10.0\t
";

    #[test]
    fn words_are_grouped_into_lines() {
        let regions = regions_from_tsv(TSV);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].content, "Invoice 2024");
        assert_eq!(regions[1].content, "Total: 500");

        let q = regions[0].quad().unwrap();
        assert_eq!(q, Quad::from_rect(10.0, 4.0, 75.0, 14.0));
    }

    #[test]
    fn garbage_rows_are_ignored() {
        let regions = regions_from_tsv("5\t1\tx\t1\t1\t1\t0\t0\t1\t1\t90\tword\nnot a row\n");
        assert!(regions.is_empty());
    }

    #[test]
    fn explicit_binary_wins() {
        let (path, source) = resolve_tesseract_path("/opt/tess/bin/tesseract", false);
        assert_eq!(path, PathBuf::from("/opt/tess/bin/tesseract"));
        assert_eq!(source, "explicitní");
    }

    #[test]
    fn tessdata_next_to_binary_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::create_dir_all(dir.path().join("tessdata")).unwrap();
        let found = find_tessdata_parent_dir(&bin.join("tesseract"));
        assert_eq!(found.as_deref(), Some(dir.path()));
    }

    #[test]
    fn missing_input_is_reported_before_spawning() {
        let ex = TesseractExtractor::resolve(&TesseractConfig {
            tess_bin: "/definitely/not/tesseract".to_string(),
            ..TesseractConfig::default()
        });
        let err = ex.extract(Path::new("/nonexistent/page.png")).unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(_)));
    }
}
