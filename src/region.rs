// src/region.rs
//! Model regionů: text + čtyřúhelník ve zdrojovém pixelovém prostoru.

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, RegionError};

/// Výchozí rozměr zdrojového obrázku, pokud ho extrakce nevrátí (A4 při 72 dpi).
pub const DEFAULT_SOURCE_WIDTH: u32 = 596;
pub const DEFAULT_SOURCE_HEIGHT: u32 = 842;

/// Bod ve zdrojovém prostoru (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Čtyři rohy v pořadí levý horní, pravý horní, pravý dolní, levý dolní.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quad {
    /// Osově zarovnaný obdélník (tak vrací regiony Tesseract extrakce).
    pub fn from_rect(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top_left: Point::new(left, top),
            top_right: Point::new(left + width, top),
            bottom_right: Point::new(left + width, top + height),
            bottom_left: Point::new(left, top + height),
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Ověří surové souřadnice z extrakce. Chyba znamená "region se nevykresluje".
    pub fn from_raw(raw: &[Vec<f64>]) -> Result<Self, GeometryError> {
        if raw.len() != 4 {
            return Err(GeometryError::CornerCount(raw.len()));
        }

        let mut corners = [Point::new(0.0, 0.0); 4];
        for (corner, (slot, coord)) in corners.iter_mut().zip(raw).enumerate() {
            if coord.len() != 2 {
                return Err(GeometryError::PointArity {
                    corner,
                    len: coord.len(),
                });
            }
            if !coord[0].is_finite() || !coord[1].is_finite() {
                return Err(GeometryError::NonFinite { corner });
            }
            *slot = Point::new(coord[0], coord[1]);
        }

        let [top_left, top_right, bottom_right, bottom_left] = corners;
        Ok(Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        })
    }

    pub fn to_raw(&self) -> Vec<Vec<f64>> {
        self.corners().iter().map(|p| vec![p.x, p.y]).collect()
    }
}

/// Rozměr obrázku v pixelech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_WIDTH, DEFAULT_SOURCE_HEIGHT)
    }
}

/// Jeden region tak, jak ho vrací extrakce.
///
/// Souřadnice se drží v surové podobě, aby jeden vadný region neshodil
/// deserializaci celého dokumentu; validuje se až při mapování.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, deserialize_with = "lenient_content")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Vec<Vec<f64>>,
}

// `null` nebo jiný typ = prázdný text
fn lenient_content<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

// Tvar se zachová, hodnoty ne: nečíselná složka je NaN, bod jiného typu je
// prázdný, ne-pole je žádný bod. Zamítne je až `Quad::from_raw`.
fn lenient_coordinates<'de, D>(de: D) -> Result<Vec<Vec<f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let serde_json::Value::Array(points) = serde_json::Value::deserialize(de)? else {
        return Ok(Vec::new());
    };
    Ok(points
        .iter()
        .map(|p| match p {
            serde_json::Value::Array(xs) => {
                xs.iter().map(|x| x.as_f64().unwrap_or(f64::NAN)).collect()
            }
            _ => Vec::new(),
        })
        .collect())
}

impl Region {
    pub fn new(content: impl Into<String>, coordinates: Vec<Vec<f64>>) -> Self {
        Self {
            content: content.into(),
            coordinates,
        }
    }

    pub fn with_quad(content: impl Into<String>, quad: Quad) -> Self {
        Self::new(content, quad.to_raw())
    }

    pub fn quad(&self) -> Result<Quad, GeometryError> {
        Quad::from_raw(&self.coordinates)
    }
}

/// Autoritativní seznam regionů jedné session.
///
/// Jediná cesta ke změně obsahu je `set_content`; geometrie je po načtení neměnná.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionList {
    regions: Vec<Region>,
    revision: u64,
}

impl RegionList {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions,
            revision: 0,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Zvyšuje se s každou změnou obsahu nebo výměnou seznamu.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Vymění celý seznam (nový výsledek extrakce).
    pub fn replace(&mut self, regions: Vec<Region>) {
        self.regions = regions;
        self.revision += 1;
    }

    pub fn set_content(&mut self, index: usize, text: impl Into<String>) -> Result<(), RegionError> {
        let len = self.regions.len();
        let region = self
            .regions
            .get_mut(index)
            .ok_or(RegionError::OutOfRange { index, len })?;
        region.content = text.into();
        self.revision += 1;
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<Region> {
        self.regions.clone()
    }
}
