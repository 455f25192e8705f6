// src/mapper.rs
//! Přepočet zdrojové geometrie na pevné plátno (viewport).

use crate::error::GeometryError;
use crate::region::{ImageSize, Point, Quad};

/// Kanonická velikost plátna v logických pixelech.
pub const VIEWPORT_WIDTH: u32 = 800;
pub const VIEWPORT_HEIGHT: u32 = 1130;

/// Minimální šířka/výška boxu, aby i degenerovaná detekce šla kliknout.
pub const MIN_BOX_SIZE: i64 = 5;

/// Osově zarovnaný box na plátně.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportBox {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl ViewportBox {
    pub fn right(&self) -> i64 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.top.saturating_add(self.height)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

/// Velikost cílového plátna.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
    }
}

/// Mez souřadnic na plátně; extrémní (ale konečné) hodnoty se na ni ořežou,
/// takže rozdíly rohů se vždy vejdou do `i64`.
pub const MAX_CANVAS_COORD: i64 = i32::MAX as i64;

// Zaokrouhlení s polovinou nahoru (i pro záporné hodnoty), stejně jako na plátně v prohlížeči.
fn round_half_up(v: f64) -> i64 {
    let limit = MAX_CANVAS_COORD as f64;
    (v + 0.5).floor().clamp(-limit, limit) as i64
}

fn scale_point(p: Point, scale_x: f64, scale_y: f64) -> (i64, i64) {
    (round_half_up(p.x * scale_x), round_half_up(p.y * scale_y))
}

/// Namapuje čtyřúhelník ze zdrojového obrázku na plátno.
///
/// Osy se škálují nezávisle (poměr stran se nezachovává). Z naškálovaných rohů
/// se vezme levý horní roh, šířka podle horní hrany a výška podle levé hrany,
/// obojí s minimem `MIN_BOX_SIZE`.
pub fn map_to_viewport(
    quad: &Quad,
    source: ImageSize,
    viewport: Viewport,
) -> Result<ViewportBox, GeometryError> {
    if source.width == 0 || source.height == 0 {
        return Err(GeometryError::EmptySource {
            width: source.width as f64,
            height: source.height as f64,
        });
    }

    let scale_x = viewport.width as f64 / source.width as f64;
    let scale_y = viewport.height as f64 / source.height as f64;

    let (tl_x, tl_y) = scale_point(quad.top_left, scale_x, scale_y);
    let (tr_x, _) = scale_point(quad.top_right, scale_x, scale_y);
    let (_, bl_y) = scale_point(quad.bottom_left, scale_x, scale_y);

    Ok(ViewportBox {
        left: tl_x,
        top: tl_y,
        width: tr_x.saturating_sub(tl_x).max(MIN_BOX_SIZE),
        height: bl_y.saturating_sub(tl_y).max(MIN_BOX_SIZE),
    })
}

/// Varianta pro surové souřadnice z extrakce.
pub fn map_raw_to_viewport(
    raw: &[Vec<f64>],
    source: ImageSize,
    viewport: Viewport,
) -> Result<ViewportBox, GeometryError> {
    let quad = Quad::from_raw(raw)?;
    map_to_viewport(&quad, source, viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn invoice_region_maps_to_expected_box() {
        let quad = Quad::from_rect(0.0, 0.0, 100.0, 20.0);
        let b = map_to_viewport(&quad, ImageSize::new(200, 100), Viewport::default()).unwrap();
        assert_eq!(
            b,
            ViewportBox {
                left: 0,
                top: 0,
                width: 400,
                height: 226
            }
        );
    }

    #[test]
    fn degenerate_quad_gets_minimum_size() {
        let quad = Quad::from_rect(10.0, 10.0, 0.0, 0.0);
        let b = map_to_viewport(&quad, ImageSize::new(800, 1130), Viewport::default()).unwrap();
        assert_eq!(b.left, 10);
        assert_eq!(b.top, 10);
        assert_eq!(b.width, MIN_BOX_SIZE);
        assert_eq!(b.height, MIN_BOX_SIZE);
    }

    #[test]
    fn rounds_halves_up() {
        // 1.5 * 1.0 → 2, -0.5 → 0
        let quad = Quad::from_rect(-0.5, 1.5, 20.0, 20.0);
        let b = map_to_viewport(&quad, ImageSize::new(800, 1130), Viewport::default()).unwrap();
        assert_eq!(b.left, 0);
        assert_eq!(b.top, 2);
    }

    #[test]
    fn zero_source_size_is_rejected() {
        let quad = Quad::from_rect(0.0, 0.0, 1.0, 1.0);
        assert!(map_to_viewport(&quad, ImageSize::new(0, 10), Viewport::default()).is_err());
    }

    #[test]
    fn raw_with_three_points_is_rejected() {
        let raw = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        assert_eq!(
            map_raw_to_viewport(&raw, ImageSize::new(10, 10), Viewport::default()),
            Err(GeometryError::CornerCount(3))
        );
    }

    #[test]
    fn extreme_coordinates_are_clamped() {
        let raw = vec![
            vec![-1e300, 0.0],
            vec![1e300, 0.0],
            vec![1e300, 1e300],
            vec![-1e300, 1e300],
        ];
        let b = map_raw_to_viewport(&raw, ImageSize::new(100, 100), Viewport::default()).unwrap();
        assert_eq!(b.left, -MAX_CANVAS_COORD);
        assert_eq!(b.width, 2 * MAX_CANVAS_COORD);
        assert_eq!(b.height, MAX_CANVAS_COORD);
        assert_eq!(b.right(), MAX_CANVAS_COORD);
        assert!(b.contains(0, 10));
    }

    #[test]
    fn box_edges_saturate() {
        let b = ViewportBox {
            left: i64::MAX - 1,
            top: 0,
            width: 10,
            height: 10,
        };
        assert_eq!(b.right(), i64::MAX);
    }

    proptest! {
        #[test]
        fn box_never_smaller_than_floor(
            pts in proptest::collection::vec((-1e300f64..1e300, -1e300f64..1e300), 4),
            sw in 1u32..5000,
            sh in 1u32..5000,
        ) {
            let raw: Vec<Vec<f64>> = pts.iter().map(|(x, y)| vec![*x, *y]).collect();
            let b = map_raw_to_viewport(&raw, ImageSize::new(sw, sh), Viewport::default()).unwrap();
            prop_assert!(b.width >= MIN_BOX_SIZE);
            prop_assert!(b.height >= MIN_BOX_SIZE);
            prop_assert!(b.left.abs() <= MAX_CANVAS_COORD);
            prop_assert!(b.top.abs() <= MAX_CANVAS_COORD);
        }
    }
}
