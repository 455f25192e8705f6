// src/overlay.rs
//! Skládá jeden průchod vykreslování: boxy regionů, editační plochu
//! a zvýrazněné výsledky hledání. Sám žádný stav nedrží.

use tracing::debug;

use crate::mapper::{Viewport, ViewportBox, map_raw_to_viewport};
use crate::search::{Match, SearchSummary, build_matches};
use crate::session::DocumentSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Plain,
    Match,
    /// Úsek s aktuálním výsledkem hledání.
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub kind: RunKind,
}

impl TextRun {
    fn new(text: String, kind: RunKind) -> Self {
        Self { text, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementBody {
    /// Běžný text regionu (klikem se začne editovat).
    Static(String),
    /// Editační plocha s rozepsaným textem; `cursor` je index znaku.
    Editor { text: String, cursor: usize },
    /// Text rozdělený na úseky podle výsledků hledání.
    Highlighted(Vec<TextRun>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayElement {
    pub index: usize,
    pub bbox: ViewportBox,
    pub body: ElementBody,
}

impl OverlayElement {
    pub fn is_editor(&self) -> bool {
        matches!(self.body, ElementBody::Editor { .. })
    }

    pub fn has_current_match(&self) -> bool {
        match &self.body {
            ElementBody::Highlighted(runs) => runs.iter().any(|r| r.kind == RunKind::Current),
            _ => false,
        }
    }
}

/// Výsledek jednoho průchodu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFrame {
    pub elements: Vec<OverlayElement>,
    /// Regiony vynechané kvůli vadné geometrii.
    pub skipped: Vec<usize>,
    pub search: SearchSummary,
}

impl OverlayFrame {
    pub fn element(&self, index: usize) -> Option<&OverlayElement> {
        self.elements.iter().find(|e| e.index == index)
    }

    /// Nejvýše položený prvek pod bodem (poslední vykreslený vyhrává).
    pub fn hit_test(&self, x: i64, y: i64) -> Option<usize> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.bbox.contains(x, y))
            .map(|e| e.index)
    }

    /// Box, který je třeba ukázat pro daný výsledek hledání.
    pub fn reveal_target(&self, m: &Match) -> Option<ViewportBox> {
        self.element(m.region_index).map(|e| e.bbox)
    }
}

/// Rozdělí text na střídající se obyčejné a zvýrazněné úseky.
///
/// `matches` musí patřit jednomu regionu a být seřazené podle `start`.
/// Překrývající se výsledky se slijí do jednoho úseku; úsek je `Current`,
/// pokud obsahuje aktuální výsledek. Sousední (nepřekrývající se) výsledky
/// zůstávají samostatné.
pub fn highlight_runs(content: &str, matches: &[Match], current: Option<&Match>) -> Vec<TextRun> {
    let chars: Vec<char> = content.chars().collect();
    let slice = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

    // sloučené intervaly (start, end, obsahuje aktuální)
    let mut spans: Vec<(usize, usize, bool)> = Vec::new();
    for m in matches {
        let start = m.start.min(chars.len());
        let end = m.end.min(chars.len());
        if start >= end {
            continue;
        }
        let is_current = current == Some(m);
        match spans.last_mut() {
            Some(last) if start < last.1 => {
                last.1 = last.1.max(end);
                last.2 |= is_current;
            }
            _ => spans.push((start, end, is_current)),
        }
    }

    let mut runs = Vec::new();
    let mut pos = 0;
    for (start, end, is_current) in spans {
        if start > pos {
            runs.push(TextRun::new(slice(pos, start), RunKind::Plain));
        }
        let kind = if is_current {
            RunKind::Current
        } else {
            RunKind::Match
        };
        runs.push(TextRun::new(slice(start, end), kind));
        pos = end;
    }
    if pos < chars.len() {
        runs.push(TextRun::new(slice(pos, chars.len()), RunKind::Plain));
    }
    runs
}

/// Jeden průchod vykreslování nad aktuálním stavem session.
pub fn compose(session: &DocumentSession, viewport: Viewport) -> OverlayFrame {
    let regions = session.regions();
    let search = session.search();
    let editing = session.edit_cursor().surface();

    // Stará data se nikdy nezobrazí: když index nesedí na revizi, spočítá se znovu a bez ukazatele.
    let fresh;
    let (matches, current) = if search.is_active() && search.is_stale(regions) {
        debug!("search index stale during render, recomputing");
        fresh = build_matches(regions.regions(), search.query());
        (fresh.as_slice(), None)
    } else {
        (search.matches(), search.current_match())
    };

    let mut elements = Vec::with_capacity(regions.len());
    let mut skipped = Vec::new();

    for (index, region) in regions.regions().iter().enumerate() {
        let bbox = match map_raw_to_viewport(&region.coordinates, session.image_size(), viewport) {
            Ok(b) => b,
            Err(e) => {
                debug!(region = index, reason = %e, "skipping region");
                skipped.push(index);
                continue;
            }
        };

        let body = match editing {
            Some(surface) if surface.index() == index => ElementBody::Editor {
                text: surface.text().to_string(),
                cursor: surface.cursor(),
            },
            _ => {
                let from = matches.partition_point(|m| m.region_index < index);
                let to = matches.partition_point(|m| m.region_index <= index);
                let own = &matches[from..to];
                if own.is_empty() {
                    ElementBody::Static(region.content.clone())
                } else {
                    ElementBody::Highlighted(highlight_runs(&region.content, own, current))
                }
            }
        };

        elements.push(OverlayElement { index, bbox, body });
    }

    OverlayFrame {
        elements,
        skipped,
        search: search.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditKey;
    use crate::extraction::ExtractionResult;
    use crate::region::{ImageSize, Quad, Region};
    use pretty_assertions::assert_eq;

    fn session(contents: &[&str]) -> DocumentSession {
        let content = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Region::with_quad(*c, Quad::from_rect(0.0, i as f64 * 30.0, 100.0, 20.0)))
            .collect();
        DocumentSession::new(ExtractionResult {
            content,
            image_size: ImageSize::new(200, 100),
            doc_type: "Document".to_string(),
        })
    }

    fn m(start: usize, end: usize) -> Match {
        Match {
            region_index: 0,
            start,
            end,
        }
    }

    #[test]
    fn runs_alternate_plain_and_match() {
        let runs = highlight_runs("a total b", &[m(2, 7)], Some(&m(2, 7)));
        assert_eq!(
            runs,
            vec![
                TextRun::new("a ".into(), RunKind::Plain),
                TextRun::new("total".into(), RunKind::Current),
                TextRun::new(" b".into(), RunKind::Plain),
            ]
        );
    }

    #[test]
    fn overlapping_matches_merge_into_one_run() {
        let runs = highlight_runs("aaa", &[m(0, 2), m(1, 3)], Some(&m(1, 3)));
        assert_eq!(runs, vec![TextRun::new("aaa".into(), RunKind::Current)]);
    }

    #[test]
    fn adjacent_matches_stay_separate() {
        let runs = highlight_runs("abab", &[m(0, 2), m(2, 4)], Some(&m(2, 4)));
        assert_eq!(
            runs,
            vec![
                TextRun::new("ab".into(), RunKind::Match),
                TextRun::new("ab".into(), RunKind::Current),
            ]
        );
    }

    #[test]
    fn static_text_without_search() {
        let s = session(&["Invoice 2024", "Total: 500"]);
        let frame = compose(&s, Viewport::default());
        assert_eq!(frame.elements.len(), 2);
        assert_eq!(frame.elements[0].body, ElementBody::Static("Invoice 2024".into()));
        assert_eq!(frame.search, SearchSummary::Inactive);
    }

    #[test]
    fn only_matching_region_is_highlighted() {
        let mut s = session(&["Invoice 2024", "Total: 500"]);
        s.set_query("total");
        let frame = compose(&s, Viewport::default());
        assert!(matches!(frame.elements[0].body, ElementBody::Static(_)));
        assert!(frame.elements[1].has_current_match());
    }

    #[test]
    fn editing_region_renders_editor_instead_of_highlights() {
        let mut s = session(&["Invoice 2024", "Total: 500"]);
        s.set_query("total");
        s.begin_edit(1).unwrap();
        s.edit_key(EditKey::Char('!')).unwrap();
        let frame = compose(&s, Viewport::default());
        assert_eq!(
            frame.elements[1].body,
            ElementBody::Editor {
                text: "Total: 500!".into(),
                cursor: 11
            }
        );
        assert!(frame.elements[1].is_editor());
    }

    #[test]
    fn malformed_regions_are_skipped_not_fatal() {
        let mut s = session(&["a", "b"]);
        let bad = Region::new("broken", vec![vec![0.0, 0.0]]);
        let mut content = s.snapshot();
        content.insert(1, bad);
        s = DocumentSession::new(ExtractionResult {
            content,
            image_size: ImageSize::new(200, 100),
            doc_type: String::new(),
        });
        let frame = compose(&s, Viewport::default());
        assert_eq!(frame.skipped, vec![1]);
        assert_eq!(
            frame.elements.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
    }

    #[test]
    fn hit_test_prefers_topmost_element() {
        let s = session(&["one", "two"]);
        let frame = compose(&s, Viewport::default());
        assert_eq!(frame.hit_test(10, 10), Some(0));
        assert_eq!(frame.hit_test(10, 340), Some(1));
        assert_eq!(frame.hit_test(790, 1100), None);
    }

    #[test]
    fn zero_results_are_reported_explicitly() {
        let mut s = session(&["one"]);
        s.set_query("zzz");
        let frame = compose(&s, Viewport::default());
        assert_eq!(frame.search, SearchSummary::NoResults);
    }
}
