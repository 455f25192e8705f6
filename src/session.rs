// src/session.rs
//! Dokumentová session: vlastní regiony, kurzor editace a stav hledání.
//!
//! Přechody vrací seznam `Effect`; fokus a scrollování provádí front-end,
//! samotný automat o vykreslování nic neví.

use tracing::{info, warn};

use crate::edit::{EditCursor, EditEvent, EditKey};
use crate::error::RegionError;
use crate::export::plain_text;
use crate::extraction::ExtractionResult;
use crate::region::{ImageSize, Region, RegionList};
use crate::search::{Match, SearchState};

/// Vedlejší efekty, které má front-end provést po přechodu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Dát fokus editační ploše regionu.
    FocusEditor { index: usize },
    /// Posunout plátno tak, aby byl výsledek vidět.
    RevealMatch(Match),
    /// Obsah regionu se změnil; k dispozici je nový snapshot.
    ContentCommitted { index: usize },
}

#[derive(Debug, Clone)]
pub struct DocumentSession {
    regions: RegionList,
    image_size: ImageSize,
    doc_type: String,
    edit: EditCursor,
    search: SearchState,
}

impl DocumentSession {
    pub fn new(result: ExtractionResult) -> Self {
        let ExtractionResult {
            content,
            image_size,
            doc_type,
        } = result;

        for (index, region) in content.iter().enumerate() {
            if let Err(e) = region.quad() {
                warn!(region = index, reason = %e, "invalid coordinates, region will not be rendered");
            }
        }
        info!(
            regions = content.len(),
            width = image_size.width,
            height = image_size.height,
            doc_type = %doc_type,
            "document session created"
        );

        Self {
            regions: RegionList::new(content),
            image_size,
            doc_type,
            edit: EditCursor::new(),
            search: SearchState::new(),
        }
    }

    pub fn regions(&self) -> &RegionList {
        &self.regions
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn edit_cursor(&self) -> &EditCursor {
        &self.edit
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Aktuální obsah všech regionů v pořadí.
    pub fn snapshot(&self) -> Vec<Region> {
        self.regions.to_vec()
    }

    pub fn plain_text(&self) -> String {
        plain_text(self.regions.regions())
    }

    fn apply_events(&mut self, events: Vec<EditEvent>) -> Vec<Effect> {
        let mut effects = Vec::new();
        for ev in events {
            match ev {
                EditEvent::Started { index } => effects.push(Effect::FocusEditor { index }),
                EditEvent::Committed { index } => {
                    self.search.reindex(&self.regions);
                    effects.push(Effect::ContentCommitted { index });
                }
                EditEvent::Cancelled { .. } => {}
            }
        }
        effects
    }

    /// Výběr regionu k editaci (klik). Případnou rozdělanou editaci nejdřív potvrdí.
    pub fn begin_edit(&mut self, index: usize) -> Result<Vec<Effect>, RegionError> {
        let events = self.edit.begin(&mut self.regions, index)?;
        Ok(self.apply_events(events))
    }

    pub fn edit_key(&mut self, key: EditKey) -> Result<Vec<Effect>, RegionError> {
        let event = self.edit.handle_key(&mut self.regions, key)?;
        Ok(self.apply_events(event.into_iter().collect()))
    }

    pub fn commit_edit(&mut self) -> Result<Vec<Effect>, RegionError> {
        self.edit_key(EditKey::Blur)
    }

    pub fn cancel_edit(&mut self) -> Option<usize> {
        self.edit.cancel()
    }

    /// Nový dotaz; první výsledek se ukáže.
    pub fn set_query(&mut self, query: impl Into<String>) -> Vec<Effect> {
        self.search.set_query(query, &self.regions);
        self.search
            .current_match()
            .map(|m| vec![Effect::RevealMatch(*m)])
            .unwrap_or_default()
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn next_match(&mut self) -> Vec<Effect> {
        self.search
            .next()
            .map(|m| vec![Effect::RevealMatch(m)])
            .unwrap_or_default()
    }

    pub fn prev_match(&mut self) -> Vec<Effect> {
        self.search
            .prev()
            .map(|m| vec![Effect::RevealMatch(m)])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Quad;

    fn session() -> DocumentSession {
        DocumentSession::new(ExtractionResult {
            content: vec![
                Region::with_quad("Invoice 2024", Quad::from_rect(0.0, 0.0, 100.0, 20.0)),
                Region::with_quad("Total: 500", Quad::from_rect(0.0, 30.0, 100.0, 20.0)),
            ],
            image_size: ImageSize::new(200, 100),
            doc_type: "Facture".to_string(),
        })
    }

    #[test]
    fn begin_edit_requests_focus() {
        let mut s = session();
        assert_eq!(s.begin_edit(0).unwrap(), vec![Effect::FocusEditor { index: 0 }]);
    }

    #[test]
    fn commit_reindexes_search() {
        let mut s = session();
        s.set_query("total");
        assert_eq!(s.search().matches().len(), 1);

        s.begin_edit(1).unwrap();
        for _ in 0.."Total: 500".len() {
            s.edit_key(EditKey::Backspace).unwrap();
        }
        for c in "Sum 500".chars() {
            s.edit_key(EditKey::Char(c)).unwrap();
        }
        let effects = s.edit_key(EditKey::Confirm { line_break: false }).unwrap();

        assert_eq!(effects, vec![Effect::ContentCommitted { index: 1 }]);
        assert!(s.search().matches().is_empty());
        assert_eq!(s.snapshot()[1].content, "Sum 500");
    }

    #[test]
    fn typing_does_not_touch_search_until_commit() {
        let mut s = session();
        s.set_query("invoice");
        s.begin_edit(0).unwrap();
        s.edit_key(EditKey::Home).unwrap();
        s.edit_key(EditKey::Delete).unwrap();
        assert_eq!(s.search().matches().len(), 1);
        assert_eq!(s.regions().regions()[0].content, "Invoice 2024");
    }

    #[test]
    fn switching_edit_emits_commit_then_focus() {
        let mut s = session();
        s.begin_edit(0).unwrap();
        let effects = s.begin_edit(1).unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::ContentCommitted { index: 0 },
                Effect::FocusEditor { index: 1 }
            ]
        );
    }

    #[test]
    fn navigation_reveals_matches() {
        let mut s = session();
        let first = s.set_query("0");
        assert_eq!(
            first,
            vec![Effect::RevealMatch(Match { region_index: 0, start: 9, end: 10 })]
        );
        assert_eq!(s.search().matches().len(), 3);
        let back = s.prev_match();
        assert_eq!(
            back,
            vec![Effect::RevealMatch(Match { region_index: 1, start: 9, end: 10 })]
        );
    }

    #[test]
    fn cancel_leaves_snapshot_unchanged() {
        let mut s = session();
        let before = s.snapshot();
        s.begin_edit(0).unwrap();
        s.edit_key(EditKey::Char('!')).unwrap();
        assert_eq!(s.cancel_edit(), Some(0));
        assert_eq!(s.snapshot(), before);
    }
}
