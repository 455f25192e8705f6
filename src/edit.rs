// src/edit.rs
//! Stavový automat editace: nejvýš jeden region je v režimu úprav.

use tracing::info;

use crate::error::RegionError;
use crate::region::RegionList;

/// Rozepsaný text jednoho regionu. Kurzor je index znaku (ne bajtu).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSurface {
    index: usize,
    text: String,
    cursor: usize,
}

impl EditSurface {
    fn new(index: usize, seed: &str) -> Self {
        Self {
            index,
            text: seed.to_string(),
            cursor: seed.chars().count(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(b, _)| b)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_offset(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

/// Klávesy, které editační plocha rozumí. Nezávislé na terminálu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    /// Enter; s modifikátorem pro nový řádek vkládá `\n` místo potvrzení.
    Confirm { line_break: bool },
    Cancel,
    /// Plocha ztratila fokus.
    Blur,
}

/// Co se stalo při přechodu automatu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Started { index: usize },
    Committed { index: usize },
    Cancelled { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing(EditSurface),
}

/// Kurzor editace. Výchozí stav je `Viewing`, koncový stav neexistuje.
#[derive(Debug, Clone, Default)]
pub struct EditCursor {
    state: EditState,
}

impl EditCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn editing_index(&self) -> Option<usize> {
        match &self.state {
            EditState::Viewing => None,
            EditState::Editing(s) => Some(s.index),
        }
    }

    pub fn surface(&self) -> Option<&EditSurface> {
        match &self.state {
            EditState::Viewing => None,
            EditState::Editing(s) => Some(s),
        }
    }

    /// Začne editovat region `index`.
    ///
    /// Pokud se právě edituje jiný region, nejdřív se jeho text potvrdí
    /// (stejně jako při ztrátě fokusu).
    pub fn begin(
        &mut self,
        regions: &mut RegionList,
        index: usize,
    ) -> Result<Vec<EditEvent>, RegionError> {
        let Some(region) = regions.get(index) else {
            return Err(RegionError::OutOfRange {
                index,
                len: regions.len(),
            });
        };
        if self.editing_index() == Some(index) {
            return Ok(Vec::new());
        }
        let seed = region.content.clone();

        let mut events = Vec::new();
        if let Some(committed) = self.commit(regions)? {
            events.push(EditEvent::Committed { index: committed });
        }

        self.state = EditState::Editing(EditSurface::new(index, &seed));
        events.push(EditEvent::Started { index });
        Ok(events)
    }

    /// Zapíše rozepsaný text do regionu. `Ok(None)`, pokud se needitovalo.
    ///
    /// Kurzor se vrací do `Viewing` i při chybě; obsah se pak nemění.
    pub fn commit(&mut self, regions: &mut RegionList) -> Result<Option<usize>, RegionError> {
        let EditState::Editing(surface) = std::mem::take(&mut self.state) else {
            return Ok(None);
        };
        regions.set_content(surface.index, surface.text)?;
        info!(region = surface.index, "edit committed");
        Ok(Some(surface.index))
    }

    /// Zahodí rozepsaný text.
    pub fn cancel(&mut self) -> Option<usize> {
        match std::mem::take(&mut self.state) {
            EditState::Viewing => None,
            EditState::Editing(surface) => Some(surface.index),
        }
    }

    /// Zpracuje klávesu v editační ploše. Mimo editaci nedělá nic.
    pub fn handle_key(
        &mut self,
        regions: &mut RegionList,
        key: EditKey,
    ) -> Result<Option<EditEvent>, RegionError> {
        let EditState::Editing(surface) = &mut self.state else {
            return Ok(None);
        };

        match key {
            EditKey::Char(c) => surface.insert(c),
            EditKey::Backspace => surface.backspace(),
            EditKey::Delete => surface.delete(),
            EditKey::Left => surface.left(),
            EditKey::Right => surface.right(),
            EditKey::Home => surface.home(),
            EditKey::End => surface.end(),
            EditKey::Confirm { line_break: true } => surface.insert('\n'),
            EditKey::Confirm { line_break: false } | EditKey::Blur => {
                return Ok(self
                    .commit(regions)?
                    .map(|index| EditEvent::Committed { index }));
            }
            EditKey::Cancel => {
                return Ok(self.cancel().map(|index| EditEvent::Cancelled { index }));
            }
        }
        Ok(None)
    }
}
