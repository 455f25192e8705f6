// src/search.rs
//! Hledání napříč regiony a cyklická navigace mezi výsledky.
//!
//! Výsledky se vždy přepočítají celé z `(dotaz, regiony)`; nic se neopravuje
//! inkrementálně. Dokumenty mají desítky až stovky regionů, takže hrubá síla stačí.

use tracing::debug;

use crate::region::{Region, RegionList};

/// Jeden nález dotazu. Offsety jsou ve znacích (Unicode scalar), `end` je exkluzivní.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Match {
    pub region_index: usize,
    pub start: usize,
    pub end: usize,
}

/// Stav hledání pro stavový řádek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSummary {
    /// Žádný (nebo jen bílý) dotaz.
    Inactive,
    NoResults,
    /// `current` je index do seznamu výsledků (od nuly).
    Results { current: usize, total: usize },
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Prázdný nebo jen bílý dotaz znamená "žádné hledání".
pub fn is_active_query(query: &str) -> bool {
    !query.trim().is_empty()
}

/// Najde všechny výskyty dotazu (bez ohledu na velikost písmen) ve všech regionech.
///
/// Kurzor se po nálezu posouvá o jeden znak za začátek, takže se najdou i
/// překrývající se výskyty ("aa" v "aaa" → offsety 0 a 1). Výsledek je seřazen
/// podle `(region_index, start)`.
pub fn build_matches(regions: &[Region], query: &str) -> Vec<Match> {
    if !is_active_query(query) {
        return Vec::new();
    }

    let needle: Vec<char> = query.chars().collect();
    let mut out = Vec::new();

    for (region_index, region) in regions.iter().enumerate() {
        let hay: Vec<char> = region.content.chars().collect();
        if hay.len() < needle.len() {
            continue;
        }

        for start in 0..=hay.len() - needle.len() {
            let window = &hay[start..start + needle.len()];
            if window
                .iter()
                .zip(&needle)
                .all(|(a, b)| chars_eq_ignore_case(*a, *b))
            {
                out.push(Match {
                    region_index,
                    start,
                    end: start + needle.len(),
                });
            }
        }
    }

    out
}

/// Dotaz, výsledky a ukazatel na aktuální výsledek.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    matches: Vec<Match>,
    current: Option<usize>,
    indexed_revision: Option<u64>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        is_active_query(&self.query)
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.current.and_then(|i| self.matches.get(i))
    }

    /// Změní dotaz a hned přepočítá výsledky.
    pub fn set_query(&mut self, query: impl Into<String>, regions: &RegionList) {
        self.query = query.into();
        self.reindex(regions);
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = None;
        self.indexed_revision = None;
    }

    /// Přepočítá výsledky z aktuálního obsahu. Ukazatel se vrací na první výsledek.
    pub fn reindex(&mut self, regions: &RegionList) {
        self.matches = build_matches(regions.regions(), &self.query);
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        self.indexed_revision = Some(regions.revision());
        debug!(
            query = %self.query,
            matches = self.matches.len(),
            revision = regions.revision(),
            "search reindexed"
        );
    }

    /// `true`, pokud se obsah od posledního přepočtu změnil.
    pub fn is_stale(&self, regions: &RegionList) -> bool {
        self.indexed_revision != Some(regions.revision())
    }

    pub fn next(&mut self) -> Option<Match> {
        if self.matches.is_empty() {
            return None;
        }
        let len = self.matches.len();
        let next = self.current.map_or(0, |i| (i + 1) % len);
        self.current = Some(next);
        self.matches.get(next).copied()
    }

    pub fn prev(&mut self) -> Option<Match> {
        if self.matches.is_empty() {
            return None;
        }
        let len = self.matches.len();
        let prev = match self.current {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.current = Some(prev);
        self.matches.get(prev).copied()
    }

    /// Výsledky v jednom regionu (souvislý úsek díky řazení).
    pub fn matches_in_region(&self, region_index: usize) -> &[Match] {
        let from = self
            .matches
            .partition_point(|m| m.region_index < region_index);
        let to = self
            .matches
            .partition_point(|m| m.region_index <= region_index);
        &self.matches[from..to]
    }

    pub fn summary(&self) -> SearchSummary {
        if !self.is_active() {
            return SearchSummary::Inactive;
        }
        match self.current {
            Some(current) => SearchSummary::Results {
                current,
                total: self.matches.len(),
            },
            None => SearchSummary::NoResults,
        }
    }
}
