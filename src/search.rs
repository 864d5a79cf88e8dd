//! Search box state: query, suggestion list, keyboard selection
//!
//! Rendering lives in `ui::search_bar`; this is the part worth testing.
//! Committing a term hands it to a [`LocationSearch`] capability, normally
//! the map handle.

use crate::traits::LocationSearch;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// Places whose name contains `query`, ignoring case, in list order
///
/// A blank query matches nothing.
pub fn filter_suggestions(places: &[String], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    places
        .iter()
        .filter(|place| place.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub struct SearchBox {
    places: Vec<String>,
    query: String,
    suggestions: Vec<String>,
    open: bool,
    selected: Option<usize>,
    target: Option<Arc<dyn LocationSearch>>,
}

impl SearchBox {
    pub fn new(places: Vec<String>) -> Self {
        Self {
            places,
            query: String::new(),
            suggestions: Vec::new(),
            open: false,
            selected: None,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Arc<dyn LocationSearch>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn set_target(&mut self, target: Arc<dyn LocationSearch>) {
        self.target = Some(target);
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Whether the suggestion list should be drawn
    pub fn is_open(&self) -> bool {
        self.open && !self.suggestions.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// A keystroke changed the text
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.suggestions = filter_suggestions(&self.places, &self.query);
        self.open = !self.suggestions.is_empty();
        self.selected = None;
    }

    /// Handles a navigation key; returns the committed term on Enter
    pub fn on_key(&mut self, key: SearchKey) -> Option<String> {
        if !self.is_open() {
            return match key {
                SearchKey::Enter if !self.query.trim().is_empty() => {
                    let term = self.query.clone();
                    self.commit(term)
                }
                _ => None,
            };
        }

        let count = self.suggestions.len();
        match key {
            SearchKey::Down => {
                self.selected = Some(match self.selected {
                    Some(i) if i + 1 < count => i + 1,
                    _ => 0,
                });
                None
            }
            SearchKey::Up => {
                self.selected = Some(match self.selected {
                    Some(i) if i > 0 => i - 1,
                    _ => count - 1,
                });
                None
            }
            SearchKey::Enter => match self.selected {
                Some(i) => {
                    let term = self.suggestions[i].clone();
                    self.commit(term)
                }
                None if !self.query.trim().is_empty() => {
                    let term = self.query.clone();
                    self.commit(term)
                }
                None => None,
            },
            SearchKey::Escape => {
                self.close();
                None
            }
        }
    }

    /// The input gained focus: show suggestions again for a non-blank query
    pub fn focus(&mut self) {
        if !self.query.trim().is_empty() {
            self.suggestions = filter_suggestions(&self.places, &self.query);
            self.open = true;
        }
    }

    pub fn click_outside(&mut self) {
        self.close();
    }

    pub fn hover(&mut self, index: usize) {
        if index < self.suggestions.len() {
            self.selected = Some(index);
        }
    }

    pub fn click_suggestion(&mut self, index: usize) -> Option<String> {
        let term = self.suggestions.get(index)?.clone();
        self.commit(term)
    }

    /// Puts `term` in the box, closes the list and searches for it
    pub fn commit(&mut self, term: String) -> Option<String> {
        self.query = term.clone();
        self.close();

        match &self.target {
            Some(target) => {
                if target.search_and_focus(&term).is_none() {
                    log::debug!("Search for '{term}' found nothing on the map");
                }
            }
            None => log::debug!("Search for '{term}' has no target"),
        }
        Some(term)
    }

    fn close(&mut self) {
        self.open = false;
        self.selected = None;
    }
}

impl std::fmt::Debug for SearchBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchBox")
            .field("query", &self.query)
            .field("suggestions", &self.suggestions)
            .field("open", &self.open)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}
