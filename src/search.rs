//! Label search over the entity store.
//!
//! Two modes: *highlight* keeps everything visible and flags matches;
//! *find* shows matches only. A photo matches when any label contains
//! the query case-insensitively; an item matches when any of its photos
//! does. Clicking a label toggles it as the active query.

use std::collections::HashSet;

use crate::models::EntityId;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Highlight,
    Find,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: Option<String>,
    pub mode: SearchMode,
}

impl SearchState {
    /// Label click: set it as the query and force find mode; clicking the
    /// active label again clears the query and reverts to highlight.
    pub fn toggle_label(&mut self, label: &str) {
        if self.query.as_deref() == Some(label) {
            self.query = None;
            self.mode = SearchMode::Highlight;
        } else {
            self.query = Some(label.to_string());
            self.mode = SearchMode::Find;
        }
    }

    pub fn set_query(&mut self, query: Option<String>) {
        self.query = query.filter(|q| !q.is_empty());
    }
}

/// Derived view: which entities are visible and which are flagged.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub visible_photos: HashSet<EntityId>,
    pub visible_items: HashSet<EntityId>,
    pub matched_photos: HashSet<EntityId>,
    pub matched_items: HashSet<EntityId>,
}

pub fn evaluate(store: &EntityStore, state: &SearchState) -> SearchView {
    let mut view = SearchView::default();

    let query = match &state.query {
        Some(q) => q,
        None => {
            for photo in store.photos() {
                view.visible_photos.insert(photo.id.clone());
            }
            for item in store.items() {
                view.visible_items.insert(item.id.clone());
            }
            return view;
        }
    };

    for photo in store.photos() {
        if photo.matches_label(query) {
            view.matched_photos.insert(photo.id.clone());
        }
    }
    for item in store.items() {
        if item
            .photo_ids
            .iter()
            .any(|pid| view.matched_photos.contains(pid))
        {
            view.matched_items.insert(item.id.clone());
        }
    }

    match state.mode {
        SearchMode::Highlight => {
            for photo in store.photos() {
                view.visible_photos.insert(photo.id.clone());
            }
            for item in store.items() {
                view.visible_items.insert(item.id.clone());
            }
        }
        SearchMode::Find => {
            view.visible_photos = view.matched_photos.clone();
            view.visible_items = view.matched_items.clone();
        }
    }
    view
}
