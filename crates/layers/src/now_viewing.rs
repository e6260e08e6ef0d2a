//! The now-viewing projection: the ordered, user-facing mirror of the
//! active layer list.
//!
//! Ordering contract:
//! - Entry order is always the reverse of the layer list's rendering order
//!   (most-recently-added first).
//! - The projection is rebuilt wholesale on every list change, never
//!   patched incrementally; rebuilding is the only way its order may move.

use catalog::document;

use crate::layer::{ActiveLayer, LayerId};
use crate::list::LayerList;

#[derive(Debug, Clone, PartialEq)]
pub struct NowViewingEntry {
    pub title: String,
    pub show: bool,
    /// Back-reference into the layer list.
    pub layer: LayerId,
}

#[derive(Debug, Default)]
pub struct NowViewing {
    entries: Vec<NowViewingEntry>,
}

impl NowViewing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[NowViewingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_for(&self, layer: LayerId) -> Option<&NowViewingEntry> {
        self.entries.iter().find(|e| e.layer == layer)
    }

    /// Rebuild from the current list state. Each entry's `show` comes from
    /// the layer's current visibility flag; titles prefer an explicit
    /// description title over the synthesized fallback.
    pub fn rebuild(&mut self, list: &LayerList) {
        self.entries.clear();
        for layer in list.iter().rev() {
            self.entries.push(NowViewingEntry {
                title: display_title(layer),
                show: layer.show,
                layer: layer.id,
            });
        }
    }

    /// Mirror a visibility flip without disturbing the ordering; everything
    /// else goes through `rebuild`.
    pub fn set_shown(&mut self, layer: LayerId, show: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.layer == layer) {
            entry.show = show;
        }
    }
}

fn display_title(layer: &ActiveLayer) -> String {
    if let Some(title) = document::title(&layer.description) {
        return title.to_string();
    }
    if !layer.name.is_empty() {
        return layer.name.clone();
    }
    match &layer.url {
        Some(url) => url.clone(),
        None => "(untitled)".to_string(),
    }
}
