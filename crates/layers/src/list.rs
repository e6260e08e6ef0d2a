//! The active layer list.
//!
//! Order is the rendering order. The list exposes append, removal by index,
//! and adjacent swaps only; a reorder over distance k therefore costs k
//! swaps, which is what the drag controller relies on.
//!
//! Ordering contract:
//! - Every effective mutation emits exactly one `LayerChange`.
//! - No-op calls (a move at the boundary, removal out of range, an unknown
//!   id) emit nothing and change nothing.

use runtime::event_bus::{ChangeBus, ChangeEvent, LayerChange};

use crate::layer::{ActiveLayer, LayerDraft, LayerId};

#[derive(Debug, Default)]
pub struct LayerList {
    layers: Vec<ActiveLayer>,
    changes: ChangeBus,
    next_id: u64,
}

impl LayerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActiveLayer> {
        self.layers.iter()
    }

    pub fn get(&self, id: LayerId) -> Option<&ActiveLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_at(&self, index: usize) -> Option<&ActiveLayer> {
        self.layers.get(index)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn append(&mut self, draft: LayerDraft) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        let index = self.layers.len();
        self.layers.push(ActiveLayer {
            id,
            name: draft.name,
            description: draft.description,
            extent: draft.extent,
            url: draft.url,
            proxy: draft.proxy,
            show: true,
        });
        self.changes.emit(LayerChange::Added { index });
        id
    }

    pub fn remove_at(&mut self, index: usize) -> Option<ActiveLayer> {
        if index >= self.layers.len() {
            return None;
        }
        let layer = self.layers.remove(index);
        self.changes.emit(LayerChange::Removed { index });
        Some(layer)
    }

    /// One step toward the top of the displayed stack: swap with the
    /// successor in rendering order. Returns `false` at the boundary or for
    /// an unknown id.
    pub fn move_up(&mut self, id: LayerId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if index + 1 >= self.layers.len() {
            return false;
        }
        self.layers.swap(index, index + 1);
        self.changes.emit(LayerChange::Moved {
            from: index,
            to: index + 1,
        });
        true
    }

    /// One step toward the bottom of the displayed stack: swap with the
    /// predecessor in rendering order.
    pub fn move_down(&mut self, id: LayerId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if index == 0 {
            return false;
        }
        self.layers.swap(index, index - 1);
        self.changes.emit(LayerChange::Moved {
            from: index,
            to: index - 1,
        });
        true
    }

    pub fn set_show(&mut self, id: LayerId, show: bool) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.layers[index].show == show {
            return false;
        }
        self.layers[index].show = show;
        self.changes.emit(LayerChange::VisibilityChanged { index });
        true
    }

    pub fn drain_changes(&mut self) -> Vec<ChangeEvent> {
        self.changes.drain()
    }
}
