/// One mutation of the active layer list.
///
/// Indices refer to positions in the list's rendering order at the time the
/// change was applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerChange {
    Added { index: usize },
    Removed { index: usize },
    Moved { from: usize, to: usize },
    VisibilityChanged { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub seq: u64,
    pub change: LayerChange,
}

/// Ordered change notifications for the active layer list.
///
/// Explicit publish/collect instead of implicit observable tracking: the list
/// records every mutation here, and consumers drain the bus after a mutation
/// burst to resynchronize derived views. Single-threaded by design; events
/// are appended on discrete calls and never reordered.
#[derive(Debug, Default)]
pub struct ChangeBus {
    next_seq: u64,
    events: Vec<ChangeEvent>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, change: LayerChange) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.events.push(ChangeEvent { seq, change });
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }
}
