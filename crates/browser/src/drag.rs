//! Drag-to-reorder for the now-viewing list.
//!
//! The controller runs entirely over display indices (the now-viewing order)
//! and an explicit model of the listing surface's row sequence, so the whole
//! state machine is testable without a rendering surface. States:
//! Idle → Dragging → (Targeting)* → Committed/Cancelled → Idle.
//!
//! The layer list only exposes adjacent swaps, so committing a reorder of
//! distance k applies exactly k swaps.

use foundation::RowBand;
use layers::list::LayerList;
use layers::now_viewing::NowViewing;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DragError {
    /// Only one drag session may exist at a time.
    SessionActive,
    NoSuchRow,
}

impl std::fmt::Display for DragError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DragError::SessionActive => write!(f, "a drag session is already active"),
            DragError::NoSuchRow => write!(f, "drag start on a row that does not exist"),
        }
    }
}

impl std::error::Error for DragError {}

/// One slot in the listing surface's current visual order. The dragged row
/// stays in the sequence (hidden) while the placeholder moves around it,
/// mirroring how the rows actually sit on the surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisplaySlot {
    Row(usize),
    Placeholder,
}

/// Ephemeral state for one drag gesture; discarded at drag end.
#[derive(Debug)]
pub struct DragSession {
    origin: usize,
    row_count: usize,
    placeholder_height: f64,
    slots: Vec<DisplaySlot>,
    target: Option<usize>,
    dragged_hidden: bool,
}

impl DragSession {
    /// Display index the dragged entry had at drag start.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Display index recorded on the placeholder, if any targeting happened.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Placeholder marker height, sized to the dragged row.
    pub fn placeholder_height(&self) -> f64 {
        self.placeholder_height
    }

    /// Current visual order for the embedding to render.
    pub fn slots(&self) -> &[DisplaySlot] {
        &self.slots
    }

    pub fn dragged_hidden(&self) -> bool {
        self.dragged_hidden
    }

    fn position_of_row(&self, row: usize) -> Option<usize> {
        self.slots.iter().position(|s| *s == DisplaySlot::Row(row))
    }

    fn position_of_placeholder(&self) -> Option<usize> {
        self.slots.iter().position(|s| *s == DisplaySlot::Placeholder)
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Begin a drag on the row at `origin`. Rejected while a session exists;
    /// the placeholder is created (sized to the dragged row) but joins the
    /// row sequence only on the first drag-enter.
    pub fn start(
        &mut self,
        origin: usize,
        row_count: usize,
        row_height: f64,
    ) -> Result<(), DragError> {
        if self.session.is_some() {
            return Err(DragError::SessionActive);
        }
        if origin >= row_count {
            return Err(DragError::NoSuchRow);
        }
        self.session = Some(DragSession {
            origin,
            row_count,
            placeholder_height: row_height,
            slots: (0..row_count).map(DisplaySlot::Row).collect(),
            target: None,
            dragged_hidden: false,
        });
        Ok(())
    }

    /// Pointer entered the row at display index `entered`.
    ///
    /// The placeholder is (re)placed immediately before the entered row,
    /// unless it is already the row's immediate predecessor; then it flips
    /// to immediately after, which is what lets the marker walk past a row
    /// instead of jittering against it. The placeholder records the display
    /// index it would displace: the entered row when placed before, the
    /// following row when placed after, clamped to the last display index.
    pub fn drag_enter(&mut self, entered: usize) {
        let Some(session) = &mut self.session else {
            return;
        };
        if entered == session.origin {
            return;
        }
        let Some(entered_pos) = session.position_of_row(entered) else {
            return;
        };
        session.dragged_hidden = true;

        let placeholder_pos = session.position_of_placeholder();
        let insert_before = match placeholder_pos {
            Some(p) => p + 1 != entered_pos,
            None => true,
        };

        session.target = Some(if insert_before {
            entered
        } else {
            match session.slots.get(entered_pos + 1) {
                Some(DisplaySlot::Row(next)) => *next,
                _ => session.row_count - 1,
            }
        });

        if let Some(p) = placeholder_pos {
            session.slots.remove(p);
        }
        let Some(entered_pos) = session.position_of_row(entered) else {
            return;
        };
        let at = if insert_before {
            entered_pos
        } else {
            entered_pos + 1
        };
        session.slots.insert(at.min(session.slots.len()), DisplaySlot::Placeholder);
    }

    /// Drop landed on the placeholder: walk the dragged layer to the
    /// recorded target with adjacent swaps, one per unit of distance. A drop
    /// before any targeting applies nothing.
    ///
    /// Returns the number of swaps applied.
    pub fn drop_on_placeholder(
        &mut self,
        list: &mut LayerList,
        now_viewing: &NowViewing,
    ) -> usize {
        let Some(session) = &self.session else {
            return 0;
        };
        let Some(target) = session.target else {
            return 0;
        };
        let Some(entry) = now_viewing.entries().get(session.origin) else {
            return 0;
        };

        let id = entry.layer;
        let mut index = session.origin;
        let mut swaps = 0;
        while index > target {
            if !list.move_up(id) {
                break;
            }
            index -= 1;
            swaps += 1;
        }
        while index < target {
            if !list.move_down(id) {
                break;
            }
            index += 1;
            swaps += 1;
        }
        swaps
    }

    /// Drag end, fired regardless of drop success: the dragged row's display
    /// is restored, the placeholder is detached, the session discarded. The
    /// caller then rebuilds the now-viewing projection unconditionally,
    /// which applies a committed reorder and discards a cancelled one, since
    /// a cancelled drag never touched the layer list.
    pub fn end(&mut self) -> bool {
        self.session.take().is_some()
    }
}

/// Translate a pointer's vertical position into the display row under it.
///
/// The caller supplies the ordered row bands of the listing surface, keeping
/// target inference decoupled from any particular rendering surface.
pub fn row_at(y: f64, rows: &[RowBand]) -> Option<usize> {
    rows.iter().position(|band| band.contains(y))
}
