/// Deterministic registry of pending out-of-band fetches.
///
/// Key properties:
/// - Submissions drain in insertion order.
/// - A key that is already pending (queued or taken but not completed)
///   dedupes: the duplicate submission returns the existing ticket and its
///   payload is dropped.
/// - Cancellation of a queued item does not perturb the order of the rest;
///   an item already taken by the host cannot be recalled.
///
/// The queue never performs I/O itself. The host drains ready items, does the
/// work out-of-band, and reports completion by key.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(pub u64);

#[derive(Debug)]
struct Item<T> {
    ticket: FetchTicket,
    key: String,
    // Moved out when the host takes the item; the entry stays to keep the
    // key pending until completion.
    payload: Option<T>,
}

#[derive(Debug)]
pub struct FetchQueue<T> {
    next_ticket: u64,
    items: Vec<Item<T>>,
}

impl<T> Default for FetchQueue<T> {
    fn default() -> Self {
        Self {
            next_ticket: 0,
            items: Vec::new(),
        }
    }
}

impl<T> FetchQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of submissions not yet completed (queued or in flight).
    pub fn pending_len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.items.iter().any(|i| i.key == key)
    }

    /// Enqueue a fetch unless `key` is already pending.
    pub fn submit(&mut self, key: impl Into<String>, payload: T) -> FetchTicket {
        let key = key.into();
        if let Some(existing) = self.items.iter().find(|i| i.key == key) {
            return existing.ticket;
        }

        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.items.push(Item {
            ticket,
            key,
            payload: Some(payload),
        });
        ticket
    }

    /// Drain everything the host has not yet taken, in insertion order.
    ///
    /// Taken items stay pending (their keys still dedupe) until `complete`.
    pub fn take_ready(&mut self) -> Vec<(FetchTicket, T)> {
        let mut out = Vec::new();
        for item in &mut self.items {
            if let Some(payload) = item.payload.take() {
                out.push((item.ticket, payload));
            }
        }
        out
    }

    /// Report completion (success or failure) of every pending item with `key`.
    ///
    /// Returns `true` if anything was pending under that key.
    pub fn complete(&mut self, key: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.key != key);
        self.items.len() != before
    }

    /// Cancel a submission that the host has not taken yet.
    ///
    /// Returns `true` if the item was still queued and was removed.
    pub fn cancel(&mut self, ticket: FetchTicket) -> bool {
        let Some(idx) = self
            .items
            .iter()
            .position(|i| i.ticket == ticket && i.payload.is_some())
        else {
            return false;
        };
        self.items.remove(idx);
        true
    }
}
