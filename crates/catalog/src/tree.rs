//! The browsable catalog tree.
//!
//! Nodes are materialized from source documents (bundled catalog files,
//! user-added services, drag-and-drop imports) and from capability fetches
//! issued lazily the first time a category is opened. The tree never performs
//! I/O: expanding a node submits a request onto a deterministic fetch queue,
//! the host performs the fetch out-of-band, and completion is applied back by
//! request key.

use std::collections::BTreeMap;

use runtime::fetch_queue::{FetchQueue, FetchTicket};
use serde_json::Value;

use crate::document;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// Where a node sits in the browse hierarchy.
///
/// Collections are top-level groupings, categories are services whose layers
/// are fetched on demand, leaves are enableable layers. Only categories ever
/// issue capability fetches.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Collection,
    Category,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    Malformed(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "capability fetch failed: {msg}"),
            FetchError::Malformed(msg) => write!(f, "capability document malformed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Lifecycle of a node's child list.
///
/// `Failed` is deliberately explicit and retryable: re-expanding a failed
/// node re-submits the fetch instead of caching the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenState {
    NotRequested,
    Loading,
    Loaded,
    Failed(FetchError),
}

/// One capability fetch for the host to perform.
///
/// `key` is the blake3 hash of the requesting node's source description, so
/// identical descriptions dedupe to one in-flight fetch and completion fans
/// out to every waiting node.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityRequest {
    pub key: String,
    pub description: Value,
}

impl CapabilityRequest {
    /// Where the host should fetch from, when the description names a
    /// service base.
    pub fn url(&self) -> Option<String> {
        crate::services::capabilities_url(&self.description)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub is_open: bool,
    pub is_enabled: bool,
    pub is_shown: bool,
    pub description: Value,
    children_state: ChildrenState,
    children: Vec<NodeId>,
}

impl CatalogNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn state(&self) -> &ChildrenState {
        &self.children_state
    }

    pub fn is_loading(&self) -> bool {
        self.children_state == ChildrenState::Loading
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }
}

#[derive(Debug)]
struct PendingFetch {
    ticket: FetchTicket,
    waiters: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct CatalogTree {
    nodes: BTreeMap<NodeId, CatalogNode>,
    roots: Vec<NodeId>,
    next_id: u64,
    fetches: FetchQueue<CapabilityRequest>,
    pending: BTreeMap<String, PendingFetch>,
}

impl CatalogTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&CatalogNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append a top-level collection; its inline `Layer` entries materialize
    /// eagerly as categories (and their inline entries as leaves).
    pub fn add_collection(&mut self, description: Value) -> NodeId {
        let id = self.create_node(description, NodeKind::Collection);
        self.roots.push(id);
        self.build_inline_children(id);
        id
    }

    /// Append a top-level category (a user-added service). Opening it later
    /// triggers the usual capability fetch.
    pub fn add_category(&mut self, description: Value) -> NodeId {
        let id = self.create_node(description, NodeKind::Category);
        self.roots.push(id);
        self.build_inline_children(id);
        id
    }

    /// Merge a named collection into the tree.
    ///
    /// If a root with the same name exists, the new data deep-merges into it
    /// in place and its immediate children are rebuilt from the merged child
    /// list; otherwise the collection is appended. Importing the same source
    /// twice therefore never duplicates it.
    pub fn merge_top_level(&mut self, description: Value) -> NodeId {
        let existing = document::name(&description)
            .and_then(|name| self.find_root_by_name(name));

        let Some(id) = existing else {
            return self.add_collection(description);
        };

        let children: Vec<NodeId> = self
            .nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children.clear();
            document::deep_merge(&mut node.description, &description);
            if let Some(name) = document::name(&node.description) {
                node.name = name.to_string();
            }
            node.children_state = ChildrenState::NotRequested;
        }
        self.build_inline_children(id);
        id
    }

    pub fn find_root_by_name(&self, name: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.name == name))
    }

    /// Open a node. The first open of a category whose children were never
    /// requested submits one capability fetch keyed by the node's
    /// description; a failed node re-submits. Opening a loaded node is a
    /// no-op beyond the flag (the result is cached for the node's lifetime).
    pub fn expand(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.is_open = true;

        if node.kind != NodeKind::Category {
            return;
        }
        match node.children_state {
            ChildrenState::NotRequested | ChildrenState::Failed(_) => {}
            ChildrenState::Loading | ChildrenState::Loaded => return,
        }

        let key = capability_key(&node.description);
        let request = CapabilityRequest {
            key: key.clone(),
            description: node.description.clone(),
        };
        node.children_state = ChildrenState::Loading;

        let ticket = self.fetches.submit(key.clone(), request);
        let entry = self.pending.entry(key).or_insert(PendingFetch {
            ticket,
            waiters: Vec::new(),
        });
        if !entry.waiters.contains(&id) {
            entry.waiters.push(id);
        }
    }

    pub fn collapse(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.is_open = false;
        }
    }

    pub fn toggle_open(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.is_open {
            self.collapse(id);
        } else {
            self.expand(id);
        }
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.is_leaf() => {
                node.is_enabled = enabled;
                true
            }
            _ => false,
        }
    }

    pub fn set_shown(&mut self, id: NodeId, shown: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.is_leaf() => {
                node.is_shown = shown;
                true
            }
            _ => false,
        }
    }

    /// Drain capability requests the host has not picked up yet.
    pub fn take_ready_fetches(&mut self) -> Vec<CapabilityRequest> {
        self.fetches
            .take_ready()
            .into_iter()
            .map(|(_, request)| request)
            .collect()
    }

    pub fn has_pending_fetches(&self) -> bool {
        !self.fetches.is_empty()
    }

    /// Deliver the outcome of a capability fetch to every node waiting on
    /// `key`. Returns the nodes that changed.
    ///
    /// On success the payload is parsed as a catalog fragment: the fragment's
    /// name replaces the node's, and the children are rebuilt from the
    /// fragment's child list with one level of hierarchy flattening: an
    /// entry that itself carries a `Layer` array contributes its own children
    /// directly, and deeper nesting is not recursed into. Arbitrary-depth
    /// hierarchies are unsupported by the rest of the tree model, so the
    /// flattening is an explicit policy here rather than something callers
    /// may rely on generalizing.
    ///
    /// On failure the children stay empty and the node parks in the
    /// retryable `Failed` state; re-expanding re-triggers the fetch. A
    /// completion for a node that is no longer loading (e.g. the tree was
    /// rebuilt while the fetch was in flight) is ignored.
    pub fn apply_capabilities(
        &mut self,
        key: &str,
        result: Result<Value, FetchError>,
    ) -> Vec<NodeId> {
        self.fetches.complete(key);
        let waiters = match self.pending.remove(key) {
            Some(pending) => pending.waiters,
            None => return Vec::new(),
        };

        let mut affected = Vec::new();
        for id in waiters {
            let still_loading = self
                .nodes
                .get(&id)
                .is_some_and(|n| n.children_state == ChildrenState::Loading);
            if !still_loading {
                continue;
            }

            match &result {
                Ok(fragment) => self.populate_from_fragment(id, fragment),
                Err(err) => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        tracing::warn!("loading children of {:?} failed: {err}", node.name);
                        node.children_state = ChildrenState::Failed(err.clone());
                    }
                }
            }
            affected.push(id);
        }
        affected
    }

    /// Discard the whole tree, cancelling queued fetches. Used when the
    /// catalog is replaced wholesale on reload.
    pub fn clear(&mut self) {
        for pending in self.pending.values() {
            self.fetches.cancel(pending.ticket);
        }
        self.pending.clear();
        self.nodes.clear();
        self.roots.clear();
    }

    fn create_node(&mut self, description: Value, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let name = document::name(&description)
            .or_else(|| document::title(&description))
            .unwrap_or_default()
            .to_string();

        self.nodes.insert(
            id,
            CatalogNode {
                id,
                name,
                kind,
                is_open: false,
                is_enabled: false,
                is_shown: true,
                description,
                children_state: ChildrenState::NotRequested,
                children: Vec::new(),
            },
        );
        id
    }

    /// Materialize children present inline in a node's description. A node
    /// with inline children is `Loaded` from the start and never fetches;
    /// one without stays `NotRequested` (categories fetch lazily,
    /// collections and leaves simply have no children).
    fn build_inline_children(&mut self, parent_id: NodeId) {
        let Some(parent) = self.nodes.get(&parent_id) else {
            return;
        };
        let parent_kind = parent.kind;
        let parent_description = parent.description.clone();
        let entries: Vec<Value> = document::layers(&parent_description)
            .cloned()
            .unwrap_or_default();

        if entries.is_empty() {
            // Categories stay NotRequested so the first open fetches;
            // collections and leaves simply have nothing to load.
            if parent_kind != NodeKind::Category {
                if let Some(node) = self.nodes.get_mut(&parent_id) {
                    node.children_state = ChildrenState::Loaded;
                }
            }
            return;
        }

        let child_kind = match parent_kind {
            NodeKind::Collection => NodeKind::Category,
            NodeKind::Category | NodeKind::Leaf => NodeKind::Leaf,
        };

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let description = if child_kind == NodeKind::Leaf {
                document::inherit(&entry, &parent_description)
            } else {
                entry
            };
            let child = self.create_node(description, child_kind);
            if child_kind == NodeKind::Category {
                self.build_inline_children(child);
            } else if let Some(leaf) = self.nodes.get_mut(&child) {
                leaf.children_state = ChildrenState::Loaded;
            }
            children.push(child);
        }

        if let Some(node) = self.nodes.get_mut(&parent_id) {
            node.children = children;
            node.children_state = ChildrenState::Loaded;
        }
    }

    fn populate_from_fragment(&mut self, id: NodeId, fragment: &Value) {
        let old_children: Vec<NodeId> = match self.nodes.get(&id) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in old_children {
            self.remove_subtree(child);
        }

        let parent_description = match self.nodes.get(&id) {
            Some(node) => node.description.clone(),
            None => return,
        };
        let mut leaf_descriptions: Vec<Value> = Vec::new();
        for entry in document::layers(fragment).cloned().unwrap_or_default() {
            match document::layers(&entry) {
                // Hoist one level: the entry's own children become our
                // immediate children. Deeper nesting is not recursed into.
                Some(sub_entries) => leaf_descriptions.extend(sub_entries.iter().cloned()),
                None => leaf_descriptions.push(entry),
            }
        }

        let mut children = Vec::with_capacity(leaf_descriptions.len());
        for entry in leaf_descriptions {
            let description = document::inherit(&entry, &parent_description);
            let child = self.create_node(description, NodeKind::Leaf);
            if let Some(leaf) = self.nodes.get_mut(&child) {
                leaf.children_state = ChildrenState::Loaded;
            }
            children.push(child);
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            if let Some(name) = document::name(fragment) {
                node.name = name.to_string();
            }
            node.children = children;
            node.children_state = ChildrenState::Loaded;
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        for child in node.children {
            self.remove_subtree(child);
        }
    }
}

/// Stable identity for a capability fetch: the content hash of the
/// requesting node's source description.
pub fn capability_key(description: &Value) -> String {
    let bytes = serde_json::to_vec(description).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}
