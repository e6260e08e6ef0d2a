//! The data-browser view model.
//!
//! Owns the catalog trees, the active layer list, the now-viewing
//! projection, and the drag controller, and mediates between them on
//! discrete UI events. Single-threaded and event-driven: every operation
//! runs to completion before the next, and the only asynchronous work
//! (capability fetches) is handed to the host through the fetch queue and
//! applied back by key.

use std::collections::BTreeMap;

use catalog::document;
use catalog::import::{ImportError, ImportPayload, classify};
use catalog::layer_extent;
use catalog::services::{ServiceRegistry, wfs_feature_url};
use catalog::tree::{CapabilityRequest, CatalogTree, FetchError, NodeId};
use layers::layer::{LayerDraft, LayerId};
use layers::list::LayerList;
use layers::now_viewing::NowViewing;
use runtime::event_bus::LayerChange;
use serde_json::Value;

use crate::drag::{DragController, DragError};
use crate::ports::{
    BingStyle, BrowserHost, GlobeView, ImagerySpec, SceneMode, ScrollSurface, TerrainMode,
};

/// Feature cap for layers whose URL is composed rather than given.
const DEFAULT_FEATURE_COUNT: u32 = 1000;

const BING_BASE_URL: &str = "//dev.virtualearth.net";
const BLACK_MARBLE_URL: &str = "//cesiumjs.org/tilesets/imagery/blackmarble";
const NATURAL_EARTH_URL: &str = "//cesiumjs.org/tilesets/imagery/naturalearthii";
const AUSTRALIAN_TOPO_URL: &str =
    "http://www.ga.gov.au/gis/rest/services/topography/Australian_Topography_WM/MapServer";
const TILE_CREDIT: &str = "© Analytical Graphics, Inc.";

/// Which catalog tree an operation addresses: the composed content tree or
/// the user's own additions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TreeSlot {
    Content,
    User,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewerMode {
    TwoD,
    Ellipsoid,
    Terrain,
}

pub struct DataBrowser {
    pub showing_panel: bool,
    pub showing_map_panel: bool,
    pub add_data_is_open: bool,
    pub now_viewing_is_open: bool,
    pub imagery_is_open: bool,
    pub viewer_selection_is_open: bool,
    add_data_url: String,
    selected_viewer: ViewerMode,
    scene_mode: SceneMode,
    terrain: TerrainMode,

    content: CatalogTree,
    user_content: CatalogTree,
    services: ServiceRegistry,
    layers: LayerList,
    now_viewing: NowViewing,
    drag: DragController,
    /// Leaf → active layer linkage while enabled.
    enabled: BTreeMap<(TreeSlot, NodeId), LayerId>,

    globe: Box<dyn GlobeView>,
    surface: Box<dyn ScrollSurface>,
    host: Box<dyn BrowserHost>,
}

impl DataBrowser {
    pub fn new(
        globe: Box<dyn GlobeView>,
        surface: Box<dyn ScrollSurface>,
        host: Box<dyn BrowserHost>,
    ) -> Self {
        Self {
            showing_panel: false,
            showing_map_panel: false,
            add_data_is_open: false,
            now_viewing_is_open: true,
            imagery_is_open: true,
            viewer_selection_is_open: false,
            add_data_url: String::new(),
            selected_viewer: ViewerMode::Terrain,
            scene_mode: SceneMode::ThreeD,
            terrain: TerrainMode::Streamed,
            content: CatalogTree::new(),
            user_content: CatalogTree::new(),
            services: ServiceRegistry::new(),
            layers: LayerList::new(),
            now_viewing: NowViewing::new(),
            drag: DragController::new(),
            enabled: BTreeMap::new(),
            globe,
            surface,
            host,
        }
    }

    // ---- panel state ----

    /// The data panel and the map panel are mutually exclusive.
    pub fn toggle_panel(&mut self) {
        self.showing_panel = !self.showing_panel;
        if self.showing_panel {
            self.showing_map_panel = false;
        }
    }

    pub fn toggle_map_panel(&mut self) {
        self.showing_map_panel = !self.showing_map_panel;
        if self.showing_map_panel {
            self.showing_panel = false;
        }
    }

    pub fn toggle_add_data(&mut self) {
        self.add_data_is_open = !self.add_data_is_open;
    }

    pub fn toggle_now_viewing(&mut self) {
        self.now_viewing_is_open = !self.now_viewing_is_open;
    }

    pub fn open_imagery(&mut self) {
        self.imagery_is_open = true;
        self.viewer_selection_is_open = false;
    }

    pub fn open_viewer_selection(&mut self) {
        self.imagery_is_open = false;
        self.viewer_selection_is_open = true;
    }

    // ---- catalog composition ----

    /// Compose the initial content tree: the bundled catalog plus each entry
    /// of the other-sources document.
    pub fn load_initial(&mut self, base_catalog: Value, other_sources: Value) {
        self.content.merge_top_level(base_catalog);
        for source in document::layers(&other_sources).cloned().unwrap_or_default() {
            self.content.merge_top_level(source);
        }
    }

    pub fn register_services(&mut self, doc: &Value) {
        if let Some(services) = document::services(doc) {
            self.services.add_services(services);
        }
    }

    pub fn content(&self) -> &CatalogTree {
        &self.content
    }

    pub fn user_content(&self) -> &CatalogTree {
        &self.user_content
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    fn tree(&self, slot: TreeSlot) -> &CatalogTree {
        match slot {
            TreeSlot::Content => &self.content,
            TreeSlot::User => &self.user_content,
        }
    }

    fn tree_mut(&mut self, slot: TreeSlot) -> &mut CatalogTree {
        match slot {
            TreeSlot::Content => &mut self.content,
            TreeSlot::User => &mut self.user_content,
        }
    }

    pub fn toggle_node_open(&mut self, slot: TreeSlot, id: NodeId) {
        self.tree_mut(slot).toggle_open(id);
    }

    /// Capability requests queued by either tree, for the host to perform.
    pub fn take_ready_fetches(&mut self) -> Vec<CapabilityRequest> {
        let mut ready = self.content.take_ready_fetches();
        ready.extend(self.user_content.take_ready_fetches());
        ready
    }

    /// Deliver a capability fetch outcome; whichever tree is waiting on the
    /// key picks it up.
    pub fn apply_capabilities(&mut self, key: &str, result: Result<Value, FetchError>) {
        self.content.apply_capabilities(key, result.clone());
        self.user_content.apply_capabilities(key, result);
    }

    // ---- enable / disable ----

    pub fn toggle_enabled(&mut self, slot: TreeSlot, id: NodeId) {
        let enabled = self.enabled.contains_key(&(slot, id));
        self.set_enabled(slot, id, !enabled);
    }

    /// Enable a catalog leaf (append an active layer built from it) or
    /// disable it (remove the linked layer by index). Enabling an enabled
    /// leaf and disabling a disabled one are both silent no-ops.
    pub fn set_enabled(&mut self, slot: TreeSlot, id: NodeId, enabled: bool) {
        if enabled {
            if self.enabled.contains_key(&(slot, id)) {
                return;
            }
            let Some(node) = self.tree(slot).node(id) else {
                return;
            };
            if !node.is_leaf() {
                return;
            }

            let description = node.description.clone();
            let name = node.name.clone();
            let extent = layer_extent(&description);
            let url = match document::url(&description) {
                Some(url) => Some(url.to_string()),
                None => wfs_feature_url(&description, DEFAULT_FEATURE_COUNT),
            };
            let proxy = document::proxy(&description);

            let layer_id = self.layers.append(
                LayerDraft::new(name, description)
                    .with_extent(extent)
                    .with_url(url)
                    .with_proxy(proxy),
            );
            self.tree_mut(slot).set_enabled(id, true);
            self.enabled.insert((slot, id), layer_id);
        } else {
            let Some(layer_id) = self.enabled.remove(&(slot, id)) else {
                return;
            };
            if let Some(index) = self.layers.index_of(layer_id) {
                self.layers.remove_at(index);
            }
            self.tree_mut(slot).set_enabled(id, false);
        }
        self.flush_layer_changes();
    }

    /// Flip a layer's visibility without disabling it.
    pub fn toggle_shown(&mut self, layer: LayerId) {
        let Some(current) = self.layers.get(layer).map(|l| l.show) else {
            return;
        };
        self.layers.set_show(layer, !current);

        let linked = self
            .enabled
            .iter()
            .find(|(_, v)| **v == layer)
            .map(|(k, _)| *k);
        if let Some((slot, node)) = linked {
            self.tree_mut(slot).set_shown(node, !current);
        }
        self.flush_layer_changes();
    }

    pub fn zoom_to(&mut self, layer: LayerId) {
        let Some(extent) = self.layers.get(layer).and_then(|l| l.extent) else {
            return;
        };
        self.globe.zoom_to(extent);
    }

    pub fn layers(&self) -> &LayerList {
        &self.layers
    }

    pub fn now_viewing(&self) -> &NowViewing {
        &self.now_viewing
    }

    // ---- viewer + base maps ----

    pub fn selected_viewer(&self) -> ViewerMode {
        self.selected_viewer
    }

    /// Switch between 2D, 3D over the ellipsoid, and 3D with streamed
    /// terrain. Engine calls go out only for actual transitions.
    pub fn select_viewer(&mut self, mode: ViewerMode) {
        self.selected_viewer = mode;
        match mode {
            ViewerMode::TwoD => {
                if self.scene_mode != SceneMode::TwoD {
                    self.scene_mode = SceneMode::TwoD;
                    self.globe.set_scene_mode(SceneMode::TwoD);
                }
            }
            ViewerMode::Ellipsoid | ViewerMode::Terrain => {
                if self.scene_mode != SceneMode::ThreeD {
                    self.scene_mode = SceneMode::ThreeD;
                    self.globe.set_scene_mode(SceneMode::ThreeD);
                }
                let terrain = match mode {
                    ViewerMode::Ellipsoid => TerrainMode::Ellipsoid,
                    _ => TerrainMode::Streamed,
                };
                if self.terrain != terrain {
                    self.terrain = terrain;
                    self.globe.set_terrain(terrain);
                }
            }
        }
    }

    pub fn activate_bing_aerial_with_labels(&mut self) {
        self.set_base_imagery(vec![ImagerySpec::BingMaps {
            url: BING_BASE_URL.to_string(),
            style: BingStyle::AerialWithLabels,
        }]);
    }

    pub fn activate_bing_aerial(&mut self) {
        self.set_base_imagery(vec![ImagerySpec::BingMaps {
            url: BING_BASE_URL.to_string(),
            style: BingStyle::Aerial,
        }]);
    }

    pub fn activate_bing_roads(&mut self) {
        self.set_base_imagery(vec![ImagerySpec::BingMaps {
            url: BING_BASE_URL.to_string(),
            style: BingStyle::Road,
        }]);
    }

    pub fn activate_nasa_black_marble(&mut self) {
        self.set_base_imagery(vec![ImagerySpec::TileService {
            url: BLACK_MARBLE_URL.to_string(),
            credit: Some(TILE_CREDIT.to_string()),
        }]);
    }

    pub fn activate_natural_earth_ii(&mut self) {
        self.set_base_imagery(vec![ImagerySpec::TileService {
            url: NATURAL_EARTH_URL.to_string(),
            credit: Some(TILE_CREDIT.to_string()),
        }]);
    }

    /// Natural Earth II underneath the national topographic map service.
    pub fn activate_australian_topography(&mut self) {
        self.set_base_imagery(vec![
            ImagerySpec::TileService {
                url: NATURAL_EARTH_URL.to_string(),
                credit: Some(TILE_CREDIT.to_string()),
            },
            ImagerySpec::ArcGisMapServer {
                url: AUSTRALIAN_TOPO_URL.to_string(),
                proxy: true,
            },
        ]);
    }

    fn set_base_imagery(&mut self, specs: Vec<ImagerySpec>) {
        self.globe.set_base_imagery(&specs);
    }

    // ---- add data ----

    pub fn add_data_url(&self) -> &str {
        &self.add_data_url
    }

    pub fn set_add_data_url(&mut self, url: impl Into<String>) {
        self.add_data_url = url.into();
    }

    /// Load the pending URL as a data source if the host recognizes its
    /// format; otherwise fall back to manual type selection and add it as an
    /// open service category. The pending URL resets either way.
    pub fn add_data_or_service(&mut self) {
        let url = std::mem::take(&mut self.add_data_url);
        if url.is_empty() {
            return;
        }
        if self.host.format_supported(&url) {
            self.host.load_url(&url);
            return;
        }

        let kind = self.host.choose_service_kind(&url);
        let description = serde_json::json!({
            "name": url,
            "base_url": url,
            "type": kind.as_str(),
            "proxy": true
        });
        let id = self.user_content.add_category(description);
        self.user_content.expand(id);
    }

    /// Merge a dropped file into the catalog: collections by name, services
    /// into the registry. Errors degrade to "no visible change" at the
    /// caller after logging.
    pub fn import_json(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ImportError> {
        match classify(file_name, bytes)? {
            ImportPayload::Collections(collections) => {
                for collection in collections {
                    if document::name(&collection).is_none() {
                        tracing::warn!("skipping unnamed collection in {file_name}");
                        continue;
                    }
                    self.content.merge_top_level(collection);
                }
            }
            ImportPayload::Services(services) => {
                self.services.add_services(&services);
            }
        }
        Ok(())
    }

    // ---- now-viewing sync ----

    /// Rebuild the projection from the layer list, preserving the surface's
    /// scroll position best-effort: content height is measured before and
    /// after the entries land and the offset shifts by the delta.
    pub fn sync_now_viewing(&mut self) {
        let before = self.surface.content_height();
        self.now_viewing.rebuild(&self.layers);
        self.surface.entries_rebuilt(self.now_viewing.entries());
        let after = self.surface.content_height();
        self.surface.adjust_scroll(after - before);
    }

    /// Drain layer-list changes: structural changes rebuild the projection,
    /// bare visibility flips patch the affected entries in place.
    fn flush_layer_changes(&mut self) {
        let events = self.layers.drain_changes();
        if events.is_empty() {
            return;
        }
        let structural = events
            .iter()
            .any(|e| !matches!(e.change, LayerChange::VisibilityChanged { .. }));
        if structural {
            self.sync_now_viewing();
            return;
        }
        for event in events {
            if let LayerChange::VisibilityChanged { index } = event.change {
                if let Some(layer) = self.layers.get_at(index) {
                    self.now_viewing.set_shown(layer.id, layer.show);
                }
            }
        }
    }

    // ---- drag reorder ----

    pub fn start_drag(&mut self, display_index: usize, row_height: f64) -> Result<(), DragError> {
        self.drag
            .start(display_index, self.now_viewing.len(), row_height)
    }

    pub fn drag_enter(&mut self, display_index: usize) {
        self.drag.drag_enter(display_index);
    }

    pub fn drop_on_placeholder(&mut self) {
        self.drag.drop_on_placeholder(&mut self.layers, &self.now_viewing);
    }

    /// Fired regardless of drop success. Discards the session, rebuilds the
    /// projection unconditionally (applying a committed reorder, discarding
    /// a cancelled one), and forces a frame so the new order renders.
    pub fn end_drag(&mut self) {
        self.drag.end();
        self.layers.drain_changes();
        self.sync_now_viewing();
        self.globe.force_redraw();
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use catalog::tree::NodeId;
    use foundation::Extent;
    use serde_json::json;

    use super::{DataBrowser, TreeSlot, ViewerMode};
    use crate::drag::DragError;
    use crate::ports::{
        BrowserHost, GlobeView, ImagerySpec, SceneMode, ScrollSurface, ServiceKind, TerrainMode,
    };
    use layers::now_viewing::NowViewingEntry;

    #[derive(Debug, PartialEq)]
    enum GlobeCall {
        BaseImagery(usize),
        SceneMode(SceneMode),
        Terrain(TerrainMode),
        ZoomTo(Extent),
        Redraw,
    }

    #[derive(Clone, Default)]
    struct RecordingGlobe {
        calls: Rc<RefCell<Vec<GlobeCall>>>,
    }

    impl GlobeView for RecordingGlobe {
        fn set_base_imagery(&mut self, layers: &[ImagerySpec]) {
            self.calls
                .borrow_mut()
                .push(GlobeCall::BaseImagery(layers.len()));
        }
        fn set_scene_mode(&mut self, mode: SceneMode) {
            self.calls.borrow_mut().push(GlobeCall::SceneMode(mode));
        }
        fn set_terrain(&mut self, mode: TerrainMode) {
            self.calls.borrow_mut().push(GlobeCall::Terrain(mode));
        }
        fn zoom_to(&mut self, extent: Extent) {
            self.calls.borrow_mut().push(GlobeCall::ZoomTo(extent));
        }
        fn force_redraw(&mut self) {
            self.calls.borrow_mut().push(GlobeCall::Redraw);
        }
    }

    #[derive(Default)]
    struct SurfaceState {
        rows: usize,
        scroll: f64,
    }

    #[derive(Clone, Default)]
    struct PanelSurface {
        state: Rc<RefCell<SurfaceState>>,
    }

    const ROW_HEIGHT: f64 = 24.0;

    impl ScrollSurface for PanelSurface {
        fn content_height(&self) -> f64 {
            self.state.borrow().rows as f64 * ROW_HEIGHT
        }
        fn entries_rebuilt(&mut self, entries: &[NowViewingEntry]) {
            self.state.borrow_mut().rows = entries.len();
        }
        fn adjust_scroll(&mut self, delta: f64) {
            self.state.borrow_mut().scroll += delta;
        }
    }

    #[derive(Clone)]
    struct StubHost {
        supported: bool,
        kind: ServiceKind,
        loaded: Rc<RefCell<Vec<String>>>,
        prompted: Rc<RefCell<Vec<String>>>,
    }

    impl StubHost {
        fn new(supported: bool, kind: ServiceKind) -> Self {
            Self {
                supported,
                kind,
                loaded: Rc::default(),
                prompted: Rc::default(),
            }
        }
    }

    impl BrowserHost for StubHost {
        fn format_supported(&self, _url: &str) -> bool {
            self.supported
        }
        fn load_url(&mut self, url: &str) {
            self.loaded.borrow_mut().push(url.to_string());
        }
        fn choose_service_kind(&mut self, url: &str) -> ServiceKind {
            self.prompted.borrow_mut().push(url.to_string());
            self.kind
        }
    }

    struct Fixture {
        browser: DataBrowser,
        globe: RecordingGlobe,
        surface: PanelSurface,
        host: StubHost,
    }

    fn fixture() -> Fixture {
        fixture_with_host(StubHost::new(false, ServiceKind::Wfs))
    }

    fn fixture_with_host(host: StubHost) -> Fixture {
        let globe = RecordingGlobe::default();
        let surface = PanelSurface::default();
        let browser = DataBrowser::new(
            Box::new(globe.clone()),
            Box::new(surface.clone()),
            Box::new(host.clone()),
        );
        Fixture {
            browser,
            globe,
            surface,
            host,
        }
    }

    /// A collection whose category carries four inline leaves.
    fn catalog_fixture() -> serde_json::Value {
        json!({
            "name": "Data Collection",
            "Layer": [{
                "name": "Inline Service",
                "base_url": "http://example.org/wfs",
                "type": "WFS",
                "Layer": [
                    {"name": "alpha"},
                    {"name": "beta"},
                    {"name": "gamma"},
                    {"name": "delta", "BoundingBox": {"west": 10, "south": -10, "east": 20, "north": 0}}
                ]
            }]
        })
    }

    fn leaf_ids(browser: &DataBrowser) -> Vec<NodeId> {
        let tree = browser.content();
        let root = tree.node(tree.roots()[0]).unwrap();
        let category = tree.node(root.children()[0]).unwrap();
        category.children().to_vec()
    }

    fn loaded_fixture() -> Fixture {
        let mut f = fixture();
        f.browser.load_initial(catalog_fixture(), json!({"Layer": []}));
        f
    }

    fn now_viewing_titles(browser: &DataBrowser) -> Vec<String> {
        browser
            .now_viewing()
            .entries()
            .iter()
            .map(|e| e.title.clone())
            .collect()
    }

    #[test]
    fn panels_are_mutually_exclusive() {
        let mut f = fixture();
        f.browser.toggle_panel();
        assert!(f.browser.showing_panel);
        f.browser.toggle_map_panel();
        assert!(f.browser.showing_map_panel);
        assert!(!f.browser.showing_panel);

        f.browser.open_viewer_selection();
        assert!(f.browser.viewer_selection_is_open);
        assert!(!f.browser.imagery_is_open);
        f.browser.open_imagery();
        assert!(f.browser.imagery_is_open);
        assert!(!f.browser.viewer_selection_is_open);
    }

    #[test]
    fn enable_builds_a_layer_and_projection_mirrors_reversed() {
        let mut f = loaded_fixture();
        let leaves = leaf_ids(&f.browser);

        f.browser.set_enabled(TreeSlot::Content, leaves[0], true);
        f.browser.set_enabled(TreeSlot::Content, leaves[1], true);

        assert_eq!(f.browser.layers().len(), 2);
        assert_eq!(now_viewing_titles(&f.browser), vec!["beta", "alpha"]);

        // The composed feature URL fills in for the missing explicit one.
        let layer = f.browser.layers().get_at(0).unwrap();
        assert_eq!(
            layer.url.as_deref(),
            Some("http://example.org/wfs?service=WFS&version=1.1.0&request=GetFeature&typeName=alpha&maxFeatures=1000&outputFormat=JSON")
        );
    }

    #[test]
    fn enabling_twice_is_a_noop() {
        let mut f = loaded_fixture();
        let leaves = leaf_ids(&f.browser);

        f.browser.set_enabled(TreeSlot::Content, leaves[0], true);
        f.browser.set_enabled(TreeSlot::Content, leaves[0], true);
        assert_eq!(f.browser.layers().len(), 1);
    }

    #[test]
    fn disabling_removes_by_identity_and_twice_is_a_noop() {
        let mut f = loaded_fixture();
        let leaves = leaf_ids(&f.browser);
        f.browser.set_enabled(TreeSlot::Content, leaves[0], true);
        f.browser.set_enabled(TreeSlot::Content, leaves[1], true);

        f.browser.set_enabled(TreeSlot::Content, leaves[0], false);
        assert_eq!(f.browser.layers().len(), 1);
        assert_eq!(now_viewing_titles(&f.browser), vec!["beta"]);

        f.browser.set_enabled(TreeSlot::Content, leaves[0], false);
        assert_eq!(f.browser.layers().len(), 1);
    }

    #[test]
    fn toggle_shown_flips_entry_without_reordering() {
        let mut f = loaded_fixture();
        let leaves = leaf_ids(&f.browser);
        f.browser.set_enabled(TreeSlot::Content, leaves[0], true);
        f.browser.set_enabled(TreeSlot::Content, leaves[1], true);

        let layer = f.browser.now_viewing().entries()[1].layer;
        f.browser.toggle_shown(layer);

        assert_eq!(now_viewing_titles(&f.browser), vec!["beta", "alpha"]);
        assert!(!f.browser.now_viewing().entries()[1].show);
        assert!(!f.browser.layers().get(layer).unwrap().show);
        // Still enabled: visibility is independent of membership.
        assert_eq!(f.browser.layers().len(), 2);
    }

    #[test]
    fn zoom_goes_out_only_with_an_extent() {
        let mut f = loaded_fixture();
        let leaves = leaf_ids(&f.browser);
        f.browser.set_enabled(TreeSlot::Content, leaves[0], true);
        f.browser.set_enabled(TreeSlot::Content, leaves[3], true);

        let bare = f.browser.now_viewing().entries()[1].layer;
        let bounded = f.browser.now_viewing().entries()[0].layer;

        f.browser.zoom_to(bare);
        assert!(f.globe.calls.borrow().is_empty());

        f.browser.zoom_to(bounded);
        assert_eq!(
            *f.globe.calls.borrow(),
            vec![GlobeCall::ZoomTo(Extent::from_degrees(10.0, -10.0, 20.0, 0.0))]
        );
    }

    #[test]
    fn scroll_offset_shifts_by_the_rebuild_delta() {
        let mut f = loaded_fixture();
        let leaves = leaf_ids(&f.browser);

        for leaf in &leaves[..3] {
            f.browser.set_enabled(TreeSlot::Content, *leaf, true);
        }
        // Each rebuild grew the content by one row.
        assert_eq!(f.surface.state.borrow().scroll, 3.0 * ROW_HEIGHT);

        f.browser.set_enabled(TreeSlot::Content, leaves[0], false);
        assert_eq!(f.surface.state.borrow().scroll, 2.0 * ROW_HEIGHT);
    }

    #[test]
    fn drag_commit_reorders_and_cancel_does_not() {
        let mut f = loaded_fixture();
        for leaf in leaf_ids(&f.browser) {
            f.browser.set_enabled(TreeSlot::Content, leaf, true);
        }
        assert_eq!(
            now_viewing_titles(&f.browser),
            vec!["delta", "gamma", "beta", "alpha"]
        );

        // Drag the bottom row to the top and drop.
        f.browser.start_drag(3, ROW_HEIGHT).unwrap();
        f.browser.drag_enter(0);
        f.browser.drop_on_placeholder();
        f.browser.end_drag();
        assert_eq!(
            now_viewing_titles(&f.browser),
            vec!["alpha", "delta", "gamma", "beta"]
        );
        assert_eq!(*f.globe.calls.borrow().last().unwrap(), GlobeCall::Redraw);

        // A cancelled drag (end without drop) changes nothing.
        f.browser.start_drag(2, ROW_HEIGHT).unwrap();
        f.browser.drag_enter(0);
        f.browser.end_drag();
        assert_eq!(
            now_viewing_titles(&f.browser),
            vec!["alpha", "delta", "gamma", "beta"]
        );
    }

    #[test]
    fn only_one_drag_session_at_a_time() {
        let mut f = loaded_fixture();
        for leaf in leaf_ids(&f.browser) {
            f.browser.set_enabled(TreeSlot::Content, leaf, true);
        }

        f.browser.start_drag(0, ROW_HEIGHT).unwrap();
        assert_eq!(
            f.browser.start_drag(1, ROW_HEIGHT),
            Err(DragError::SessionActive)
        );
        f.browser.end_drag();
        assert!(f.browser.start_drag(1, ROW_HEIGHT).is_ok());
    }

    #[test]
    fn viewer_selection_only_emits_transitions() {
        let mut f = fixture();

        f.browser.select_viewer(ViewerMode::Ellipsoid);
        f.browser.select_viewer(ViewerMode::Ellipsoid);
        f.browser.select_viewer(ViewerMode::TwoD);
        f.browser.select_viewer(ViewerMode::Terrain);

        assert_eq!(
            *f.globe.calls.borrow(),
            vec![
                GlobeCall::Terrain(TerrainMode::Ellipsoid),
                GlobeCall::SceneMode(SceneMode::TwoD),
                GlobeCall::SceneMode(SceneMode::ThreeD),
                GlobeCall::Terrain(TerrainMode::Streamed),
            ]
        );
        assert_eq!(f.browser.selected_viewer(), ViewerMode::Terrain);
    }

    #[test]
    fn australian_topography_stacks_two_imagery_layers() {
        let mut f = fixture();
        f.browser.activate_bing_aerial();
        f.browser.activate_australian_topography();
        assert_eq!(
            *f.globe.calls.borrow(),
            vec![GlobeCall::BaseImagery(1), GlobeCall::BaseImagery(2)]
        );
    }

    #[test]
    fn supported_add_data_url_goes_to_the_host() {
        let mut f = fixture_with_host(StubHost::new(true, ServiceKind::Wfs));
        f.browser.set_add_data_url("http://example.org/data.geojson");
        f.browser.add_data_or_service();

        assert_eq!(
            *f.host.loaded.borrow(),
            vec!["http://example.org/data.geojson".to_string()]
        );
        assert!(f.host.prompted.borrow().is_empty());
        assert_eq!(f.browser.add_data_url(), "");
    }

    #[test]
    fn unsupported_add_data_url_falls_back_to_type_selection() {
        let mut f = fixture_with_host(StubHost::new(false, ServiceKind::Wms));
        f.browser.set_add_data_url("http://example.org/ows");
        f.browser.add_data_or_service();

        assert_eq!(*f.host.prompted.borrow(), vec!["http://example.org/ows".to_string()]);
        assert_eq!(f.browser.add_data_url(), "");

        // The service lands in the user tree, open and fetching.
        let tree = f.browser.user_content();
        assert_eq!(tree.roots().len(), 1);
        let node = tree.node(tree.roots()[0]).unwrap();
        assert!(node.is_open);
        assert!(node.is_loading());
        assert_eq!(
            node.description.get("type"),
            Some(&serde_json::json!("WMS"))
        );

        let requests = f.browser.take_ready_fetches();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url().as_deref(),
            Some("http://example.org/ows?service=WMS&request=GetCapabilities")
        );
    }

    #[test]
    fn importing_the_same_collection_twice_merges() {
        let mut f = fixture();
        let drop = json!({
            "name": "Dropped",
            "nm_ext_type": "collections",
            "Layer": [{"name": "Cat", "base_url": "http://x", "type": "WMS"}]
        });
        let bytes = serde_json::to_vec(&drop).unwrap();

        f.browser.import_json("dropped.json", &bytes).unwrap();
        f.browser.import_json("dropped.json", &bytes).unwrap();

        assert_eq!(f.browser.content().roots().len(), 1);
    }

    #[test]
    fn service_imports_go_to_the_registry() {
        let mut f = fixture();
        let drop = json!({
            "name": "endpoints",
            "nm_ext_type": "services",
            "services": [{"name": "wfs-main", "base_url": "http://example.org"}]
        });
        f.browser
            .import_json("svc.json", &serde_json::to_vec(&drop).unwrap())
            .unwrap();

        assert_eq!(f.browser.services().len(), 1);
        assert!(f.browser.content().roots().is_empty());
    }

    #[test]
    fn fetch_completion_materializes_leaves_through_the_view_model() {
        let mut f = fixture();
        f.browser.load_initial(
            json!({
                "name": "Data Collection",
                "Layer": [{"name": "Remote", "base_url": "http://example.org/wms", "type": "WMS"}]
            }),
            json!({"Layer": []}),
        );
        let tree = f.browser.content();
        let root = tree.roots()[0];
        let category = tree.node(root).unwrap().children()[0];

        f.browser.toggle_node_open(TreeSlot::Content, category);
        let requests = f.browser.take_ready_fetches();
        assert_eq!(requests.len(), 1);

        f.browser.apply_capabilities(
            &requests[0].key,
            Ok(json!({"Layer": [{"name": "remote-layer"}]})),
        );
        let node = f.browser.content().node(category).unwrap();
        assert_eq!(node.children().len(), 1);
    }
}
