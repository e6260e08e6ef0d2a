//! Injected ports into the embedding.
//!
//! Every callback the browser needs from its host is an explicit trait slot
//! passed in at construction; nothing is reached through ambient globals.

use foundation::Extent;
use layers::NowViewingEntry;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BingStyle {
    Aerial,
    AerialWithLabels,
    Road,
}

/// One base-imagery provider; a base map may stack several.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagerySpec {
    BingMaps { url: String, style: BingStyle },
    TileService { url: String, credit: Option<String> },
    ArcGisMapServer { url: String, proxy: bool },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SceneMode {
    TwoD,
    ThreeD,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerrainMode {
    Ellipsoid,
    Streamed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    Wfs,
    Wms,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Wfs => "WFS",
            ServiceKind::Wms => "WMS",
        }
    }
}

/// Rendering-engine operations the browser consumes.
pub trait GlobeView {
    /// Replace the base imagery stack wholesale.
    fn set_base_imagery(&mut self, layers: &[ImagerySpec]);
    fn set_scene_mode(&mut self, mode: SceneMode);
    fn set_terrain(&mut self, mode: TerrainMode);
    fn zoom_to(&mut self, extent: Extent);
    fn force_redraw(&mut self);
}

/// The surface displaying the now-viewing list.
///
/// A rebuild measures content height before and after the entries land so
/// the scroll offset can be shifted by the delta and the list does not jump
/// under the pointer.
pub trait ScrollSurface {
    fn content_height(&self) -> f64;
    fn entries_rebuilt(&mut self, entries: &[NowViewingEntry]);
    fn adjust_scroll(&mut self, delta: f64);
}

/// Data-manager callbacks owned by the embedding.
pub trait BrowserHost {
    /// Whether `url` can be loaded directly as a data source.
    fn format_supported(&self, url: &str) -> bool;
    fn load_url(&mut self, url: &str);
    /// Manual type selection for an add-data URL nothing else recognizes.
    fn choose_service_kind(&mut self, url: &str) -> ServiceKind;
}
