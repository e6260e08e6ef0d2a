use foundation::Extent;
use serde_json::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// A layer currently instantiated on the rendering surface.
///
/// Created on enable, destroyed on disable; owned by the `LayerList`, whose
/// order is the rendering order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLayer {
    pub id: LayerId,
    pub name: String,
    /// Merged metadata from the catalog leaf and its service.
    pub description: Value,
    pub extent: Option<Extent>,
    pub url: Option<String>,
    pub proxy: bool,
    /// Visibility without disabling; independent of list membership.
    pub show: bool,
}

/// Everything needed to instantiate a layer; the list assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDraft {
    pub name: String,
    pub description: Value,
    pub extent: Option<Extent>,
    pub url: Option<String>,
    pub proxy: bool,
}

impl LayerDraft {
    pub fn new(name: impl Into<String>, description: Value) -> Self {
        Self {
            name: name.into(),
            description,
            extent: None,
            url: None,
            proxy: false,
        }
    }

    pub fn with_extent(mut self, extent: Option<Extent>) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_proxy(mut self, proxy: bool) -> Self {
        self.proxy = proxy;
        self
    }
}
