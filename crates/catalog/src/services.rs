//! Registered service endpoints and OGC request-URL composition.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document;

/// Descriptor store for `services` payloads. Keyed by name; a later
/// registration under the same name wins.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Value>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_services(&mut self, services: &[Value]) {
        for service in services {
            match document::name(service) {
                Some(name) => {
                    self.services.insert(name.to_string(), service.clone());
                }
                None => {
                    tracing::warn!("ignoring service descriptor without a name");
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.services.get(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Build a WFS GetFeature URL for a layer description that has no URL of its
/// own. The service base comes from the description (inherited from its
/// category); returns `None` for non-WFS descriptions or when the base is
/// missing.
pub fn wfs_feature_url(description: &Value, count: u32) -> Option<String> {
    let base = document::base_url(description)?;
    let name = document::name(description)?;
    let service_type = document::service_type(description).unwrap_or("WFS");
    if !service_type.eq_ignore_ascii_case("WFS") {
        return None;
    }
    Some(format!(
        "{base}?service=WFS&version=1.1.0&request=GetFeature&typeName={name}&maxFeatures={count}&outputFormat=JSON"
    ))
}

/// Build the GetCapabilities URL for a category description.
pub fn capabilities_url(description: &Value) -> Option<String> {
    let base = document::base_url(description)?;
    let service_type = document::service_type(description).unwrap_or("WMS");
    Some(format!(
        "{base}?service={service_type}&request=GetCapabilities"
    ))
}
