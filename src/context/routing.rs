use std::any::Any;
use std::sync::Arc;

/// Resource instance a handler is invoked on.
pub type ResourceInstance = Arc<dyn Any + Send + Sync>;

/// Per-request record of the resources matched while routing.
#[derive(Clone, Default)]
pub struct RoutingContext {
    matched_resources: Vec<ResourceInstance>,
}

impl RoutingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routing context whose last matched resource is `resource`.
    #[must_use]
    pub fn matched(resource: ResourceInstance) -> Self {
        Self {
            matched_resources: vec![resource],
        }
    }

    pub fn push_matched_resource(&mut self, resource: ResourceInstance) {
        self.matched_resources.push(resource);
    }

    /// The most recently matched resource.
    #[must_use]
    pub fn peek_matched_resource(&self) -> Option<ResourceInstance> {
        self.matched_resources.last().cloned()
    }
}

impl std::fmt::Debug for RoutingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingContext")
            .field("matched_resources", &self.matched_resources.len())
            .finish()
    }
}
