use super::core::Provider;
use crate::model::EndpointDescriptor;

/// Attaches providers to endpoints by inspecting their metadata.
///
/// Each binder is consulted exactly once per endpoint while the application is
/// assembled. The returned provider is classified by its capabilities and added
/// to the endpoint's filters and interceptors alongside the name-bound ones.
pub trait DynamicBinder: Send + Sync {
    fn bound_provider(&self, endpoint: &EndpointDescriptor) -> Option<Provider>;
}

impl<F> DynamicBinder for F
where
    F: Fn(&EndpointDescriptor) -> Option<Provider> + Send + Sync,
{
    fn bound_provider(&self, endpoint: &EndpointDescriptor) -> Option<Provider> {
        self(endpoint)
    }
}
