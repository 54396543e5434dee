use std::sync::Arc;

use tracing::debug;

use super::binder::DynamicBinder;
use super::binding::NameBoundProviders;
use super::core::{Capability, Provider};

/// Every provider source an invoker is assembled from.
///
/// Filled single-threaded during application build, then shared read-only.
#[derive(Clone, Default)]
pub struct ProviderBindings {
    name_bound: NameBoundProviders,
    global_request_filters: Vec<Provider>,
    global_response_filters: Vec<Provider>,
    global_reader_interceptors: Vec<Provider>,
    global_writer_interceptors: Vec<Provider>,
    dynamic_binders: Vec<Arc<dyn DynamicBinder>>,
}

impl ProviderBindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    ///
    /// Providers carrying binding tags are name-bound under each of their tags;
    /// the rest are global for every capability they implement.
    pub fn register(&mut self, provider: Provider) {
        if provider.is_name_bound() {
            for tag in provider.binding_tags() {
                self.name_bound.bind(tag, &provider);
            }
            debug!(
                provider = %provider.name(),
                tags = ?provider.binding_tags(),
                capabilities = ?provider.capabilities(),
                "Registered name-bound provider"
            );
            return;
        }

        for capability in provider.capabilities().iter() {
            let target = match capability {
                Capability::RequestFilter => &mut self.global_request_filters,
                Capability::ResponseFilter => &mut self.global_response_filters,
                Capability::ReaderInterceptor => &mut self.global_reader_interceptors,
                Capability::WriterInterceptor => &mut self.global_writer_interceptors,
            };
            target.push(provider.clone());
        }
        debug!(
            provider = %provider.name(),
            capabilities = ?provider.capabilities(),
            "Registered global provider"
        );
    }

    /// Append a dynamic binder. Binders are consulted in registration order.
    pub fn add_dynamic_binder(&mut self, binder: Arc<dyn DynamicBinder>) {
        self.dynamic_binders.push(binder);
    }

    #[must_use]
    pub fn name_bound(&self) -> &NameBoundProviders {
        &self.name_bound
    }

    #[must_use]
    pub fn global_request_filters(&self) -> &[Provider] {
        &self.global_request_filters
    }

    #[must_use]
    pub fn global_response_filters(&self) -> &[Provider] {
        &self.global_response_filters
    }

    #[must_use]
    pub fn global_reader_interceptors(&self) -> &[Provider] {
        &self.global_reader_interceptors
    }

    #[must_use]
    pub fn global_writer_interceptors(&self) -> &[Provider] {
        &self.global_writer_interceptors
    }

    #[must_use]
    pub fn dynamic_binders(&self) -> &[Arc<dyn DynamicBinder>] {
        &self.dynamic_binders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContainerRequest, Response};
    use crate::provider::{BindingTag, RequestFilter};

    struct Pass;

    impl RequestFilter for Pass {
        fn filter(&self, _request: &mut ContainerRequest) -> Option<Response> {
            None
        }
    }

    #[test]
    fn test_register_splits_global_and_name_bound() {
        let tag = BindingTag::declare("Secured");
        let global = Provider::request_filter("global", Pass);
        let bound = Provider::builder("bound")
            .bind_to(&tag)
            .with_request_filter(Arc::new(Pass))
            .build()
            .unwrap();

        let mut bindings = ProviderBindings::new();
        bindings.register(global.clone());
        bindings.register(bound.clone());

        assert_eq!(bindings.global_request_filters(), &[global]);
        assert_eq!(bindings.name_bound().request_filters(&tag), &[bound]);
        assert!(bindings.global_response_filters().is_empty());
    }
}
