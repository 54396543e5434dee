use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::error::DispatchError;
use crate::context::{ContainerRequest, InterceptorList, ResourceInstance, Response};
use crate::model::{EndpointDescriptor, HandlingMethod};
use crate::provider::{Capability, Provider, ProviderBindings, ProviderId};

/// Invokes the handler behind an endpoint.
///
/// How the handler is actually called (direct call, coroutine channel, typed
/// wrapper) is up to the implementation. `Ok(None)` is a handler that produced
/// no response value.
pub trait HandlerDispatcher: Send + Sync {
    /// # Errors
    ///
    /// Any failure of the handler; it is propagated unchanged.
    fn dispatch(
        &self,
        resource: &ResourceInstance,
        request: &ContainerRequest,
    ) -> Result<Option<Response>, DispatchError>;
}

impl<F> HandlerDispatcher for F
where
    F: Fn(&ResourceInstance, &ContainerRequest) -> Result<Option<Response>, DispatchError>
        + Send
        + Sync,
{
    fn dispatch(
        &self,
        resource: &ResourceInstance,
        request: &ContainerRequest,
    ) -> Result<Option<Response>, DispatchError> {
        self(resource, request)
    }
}

/// Deduplicated set of filter providers.
///
/// Membership is by provider identity. Iteration follows first insertion;
/// callers must not rely on it for semantics.
#[derive(Clone, Default)]
pub struct FilterSet {
    members: Vec<Provider>,
    ids: HashSet<ProviderId>,
}

impl FilterSet {
    /// Add a provider; returns `false` if it was already present.
    fn insert(&mut self, provider: &Provider) -> bool {
        if !self.ids.insert(provider.id()) {
            return false;
        }
        self.members.push(provider.clone());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, provider: &Provider) -> bool {
        self.ids.contains(&provider.id())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Provider> {
        self.members.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Provider] {
        &self.members
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Provider;
    type IntoIter = std::slice::Iter<'a, Provider>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.members.iter().map(Provider::name))
            .finish()
    }
}

/// Mutable collections used only while one invoker is assembled.
#[derive(Default)]
struct Assembly {
    request_filters: FilterSet,
    response_filters: FilterSet,
    reader_interceptors: Vec<Provider>,
    writer_interceptors: Vec<Provider>,
}

impl Assembly {
    /// File `provider` under each capability it has.
    fn add(&mut self, provider: &Provider) {
        for capability in provider.capabilities().iter() {
            self.add_as(capability, provider);
        }
    }

    fn add_as(&mut self, capability: Capability, provider: &Provider) {
        match capability {
            Capability::RequestFilter => {
                self.request_filters.insert(provider);
            }
            Capability::ResponseFilter => {
                self.response_filters.insert(provider);
            }
            Capability::ReaderInterceptor => self.reader_interceptors.push(provider.clone()),
            Capability::WriterInterceptor => self.writer_interceptors.push(provider.clone()),
        }
    }
}

/// Per-endpoint invoker.
///
/// Built once per endpoint during application startup and immutable afterwards:
/// the filter sets and interceptor lists are frozen, so any number of requests
/// may run through the same invoker concurrently without locking.
pub struct Invoker {
    pub(super) endpoint: Arc<EndpointDescriptor>,
    pub(super) dispatcher: Arc<dyn HandlerDispatcher>,
    request_filters: FilterSet,
    response_filters: FilterSet,
    pub(super) reader_interceptors: InterceptorList,
    pub(super) writer_interceptors: InterceptorList,
}

impl Invoker {
    /// Assemble the invoker for `endpoint`.
    ///
    /// 1. every dynamic binder is consulted once and its provider filed by capability
    /// 2. global reader/writer interceptors are appended
    /// 3. unless the endpoint is a sub-resource locator, providers name-bound to
    ///    any of its tags are appended
    /// 4. both interceptor lists are stable-sorted by ascending priority
    ///
    /// Filters collapse by identity; interceptors are kept once per source that
    /// contributed them. Global filters are not part of the invoker, the
    /// application runs them ahead of the endpoint's own.
    #[must_use]
    pub fn build(
        endpoint: Arc<EndpointDescriptor>,
        dispatcher: Arc<dyn HandlerDispatcher>,
        bindings: &ProviderBindings,
    ) -> Self {
        let mut assembly = Assembly::default();

        for binder in bindings.dynamic_binders() {
            if let Some(provider) = binder.bound_provider(&endpoint) {
                debug!(
                    handler_name = %endpoint.handler_name(),
                    provider = %provider.name(),
                    capabilities = ?provider.capabilities(),
                    "Dynamic binder attached provider"
                );
                assembly.add(&provider);
            }
        }

        assembly
            .reader_interceptors
            .extend_from_slice(bindings.global_reader_interceptors());
        assembly
            .writer_interceptors
            .extend_from_slice(bindings.global_writer_interceptors());

        if endpoint.handling_method().is_some() {
            let name_bound = bindings.name_bound();
            for tag in endpoint.binding_tags() {
                for capability in Capability::ALL {
                    for provider in name_bound.lookup(capability, tag) {
                        assembly.add_as(capability, provider);
                    }
                }
            }
        }

        // sort_by_key is stable: equal priorities keep insertion order
        assembly.reader_interceptors.sort_by_key(Provider::priority);
        assembly.writer_interceptors.sort_by_key(Provider::priority);

        let invoker = Self {
            endpoint,
            dispatcher,
            request_filters: assembly.request_filters,
            response_filters: assembly.response_filters,
            reader_interceptors: assembly.reader_interceptors.into(),
            writer_interceptors: assembly.writer_interceptors.into(),
        };

        info!(
            handler_name = %invoker.endpoint.handler_name(),
            request_filters = invoker.request_filters.len(),
            response_filters = invoker.response_filters.len(),
            reader_interceptors = invoker.reader_interceptors.len(),
            writer_interceptors = invoker.writer_interceptors.len(),
            "Invoker assembled"
        );
        invoker
    }

    #[must_use]
    pub fn endpoint(&self) -> &Arc<EndpointDescriptor> {
        &self.endpoint
    }

    /// The handling method, `None` for a sub-resource locator.
    #[must_use]
    pub fn resource_method(&self) -> Option<&HandlingMethod> {
        self.endpoint.handling_method()
    }

    #[must_use]
    pub fn resource_class(&self) -> &str {
        self.endpoint.resource_class()
    }

    #[must_use]
    pub fn request_filters(&self) -> &FilterSet {
        &self.request_filters
    }

    #[must_use]
    pub fn response_filters(&self) -> &FilterSet {
        &self.response_filters
    }

    #[must_use]
    pub fn reader_interceptors(&self) -> &[Provider] {
        &self.reader_interceptors
    }

    #[must_use]
    pub fn writer_interceptors(&self) -> &[Provider] {
        &self.writer_interceptors
    }
}

impl fmt::Display for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.endpoint.handling_method() {
            Some(method) => write!(f, "Invoker{{{}::{}}}", self.resource_class(), method.name()),
            None => write!(
                f,
                "Invoker{{{}::{} (locator)}}",
                self.resource_class(),
                self.endpoint.handler_name()
            ),
        }
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("endpoint", &self.endpoint.handler_name())
            .field("request_filters", &self.request_filters)
            .field("response_filters", &self.response_filters)
            .field(
                "reader_interceptors",
                &self.reader_interceptors.iter().map(Provider::name).collect::<Vec<_>>(),
            )
            .field(
                "writer_interceptors",
                &self.writer_interceptors.iter().map(Provider::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
