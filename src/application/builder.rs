use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::core::Application;
use crate::invoker::{HandlerDispatcher, Invoker};
use crate::model::EndpointDescriptor;
use crate::provider::{DynamicBinder, Provider, ProviderBindings};
use crate::runtime_config::RuntimeConfig;
use crate::worker_pool::ManagedPool;

/// Application assembly failure. Fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Two endpoints registered under the same handler name
    DuplicateEndpoint { handler: String },
    /// An endpoint runs managed-async but the pool has no workers
    NoManagedWorkers { handler: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DuplicateEndpoint { handler } => {
                write!(f, "duplicate endpoint '{handler}'")
            }
            BuildError::NoManagedWorkers { handler } => write!(
                f,
                "endpoint '{handler}' is managed-async but no managed workers are configured"
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// Collects providers, binders and endpoints, then assembles every invoker.
///
/// Building is single threaded and happens before any request is served.
#[derive(Default)]
pub struct ApplicationBuilder {
    bindings: ProviderBindings,
    endpoints: Vec<(Arc<EndpointDescriptor>, Arc<dyn HandlerDispatcher>)>,
    config: RuntimeConfig,
}

impl ApplicationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global or name-bound provider.
    #[must_use]
    pub fn register(mut self, provider: Provider) -> Self {
        self.bindings.register(provider);
        self
    }

    #[must_use]
    pub fn dynamic_binder<B: DynamicBinder + 'static>(mut self, binder: B) -> Self {
        self.bindings.add_dynamic_binder(Arc::new(binder));
        self
    }

    #[must_use]
    pub fn endpoint<D: HandlerDispatcher + 'static>(
        mut self,
        descriptor: EndpointDescriptor,
        dispatcher: D,
    ) -> Self {
        self.endpoints
            .push((Arc::new(descriptor), Arc::new(dispatcher)));
        self
    }

    /// Like [`endpoint`](Self::endpoint) for an already shared dispatcher.
    #[must_use]
    pub fn shared_endpoint(
        mut self,
        descriptor: EndpointDescriptor,
        dispatcher: Arc<dyn HandlerDispatcher>,
    ) -> Self {
        self.endpoints.push((Arc::new(descriptor), dispatcher));
        self
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble one invoker per endpoint and start the managed-async pool.
    ///
    /// # Errors
    ///
    /// [`BuildError::DuplicateEndpoint`] when a handler name is registered
    /// twice; [`BuildError::NoManagedWorkers`] when a managed-async endpoint
    /// exists but `managed_workers` is zero.
    pub fn build(self) -> Result<Application, BuildError> {
        let ApplicationBuilder {
            bindings,
            endpoints,
            config,
        } = self;

        let mut invokers = HashMap::with_capacity(endpoints.len());
        for (descriptor, dispatcher) in endpoints {
            let handler = descriptor.handler_name().to_string();
            if invokers.contains_key(&handler) {
                return Err(BuildError::DuplicateEndpoint { handler });
            }
            if descriptor.managed_async_declared() && config.managed_workers == 0 {
                return Err(BuildError::NoManagedWorkers { handler });
            }
            debug!(endpoint = %descriptor, "Assembling invoker");
            let invoker = Invoker::build(descriptor, dispatcher, &bindings);
            invokers.insert(handler, Arc::new(invoker));
        }

        let pool = Arc::new(ManagedPool::new(&config));
        info!(
            endpoints = invokers.len(),
            global_request_filters = bindings.global_request_filters().len(),
            global_response_filters = bindings.global_response_filters().len(),
            managed_workers = pool.workers(),
            "Application built"
        );

        Ok(Application::new(
            invokers,
            bindings.global_request_filters().into(),
            bindings.global_response_filters().into(),
            pool,
        ))
    }
}
