//! # brrtinvoker
//!
//! **brrtinvoker** is the request-invocation core of a coroutine-powered HTTP
//! service. Routing has already resolved a request to an endpoint; this crate
//! assembles the filters and interceptors that apply to that endpoint, runs its
//! handler synchronously or suspended, and prepares the result for serialization.
//!
//! ## Architecture
//!
//! - **[`model`]** - endpoint metadata: handling methods, markers, declared types
//! - **[`provider`]** - filters, interceptors, binding tags, dynamic binders
//! - **[`invoker`]** - per-endpoint assembly, dispatch and response post-processing
//! - **[`context`]** - request/response types and the request-scoped contexts
//! - **[`extract`]** - typed parameter extraction with memoized defaults
//! - **[`dispatcher`]** - handlers running on `may` coroutines
//! - **[`typed`]** - type-safe handlers
//! - **[`application`]** - assembly over all endpoints and the request pipeline
//! - **[`worker_pool`]** - coroutine pool for managed-async invocations
//! - **[`runtime_config`]** / **[`logging`]** - environment-driven configuration
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant App as Application
//!     participant Filters as Request Filters
//!     participant Invoker
//!     participant Async as AsyncContext
//!     participant Handler
//!     participant Responding as RespondingContext
//!     participant Writer as Writer Interceptors
//!
//!     Caller->>App: handle(request, resource)
//!     App->>Filters: global, then endpoint-bound
//!     alt Filter aborts
//!         Filters-->>App: Response
//!     else Continue
//!         App->>Invoker: apply(request, scope)
//!         Invoker->>Invoker: attach interceptor lists
//!         alt suspend or managed-async declared
//!             Invoker->>Async: suspend()
//!         end
//!         alt managed-async
//!             Invoker->>Async: invoke_managed(unit)
//!             Invoker-->>App: None
//!             Async->>Responding: push(post_process)
//!             Async->>Handler: dispatch (pool coroutine)
//!             Handler-->>Async: raw result
//!             Async->>App: resume(response)
//!         else synchronous
//!             Invoker->>Responding: push(post_process)
//!             Invoker->>Handler: dispatch
//!             Handler-->>Invoker: raw result
//!             Invoker-->>App: ContainerResponse
//!         end
//!     end
//!     App->>Responding: process(response)
//!     App->>App: response filters
//!     App->>Writer: proceed() + JSON encoding
//!     App-->>Caller: WrittenResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use brrtinvoker::application::ApplicationBuilder;
//! use brrtinvoker::context::{ContainerRequest, ContainerResponse, ResourceInstance, Response};
//! use brrtinvoker::invoker::DispatchError;
//! use brrtinvoker::model::{EndpointDescriptor, HandlingMethod, Marker, TypeDescriptor};
//! use brrtinvoker::provider::{BindingTag, Provider, ResponseFilter};
//! use http::Method;
//!
//! struct PoweredBy;
//!
//! impl ResponseFilter for PoweredBy {
//!     fn filter(&self, _request: &ContainerRequest, response: &mut ContainerResponse) {
//!         response.set_header("x-powered-by", "brrtinvoker".to_string());
//!     }
//! }
//!
//! let branded = BindingTag::declare("Branded");
//! let endpoint = EndpointDescriptor::builder("list_pets", "PetResource")
//!     .route(Method::GET, "/pets")
//!     .handling_method(
//!         HandlingMethod::new("list_pets", TypeDescriptor::of::<Vec<String>>())
//!             .with_marker(Marker::new("Cacheable")),
//!     )
//!     .tag(&branded)
//!     .build();
//!
//! let app = ApplicationBuilder::new()
//!     .register(
//!         Provider::builder("powered-by")
//!             .bind_to(&branded)
//!             .with_response_filter(Arc::new(PoweredBy))
//!             .build()
//!             .unwrap(),
//!     )
//!     .endpoint(endpoint, |_: &ResourceInstance, _: &ContainerRequest| {
//!         Ok::<_, DispatchError>(Some(Response::ok(serde_json::json!(["rex", "tom"]))))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = app.handle_blocking(
//!     ContainerRequest::new(Method::GET, "/pets", "list_pets"),
//!     Arc::new(()),
//! );
//! assert_eq!(response.status, 200);
//! assert_eq!(response.get_header("x-powered-by"), Some("brrtinvoker"));
//! ```
//!
//! ## Runtime
//!
//! Built on the `may` coroutine runtime. Coroutine stack size and the number of
//! managed-async workers come from [`runtime_config::RuntimeConfig`]
//! (`BRRTI_STACK_SIZE`, `BRRTI_MANAGED_WORKERS`).

pub mod application;
pub mod context;
pub mod dispatcher;
pub mod extract;
pub mod ids;
pub mod invoker;
pub mod logging;
pub mod model;
pub mod provider;
pub mod runtime_config;
pub mod typed;
pub mod worker_pool;
