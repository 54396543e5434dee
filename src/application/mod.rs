//! # Application Module
//!
//! Assembles invokers for every endpoint and drives requests through them.
//!
//! ## Request Pipeline
//!
//! ```text
//! handle(request, resource)
//!   ├─ unknown handler ─────────────────────────────▶ 404
//!   ├─ request filters (global, then endpoint-bound)
//!   │    └─ abort ──────────────────────────────┐
//!   ├─ Invoker::apply                           │
//!   │    ├─ sync response ──────────────────────┤
//!   │    └─ suspended ── resume() ──────────────┤
//!   │                                           ▼
//!   │                 responding stages (post-processing)
//!   │                 response filters (global, then endpoint-bound)
//!   │                 writer interceptors + JSON encoding
//!   └──────────────────────────────────────────▶ WrittenResponse
//! ```
//!
//! Dispatch failures are mapped to responses here, after the invoker: a
//! parameter conversion error becomes 400, an unreachable handler 503, anything
//! else 500.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use brrtinvoker::application::ApplicationBuilder;
//! use brrtinvoker::context::{ContainerRequest, ResourceInstance, Response};
//! use brrtinvoker::invoker::DispatchError;
//! use brrtinvoker::model::{EndpointDescriptor, HandlingMethod, TypeDescriptor};
//! use http::Method;
//!
//! let endpoint = EndpointDescriptor::builder("hello", "Greeter")
//!     .route(Method::GET, "/hello")
//!     .handling_method(HandlingMethod::new("hello", TypeDescriptor::Response))
//!     .build();
//!
//! let app = ApplicationBuilder::new()
//!     .endpoint(endpoint, |_: &ResourceInstance, _: &ContainerRequest| {
//!         Ok::<_, DispatchError>(Some(Response::ok(serde_json::json!({ "hello": "world" }))))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = app.handle_blocking(
//!     ContainerRequest::new(Method::GET, "/hello", "hello"),
//!     Arc::new(()),
//! );
//! assert_eq!(response.status, 200);
//! ```

mod builder;
mod core;

pub use builder::{ApplicationBuilder, BuildError};
pub use core::{Application, REQUEST_ID_HEADER};
