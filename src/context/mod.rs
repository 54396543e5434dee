//! # Context Module
//!
//! Request-scoped state: the inbound request, the response types, and the
//! three collaborators the invoker drives while dispatching.
//!
//! - [`RoutingContext`] - resources matched by routing
//! - [`AsyncContext`] - suspension and managed-async execution
//! - [`RespondingContext`] - response stages applied once a response exists
//!
//! They are bundled into a [`RequestScope`] per request and passed explicitly;
//! nothing in here is cached across requests.
//!
//! ## Suspension
//!
//! ```text
//!   Initial ──suspend()──▶ Suspended ──resume()──▶ Completing ──▶ Terminal
//!      │                                                            ▲
//!      └────────────────────── complete() ──────────────────────────┘
//! ```
//!
//! `resume()` is accepted only in `Suspended`, either from the managed-async
//! unit of work finishing or from a handler calling [`AsyncResponse::resume`].

mod async_context;
mod request;
mod responding;
mod response;
mod routing;
mod scope;

pub(crate) use async_context::panic_message;
pub use async_context::{
    AsyncContext, AsyncResponse, AsyncState, ManagedWork, Resolver, SuspendableContext,
};
pub use request::{
    ContainerRequest, HeaderVec, InterceptorList, ParamVec, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS,
};
pub use responding::{RespondingContext, ResponseStage};
pub use response::{ContainerResponse, Response, WrittenResponse};
pub use routing::{ResourceInstance, RoutingContext};
pub use scope::RequestScope;
