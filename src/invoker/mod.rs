//! # Invoker Module
//!
//! One [`Invoker`] per endpoint, assembled at application build time and shared
//! read-only by every request routed to that endpoint.
//!
//! ## Assembly
//!
//! [`Invoker::build`] merges three provider sources for the endpoint:
//!
//! 1. dynamic binders, each consulted once
//! 2. global reader/writer interceptors
//! 3. providers name-bound to the endpoint's binding tags
//!
//! Request/response filters end up in deduplicated [`FilterSet`]s; reader and
//! writer interceptors in lists ordered by ascending priority.
//!
//! ## Dispatch
//!
//! [`Invoker::apply`] runs the handler synchronously, or suspends the request and
//! lets the handler or the managed-async pool resolve it later. Each raw result
//! pushes [`post_process`] onto the request's responding context, which runs
//! before the response reaches the response filters and writer interceptors.

mod core;
mod dispatch;
mod error;
mod post_process;

pub use core::{FilterSet, HandlerDispatcher, Invoker};
pub use error::DispatchError;
pub use post_process::post_process;
