//! # Provider Module
//!
//! Filters and interceptors, the capability model used to classify them, and
//! the structures that decide which endpoints they apply to.
//!
//! ## Sources
//!
//! A provider reaches an endpoint through one of three sources:
//!
//! - **Global**: registered without binding tags, applies to every endpoint
//! - **Name-bound**: registered with one or more [`BindingTag`]s, applies to
//!   endpoints carrying one of those tags (see [`NameBoundProviders`])
//! - **Dynamic**: returned by a [`DynamicBinder`] after inspecting the endpoint
//!
//! [`ProviderBindings`] collects all three and is handed to
//! [`Invoker::build`](crate::invoker::Invoker::build).
//!
//! ## Ordering
//!
//! Filters are sets: duplicates collapse by provider identity and their relative
//! order carries no meaning. Interceptors nest around the entity stream, so they
//! are kept as lists sorted by ascending priority, ties kept in registration order.

mod binder;
mod binding;
mod bindings;
mod core;
mod error;
mod interceptors;

pub use binder::DynamicBinder;
pub use binding::{BindingTag, NameBoundProviders};
pub use bindings::ProviderBindings;
pub use core::{
    Capabilities, Capability, Provider, ProviderBuilder, ProviderId, ReaderInterceptor,
    RequestFilter, ResponseFilter, WriterInterceptor, DEFAULT_PRIORITY,
};
pub use error::{InterceptorError, ProviderError};
pub use interceptors::{ReaderInterceptorContext, WriterInterceptorContext};
