//! # Model Module
//!
//! Immutable metadata describing resource methods: the endpoint descriptor, the
//! handling method with its declared markers and response type, and the type
//! descriptors used to carry generic type information to the serialization layer.
//!
//! Descriptors are created once per discovered resource method during application
//! build and shared as `Arc<EndpointDescriptor>` for the lifetime of the application.

mod endpoint;
mod types;

pub use endpoint::{EndpointDescriptor, EndpointDescriptorBuilder, HandlingMethod};
pub use types::{Marker, TypeDescriptor};
