use std::fmt;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;

use super::types::{Marker, TypeDescriptor};
use crate::provider::BindingTag;

/// The concrete method an endpoint invokes.
#[derive(Debug, Clone)]
pub struct HandlingMethod {
    name: Arc<str>,
    markers: Vec<Marker>,
    response_type: TypeDescriptor,
}

impl HandlingMethod {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, response_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            markers: Vec::new(),
            response_type,
        }
    }

    /// Add a marker declared on the method. Declaration order is preserved.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn response_type(&self) -> &TypeDescriptor {
        &self.response_type
    }
}

/// Immutable metadata of one resource method, built during application startup.
///
/// Dynamic binders inspect it to decide which providers to attach, and the
/// invoker reads its suspension flags on every request.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    handler_name: Arc<str>,
    resource_class: Arc<str>,
    method: Method,
    path_pattern: Arc<str>,
    handling_method: Option<HandlingMethod>,
    binding_tags: SmallVec<[BindingTag; 4]>,
    suspend_declared: bool,
    managed_async_declared: bool,
}

impl EndpointDescriptor {
    #[must_use]
    pub fn builder(
        handler_name: impl Into<Arc<str>>,
        resource_class: impl Into<Arc<str>>,
    ) -> EndpointDescriptorBuilder {
        EndpointDescriptorBuilder {
            handler_name: handler_name.into(),
            resource_class: resource_class.into(),
            method: Method::GET,
            path_pattern: Arc::from("/"),
            handling_method: None,
            binding_tags: SmallVec::new(),
            suspend_declared: false,
            managed_async_declared: false,
        }
    }

    /// Identity of the handling method, unique within an application.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    #[must_use]
    pub fn resource_class(&self) -> &str {
        &self.resource_class
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path_pattern(&self) -> &str {
        &self.path_pattern
    }

    /// `None` for a sub-resource locator placeholder.
    #[must_use]
    pub fn handling_method(&self) -> Option<&HandlingMethod> {
        self.handling_method.as_ref()
    }

    #[must_use]
    pub fn binding_tags(&self) -> &[BindingTag] {
        &self.binding_tags
    }

    #[must_use]
    pub fn suspend_declared(&self) -> bool {
        self.suspend_declared
    }

    #[must_use]
    pub fn managed_async_declared(&self) -> bool {
        self.managed_async_declared
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handling_method {
            Some(m) => write!(f, "{}::{}", self.resource_class, m.name()),
            None => write!(f, "{}::<locator {}>", self.resource_class, self.handler_name),
        }
    }
}

/// Builder for [`EndpointDescriptor`].
#[derive(Debug)]
pub struct EndpointDescriptorBuilder {
    handler_name: Arc<str>,
    resource_class: Arc<str>,
    method: Method,
    path_pattern: Arc<str>,
    handling_method: Option<HandlingMethod>,
    binding_tags: SmallVec<[BindingTag; 4]>,
    suspend_declared: bool,
    managed_async_declared: bool,
}

impl EndpointDescriptorBuilder {
    #[must_use]
    pub fn route(mut self, method: Method, path_pattern: impl Into<Arc<str>>) -> Self {
        self.method = method;
        self.path_pattern = path_pattern.into();
        self
    }

    /// Set the concrete handling method. Endpoints built without one are treated
    /// as sub-resource locators.
    #[must_use]
    pub fn handling_method(mut self, handling_method: HandlingMethod) -> Self {
        self.handling_method = Some(handling_method);
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: &BindingTag) -> Self {
        self.binding_tags.push(tag.clone());
        self
    }

    /// The handler completes the response itself through an injected
    /// [`AsyncResponse`](crate::context::AsyncResponse).
    #[must_use]
    pub fn suspended(mut self) -> Self {
        self.suspend_declared = true;
        self
    }

    /// The framework runs the handler on the managed-async pool.
    #[must_use]
    pub fn managed_async(mut self) -> Self {
        self.managed_async_declared = true;
        self
    }

    #[must_use]
    pub fn build(self) -> EndpointDescriptor {
        EndpointDescriptor {
            handler_name: self.handler_name,
            resource_class: self.resource_class,
            method: self.method,
            path_pattern: self.path_pattern,
            handling_method: self.handling_method,
            binding_tags: self.binding_tags,
            suspend_declared: self.suspend_declared,
            managed_async_declared: self.managed_async_declared,
        }
    }
}
