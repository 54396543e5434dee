use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::context::Response;

/// Declared type of a handler result or response entity.
///
/// Serializers use this to pick the right representation for the entity. The
/// dispatch layer frequently only knows the erased JSON value, so the handler's
/// declared type is kept around to recover the precise type later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Handler returns nothing (`()`).
    Void,
    /// Handler returns the raw [`Response`] wrapper.
    Response,
    /// A concrete, non-generic type.
    Raw(Arc<str>),
    /// A fully parameterized generic type such as `Vec<Widget>`.
    Parameterized(Arc<str>),
}

impl TypeDescriptor {
    /// Derive the descriptor of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<()>() {
            return TypeDescriptor::Void;
        }
        if id == TypeId::of::<Response>() {
            return TypeDescriptor::Response;
        }
        let name = type_name::<T>();
        if name.contains('<') {
            TypeDescriptor::Parameterized(Arc::from(name))
        } else {
            TypeDescriptor::Raw(Arc::from(name))
        }
    }

    /// Descriptor of an entity that only exists as an erased JSON value.
    #[must_use]
    pub fn untyped() -> Self {
        Self::of::<Value>()
    }

    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        matches!(self, TypeDescriptor::Parameterized(_))
    }

    /// Whether a handler declared to return this type says anything useful about
    /// the entity it produced.
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        !matches!(self, TypeDescriptor::Void | TypeDescriptor::Response)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Void => "()",
            TypeDescriptor::Response => "Response",
            TypeDescriptor::Raw(name) | TypeDescriptor::Parameterized(name) => name,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An attribute declared on a handling method or attached to a response entity.
///
/// Writers and writer interceptors read markers to adjust how an entity is
/// serialized (views, wrapping, compression hints).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl Marker {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}
