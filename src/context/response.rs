use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::request::{ContainerRequest, HeaderVec};
use crate::ids::RequestId;
use crate::model::{Marker, TypeDescriptor};
use crate::provider::{InterceptorError, Provider, WriterInterceptorContext};

/// Raw result of a handler dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    pub headers: HeaderVec,
    entity: Option<Value>,
    entity_type: Option<TypeDescriptor>,
    entity_markers: Vec<Marker>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            entity: None,
            entity_type: None,
            entity_markers: Vec::new(),
        }
    }

    /// 200 with an untyped JSON entity.
    #[must_use]
    pub fn ok(entity: Value) -> Self {
        Self::new(200).with_entity(entity)
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Error response with a `{"error": message}` body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::new(status).with_entity(serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn with_entity(mut self, entity: Value) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Entity serialized from a typed value, carrying `T`'s descriptor.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `entity` cannot be represented as JSON.
    pub fn typed<T: Serialize + 'static>(status: u16, entity: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status)
            .with_entity(serde_json::to_value(entity)?)
            .with_entity_type(TypeDescriptor::of::<T>()))
    }

    #[must_use]
    pub fn with_entity_type(mut self, entity_type: TypeDescriptor) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.entity_markers.push(marker);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value.into());
        self
    }

    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn entity(&self) -> Option<&Value> {
        self.entity.as_ref()
    }
}

/// Response travelling back through post-processing, response filters and
/// writer interceptors.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerResponse {
    request_id: RequestId,
    status: u16,
    headers: HeaderVec,
    entity: Option<Value>,
    entity_type: TypeDescriptor,
    entity_markers: Vec<Marker>,
}

impl ContainerResponse {
    /// Wrap a handler result. An absent result becomes `204 No Content`.
    #[must_use]
    pub fn new(request: &ContainerRequest, response: Option<Response>) -> Self {
        let response = response.unwrap_or_else(Response::no_content);
        let entity_type = match (&response.entity, response.entity_type) {
            (_, Some(declared)) => declared,
            (Some(_), None) => TypeDescriptor::untyped(),
            (None, None) => TypeDescriptor::Void,
        };
        Self {
            request_id: request.request_id,
            status: response.status,
            headers: response.headers,
            entity: response.entity,
            entity_type,
            entity_markers: response.entity_markers,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    #[must_use]
    pub fn entity(&self) -> Option<&Value> {
        self.entity.as_ref()
    }

    pub fn set_entity(&mut self, entity: Option<Value>) {
        self.entity = entity;
    }

    #[must_use]
    pub fn entity_type(&self) -> &TypeDescriptor {
        &self.entity_type
    }

    pub fn set_entity_type(&mut self, entity_type: TypeDescriptor) {
        self.entity_type = entity_type;
    }

    #[must_use]
    pub fn entity_markers(&self) -> &[Marker] {
        &self.entity_markers
    }

    pub fn set_entity_markers(&mut self, markers: Vec<Marker>) {
        self.entity_markers = markers;
    }

    /// Serialize the entity through `interceptors` and produce the final response.
    ///
    /// Interceptors only run when there is an entity to write.
    ///
    /// # Errors
    ///
    /// Propagates interceptor failures and JSON encoding errors.
    pub fn write(self, interceptors: &[Provider]) -> Result<WrittenResponse, InterceptorError> {
        let ContainerResponse {
            request_id,
            status,
            mut headers,
            entity,
            entity_type,
            entity_markers,
        } = self;

        let body = match entity {
            Some(entity) => {
                if !headers
                    .iter()
                    .any(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                {
                    headers.push((Arc::from("content-type"), "application/json".to_string()));
                }
                let mut ctx = WriterInterceptorContext::new(
                    interceptors,
                    entity,
                    &entity_type,
                    &entity_markers,
                    &mut headers,
                );
                ctx.proceed()?;
                ctx.into_output()
            }
            None => Vec::new(),
        };

        Ok(WrittenResponse {
            request_id,
            status,
            headers,
            body,
        })
    }
}

/// Fully serialized response, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenResponse {
    pub request_id: RequestId,
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl WrittenResponse {
    /// Plain error response that bypasses interceptors.
    #[must_use]
    pub fn error(request_id: RequestId, status: u16, message: &str) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            request_id,
            status,
            headers,
            body: serde_json::json!({ "error": message }).to_string().into_bytes(),
        }
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parse the body as JSON. `None` for an empty or non-JSON body.
    #[must_use]
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
