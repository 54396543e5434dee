use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;

use super::async_context::AsyncResponse;
use crate::ids::RequestId;
use crate::provider::{InterceptorError, Provider, ReaderInterceptorContext};

/// Maximum inline path/query parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers/cookies before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated parameter storage; names are shared `Arc<str>` because the
/// same names repeat on every request to an endpoint.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header/cookie storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Frozen, priority-ordered interceptor list shared by all requests to an endpoint.
pub type InterceptorList = Arc<[Provider]>;

/// Inbound request as seen by filters, the invoker and handlers.
///
/// Routing has already happened: `handler_name` names the matched endpoint and the
/// path parameters are extracted. The raw entity is kept as bytes until a handler
/// asks for it through [`ContainerRequest::read_entity`], which runs the reader
/// interceptors attached by the invoker.
#[derive(Debug, Clone)]
pub struct ContainerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    /// Name of the endpoint this request was routed to
    pub handler_name: String,
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    pub headers: HeaderVec,
    pub cookies: HeaderVec,
    /// Raw request entity, if any
    pub entity: Option<Vec<u8>>,
    reader_interceptors: Option<InterceptorList>,
    writer_interceptors: Option<InterceptorList>,
    async_response: Option<AsyncResponse>,
}

impl ContainerRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, handler_name: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            handler_name: handler_name.into(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            entity: None,
            reader_interceptors: None,
            writer_interceptors: None,
            async_response: None,
        }
    }

    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<Vec<u8>>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Get a path parameter by name ("last write wins" on duplicates)
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name ("last write wins" on duplicates)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated query parameter, in request order
    #[must_use]
    pub fn get_query_params(&self, name: &str) -> SmallVec<[&str; MAX_INLINE_PARAMS]> {
        self.query_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn attach_interceptors(&mut self, reader: InterceptorList, writer: InterceptorList) {
        self.reader_interceptors = Some(reader);
        self.writer_interceptors = Some(writer);
    }

    /// Reader interceptors attached by the invoker; empty before dispatch.
    #[must_use]
    pub fn reader_interceptors(&self) -> &[Provider] {
        self.reader_interceptors.as_deref().unwrap_or(&[])
    }

    /// Writer interceptors attached by the invoker; empty before dispatch.
    #[must_use]
    pub fn writer_interceptors(&self) -> &[Provider] {
        self.writer_interceptors.as_deref().unwrap_or(&[])
    }

    pub(crate) fn attach_async_response(&mut self, handle: AsyncResponse) {
        self.async_response = Some(handle);
    }

    /// Handle for completing a suspended request. Present whenever the request
    /// went through [`Application::handle`](crate::application::Application::handle).
    #[must_use]
    pub fn async_response(&self) -> Option<&AsyncResponse> {
        self.async_response.as_ref()
    }

    /// Decode the request entity through the reader interceptor chain.
    ///
    /// Returns `Ok(None)` when the request carries no entity.
    ///
    /// # Errors
    ///
    /// Returns the first interceptor failure, or a decode error if the final
    /// bytes are not valid JSON for `T`.
    pub fn read_entity<T: DeserializeOwned>(&self) -> Result<Option<T>, InterceptorError> {
        let Some(entity) = &self.entity else {
            return Ok(None);
        };
        let mut ctx =
            ReaderInterceptorContext::new(self.reader_interceptors(), &self.headers, entity.clone());
        let value = ctx.proceed()?;
        serde_json::from_value(value)
            .map(Some)
            .map_err(InterceptorError::Decode)
    }
}
