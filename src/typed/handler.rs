use std::convert::TryFrom;
use std::fmt;

use http::Method;
use serde::Serialize;
use tracing::debug;

use crate::context::{AsyncResponse, ContainerRequest, ParamVec, ResourceInstance, Response};
use crate::ids::RequestId;
use crate::invoker::{DispatchError, HandlerDispatcher};
use crate::model::{HandlingMethod, TypeDescriptor};

/// Trait implemented by typed handlers.
///
/// The request is converted from the [`ContainerRequest`] with `TryFrom`; the
/// response is any `Serialize` value.
pub trait Handler: Send + Sync + 'static {
    /// The typed request type (converted from ContainerRequest)
    type Request: TryFrom<ContainerRequest, Error = anyhow::Error> + Send + 'static;
    /// The typed response type (serialized to JSON)
    type Response: Serialize + Send + 'static;

    /// # Errors
    ///
    /// Any failure; it surfaces as a handler error.
    fn handle(&self, req: TypedHandlerRequest<Self::Request>) -> anyhow::Result<Self::Response>;
}

/// Typed request data passed to a [`Handler`]
#[derive(Debug, Clone)]
pub struct TypedHandlerRequest<T> {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    pub handler_name: String,
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    /// Present for requests dispatched through an application
    pub async_response: Option<AsyncResponse>,
    /// Typed request data (validated and converted)
    pub data: T,
}

impl<T> TypedHandlerRequest<T>
where
    T: TryFrom<ContainerRequest, Error = anyhow::Error>,
{
    /// # Errors
    ///
    /// Returns the conversion error if the request does not fit `T`.
    pub fn from_request(req: &ContainerRequest) -> anyhow::Result<Self> {
        let data = T::try_from(req.clone())?;
        Ok(Self {
            request_id: req.request_id,
            method: req.method.clone(),
            path: req.path.clone(),
            handler_name: req.handler_name.clone(),
            path_params: req.path_params.clone(),
            query_params: req.query_params.clone(),
            async_response: req.async_response().cloned(),
            data,
        })
    }
}

/// Handling method metadata for a typed handler: its declared response type is
/// `H::Response`.
#[must_use]
pub fn handling_method<H: Handler>(name: &str) -> HandlingMethod {
    HandlingMethod::new(name, TypeDescriptor::of::<H::Response>())
}

/// Dispatches to a typed [`Handler`] on the calling coroutine.
///
/// The handler's response is serialized into an untyped JSON entity; the
/// declared type is recovered from [`handling_method`] during post-processing.
/// Requests that fail conversion fail with [`DispatchError::BadRequest`]
/// instead of producing a handler result.
pub struct TypedDispatcher<H> {
    handler: H,
}

impl<H: Handler> TypedDispatcher<H> {
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<H: Handler> HandlerDispatcher for TypedDispatcher<H> {
    fn dispatch(
        &self,
        _resource: &ResourceInstance,
        request: &ContainerRequest,
    ) -> Result<Option<Response>, DispatchError> {
        let typed = TypedHandlerRequest::<H::Request>::from_request(request).map_err(|err| {
            debug!(
                request_id = %request.request_id,
                handler_name = %request.handler_name,
                error = %err,
                "Typed request conversion failed"
            );
            DispatchError::BadRequest {
                handler: request.handler_name.clone(),
                message: err.to_string(),
            }
        })?;

        let result = self
            .handler
            .handle(typed)
            .map_err(|e| DispatchError::handler(request.handler_name.as_str(), e))?;
        let entity = serde_json::to_value(result)
            .map_err(|e| DispatchError::handler(request.handler_name.as_str(), e))?;
        Ok(Some(Response::ok(entity)))
    }
}

impl<H> fmt::Debug for TypedDispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedDispatcher")
            .field("handler", &std::any::type_name::<H>())
            .finish()
    }
}
