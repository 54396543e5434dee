use std::sync::Arc;

use tracing::debug;

use super::core::{HandlerDispatcher, Invoker};
use super::error::DispatchError;
use super::post_process::post_process;
use crate::context::{
    ContainerRequest, ContainerResponse, RequestScope, ResourceInstance, RespondingContext,
    Response,
};
use crate::model::EndpointDescriptor;

impl Invoker {
    /// Dispatch `request` to the endpoint's handler.
    ///
    /// The interceptor lists are attached to the request first. An endpoint that
    /// suspends or runs managed-async is suspended before the handler runs, so a
    /// handler resolving the response from elsewhere cannot race the suspension.
    ///
    /// Returns `Ok(Some(_))` only on the synchronous path. Managed-async returns
    /// `Ok(None)` at once and resolves the suspended context when the unit of
    /// work finishes, unless the endpoint also suspends, in which case the handler
    /// resolves it through its [`AsyncResponse`](crate::context::AsyncResponse)
    /// and the unit's result is dropped. A suspend-only endpoint returns
    /// `Ok(None)` as well.
    ///
    /// Every handler invocation registers exactly one post-processing stage on
    /// the scope's responding context.
    ///
    /// # Errors
    ///
    /// Handler failures on the calling path are returned unchanged, as is
    /// [`DispatchError::NoMatchedResource`] when routing left nothing to invoke.
    pub fn apply(
        &self,
        request: &mut ContainerRequest,
        scope: &RequestScope,
    ) -> Result<Option<ContainerResponse>, DispatchError> {
        request.attach_interceptors(
            Arc::clone(&self.reader_interceptors),
            Arc::clone(&self.writer_interceptors),
        );

        let suspend = self.endpoint.suspend_declared();
        let managed = self.endpoint.managed_async_declared();

        let resource = scope.routing().peek_matched_resource().ok_or_else(|| {
            DispatchError::NoMatchedResource {
                handler: self.endpoint.handler_name().to_string(),
            }
        })?;

        if suspend || managed {
            scope.async_context().suspend();
        }

        if managed {
            let endpoint = Arc::clone(&self.endpoint);
            let dispatcher = Arc::clone(&self.dispatcher);
            let responding = scope.responding().clone();
            let request = request.clone();
            debug!(
                request_id = %request.request_id,
                handler_name = %endpoint.handler_name(),
                "Submitting managed-async invocation"
            );
            scope.async_context().invoke_managed(Box::new(move || {
                let raw = invoke(&endpoint, dispatcher.as_ref(), &resource, &request, &responding)?;
                if suspend {
                    debug!(
                        request_id = %request.request_id,
                        "Managed result discarded - handler resolves the suspended response"
                    );
                    return Ok(None);
                }
                Ok(Some(raw.unwrap_or_else(Response::no_content)))
            }));
            return Ok(None);
        }

        let raw = invoke(
            &self.endpoint,
            self.dispatcher.as_ref(),
            &resource,
            request,
            scope.responding(),
        )?;

        if suspend {
            debug!(
                request_id = %request.request_id,
                handler_name = %self.endpoint.handler_name(),
                "Handler returned on a suspended endpoint - awaiting explicit resume"
            );
            return Ok(None);
        }

        Ok(Some(ContainerResponse::new(request, raw)))
    }
}

/// Register the post-processing stage, then run the handler.
///
/// The stage must exist before the call: a handler may resume its suspended
/// request from inside it.
fn invoke(
    endpoint: &Arc<EndpointDescriptor>,
    dispatcher: &dyn HandlerDispatcher,
    resource: &ResourceInstance,
    request: &ContainerRequest,
    responding: &RespondingContext,
) -> Result<Option<Response>, DispatchError> {
    let stage_endpoint = Arc::clone(endpoint);
    responding.push(Box::new(move |response| match stage_endpoint.handling_method() {
        Some(method) => post_process(method, response),
        None => response,
    }));
    dispatcher.dispatch(resource, request)
}
