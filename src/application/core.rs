use std::collections::HashMap;
use std::sync::Arc;

use may::sync::mpsc;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::context::{
    AsyncContext, AsyncResponse, AsyncState, ContainerRequest, ContainerResponse, RequestScope,
    ResourceInstance, RespondingContext, Response, RoutingContext, SuspendableContext,
    WrittenResponse,
};
use crate::ids::RequestId;
use crate::invoker::{DispatchError, Invoker};
use crate::provider::Provider;
use crate::worker_pool::ManagedPool;

/// Header carrying a caller-supplied correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The assembled application: one invoker per endpoint plus the global filters.
///
/// Immutable after [`ApplicationBuilder::build`](super::ApplicationBuilder::build);
/// share it with `Arc` and call [`handle`](Self::handle) from any number of
/// coroutines.
pub struct Application {
    invokers: HashMap<String, Arc<Invoker>>,
    global_request_filters: Arc<[Provider]>,
    global_response_filters: Arc<[Provider]>,
    pool: Arc<ManagedPool>,
}

impl Application {
    pub(super) fn new(
        invokers: HashMap<String, Arc<Invoker>>,
        global_request_filters: Arc<[Provider]>,
        global_response_filters: Arc<[Provider]>,
        pool: Arc<ManagedPool>,
    ) -> Self {
        Self {
            invokers,
            global_request_filters,
            global_response_filters,
            pool,
        }
    }

    #[must_use]
    pub fn invoker(&self, handler_name: &str) -> Option<&Arc<Invoker>> {
        self.invokers.get(handler_name)
    }

    /// Names of all registered endpoints, sorted
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.invokers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Effective request filter chain of an endpoint: global filters first,
    /// then the endpoint's own that are not already global.
    #[must_use]
    pub fn request_filters_for(&self, handler_name: &str) -> Option<Vec<Provider>> {
        let invoker = self.invokers.get(handler_name)?;
        Some(merge_filters(
            &self.global_request_filters,
            invoker.request_filters().as_slice(),
        ))
    }

    /// Effective response filter chain of an endpoint, global first.
    #[must_use]
    pub fn response_filters_for(&self, handler_name: &str) -> Option<Vec<Provider>> {
        let invoker = self.invokers.get(handler_name)?;
        Some(merge_filters(
            &self.global_response_filters,
            invoker.response_filters().as_slice(),
        ))
    }

    #[must_use]
    pub fn managed_pool(&self) -> &Arc<ManagedPool> {
        &self.pool
    }

    /// Process one routed request.
    ///
    /// `resource` is the instance routing matched for the request. The returned
    /// receiver yields exactly one [`WrittenResponse`], either right away or once
    /// a suspended request is resolved.
    pub fn handle(
        &self,
        mut request: ContainerRequest,
        resource: ResourceInstance,
    ) -> mpsc::Receiver<WrittenResponse> {
        correlate(&mut request);
        self.handle_correlated(request, resource)
    }

    /// [`handle`](Self::handle) and wait for the response.
    ///
    /// A suspended request whose handler drops its [`AsyncResponse`] without
    /// resolving it yields a 500.
    pub fn handle_blocking(
        &self,
        mut request: ContainerRequest,
        resource: ResourceInstance,
    ) -> WrittenResponse {
        correlate(&mut request);
        let request_id = request.request_id;
        self.handle_correlated(request, resource)
            .recv()
            .unwrap_or_else(|_| {
                error!(
                    request_id = %request_id,
                    "Suspended request dropped without a response - CRITICAL"
                );
                WrittenResponse::error(request_id, 500, "Response was never resolved")
            })
    }

    fn handle_correlated(
        &self,
        mut request: ContainerRequest,
        resource: ResourceInstance,
    ) -> mpsc::Receiver<WrittenResponse> {
        let (tx, rx) = mpsc::channel();
        let request_id = request.request_id;

        let Some(invoker) = self.invokers.get(&request.handler_name).cloned() else {
            warn!(
                request_id = %request_id,
                handler_name = %request.handler_name,
                "No endpoint registered for handler"
            );
            let _ = tx.send(WrittenResponse::error(request_id, 404, "Not Found"));
            return rx;
        };

        debug!(
            request_id = %request_id,
            handler_name = %request.handler_name,
            method = %request.method,
            path = %request.path,
            "Request received"
        );

        let response_filters = merge_filters(
            &self.global_response_filters,
            invoker.response_filters().as_slice(),
        );
        let responding = RespondingContext::new();

        let aborted = self.run_request_filters(&invoker, &mut request);
        let completion = Arc::new(Completion {
            request: request.clone(),
            invoker: Arc::clone(&invoker),
            response_filters,
            responding: responding.clone(),
            reply: Mutex::new(Some(tx)),
        });

        if let Some(response) = aborted {
            let response = ContainerResponse::new(&completion.request, Some(response));
            completion.finish(Ok(Some(response)));
            return rx;
        }

        let resolver_completion = Arc::clone(&completion);
        let cx = SuspendableContext::new(
            request_id,
            Arc::clone(&self.pool),
            Box::new(move |outcome: Result<Response, DispatchError>| {
                let outcome = outcome.map(|response| {
                    Some(ContainerResponse::new(
                        &resolver_completion.request,
                        Some(response),
                    ))
                });
                resolver_completion.finish(outcome);
            }),
        );
        let async_context: Arc<dyn AsyncContext> = Arc::new(cx.clone());
        request.attach_async_response(AsyncResponse::new(Arc::clone(&async_context)));

        let scope = RequestScope::new(RoutingContext::matched(resource), async_context, responding);

        match invoker.apply(&mut request, &scope) {
            Ok(Some(response)) => {
                cx.complete();
                completion.finish(Ok(Some(response)));
            }
            Ok(None) => {
                debug!(
                    request_id = %request_id,
                    state = ?cx.state(),
                    "Request suspended"
                );
            }
            Err(e) => match cx.state() {
                AsyncState::Suspended => {
                    cx.resume(Err(e));
                }
                AsyncState::Initial => {
                    cx.complete();
                    completion.finish(Err(e));
                }
                state => {
                    warn!(
                        request_id = %request_id,
                        state = ?state,
                        error = %e,
                        "Handler failed after its response was resolved"
                    );
                }
            },
        }

        rx
    }

    /// Global then endpoint-bound request filters; the first abort wins.
    fn run_request_filters(
        &self,
        invoker: &Invoker,
        request: &mut ContainerRequest,
    ) -> Option<Response> {
        let chain = merge_filters(
            &self.global_request_filters,
            invoker.request_filters().as_slice(),
        );
        for provider in &chain {
            let Some(filter) = provider.as_request_filter() else {
                continue;
            };
            if let Some(response) = filter.filter(request) {
                info!(
                    request_id = %request.request_id,
                    handler_name = %request.handler_name,
                    filter = %provider.name(),
                    status = response.status,
                    "Request aborted by filter"
                );
                return Some(response);
            }
        }
        None
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("endpoints", &self.handler_names())
            .field("pool", &self.pool)
            .finish()
    }
}

/// Adopt the caller's correlation ID when the request carries a valid one.
fn correlate(request: &mut ContainerRequest) {
    if let Some(id) = RequestId::from_header(request.get_header(REQUEST_ID_HEADER)) {
        request.request_id = id;
    }
}

fn merge_filters(global: &[Provider], bound: &[Provider]) -> Vec<Provider> {
    let mut chain = global.to_vec();
    chain.extend(bound.iter().filter(|p| !global.contains(p)).cloned());
    chain
}

/// Everything needed to turn a dispatch outcome into a written response,
/// on whichever coroutine the outcome arrives.
struct Completion {
    request: ContainerRequest,
    invoker: Arc<Invoker>,
    response_filters: Vec<Provider>,
    responding: RespondingContext,
    reply: Mutex<Option<mpsc::Sender<WrittenResponse>>>,
}

impl Completion {
    /// Responding stages, response filters, writer interceptors, send.
    fn finish(&self, outcome: Result<Option<ContainerResponse>, DispatchError>) {
        let Some(reply) = self.reply.lock().take() else {
            warn!(
                request_id = %self.request.request_id,
                "Response already sent - dropping duplicate completion"
            );
            return;
        };

        let mut response = match outcome {
            Ok(response) => self
                .responding
                .process(response)
                .unwrap_or_else(|| ContainerResponse::new(&self.request, None)),
            Err(e) => {
                warn!(
                    request_id = %self.request.request_id,
                    handler_name = %self.request.handler_name,
                    status = e.status(),
                    error = %e,
                    "Dispatch failed"
                );
                ContainerResponse::new(&self.request, Some(error_response(&e)))
            }
        };

        for provider in &self.response_filters {
            if let Some(filter) = provider.as_response_filter() {
                filter.filter(&self.request, &mut response);
            }
        }

        let status = response.status();
        let written = response
            .write(self.invoker.writer_interceptors())
            .unwrap_or_else(|e| {
                error!(
                    request_id = %self.request.request_id,
                    error = %e,
                    "Writing response entity failed"
                );
                WrittenResponse::error(self.request.request_id, e.status(), &e.to_string())
            });

        debug!(
            request_id = %self.request.request_id,
            handler_name = %self.request.handler_name,
            status = status,
            body_len = written.body.len(),
            "Response written"
        );
        let _ = reply.send(written);
    }
}

fn error_response(error: &DispatchError) -> Response {
    match error {
        DispatchError::Param(e) => e.to_response(),
        DispatchError::BadRequest { message, .. } => {
            Response::new(400).with_entity(serde_json::json!({
                "error": "Invalid request data",
                "message": message,
            }))
        }
        other => Response::error(other.status(), &other.to_string()),
    }
}
