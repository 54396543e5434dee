use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::response::Response;
use crate::ids::RequestId;
use crate::invoker::DispatchError;
use crate::worker_pool::ManagedPool;

/// Lifecycle of a request's response resolution.
///
/// `Initial → Terminal` for synchronous requests,
/// `Initial → Suspended → Completing → Terminal` for suspended ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncState {
    Initial,
    Suspended,
    Completing,
    Terminal,
}

/// Unit of work executed on the managed-async pool.
///
/// `Ok(None)` means the handler resolves the response itself.
pub type ManagedWork = Box<dyn FnOnce() -> Result<Option<Response>, DispatchError> + Send>;

/// Callback receiving the outcome of a suspended request exactly once.
pub type Resolver = Box<dyn FnOnce(Result<Response, DispatchError>) + Send>;

/// Request-scoped suspension control.
pub trait AsyncContext: Send + Sync {
    /// Move from `Initial` to `Suspended`. Returns `false` and changes nothing
    /// from any other state.
    fn suspend(&self) -> bool;

    /// Run `work` off the calling path. A produced response, or a failure,
    /// resumes the context; `Ok(None)` leaves resolution to the handler.
    fn invoke_managed(&self, work: ManagedWork);

    /// Resolve a suspended context. Returns `false` unless the context was
    /// `Suspended`.
    fn resume(&self, outcome: Result<Response, DispatchError>) -> bool;

    fn state(&self) -> AsyncState;
}

struct SuspendableInner {
    request_id: RequestId,
    state: Mutex<AsyncState>,
    resolver: Mutex<Option<Resolver>>,
    pool: Arc<ManagedPool>,
}

/// [`AsyncContext`] backed by the managed-async coroutine pool.
#[derive(Clone)]
pub struct SuspendableContext {
    inner: Arc<SuspendableInner>,
}

impl SuspendableContext {
    #[must_use]
    pub fn new(request_id: RequestId, pool: Arc<ManagedPool>, resolver: Resolver) -> Self {
        Self {
            inner: Arc::new(SuspendableInner {
                request_id,
                state: Mutex::new(AsyncState::Initial),
                resolver: Mutex::new(Some(resolver)),
                pool,
            }),
        }
    }

    /// Mark a synchronously answered request as finished (`Initial → Terminal`).
    pub fn complete(&self) -> bool {
        let mut state = self.inner.state.lock();
        if *state != AsyncState::Initial {
            return false;
        }
        *state = AsyncState::Terminal;
        true
    }
}

impl AsyncContext for SuspendableContext {
    fn suspend(&self) -> bool {
        let mut state = self.inner.state.lock();
        if *state != AsyncState::Initial {
            warn!(
                request_id = %self.inner.request_id,
                state = ?*state,
                "Suspend rejected - context already left initial state"
            );
            return false;
        }
        *state = AsyncState::Suspended;
        debug!(request_id = %self.inner.request_id, "Request suspended");
        true
    }

    fn invoke_managed(&self, work: ManagedWork) {
        let cx = self.clone();
        let request_id = self.inner.request_id;
        let submitted = self.inner.pool.submit(Box::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|panic| {
                let message = panic_message(panic.as_ref());
                error!(
                    request_id = %request_id,
                    panic_message = %message,
                    "Managed handler panicked - CRITICAL"
                );
                Err(DispatchError::Panicked { message })
            });
            match outcome {
                Ok(Some(response)) => {
                    cx.resume(Ok(response));
                }
                Ok(None) => {
                    debug!(
                        request_id = %request_id,
                        "Managed unit finished without a response - handler resolves it"
                    );
                }
                Err(e) => {
                    cx.resume(Err(e));
                }
            }
        }));

        if let Err(e) = submitted {
            error!(
                request_id = %request_id,
                error = %e,
                "Managed unit could not be scheduled"
            );
            self.resume(Err(e));
        }
    }

    fn resume(&self, outcome: Result<Response, DispatchError>) -> bool {
        {
            let mut state = self.inner.state.lock();
            if *state != AsyncState::Suspended {
                warn!(
                    request_id = %self.inner.request_id,
                    state = ?*state,
                    "Resume rejected - context is not suspended"
                );
                return false;
            }
            *state = AsyncState::Completing;
        }

        let resolver = self.inner.resolver.lock().take();
        if let Some(resolver) = resolver {
            resolver(outcome);
        }
        *self.inner.state.lock() = AsyncState::Terminal;
        debug!(request_id = %self.inner.request_id, "Suspended request resolved");
        true
    }

    fn state(&self) -> AsyncState {
        *self.inner.state.lock()
    }
}

impl fmt::Debug for SuspendableContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspendableContext")
            .field("request_id", &self.inner.request_id)
            .field("state", &self.state())
            .finish()
    }
}

/// Handle given to handlers of suspended endpoints for completing the response
/// later, from any thread or coroutine.
#[derive(Clone)]
pub struct AsyncResponse {
    context: Arc<dyn AsyncContext>,
}

impl AsyncResponse {
    #[must_use]
    pub fn new(context: Arc<dyn AsyncContext>) -> Self {
        Self { context }
    }

    /// Resolve the suspended request with `response`.
    pub fn resume(&self, response: Response) -> bool {
        self.context.resume(Ok(response))
    }

    /// Resolve the suspended request with a failure.
    pub fn resume_with_error(&self, error: DispatchError) -> bool {
        self.context.resume(Err(error))
    }

    /// Give up on the request; the client receives `503 Service Unavailable`.
    pub fn cancel(&self) -> bool {
        self.context
            .resume(Ok(Response::error(503, "Service Unavailable")))
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.context.state() == AsyncState::Suspended
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.context.state() == AsyncState::Terminal
    }
}

impl fmt::Debug for AsyncResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResponse")
            .field("state", &self.context.state())
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;

    fn context_with_sink() -> (
        SuspendableContext,
        Arc<Mutex<Vec<Result<Response, DispatchError>>>>,
    ) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&sink);
        let pool = Arc::new(ManagedPool::new(&RuntimeConfig::default()));
        let cx = SuspendableContext::new(
            RequestId::new(),
            pool,
            Box::new(move |outcome| captured.lock().push(outcome)),
        );
        (cx, sink)
    }

    #[test]
    fn test_suspend_then_resume_transitions() {
        let (cx, sink) = context_with_sink();
        assert_eq!(cx.state(), AsyncState::Initial);
        assert!(cx.suspend());
        assert_eq!(cx.state(), AsyncState::Suspended);
        assert!(!cx.suspend());

        assert!(cx.resume(Ok(Response::new(200))));
        assert_eq!(cx.state(), AsyncState::Terminal);
        assert!(!cx.resume(Ok(Response::new(500))));
        assert_eq!(sink.lock().len(), 1);
    }

    #[test]
    fn test_resume_without_suspend_is_rejected() {
        let (cx, sink) = context_with_sink();
        assert!(!cx.resume(Ok(Response::new(200))));
        assert!(sink.lock().is_empty());
        assert!(cx.complete());
        assert_eq!(cx.state(), AsyncState::Terminal);
        assert!(!cx.suspend());
    }

    #[test]
    fn test_cancel_resolves_with_service_unavailable() {
        let (cx, sink) = context_with_sink();
        cx.suspend();
        let handle = AsyncResponse::new(Arc::new(cx.clone()));
        assert!(handle.is_suspended());
        assert!(handle.cancel());
        assert!(handle.is_done());
        let outcomes = sink.lock();
        assert!(matches!(&outcomes[0], Ok(r) if r.status == 503));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
