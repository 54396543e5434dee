use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use may::coroutine;
use may::sync::mpsc;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::context::{panic_message, ContainerRequest, ResourceInstance, Response};
use crate::invoker::{DispatchError, HandlerDispatcher};
use crate::runtime_config::RuntimeConfig;

/// Outcome sent back from a handler coroutine.
pub type HandlerReply = Result<Option<Response>, DispatchError>;

/// One call queued on a handler coroutine.
pub struct HandlerCall {
    pub request: ContainerRequest,
    pub resource: ResourceInstance,
    reply_tx: mpsc::Sender<HandlerReply>,
}

/// Handler running in its own `may` coroutine, fed through a channel.
///
/// Each dispatch sends the request together with a reply sender and waits for
/// the answer. Handler panics are caught in the coroutine and come back as
/// [`DispatchError::Panicked`]; a coroutine that is gone shows up as
/// [`DispatchError::Unavailable`].
pub struct ChannelDispatcher {
    handler_name: String,
    sender: Mutex<mpsc::Sender<HandlerCall>>,
}

impl ChannelDispatcher {
    /// Spawn the handler coroutine.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] if the coroutine cannot be spawned.
    pub fn spawn<F>(
        handler_name: &str,
        config: &RuntimeConfig,
        handler_fn: F,
    ) -> Result<Self, DispatchError>
    where
        F: Fn(&ResourceInstance, &ContainerRequest) -> anyhow::Result<Option<Response>>
            + Send
            + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerCall>();
        let name = handler_name.to_string();
        let stack_size = config.stack_size;

        // SAFETY: may::coroutine::Builder::spawn() is unsafe because coroutines
        // must not hold thread-local references across yields. The handler is
        // Send + 'static and the loop keeps no TLS borrows.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .name(format!("handler-{handler_name}"))
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(
                        handler_name = %name,
                        stack_size = stack_size,
                        "Handler coroutine start"
                    );

                    for call in rx.iter() {
                        let HandlerCall {
                            request,
                            resource,
                            reply_tx,
                        } = call;
                        let request_id = request.request_id;
                        let execution_start = Instant::now();

                        let reply = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            handler_fn(&resource, &request)
                                .map_err(|source| DispatchError::handler(name.as_str(), source))
                        }))
                        .unwrap_or_else(|panic| {
                            let message = panic_message(panic.as_ref());
                            error!(
                                request_id = %request_id,
                                handler_name = %name,
                                panic_message = %message,
                                "Handler panicked - CRITICAL"
                            );
                            Err(DispatchError::Panicked { message })
                        });

                        debug!(
                            request_id = %request_id,
                            handler_name = %name,
                            execution_time_ms = execution_start.elapsed().as_millis() as u64,
                            success = reply.is_ok(),
                            "Handler execution complete"
                        );
                        let _ = reply_tx.send(reply);
                    }

                    debug!(handler_name = %name, "Handler coroutine exiting");
                })
        };

        if let Err(e) = spawn_result {
            error!(
                handler_name = %handler_name,
                error = %e,
                stack_size = stack_size,
                "Failed to spawn handler coroutine - CRITICAL"
            );
            return Err(DispatchError::Unavailable {
                reason: format!("cannot spawn handler coroutine: {e}"),
            });
        }

        info!(handler_name = %handler_name, "Handler coroutine registered");
        Ok(Self {
            handler_name: handler_name.to_string(),
            sender: Mutex::new(tx),
        })
    }

    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }
}

impl HandlerDispatcher for ChannelDispatcher {
    fn dispatch(
        &self,
        resource: &ResourceInstance,
        request: &ContainerRequest,
    ) -> Result<Option<Response>, DispatchError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let sender = self.sender.lock().clone();
        sender
            .send(HandlerCall {
                request: request.clone(),
                resource: Arc::clone(resource),
                reply_tx,
            })
            .map_err(|_| DispatchError::Unavailable {
                reason: format!("handler '{}' is not running", self.handler_name),
            })?;

        reply_rx.recv().map_err(|_| DispatchError::Unavailable {
            reason: format!("handler '{}' dropped the request", self.handler_name),
        })?
    }
}

impl fmt::Debug for ChannelDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDispatcher")
            .field("handler_name", &self.handler_name)
            .finish()
    }
}
