use std::sync::Arc;

use super::async_context::AsyncContext;
use super::responding::RespondingContext;
use super::routing::RoutingContext;

/// The request-scoped collaborators of one dispatch.
///
/// A scope lives exactly as long as the request it was created for. It is
/// passed explicitly into [`Invoker::apply`](crate::invoker::Invoker::apply)
/// and must never be stored on anything that outlives the request.
pub struct RequestScope {
    routing: RoutingContext,
    async_context: Arc<dyn AsyncContext>,
    responding: RespondingContext,
}

impl RequestScope {
    #[must_use]
    pub fn new(
        routing: RoutingContext,
        async_context: Arc<dyn AsyncContext>,
        responding: RespondingContext,
    ) -> Self {
        Self {
            routing,
            async_context,
            responding,
        }
    }

    #[must_use]
    pub fn routing(&self) -> &RoutingContext {
        &self.routing
    }

    #[must_use]
    pub fn async_context(&self) -> &Arc<dyn AsyncContext> {
        &self.async_context
    }

    #[must_use]
    pub fn responding(&self) -> &RespondingContext {
        &self.responding
    }
}
