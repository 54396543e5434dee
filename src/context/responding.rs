use std::sync::Arc;

use parking_lot::Mutex;

use super::response::ContainerResponse;

/// A transformation applied to the response once it exists.
pub type ResponseStage =
    Box<dyn FnOnce(Option<ContainerResponse>) -> Option<ContainerResponse> + Send>;

/// Per-request stack of response stages.
///
/// Stages may be pushed from the request thread or from a managed-async worker,
/// so the stack is shared behind a lock. [`RespondingContext::process`] drains it:
/// every stage runs at most once, last pushed first.
#[derive(Clone, Default)]
pub struct RespondingContext {
    stages: Arc<Mutex<Vec<ResponseStage>>>,
}

impl RespondingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, stage: ResponseStage) {
        self.stages.lock().push(stage);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.lock().is_empty()
    }

    /// Run and discard every pushed stage.
    #[must_use]
    pub fn process(&self, response: Option<ContainerResponse>) -> Option<ContainerResponse> {
        let stages = std::mem::take(&mut *self.stages.lock());
        stages
            .into_iter()
            .rev()
            .fold(response, |response, stage| stage(response))
    }
}

impl std::fmt::Debug for RespondingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespondingContext")
            .field("stages", &self.len())
            .finish()
    }
}
