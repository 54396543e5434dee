use std::fmt;

use crate::extract::ParamError;
use crate::provider::InterceptorError;

/// Failure raised while dispatching a request to its handler.
///
/// The invoker never translates these; they travel unchanged to whoever maps
/// errors to responses ([`Application`](crate::application::Application) does).
#[derive(Debug)]
pub enum DispatchError {
    /// The handler itself failed
    Handler {
        handler: String,
        source: anyhow::Error,
    },
    /// Argument binding failed for a parameter
    Param(ParamError),
    /// The request entity could not be read
    Entity(InterceptorError),
    /// The request could not be converted into the handler's typed input
    BadRequest { handler: String, message: String },
    /// Routing left no resource instance to invoke the handler on
    NoMatchedResource { handler: String },
    /// The handler panicked
    Panicked { message: String },
    /// The handler could not be reached (closed channel, no workers)
    Unavailable { reason: String },
}

impl DispatchError {
    /// Wrap a handler failure.
    pub fn handler(handler: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        DispatchError::Handler {
            handler: handler.into(),
            source: source.into(),
        }
    }

    /// HTTP status code this failure maps to
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::Param(e) => e.status(),
            DispatchError::Entity(e) => e.status(),
            DispatchError::BadRequest { .. } => 400,
            DispatchError::Unavailable { .. } => 503,
            DispatchError::Handler { .. }
            | DispatchError::NoMatchedResource { .. }
            | DispatchError::Panicked { .. } => 500,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler { handler, source } => {
                write!(f, "handler '{handler}' failed: {source}")
            }
            DispatchError::Param(e) => write!(f, "{e}"),
            DispatchError::Entity(e) => write!(f, "cannot read request entity: {e}"),
            DispatchError::BadRequest { handler, message } => {
                write!(f, "invalid request data for handler '{handler}': {message}")
            }
            DispatchError::NoMatchedResource { handler } => {
                write!(f, "no matched resource for handler '{handler}'")
            }
            DispatchError::Panicked { message } => write!(f, "handler panicked: {message}"),
            DispatchError::Unavailable { reason } => write!(f, "handler unavailable: {reason}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler { source, .. } => Some(&**source),
            DispatchError::Param(e) => Some(e),
            DispatchError::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamError> for DispatchError {
    fn from(e: ParamError) -> Self {
        DispatchError::Param(e)
    }
}

impl From<InterceptorError> for DispatchError {
    fn from(e: InterceptorError) -> Self {
        DispatchError::Entity(e)
    }
}
