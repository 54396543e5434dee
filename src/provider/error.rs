use std::fmt;

/// Error returned by [`ProviderBuilder::build`](super::ProviderBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider implements none of the four capabilities.
    NoCapabilities {
        /// Name the provider was declared with
        name: String,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::NoCapabilities { name } => write!(
                f,
                "provider '{name}' implements neither a filter nor an interceptor"
            ),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Failure inside a reader or writer interceptor chain.
#[derive(Debug)]
pub enum InterceptorError {
    /// The request entity could not be decoded.
    Decode(serde_json::Error),
    /// The response entity could not be encoded.
    Encode(serde_json::Error),
    /// An interceptor refused to continue.
    Rejected {
        interceptor: String,
        reason: String,
    },
}

impl InterceptorError {
    #[must_use]
    pub fn rejected(interceptor: impl Into<String>, reason: impl Into<String>) -> Self {
        InterceptorError::Rejected {
            interceptor: interceptor.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status this failure maps to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            InterceptorError::Decode(_) => 400,
            InterceptorError::Encode(_) | InterceptorError::Rejected { .. } => 500,
        }
    }
}

impl fmt::Display for InterceptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptorError::Decode(e) => write!(f, "failed to decode request entity: {e}"),
            InterceptorError::Encode(e) => write!(f, "failed to encode response entity: {e}"),
            InterceptorError::Rejected {
                interceptor,
                reason,
            } => write!(f, "interceptor '{interceptor}' rejected the entity: {reason}"),
        }
    }
}

impl std::error::Error for InterceptorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InterceptorError::Decode(e) | InterceptorError::Encode(e) => Some(e),
            InterceptorError::Rejected { .. } => None,
        }
    }
}
