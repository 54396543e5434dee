use std::fmt;

use crate::context::Response;

/// A converter could not turn a raw string into its target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub input: String,
    pub message: String,
}

impl ConversionError {
    pub fn new(input: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            input: input.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for ConversionError {}

/// Parameter conversion failure, attributed to the parameter it happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// The declared default value does not convert. Raised while endpoints are
    /// built and fatal to startup.
    InvalidDefault {
        parameter: String,
        source: ConversionError,
    },
    /// A request supplied a value that does not convert.
    Conversion {
        parameter: String,
        source: ConversionError,
    },
}

impl ParamError {
    #[must_use]
    pub fn parameter(&self) -> &str {
        match self {
            ParamError::InvalidDefault { parameter, .. } | ParamError::Conversion { parameter, .. } => {
                parameter
            }
        }
    }

    /// 500 for a broken default (server fault), 400 for a bad request value
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ParamError::InvalidDefault { .. } => 500,
            ParamError::Conversion { .. } => 400,
        }
    }

    /// Error response naming the offending parameter.
    #[must_use]
    pub fn to_response(&self) -> Response {
        let source = match self {
            ParamError::InvalidDefault { source, .. } | ParamError::Conversion { source, .. } => {
                source
            }
        };
        Response::new(self.status()).with_entity(serde_json::json!({
            "error": match self {
                ParamError::InvalidDefault { .. } => "Invalid default value",
                ParamError::Conversion { .. } => "Invalid parameter",
            },
            "parameter": self.parameter(),
            "message": source.to_string(),
        }))
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::InvalidDefault { parameter, source } => {
                write!(f, "invalid default value for parameter '{parameter}': {source}")
            }
            ParamError::Conversion { parameter, source } => {
                write!(f, "invalid value for parameter '{parameter}': {source}")
            }
        }
    }
}

impl std::error::Error for ParamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParamError::InvalidDefault { source, .. } | ParamError::Conversion { source, .. } => {
                Some(source)
            }
        }
    }
}
