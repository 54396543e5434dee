use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, error};

use super::converter::ParamConverter;
use super::error::ParamError;
use crate::context::ContainerRequest;

/// Where in the request a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Cookie,
}

/// Converts one declared parameter's raw value, falling back to its default.
///
/// Built once per parameter while endpoints are assembled. The converted default
/// is memoized; unless the converter is lazy it is converted on construction so
/// a malformed default fails startup instead of a request.
pub struct ValueExtractor<T> {
    converter: Arc<dyn ParamConverter<T>>,
    name: String,
    default_value_str: Option<String>,
    default_value: OnceCell<Option<T>>,
}

impl<T: Clone> ValueExtractor<T> {
    /// # Errors
    ///
    /// [`ParamError::InvalidDefault`] if `default_value` does not convert and the
    /// converter is not lazy.
    pub fn new(
        converter: Arc<dyn ParamConverter<T>>,
        name: impl Into<String>,
        default_value: Option<&str>,
    ) -> Result<Self, ParamError> {
        let extractor = Self {
            converter,
            name: name.into(),
            default_value_str: default_value.map(str::to_owned),
            default_value: OnceCell::new(),
        };

        if extractor.default_value_str.is_some() && !extractor.converter.is_lazy() {
            extractor.default_value().inspect_err(|e| {
                error!(
                    parameter = %extractor.name,
                    error = %e,
                    "Default value failed validation"
                );
            })?;
        }

        debug!(
            parameter = %extractor.name,
            has_default = extractor.has_default(),
            lazy = extractor.converter.is_lazy(),
            "Value extractor created"
        );
        Ok(extractor)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default as declared, before conversion
    #[must_use]
    pub fn default_value_str(&self) -> Option<&str> {
        self.default_value_str.as_deref()
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_value_str.is_some()
    }

    /// The converted default, `None` when no default was declared.
    ///
    /// Converted on first call and cached. A failed conversion is not cached.
    ///
    /// # Errors
    ///
    /// [`ParamError::InvalidDefault`] if the default does not convert.
    pub fn default_value(&self) -> Result<Option<T>, ParamError> {
        let Some(raw) = self.default_value_str.as_deref() else {
            return Ok(None);
        };
        self.default_value
            .get_or_try_init(|| {
                self.converter
                    .convert(raw)
                    .map_err(|source| ParamError::InvalidDefault {
                        parameter: self.name.clone(),
                        source,
                    })
            })
            .cloned()
    }

    /// Convert `raw`, using the default when it is missing or converts to nothing.
    ///
    /// # Errors
    ///
    /// [`ParamError::Conversion`] naming this parameter when `raw` is invalid,
    /// or [`ParamError::InvalidDefault`] from a lazily converted default.
    pub fn extract(&self, raw: Option<&str>) -> Result<Option<T>, ParamError> {
        let converted = match raw {
            Some(raw) => self
                .converter
                .convert(raw)
                .map_err(|source| ParamError::Conversion {
                    parameter: self.name.clone(),
                    source,
                })?,
            None => None,
        };
        match converted {
            Some(value) => Ok(Some(value)),
            None => self.default_value(),
        }
    }

    /// Convert every value of a multi-valued parameter.
    ///
    /// No values yields the default alone, if there is one.
    ///
    /// # Errors
    ///
    /// The first conversion failure.
    pub fn extract_all(&self, raw: &[&str]) -> Result<Vec<T>, ParamError> {
        if raw.is_empty() {
            return Ok(self.default_value()?.into_iter().collect());
        }
        let mut values = Vec::with_capacity(raw.len());
        for value in raw.iter().copied() {
            if let Some(v) = self.extract(Some(value))? {
                values.push(v);
            }
        }
        Ok(values)
    }

    /// Read the parameter from `request` and convert it.
    ///
    /// # Errors
    ///
    /// See [`ValueExtractor::extract`].
    pub fn extract_from(
        &self,
        request: &ContainerRequest,
        source: ParamSource,
    ) -> Result<Option<T>, ParamError> {
        let raw = match source {
            ParamSource::Path => request.get_path_param(&self.name),
            ParamSource::Query => request.get_query_param(&self.name),
            ParamSource::Header => request.get_header(&self.name),
            ParamSource::Cookie => request.get_cookie(&self.name),
        };
        self.extract(raw)
    }
}

impl<T> fmt::Debug for ValueExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueExtractor")
            .field("name", &self.name)
            .field("default_value", &self.default_value_str)
            .field("converted", &self.default_value.get().is_some())
            .finish()
    }
}
