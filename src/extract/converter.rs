use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use super::error::ConversionError;

/// Converts a raw parameter string into `T`.
///
/// `Ok(None)` means the input represents no value, which makes the extractor
/// fall back to the default.
pub trait ParamConverter<T>: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `raw` is not a valid `T`.
    fn convert(&self, raw: &str) -> Result<Option<T>, ConversionError>;

    /// Whether default-value conversion may be deferred to first use. Eager
    /// converters have their defaults validated when the extractor is built.
    fn is_lazy(&self) -> bool {
        false
    }
}

/// Converter for any `FromStr` type. Empty input is treated as absent.
pub struct FromStrConverter<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> FromStrConverter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParamConverter<T> for FromStrConverter<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn convert(&self, raw: &str) -> Result<Option<T>, ConversionError> {
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<T>()
            .map(Some)
            .map_err(|e| ConversionError::new(raw, e))
    }
}

/// Marks the wrapped converter as safe for deferred default conversion.
pub struct Lazy<C>(pub C);

impl<T, C: ParamConverter<T>> ParamConverter<T> for Lazy<C> {
    fn convert(&self, raw: &str) -> Result<Option<T>, ConversionError> {
        self.0.convert(raw)
    }

    fn is_lazy(&self) -> bool {
        true
    }
}

impl<T, F> ParamConverter<T> for F
where
    F: Fn(&str) -> Result<Option<T>, ConversionError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> Result<Option<T>, ConversionError> {
        self(raw)
    }
}
