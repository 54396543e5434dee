//! # Extract Module
//!
//! Typed parameter extraction with default values.
//!
//! A [`ValueExtractor`] is created per declared parameter while endpoints are
//! built. Its default is converted once and cached; converters that are not
//! marked [`Lazy`] have their defaults validated immediately, so a bad default
//! stops the application from starting.
//!
//! ```rust
//! use std::sync::Arc;
//! use brrtinvoker::extract::{FromStrConverter, ValueExtractor};
//!
//! let limit = ValueExtractor::<u32>::new(
//!     Arc::new(FromStrConverter::<u32>::new()),
//!     "limit",
//!     Some("25"),
//! )
//! .unwrap();
//! assert_eq!(limit.extract(None).unwrap(), Some(25));
//! assert_eq!(limit.extract(Some("10")).unwrap(), Some(10));
//! assert!(limit.extract(Some("ten")).is_err());
//! ```

mod converter;
mod error;
mod extractor;

pub use converter::{FromStrConverter, Lazy, ParamConverter};
pub use error::{ConversionError, ParamError};
pub use extractor::{ParamSource, ValueExtractor};
