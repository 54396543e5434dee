//! Entity stream chains.
//!
//! Interceptors nest around (de)serialization: each one receives the context,
//! optionally rewrites it, and calls `proceed()` to run the rest of the chain.
//! The innermost step is plain `serde_json`.

use std::sync::Arc;

use serde_json::Value;

use super::core::Provider;
use super::error::InterceptorError;
use crate::context::HeaderVec;
use crate::model::{Marker, TypeDescriptor};

/// State threaded through the reader interceptor chain.
pub struct ReaderInterceptorContext<'a> {
    interceptors: &'a [Provider],
    next: usize,
    headers: &'a HeaderVec,
    entity: Vec<u8>,
}

impl<'a> ReaderInterceptorContext<'a> {
    pub(crate) fn new(interceptors: &'a [Provider], headers: &'a HeaderVec, entity: Vec<u8>) -> Self {
        Self {
            interceptors,
            next: 0,
            headers,
            entity,
        }
    }

    /// Request header lookup (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn entity(&self) -> &[u8] {
        &self.entity
    }

    /// Replace the raw entity bytes seen by the rest of the chain.
    pub fn set_entity(&mut self, entity: Vec<u8>) {
        self.entity = entity;
    }

    /// Run the next interceptor, or decode the entity when none is left.
    ///
    /// # Errors
    ///
    /// Propagates interceptor failures and JSON decoding errors.
    pub fn proceed(&mut self) -> Result<Value, InterceptorError> {
        let interceptors = self.interceptors;
        while let Some(provider) = interceptors.get(self.next) {
            self.next += 1;
            if let Some(interceptor) = provider.as_reader_interceptor() {
                return interceptor.around_read_from(self);
            }
        }
        serde_json::from_slice(&self.entity).map_err(InterceptorError::Decode)
    }
}

/// State threaded through the writer interceptor chain.
pub struct WriterInterceptorContext<'a> {
    interceptors: &'a [Provider],
    next: usize,
    entity: Value,
    entity_type: &'a TypeDescriptor,
    markers: &'a [Marker],
    headers: &'a mut HeaderVec,
    output: Vec<u8>,
}

impl<'a> WriterInterceptorContext<'a> {
    pub(crate) fn new(
        interceptors: &'a [Provider],
        entity: Value,
        entity_type: &'a TypeDescriptor,
        markers: &'a [Marker],
        headers: &'a mut HeaderVec,
    ) -> Self {
        Self {
            interceptors,
            next: 0,
            entity,
            entity_type,
            markers,
            headers,
            output: Vec::new(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &Value {
        &self.entity
    }

    pub fn set_entity(&mut self, entity: Value) {
        self.entity = entity;
    }

    /// Declared type of the entity after post-processing.
    #[must_use]
    pub fn entity_type(&self) -> &TypeDescriptor {
        self.entity_type
    }

    /// Handler markers followed by entity markers.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        self.markers
    }

    /// Add or replace a response header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Serialized bytes produced so far. Empty until the innermost step ran.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn set_output(&mut self, output: Vec<u8>) {
        self.output = output;
    }

    /// Run the next interceptor, or encode the entity when none is left.
    ///
    /// # Errors
    ///
    /// Propagates interceptor failures and JSON encoding errors.
    pub fn proceed(&mut self) -> Result<(), InterceptorError> {
        let interceptors = self.interceptors;
        while let Some(provider) = interceptors.get(self.next) {
            self.next += 1;
            if let Some(interceptor) = provider.as_writer_interceptor() {
                return interceptor.around_write_to(self);
            }
        }
        self.output = serde_json::to_vec(&self.entity).map_err(InterceptorError::Encode)?;
        Ok(())
    }

    pub(crate) fn into_output(self) -> Vec<u8> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ReaderInterceptor, WriterInterceptor};
    use serde_json::json;

    /// Strips a `v1:` envelope from the raw bytes.
    struct Unwrap;

    impl ReaderInterceptor for Unwrap {
        fn around_read_from(
            &self,
            ctx: &mut ReaderInterceptorContext<'_>,
        ) -> Result<Value, InterceptorError> {
            if let Some(inner) = ctx.entity().strip_prefix(b"v1:") {
                let inner = inner.to_vec();
                ctx.set_entity(inner);
            }
            ctx.proceed()
        }
    }

    /// Appends a newline after everything inside it has written.
    struct Newline;

    impl WriterInterceptor for Newline {
        fn around_write_to(
            &self,
            ctx: &mut WriterInterceptorContext<'_>,
        ) -> Result<(), InterceptorError> {
            ctx.proceed()?;
            let mut output = ctx.output().to_vec();
            output.push(b'\n');
            ctx.set_output(output);
            Ok(())
        }
    }

    /// Wraps the entity and tags the response before encoding.
    struct Envelope;

    impl WriterInterceptor for Envelope {
        fn around_write_to(
            &self,
            ctx: &mut WriterInterceptorContext<'_>,
        ) -> Result<(), InterceptorError> {
            let wrapped = json!({ "data": ctx.entity().clone() });
            ctx.set_entity(wrapped);
            ctx.set_header("x-envelope", ctx.markers().len().to_string());
            ctx.proceed()
        }
    }

    struct Deny;

    impl WriterInterceptor for Deny {
        fn around_write_to(
            &self,
            _ctx: &mut WriterInterceptorContext<'_>,
        ) -> Result<(), InterceptorError> {
            Err(InterceptorError::rejected("deny", "not today"))
        }
    }

    #[test]
    fn test_reader_chain_rewrites_bytes_before_decoding() {
        let interceptors = [Provider::reader_interceptor("unwrap", 1, Unwrap)];
        let headers = HeaderVec::new();
        let mut ctx = ReaderInterceptorContext::new(&interceptors, &headers, b"v1:{\"a\":1}".to_vec());
        assert_eq!(ctx.proceed().unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn test_reader_chain_reports_bad_json() {
        let headers = HeaderVec::new();
        let mut ctx = ReaderInterceptorContext::new(&[], &headers, b"{".to_vec());
        let err = ctx.proceed().unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_writer_chain_nests_in_list_order() {
        let interceptors = [
            Provider::writer_interceptor("newline", 1, Newline),
            Provider::writer_interceptor("envelope", 2, Envelope),
        ];
        let entity_type = TypeDescriptor::untyped();
        let markers = [Marker::new("A"), Marker::new("B")];
        let mut headers = HeaderVec::new();

        let mut ctx =
            WriterInterceptorContext::new(&interceptors, json!(7), &entity_type, &markers, &mut headers);
        ctx.proceed().unwrap();
        assert_eq!(ctx.into_output(), b"{\"data\":7}\n".to_vec());
        assert_eq!(headers[0].1, "2");
    }

    #[test]
    fn test_rejecting_writer_stops_the_chain() {
        let interceptors = [
            Provider::writer_interceptor("deny", 1, Deny),
            Provider::writer_interceptor("newline", 2, Newline),
        ];
        let entity_type = TypeDescriptor::untyped();
        let mut headers = HeaderVec::new();

        let mut ctx =
            WriterInterceptorContext::new(&interceptors, json!(null), &entity_type, &[], &mut headers);
        let err = ctx.proceed().unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(ctx.output().is_empty());
    }
}
