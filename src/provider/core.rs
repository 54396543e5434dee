use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

use super::binding::BindingTag;
use super::error::{InterceptorError, ProviderError};
use super::interceptors::{ReaderInterceptorContext, WriterInterceptorContext};
use crate::context::{ContainerRequest, ContainerResponse, Response};

/// Priority assigned to providers that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 5000;

/// Inspects or mutates a request before the handler runs.
pub trait RequestFilter: Send + Sync {
    /// Returning `Some` aborts the request with that response; the handler is
    /// never invoked.
    fn filter(&self, request: &mut ContainerRequest) -> Option<Response>;
}

/// Inspects or mutates a response after the handler produced it.
pub trait ResponseFilter: Send + Sync {
    fn filter(&self, request: &ContainerRequest, response: &mut ContainerResponse);
}

/// Wraps deserialization of the request entity.
///
/// Implementations call [`ReaderInterceptorContext::proceed`] to hand control
/// to the next interceptor (or the decoder) and may rewrite the raw bytes
/// before, or the decoded value after, that call.
pub trait ReaderInterceptor: Send + Sync {
    fn around_read_from(
        &self,
        ctx: &mut ReaderInterceptorContext<'_>,
    ) -> Result<Value, InterceptorError>;
}

/// Wraps serialization of the response entity.
pub trait WriterInterceptor: Send + Sync {
    fn around_write_to(&self, ctx: &mut WriterInterceptorContext<'_>)
        -> Result<(), InterceptorError>;
}

/// One of the four roles a provider can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    RequestFilter,
    ResponseFilter,
    ReaderInterceptor,
    WriterInterceptor,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::RequestFilter,
        Capability::ResponseFilter,
        Capability::ReaderInterceptor,
        Capability::WriterInterceptor,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// The subset of [`Capability`] values a provider satisfies.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const EMPTY: Capabilities = Capabilities(0);

    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Capabilities(self.0 | capability.bit())
    }

    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider-{}", self.0)
    }
}

struct ProviderInner {
    id: ProviderId,
    name: Arc<str>,
    priority: i32,
    capabilities: Capabilities,
    binding_tags: SmallVec<[BindingTag; 2]>,
    request_filter: Option<Arc<dyn RequestFilter>>,
    response_filter: Option<Arc<dyn ResponseFilter>>,
    reader_interceptor: Option<Arc<dyn ReaderInterceptor>>,
    writer_interceptor: Option<Arc<dyn WriterInterceptor>>,
}

/// A shared filter/interceptor registration.
///
/// A provider may play any nonempty combination of the four roles. Its
/// capability set is computed once when it is built. Clones share the same
/// identity, and equality and hashing are by identity, so the same provider
/// reaching an invoker through two sources is recognised as one.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

impl Provider {
    #[must_use]
    pub fn builder(name: impl Into<Arc<str>>) -> ProviderBuilder {
        ProviderBuilder {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            binding_tags: SmallVec::new(),
            request_filter: None,
            response_filter: None,
            reader_interceptor: None,
            writer_interceptor: None,
        }
    }

    /// Global request filter with default priority.
    #[must_use]
    pub fn request_filter<F: RequestFilter + 'static>(name: impl Into<Arc<str>>, filter: F) -> Self {
        Self::builder(name)
            .with_request_filter(Arc::new(filter))
            .assemble()
    }

    /// Global response filter with default priority.
    #[must_use]
    pub fn response_filter<F: ResponseFilter + 'static>(
        name: impl Into<Arc<str>>,
        filter: F,
    ) -> Self {
        Self::builder(name)
            .with_response_filter(Arc::new(filter))
            .assemble()
    }

    #[must_use]
    pub fn reader_interceptor<I: ReaderInterceptor + 'static>(
        name: impl Into<Arc<str>>,
        priority: i32,
        interceptor: I,
    ) -> Self {
        Self::builder(name)
            .priority(priority)
            .with_reader_interceptor(Arc::new(interceptor))
            .assemble()
    }

    #[must_use]
    pub fn writer_interceptor<I: WriterInterceptor + 'static>(
        name: impl Into<Arc<str>>,
        priority: i32,
        interceptor: I,
    ) -> Self {
        Self::builder(name)
            .priority(priority)
            .with_writer_interceptor(Arc::new(interceptor))
            .assemble()
    }

    #[must_use]
    pub fn id(&self) -> ProviderId {
        self.inner.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.inner.priority
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    /// Tags this provider is name-bound to. Empty for global providers.
    #[must_use]
    pub fn binding_tags(&self) -> &[BindingTag] {
        &self.inner.binding_tags
    }

    #[must_use]
    pub fn is_name_bound(&self) -> bool {
        !self.inner.binding_tags.is_empty()
    }

    #[must_use]
    pub fn as_request_filter(&self) -> Option<&dyn RequestFilter> {
        self.inner.request_filter.as_deref()
    }

    #[must_use]
    pub fn as_response_filter(&self) -> Option<&dyn ResponseFilter> {
        self.inner.response_filter.as_deref()
    }

    #[must_use]
    pub fn as_reader_interceptor(&self) -> Option<&dyn ReaderInterceptor> {
        self.inner.reader_interceptor.as_deref()
    }

    #[must_use]
    pub fn as_writer_interceptor(&self) -> Option<&dyn WriterInterceptor> {
        self.inner.writer_interceptor.as_deref()
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Provider {}

impl std::hash::Hash for Provider {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("priority", &self.inner.priority)
            .field("capabilities", &self.inner.capabilities)
            .field("binding_tags", &self.inner.binding_tags)
            .finish()
    }
}

/// Builder for [`Provider`].
///
/// One concrete type implementing several capability traits is registered by
/// passing clones of the same `Arc` to each `with_*` method:
///
/// ```rust
/// use std::sync::Arc;
/// use brrtinvoker::context::{ContainerRequest, ContainerResponse, Response};
/// use brrtinvoker::provider::{Capability, Provider, RequestFilter, ResponseFilter};
///
/// struct Audit;
///
/// impl RequestFilter for Audit {
///     fn filter(&self, _req: &mut ContainerRequest) -> Option<Response> {
///         None
///     }
/// }
///
/// impl ResponseFilter for Audit {
///     fn filter(&self, _req: &ContainerRequest, _res: &mut ContainerResponse) {}
/// }
///
/// let audit = Arc::new(Audit);
/// let provider = Provider::builder("audit")
///     .with_request_filter(Arc::clone(&audit))
///     .with_response_filter(audit)
///     .build()
///     .unwrap();
/// assert!(provider.capabilities().contains(Capability::ResponseFilter));
/// ```
pub struct ProviderBuilder {
    name: Arc<str>,
    priority: i32,
    binding_tags: SmallVec<[BindingTag; 2]>,
    request_filter: Option<Arc<dyn RequestFilter>>,
    response_filter: Option<Arc<dyn ResponseFilter>>,
    reader_interceptor: Option<Arc<dyn ReaderInterceptor>>,
    writer_interceptor: Option<Arc<dyn WriterInterceptor>>,
}

impl ProviderBuilder {
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Name-bind the provider to `tag`. Providers without tags are global.
    #[must_use]
    pub fn bind_to(mut self, tag: &BindingTag) -> Self {
        self.binding_tags.push(tag.clone());
        self
    }

    #[must_use]
    pub fn with_request_filter<F: RequestFilter + 'static>(mut self, filter: Arc<F>) -> Self {
        self.request_filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_response_filter<F: ResponseFilter + 'static>(mut self, filter: Arc<F>) -> Self {
        self.response_filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_reader_interceptor<I: ReaderInterceptor + 'static>(
        mut self,
        interceptor: Arc<I>,
    ) -> Self {
        self.reader_interceptor = Some(interceptor);
        self
    }

    #[must_use]
    pub fn with_writer_interceptor<I: WriterInterceptor + 'static>(
        mut self,
        interceptor: Arc<I>,
    ) -> Self {
        self.writer_interceptor = Some(interceptor);
        self
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::EMPTY;
        if self.request_filter.is_some() {
            capabilities = capabilities.with(Capability::RequestFilter);
        }
        if self.response_filter.is_some() {
            capabilities = capabilities.with(Capability::ResponseFilter);
        }
        if self.reader_interceptor.is_some() {
            capabilities = capabilities.with(Capability::ReaderInterceptor);
        }
        if self.writer_interceptor.is_some() {
            capabilities = capabilities.with(Capability::WriterInterceptor);
        }
        capabilities
    }

    /// Build the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoCapabilities`] if no filter or interceptor was supplied.
    pub fn build(self) -> Result<Provider, ProviderError> {
        if self.capabilities().is_empty() {
            return Err(ProviderError::NoCapabilities {
                name: self.name.to_string(),
            });
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> Provider {
        let capabilities = self.capabilities();
        Provider {
            inner: Arc::new(ProviderInner {
                id: ProviderId(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed)),
                name: self.name,
                priority: self.priority,
                capabilities,
                binding_tags: self.binding_tags,
                request_filter: self.request_filter,
                response_filter: self.response_filter,
                reader_interceptor: self.reader_interceptor,
                writer_interceptor: self.writer_interceptor,
            }),
        }
    }
}
