use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::core::{Capability, Provider};

static NEXT_TAG_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque key associating providers with the endpoints that carry it.
///
/// A tag is an identity, not a value: two tags declared with the same name are
/// different tags. The name only shows up in logs and `Debug` output.
#[derive(Clone)]
pub struct BindingTag {
    id: u64,
    name: Arc<str>,
}

impl BindingTag {
    #[must_use]
    pub fn declare(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_TAG_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for BindingTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BindingTag {}

impl Hash for BindingTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for BindingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}#{}", self.name, self.id)
    }
}

type TagMap = HashMap<BindingTag, Vec<Provider>>;

/// Tag → providers index, one map per capability.
///
/// Populated once while the application is assembled and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct NameBoundProviders {
    request_filters: TagMap,
    response_filters: TagMap,
    reader_interceptors: TagMap,
    writer_interceptors: TagMap,
}

impl NameBoundProviders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File `provider` under `tag` in every map matching one of its capabilities.
    /// Registration order within a tag is preserved.
    pub fn bind(&mut self, tag: &BindingTag, provider: &Provider) {
        for capability in provider.capabilities().iter() {
            self.map_mut(capability)
                .entry(tag.clone())
                .or_default()
                .push(provider.clone());
        }
    }

    /// Providers bound to `tag` for `capability`; empty when nothing is bound.
    #[must_use]
    pub fn lookup(&self, capability: Capability, tag: &BindingTag) -> &[Provider] {
        self.map(capability)
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn request_filters(&self, tag: &BindingTag) -> &[Provider] {
        self.lookup(Capability::RequestFilter, tag)
    }

    #[must_use]
    pub fn response_filters(&self, tag: &BindingTag) -> &[Provider] {
        self.lookup(Capability::ResponseFilter, tag)
    }

    #[must_use]
    pub fn reader_interceptors(&self, tag: &BindingTag) -> &[Provider] {
        self.lookup(Capability::ReaderInterceptor, tag)
    }

    #[must_use]
    pub fn writer_interceptors(&self, tag: &BindingTag) -> &[Provider] {
        self.lookup(Capability::WriterInterceptor, tag)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.request_filters.is_empty()
            && self.response_filters.is_empty()
            && self.reader_interceptors.is_empty()
            && self.writer_interceptors.is_empty()
    }

    fn map(&self, capability: Capability) -> &TagMap {
        match capability {
            Capability::RequestFilter => &self.request_filters,
            Capability::ResponseFilter => &self.response_filters,
            Capability::ReaderInterceptor => &self.reader_interceptors,
            Capability::WriterInterceptor => &self.writer_interceptors,
        }
    }

    fn map_mut(&mut self, capability: Capability) -> &mut TagMap {
        match capability {
            Capability::RequestFilter => &mut self.request_filters,
            Capability::ResponseFilter => &mut self.response_filters,
            Capability::ReaderInterceptor => &mut self.reader_interceptors,
            Capability::WriterInterceptor => &mut self.writer_interceptors,
        }
    }
}
