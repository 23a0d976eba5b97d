use std::fmt::{Debug, Formatter};
use std::io::Read;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use url::Url;

use weft_store::StoreError;

use crate::DerefError;

/// A media-typed, read-once byte stream produced by a dereferencer.
///
/// Consumers must read to EOF or drop the value; there is no rewinding. The
/// media type is the declared one (e.g. the `Content-Type` response header),
/// stripped of parameters.
pub struct Representation {
    media_type: String,
    body: Box<dyn Read + Send>,
}

impl Representation {
    pub fn new(media_type: impl Into<String>, body: impl Read + Send + 'static) -> Self {
        Representation {
            media_type: media_type.into(),
            body: Box::new(body),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn body_mut(&mut self) -> &mut (dyn Read + Send) {
        &mut *self.body
    }
}

impl Debug for Representation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Representation")
            .field("media_type", &self.media_type)
            .finish_non_exhaustive()
    }
}

/// Answers redirect discoveries during a fetch.
///
/// The engine's implementation records the hop as a `redirectsTo` statement and
/// reports whether the target document is already cached and fresh, in which
/// case the dereferencer stops and yields `None`.
pub trait RedirectObserver {
    fn on_redirect(&mut self, source: &Url, target: &Url) -> Result<bool, StoreError>;
}

/// Per-call collaboration handed to a dereferencer: the negotiated Accept
/// preference string and the redirect observer.
pub struct DerefContext<'a> {
    pub accept: Option<String>,
    pub redirects: &'a mut dyn RedirectObserver,
}

/// A scheme-specific fetcher.
pub trait Dereferencer: Send + Sync {
    /// Symbolic name recorded on the cache entry.
    fn name(&self) -> &'static str;

    /// Fetch `iri`. `Ok(None)` means "no new work": the document is already
    /// covered by a cached graph (e.g. a redirect landed on one).
    fn dereference(
        &self,
        iri: &Url,
        cx: &mut DerefContext<'_>,
    ) -> Result<Option<Representation>, DerefError>;
}

/// Scheme (lowercased) → dereferencer.
#[derive(Default, Clone)]
pub struct DereferencerRegistry {
    by_scheme: FxHashMap<String, Arc<dyn Dereferencer>>,
}

impl DereferencerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scheme: &str, dereferencer: Arc<dyn Dereferencer>) {
        self.by_scheme.insert(scheme.to_ascii_lowercase(), dereferencer);
    }

    pub fn get(&self, scheme: &str) -> Option<Arc<dyn Dereferencer>> {
        self.by_scheme.get(&scheme.to_ascii_lowercase()).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.by_scheme.is_empty()
    }
}

impl Debug for DereferencerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.by_scheme.keys()).finish()
    }
}

/// Observer for callers with no metadata graph to consult, e.g. tests of a bare
/// dereferencer.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreRedirects;

impl RedirectObserver for IgnoreRedirects {
    fn on_redirect(&mut self, _source: &Url, _target: &Url) -> Result<bool, StoreError> {
        Ok(false)
    }
}
