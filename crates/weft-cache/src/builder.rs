use std::sync::Arc;

use weft_deref::{Dereferencer, DereferencerRegistry, FileDereferencer, HttpDereferencer};
use weft_memo::{ExpirationPolicy, MaxAge, MemoIndex, RedirectManager};
use weft_rdfize::{ParserFormat, ParserRdfizer, Rdfizer, RdfizerRegistry};
use weft_store::{DataStoreFactory, DirectStore, StoreConnection};

use crate::{CacheConfig, CacheError, LinkedDataCache};

/// Quality for verbatim rdfizers unless a format says otherwise.
const DEFAULT_QUALITY: f64 = 0.5;
/// Quality to register an image-metadata rdfizer under, for callers that
/// provide one.
pub const IMAGE_QUALITY: f64 = 0.4;

/// A builder for a [`LinkedDataCache`].
#[derive(Default)]
pub struct LinkedDataCacheBuilder {
    config: CacheConfig,
    dereferencers: DereferencerRegistry,
    rdfizers: Vec<(String, f64, Arc<dyn Rdfizer>)>,
    wire_default_dereferencers: bool,
    policy: Option<Box<dyn ExpirationPolicy>>,
    data_store: Option<Box<dyn DataStoreFactory>>,
}

impl LinkedDataCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.memory_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn lifetime_secs(mut self, seconds: u64) -> Self {
        self.config.cache_lifetime = seconds;
        self
    }

    #[must_use]
    pub fn use_blank_nodes(mut self, use_blank_nodes: bool) -> Self {
        self.config.use_blank_nodes = use_blank_nodes;
        self
    }

    #[must_use]
    pub fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.config.auto_commit = auto_commit;
        self
    }

    /// Register a dereferencer for an IRI scheme (case-insensitive).
    #[must_use]
    pub fn dereferencer(mut self, scheme: &str, dereferencer: Arc<dyn Dereferencer>) -> Self {
        self.dereferencers.register(scheme, dereferencer);
        self
    }

    /// Wire the built-in HTTP/HTTPS and file dereferencers at build time.
    #[must_use]
    pub fn default_dereferencers(mut self) -> Self {
        self.wire_default_dereferencers = true;
        self
    }

    /// Register an rdfizer for a media type; validation happens at build time.
    #[must_use]
    pub fn rdfizer(mut self, media_type: &str, quality: f64, rdfizer: Arc<dyn Rdfizer>) -> Self {
        self.rdfizers.push((media_type.to_owned(), quality, rdfizer));
        self
    }

    /// Register an image-metadata rdfizer (JPEG/TIFF EXIF pipelines) at the
    /// conventional quality of 0.4. The rdfizer itself is a collaborator; the
    /// engine ships none.
    #[must_use]
    pub fn image_rdfizer(mut self, media_type: &str, rdfizer: Arc<dyn Rdfizer>) -> Self {
        self.rdfizers.push((media_type.to_owned(), IMAGE_QUALITY, rdfizer));
        self
    }

    /// One verbatim rdfizer per built-in parser format at quality 0.5, with
    /// `application/rdf+xml` at 1.0 and `text/xml` at 0.25.
    #[must_use]
    pub fn default_rdfizers(mut self) -> Self {
        for format in ParserFormat::ALL {
            let rdfizer: Arc<dyn Rdfizer> = Arc::new(ParserRdfizer::new(format));
            for media_type in format.media_types() {
                let quality = match *media_type {
                    "application/rdf+xml" => 1.0,
                    "text/xml" => 0.25,
                    _ => DEFAULT_QUALITY,
                };
                self.rdfizers
                    .push(((*media_type).to_owned(), quality, Arc::clone(&rdfizer)));
            }
        }
        self
    }

    #[must_use]
    pub fn expiration_policy(mut self, policy: Box<dyn ExpirationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn data_store(mut self, factory: Box<dyn DataStoreFactory>) -> Self {
        self.data_store = Some(factory);
        self
    }

    pub fn build(self, store: Arc<dyn StoreConnection>) -> Result<LinkedDataCache, CacheError> {
        let mut dereferencers = self.dereferencers;
        if self.wire_default_dereferencers {
            let http: Arc<dyn Dereferencer> = Arc::new(HttpDereferencer::new()?);
            dereferencers.register("http", Arc::clone(&http));
            dereferencers.register("https", http);
            dereferencers.register("file", Arc::new(FileDereferencer::new()));
        }

        let rdfizers = RdfizerRegistry::new();
        for (media_type, quality, rdfizer) in self.rdfizers {
            rdfizers.register(&media_type, quality, rdfizer)?;
        }

        let policy = self
            .policy
            .unwrap_or_else(|| Box::new(MaxAge::new(self.config.lifetime())));

        Ok(LinkedDataCache {
            store,
            dereferencers,
            rdfizers,
            index: MemoIndex::new(self.config.memory_cache_capacity),
            redirects: RedirectManager::new(),
            policy,
            data_store: self.data_store.unwrap_or_else(|| Box::new(DirectStore)),
            config: self.config,
        })
    }
}
