use std::sync::Arc;
use std::time::SystemTime;

use oxrdf::{GraphName, NamedNode};
use tracing::{debug, info};
use url::Url;

use weft_deref::{DerefContext, DerefError, DereferencerRegistry, RedirectObserver};
use weft_memo::{ExpirationPolicy, Memo, MemoIndex, RedirectManager, Status};
use weft_rdf::{namespace, GraphIri, StatementHandler};
use weft_rdfize::{DatatypeFilter, DatatypeHandling, RdfizerRegistry, RdfizeStatus};
use weft_store::{DataStoreFactory, StoreConnection, StoreError};

use crate::pipeline::{BnodeToIri, ContextRewriter, StatementBuffer};
use crate::{CacheConfig, CacheError, LinkedDataCacheBuilder, StatementPosition};

/// The caching engine.
///
/// One shared instance sits beneath a query layer; any thread may call
/// [`retrieve`](Self::retrieve) with an IRI it encountered. The engine decides
/// whether the IRI's document is already cached, fetches and RDFizes it if not,
/// and memoises the outcome so the next request is answered, or declined,
/// without network I/O.
pub struct LinkedDataCache {
    pub(crate) store: Arc<dyn StoreConnection>,
    pub(crate) dereferencers: DereferencerRegistry,
    pub(crate) rdfizers: RdfizerRegistry,
    pub(crate) index: MemoIndex,
    pub(crate) redirects: RedirectManager,
    pub(crate) policy: Box<dyn ExpirationPolicy>,
    pub(crate) data_store: Box<dyn DataStoreFactory>,
    pub(crate) config: CacheConfig,
}

impl LinkedDataCache {
    pub fn builder() -> LinkedDataCacheBuilder {
        LinkedDataCacheBuilder::new()
    }

    /// The fully wired default engine: HTTP/HTTPS and file dereferencers, one
    /// verbatim rdfizer per built-in parser format at quality 0.5, with
    /// `application/rdf+xml` promoted to 1.0 and `text/xml` demoted to 0.25.
    pub fn with_defaults(store: Arc<dyn StoreConnection>) -> Result<Self, CacheError> {
        Self::builder()
            .default_dereferencers()
            .default_rdfizers()
            .build(store)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether the query layer should request dereferencing for IRIs seen in
    /// `position`.
    pub fn should_dereference(&self, position: StatementPosition) -> bool {
        self.config.should_dereference(position)
    }

    /// The aggregate Accept preference string of the registered rdfizers.
    pub fn accept_header(&self) -> String {
        self.rdfizers.accept_header()
    }

    pub fn set_expiration_policy(&mut self, policy: Box<dyn ExpirationPolicy>) {
        self.policy = policy;
    }

    pub fn set_data_store(&mut self, factory: Box<dyn DataStoreFactory>) {
        self.data_store = factory;
    }

    /// The shared store connection.
    pub fn connection(&self) -> &dyn StoreConnection {
        &*self.store
    }

    /// Drop the in-memory index and truncate the store.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.index.clear();
        self.store.clear()?;
        Ok(())
    }

    pub fn close(&self) -> Result<(), CacheError> {
        self.store.close()?;
        Ok(())
    }

    /// Retrieve `iri` through the engine's own connection.
    pub fn retrieve(&self, iri: &NamedNode) -> Result<Memo, CacheError> {
        self.retrieve_with(iri, &*self.store)
    }

    /// The single entry point of the engine.
    ///
    /// Computes the graph IRI, wins or loses the right to retrieve, and on a
    /// win walks the pipeline: dereferencer selection → fetch → rdfizer
    /// selection → parse into a buffer → on success, replace the named graph
    /// with the buffered statements. Every outcome is classified on the
    /// returned memo, and terminal outcomes are persisted; fetch and parse
    /// problems are never raised as errors.
    pub fn retrieve_with(
        &self,
        iri: &NamedNode,
        conn: &dyn StoreConnection,
    ) -> Result<Memo, CacheError> {
        let now = SystemTime::now();
        let original = Url::parse(iri.as_str())?;
        let graph = GraphIri::new(&original);
        let graph_node = graph.to_named_node();

        let mut memo = self.index.get_or_create(&graph_node, &*self.policy, now, conn)?;
        if memo.status() != Status::CacheLookup {
            debug!("{graph} is already handled ({})", memo.status());
            return Ok(memo);
        }
        memo.set_status(Status::Undetermined);

        let Some(dereferencer) = self.dereferencers.get(graph.scheme()) else {
            // The entry stays Undetermined in memory only; a non-terminal
            // status is never written to the store or committed.
            debug!("no dereferencer for scheme `{}`", graph.scheme());
            return Ok(memo);
        };
        memo.set_dereferencer(dereferencer.name());
        memo.set_status(Status::DereferencerError);

        // Resolve previously recorded redirects so a known chain costs no
        // round-trips. A fresh terminal document short-circuits the fetch.
        let resolved = self.redirects.resolve(&graph_node, conn)?;
        if resolved != graph_node && self.is_cached_fresh(&resolved, now, conn)? {
            memo.set_status(Status::RedirectsToCached);
            return self.finish(&graph_node, memo, now, conn);
        }
        let retrieval_iri = Url::parse(resolved.as_str())?;

        let mut representation = {
            let accept = self.accept_header();
            let mut observer = RecordAndCheck { cache: self, now, conn };
            let mut cx = DerefContext {
                accept: (!accept.is_empty()).then_some(accept),
                redirects: &mut observer,
            };
            match dereferencer.dereference(&retrieval_iri, &mut cx) {
                Ok(Some(representation)) => representation,
                Ok(None) => {
                    memo.set_status(Status::RedirectsToCached);
                    return self.finish(&graph_node, memo, now, conn);
                }
                Err(err) => {
                    info!("dereferencing {graph} failed: {err}");
                    let memo = self.finish(&graph_node, memo, now, conn)?;
                    // Fetch trouble is an outcome; store trouble is an error.
                    return match err {
                        DerefError::Store(store_err) => Err(store_err.into()),
                        _ => Ok(memo),
                    };
                }
            }
        };

        memo.set_media_type(representation.media_type());
        let Some(rdfizer) = self.rdfizers.get(representation.media_type()) else {
            memo.set_status(Status::BadMediaType);
            return self.finish(&graph_node, memo, now, conn);
        };
        memo.set_rdfizer(rdfizer.name());

        // The base for relative resolution keeps the original IRI's fragment
        // context, not the graph form.
        let base_iri = namespace(original.as_str()).to_owned();
        let mut buffer = StatementBuffer::default();
        let verdict = {
            let mut datatype_stage;
            let mut sink: &mut dyn StatementHandler = &mut buffer;
            if self.config.datatype_handling != DatatypeHandling::Ignore {
                datatype_stage = DatatypeFilter::new(self.config.datatype_handling, sink);
                sink = &mut datatype_stage;
            }
            let mut bnode_stage;
            if !self.config.use_blank_nodes {
                bnode_stage = BnodeToIri::new(sink);
                sink = &mut bnode_stage;
            }
            let mut rewriter = ContextRewriter::new(graph_node.clone(), sink);
            rdfizer.rdfize(representation.body_mut(), &mut rewriter, &base_iri)
        };
        drop(representation);

        memo.set_status(match verdict {
            RdfizeStatus::Success => Status::Success,
            RdfizeStatus::Failure => Status::Failure,
            RdfizeStatus::ParseError => Status::ParseError,
        });

        if memo.status() == Status::Success {
            // Replace-in-place: clear the graph, then flush the buffer, inside
            // the same transactional scope.
            let target = GraphName::NamedNode(graph_node.clone());
            conn.remove_matching(None, None, None, Some(&target))?;
            debug!("storing {} statements under {graph}", buffer.len());
            let mut sink = self.data_store.consumer(conn);
            buffer.drain_into(&mut *sink)?;
        }

        self.finish(&graph_node, memo, now, conn)
    }

    /// Step 12: persist the memo, honour auto-commit, log non-success.
    fn finish(
        &self,
        graph: &NamedNode,
        mut memo: Memo,
        now: SystemTime,
        conn: &dyn StoreConnection,
    ) -> Result<Memo, CacheError> {
        if memo.status().is_terminal() {
            memo.set_timestamp(now);
        }
        self.index.set(graph, &memo, Some(conn))?;
        if self.config.auto_commit {
            conn.commit()?;
            conn.begin()?;
        }
        if memo.status() != Status::Success {
            info!("retrieval of {graph} ended as {}", memo.status());
        }
        Ok(memo)
    }

    fn is_cached_fresh(
        &self,
        graph: &NamedNode,
        now: SystemTime,
        conn: &dyn StoreConnection,
    ) -> Result<bool, StoreError> {
        Ok(self.index.get(graph, conn)?.is_some_and(|memo| {
            memo.status().is_terminal() && !self.policy.is_expired(&memo, now)
        }))
    }
}

/// Redirect observer wired into a retrieval: records the hop as a
/// `redirectsTo` statement and answers whether the target's document is
/// already cached and fresh.
struct RecordAndCheck<'a> {
    cache: &'a LinkedDataCache,
    now: SystemTime,
    conn: &'a dyn StoreConnection,
}

impl RedirectObserver for RecordAndCheck<'_> {
    fn on_redirect(&mut self, source: &Url, target: &Url) -> Result<bool, StoreError> {
        let source = GraphIri::new(source).to_named_node();
        let target = GraphIri::new(target).to_named_node();
        self.cache.redirects.record(&source, &target, self.conn)?;
        self.cache.is_cached_fresh(&target, self.now, self.conn)
    }
}
