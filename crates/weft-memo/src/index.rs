use std::sync::Mutex;
use std::time::SystemTime;

use indexmap::IndexMap;
use oxrdf::{GraphName, Literal, NamedNode, Quad, Subject, Term};
use tracing::warn;

use weft_rdf::vocab;
use weft_store::{StoreConnection, StoreError};

use crate::{ExpirationPolicy, Memo, Status};

/// Requested capacities below this are overridden.
pub const CAPACITY_FLOOR: usize = 100;

/// Bounded in-memory mapping from graph IRI to [`Memo`], backed by the store.
///
/// Lookups fall through to the metadata statements in the store's default graph;
/// every mutation is mirrored back there when a connection is supplied. On
/// overflow the least-recently-inserted entry is evicted from memory only; its
/// projection in the store is unaffected and can be reloaded later.
///
/// All operations serialise on one internal lock. `get_or_create` is the
/// critical section that makes concurrent retrievals of the same IRI safe: the
/// first caller past the lock gets a `CacheLookup`-marked copy and the duty to
/// retrieve; everyone else sees the in-flight entry and backs off.
pub struct MemoIndex {
    inner: Mutex<Inner>,
}

struct Inner {
    memos: IndexMap<NamedNode, Memo>,
    capacity: usize,
}

impl MemoIndex {
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity < CAPACITY_FLOOR {
            warn!(
                "memory cache capacity {capacity} is below the floor; using {CAPACITY_FLOOR}"
            );
            CAPACITY_FLOOR
        } else {
            capacity
        };
        MemoIndex {
            inner: Mutex::new(Inner {
                memos: IndexMap::new(),
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().memos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The memo for `graph`, from memory or from the store's metadata statements.
    pub fn get(
        &self,
        graph: &NamedNode,
        conn: &dyn StoreConnection,
    ) -> Result<Option<Memo>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if let Some(memo) = inner.memos.get(graph) {
            return Ok(Some(memo.clone()));
        }
        // Still under the lock: a concurrent `set` must not replace the store
        // statement halfway through this read.
        load(graph, conn)
    }

    /// Insert or replace the memo in memory; mirror it into the store when a
    /// connection is supplied.
    pub fn set(
        &self,
        graph: &NamedNode,
        memo: &Memo,
        conn: Option<&dyn StoreConnection>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.insert_bounded(graph.clone(), memo.clone());
        // The lock also serialises the store-side replacement, so two writers can
        // never leave a graph with two memo statements.
        if let Some(conn) = conn {
            persist(graph, memo, conn)?;
        }
        Ok(())
    }

    /// The miss-lookup critical section.
    ///
    /// Returns the existing memo unchanged when it is fresh. Otherwise installs a
    /// fresh `Undetermined` entry (memory only) and returns a copy marked
    /// `CacheLookup`, the marker that tells the caller "you won; go retrieve".
    /// The marker never enters the shared map, so losing threads observe the
    /// in-flight `Undetermined` entry and short-circuit.
    ///
    /// A persisted `CacheLookup` loaded from the store means a crash happened
    /// mid-retrieval; it is treated as expired.
    pub fn get_or_create(
        &self,
        graph: &NamedNode,
        policy: &dyn ExpirationPolicy,
        now: SystemTime,
        conn: &dyn StoreConnection,
    ) -> Result<Memo, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let existing = match inner.memos.get(graph) {
            Some(memo) => Some(memo.clone()),
            None => load(graph, conn)?,
        };
        if let Some(memo) = existing {
            let stale =
                memo.status() == Status::CacheLookup || policy.is_expired(&memo, now);
            if !stale {
                inner.insert_bounded(graph.clone(), memo.clone());
                return Ok(memo);
            }
        }
        inner.insert_bounded(graph.clone(), Memo::new(Status::Undetermined));
        Ok(Memo::new(Status::CacheLookup))
    }

    /// Drop every in-memory entry. Store projections are untouched.
    pub fn clear(&self) {
        self.inner.lock().unwrap().memos.clear();
    }
}

impl Inner {
    fn insert_bounded(&mut self, graph: NamedNode, memo: Memo) {
        if self.memos.contains_key(&graph) {
            // Replacement keeps the original insertion position.
            self.memos.insert(graph, memo);
            return;
        }
        if self.memos.len() >= self.capacity {
            self.memos.shift_remove_index(0);
        }
        self.memos.insert(graph, memo);
    }
}

fn load(graph: &NamedNode, conn: &dyn StoreConnection) -> Result<Option<Memo>, StoreError> {
    let subject = Subject::NamedNode(graph.clone());
    let predicate = vocab::MEMO.into_owned();
    let statements = conn.matching(
        Some(&subject),
        Some(&predicate),
        None,
        Some(&GraphName::DefaultGraph),
    )?;
    let Some(quad) = statements.first() else {
        return Ok(None);
    };
    let Term::Literal(literal) = &quad.object else {
        warn!("memo statement for {graph} has a non-literal object; ignoring");
        return Ok(None);
    };
    match literal.value().parse::<Memo>() {
        Ok(memo) => Ok(Some(memo)),
        Err(err) => {
            warn!("broken memo entry for {graph}, ignoring: {err}");
            Ok(None)
        }
    }
}

fn persist(graph: &NamedNode, memo: &Memo, conn: &dyn StoreConnection) -> Result<(), StoreError> {
    let subject = Subject::NamedNode(graph.clone());
    let predicate = vocab::MEMO.into_owned();
    conn.remove_matching(
        Some(&subject),
        Some(&predicate),
        None,
        Some(&GraphName::DefaultGraph),
    )?;
    conn.add(&Quad::new(
        graph.clone(),
        predicate,
        Literal::new_simple_literal(memo.to_string()),
        GraphName::DefaultGraph,
    ))
}
