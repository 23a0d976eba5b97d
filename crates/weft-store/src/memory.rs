use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use oxrdf::{GraphName, NamedNode, Quad, Subject, Term};

use crate::connection::quad_matches;
use crate::{StoreConnection, StoreError};

/// In-memory reference store.
///
/// Backs the default wiring and the test suite. Statement-level operations take
/// the inner lock per call, which satisfies the driver contract: concurrent
/// retrievals may interleave writes for distinct graphs without corruption.
/// Transactions are a formality here (writes apply immediately and `commit` only
/// counts), but the counter lets tests observe the engine's transaction
/// discipline.
#[derive(Debug, Default)]
pub struct MemoryStore {
    quads: RwLock<HashSet<Quad>>,
    commits: AtomicU64,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of statements across all graphs.
    pub fn len(&self) -> usize {
        self.quads.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of statements in one named graph.
    pub fn graph_len(&self, graph: &GraphName) -> usize {
        self.quads
            .read()
            .unwrap()
            .iter()
            .filter(|quad| quad.graph_name == *graph)
            .count()
    }

    /// How many times `commit` has been called.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Relaxed) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl StoreConnection for MemoryStore {
    fn add(&self, quad: &Quad) -> Result<(), StoreError> {
        self.check_open()?;
        self.quads.write().unwrap().insert(quad.clone());
        Ok(())
    }

    fn remove_matching(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&GraphName>,
    ) -> Result<usize, StoreError> {
        self.check_open()?;
        let mut quads = self.quads.write().unwrap();
        let before = quads.len();
        quads.retain(|quad| !quad_matches(quad, subject, predicate, object, graph));
        Ok(before - quads.len())
    }

    fn matching(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&GraphName>,
    ) -> Result<Vec<Quad>, StoreError> {
        self.check_open()?;
        Ok(self
            .quads
            .read()
            .unwrap()
            .iter()
            .filter(|quad| quad_matches(quad, subject, predicate, object, graph))
            .cloned()
            .collect())
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.check_open()
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.check_open()?;
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check_open()?;
        self.quads.write().unwrap().clear();
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use oxrdf::{Literal, NamedNode};

    use super::*;

    fn quad(s: &str, p: &str, o: &str, g: &str) -> Quad {
        Quad::new(
            NamedNode::new(s).unwrap(),
            NamedNode::new(p).unwrap(),
            Literal::new_simple_literal(o),
            NamedNode::new(g).unwrap(),
        )
    }

    #[test]
    fn add_is_set_like() {
        let store = MemoryStore::new();
        let q = quad("http://ex/s", "http://ex/p", "o", "http://ex/g");
        store.add(&q).unwrap();
        store.add(&q).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_matching_honours_wildcards() {
        let store = MemoryStore::new();
        store
            .add(&quad("http://ex/s", "http://ex/p", "a", "http://ex/g1"))
            .unwrap();
        store
            .add(&quad("http://ex/s", "http://ex/p", "b", "http://ex/g1"))
            .unwrap();
        store
            .add(&quad("http://ex/s", "http://ex/p", "c", "http://ex/g2"))
            .unwrap();

        let graph = GraphName::NamedNode(NamedNode::new("http://ex/g1").unwrap());
        let removed = store.remove_matching(None, None, None, Some(&graph)).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.graph_len(&graph), 0);
    }

    #[test]
    fn closed_connection_rejects_calls() {
        let store = MemoryStore::new();
        store.close().unwrap();
        let q = quad("http://ex/s", "http://ex/p", "o", "http://ex/g");
        assert!(matches!(store.add(&q), Err(StoreError::Closed)));
    }

    #[test]
    fn commit_counts() {
        let store = MemoryStore::new();
        store.begin().unwrap();
        store.commit().unwrap();
        store.commit().unwrap();
        assert_eq!(store.commits(), 2);
    }
}
