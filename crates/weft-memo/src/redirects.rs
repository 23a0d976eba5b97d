use oxrdf::{GraphName, NamedNode, Quad, Subject, Term};
use rustc_hash::FxHashSet;
use tracing::debug;

use weft_rdf::vocab;
use weft_store::{StoreConnection, StoreError};

/// Records and resolves `redirectsTo` links in the metadata graph.
///
/// Redirects persist as `(source, redirectsTo, target)` statements in the default
/// graph, so a chain discovered across several retrievals resolves in one pass the
/// next time any IRI on it is requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct RedirectManager;

impl RedirectManager {
    pub fn new() -> Self {
        RedirectManager
    }

    /// Record `source` → `target`, replacing any previous target for `source`.
    /// Self-redirects are dropped.
    pub fn record(
        &self,
        source: &NamedNode,
        target: &NamedNode,
        conn: &dyn StoreConnection,
    ) -> Result<(), StoreError> {
        if source == target {
            return Ok(());
        }
        debug!("recording redirect {source} -> {target}");
        let subject = Subject::NamedNode(source.clone());
        let predicate = vocab::REDIRECTS_TO.into_owned();
        conn.remove_matching(
            Some(&subject),
            Some(&predicate),
            None,
            Some(&GraphName::DefaultGraph),
        )?;
        conn.add(&Quad::new(
            source.clone(),
            predicate,
            target.clone(),
            GraphName::DefaultGraph,
        ))
    }

    /// Follow recorded redirects from `iri` to the end of the chain. Cycles are
    /// broken by a visited set; the last IRI before re-entry wins.
    pub fn resolve(
        &self,
        iri: &NamedNode,
        conn: &dyn StoreConnection,
    ) -> Result<NamedNode, StoreError> {
        let mut seen = FxHashSet::default();
        let mut current = iri.clone();
        loop {
            seen.insert(current.clone());
            let Some(next) = self.target_of(&current, conn)? else {
                return Ok(current);
            };
            if seen.contains(&next) {
                return Ok(current);
            }
            current = next;
        }
    }

    fn target_of(
        &self,
        source: &NamedNode,
        conn: &dyn StoreConnection,
    ) -> Result<Option<NamedNode>, StoreError> {
        let subject = Subject::NamedNode(source.clone());
        let predicate = vocab::REDIRECTS_TO.into_owned();
        let statements = conn.matching(
            Some(&subject),
            Some(&predicate),
            None,
            Some(&GraphName::DefaultGraph),
        )?;
        Ok(statements.into_iter().find_map(|quad| match quad.object {
            Term::NamedNode(node) => Some(node),
            _ => None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use weft_store::MemoryStore;

    use super::*;

    fn node(s: &str) -> NamedNode {
        NamedNode::new(s).unwrap()
    }

    #[test]
    fn resolves_chains() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let redirects = RedirectManager::new();
        redirects.record(&node("http://ex/a"), &node("http://ex/b"), &store)?;
        redirects.record(&node("http://ex/b"), &node("http://ex/c"), &store)?;

        assert_eq!(redirects.resolve(&node("http://ex/a"), &store)?, node("http://ex/c"));
        assert_eq!(redirects.resolve(&node("http://ex/b"), &store)?, node("http://ex/c"));
        assert_eq!(redirects.resolve(&node("http://ex/d"), &store)?, node("http://ex/d"));
        Ok(())
    }

    #[test]
    fn cycles_terminate() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let redirects = RedirectManager::new();
        redirects.record(&node("http://ex/a"), &node("http://ex/b"), &store)?;
        redirects.record(&node("http://ex/b"), &node("http://ex/a"), &store)?;

        // The walk stops at the last new IRI before re-entry.
        assert_eq!(redirects.resolve(&node("http://ex/a"), &store)?, node("http://ex/b"));
        Ok(())
    }

    #[test]
    fn re_recording_replaces_the_target() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let redirects = RedirectManager::new();
        redirects.record(&node("http://ex/a"), &node("http://ex/b"), &store)?;
        redirects.record(&node("http://ex/a"), &node("http://ex/c"), &store)?;

        assert_eq!(redirects.resolve(&node("http://ex/a"), &store)?, node("http://ex/c"));
        assert_eq!(
            store
                .matching(None, Some(&vocab::REDIRECTS_TO.into_owned()), None, None)?
                .len(),
            1
        );
        Ok(())
    }

    #[test]
    fn self_redirects_are_dropped() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let redirects = RedirectManager::new();
        redirects.record(&node("http://ex/a"), &node("http://ex/a"), &store)?;
        assert!(store.is_empty());
        Ok(())
    }
}
