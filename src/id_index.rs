//! Per-subtree index of ID attribute values

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::node::{Node, NodeRef};

/// Maps ID values to the node that owns them
///
/// Every node keeps one for itself and its descendants, so any node can resolve
/// `#fragment` references within its own subtree. Referents are weak: the index never keeps
/// a node alive.
#[derive(Clone, Default)]
pub struct IdIndex {
    mappings: HashMap<String, Weak<Node>>,
}

impl IdIndex {
    pub fn lookup(&self, id: &str) -> Option<NodeRef> {
        self.mappings.get(id).and_then(Weak::upgrade)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mappings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub(crate) fn owner_of(&self, id: &str) -> Option<&Weak<Node>> {
        self.mappings.get(id)
    }

    /// Register `referent` as the owner of `id`
    pub fn register_id_mapping(&mut self, id: &str, referent: &NodeRef) -> Result<()> {
        self.register_weak(id, &Arc::downgrade(referent))
    }

    pub(crate) fn register_weak(&mut self, id: &str, referent: &Weak<Node>) -> Result<()> {
        match self.mappings.get(id) {
            Some(existing) if !Weak::ptr_eq(existing, referent) => Err(Error::duplicate_id(id)),
            _ => {
                self.insert(id, referent);
                Ok(())
            }
        }
    }

    /// Merge every mapping of `sub`; nothing is merged if any ID is owned by another node
    pub fn register_id_mappings(&mut self, sub: &Self) -> Result<()> {
        if let Some(id) = self.find_conflict(sub, None) {
            return Err(Error::duplicate_id(&id));
        }
        self.merge(sub);
        Ok(())
    }

    /// Remove `id` if it is owned by `referent`
    pub fn deregister_id_mapping(&mut self, id: &str, referent: &Weak<Node>) -> bool {
        let owned = self
            .mappings
            .get(id)
            .is_some_and(|existing| Weak::ptr_eq(existing, referent));
        if owned {
            self.mappings.remove(id);
        }
        owned
    }

    /// Remove every mapping that `sub` also holds for the same referent
    pub fn deregister_id_mappings(&mut self, sub: &Self) {
        for (id, referent) in &sub.mappings {
            self.deregister_id_mapping(id, referent);
        }
    }

    /// First ID of `incoming` owned here by a different node, ignoring mappings that are
    /// about to be replaced along with `outgoing`
    pub fn find_conflict(&self, incoming: &Self, outgoing: Option<&Self>) -> Option<String> {
        incoming
            .mappings
            .iter()
            .find(|(id, referent)| {
                self.mappings.get(id.as_str()).is_some_and(|existing| {
                    !Weak::ptr_eq(existing, referent)
                        && !outgoing.is_some_and(|outgoing| {
                            outgoing
                                .mappings
                                .get(id.as_str())
                                .is_some_and(|leaving| Weak::ptr_eq(leaving, existing))
                        })
                })
            })
            .map(|(id, _)| id.clone())
    }

    pub(crate) fn insert(&mut self, id: &str, referent: &Weak<Node>) {
        self.mappings.insert(id.to_string(), referent.clone());
    }

    pub(crate) fn merge(&mut self, sub: &Self) {
        for (id, referent) in &sub.mappings {
            self.mappings.insert(id.clone(), referent.clone());
        }
    }
}

impl fmt::Debug for IdIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_set().entries(ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::node::tests::holder;

    #[test]
    fn test_register_and_lookup() -> Result<()> {
        let node = holder("a");
        let mut index = IdIndex::default();
        index.register_id_mapping("x", &node)?;
        index.register_id_mapping("x", &node)?;
        assert_eq!(index.len(), 1);
        assert!(index.lookup("x").is_some_and(|found| Arc::ptr_eq(&found, &node)));
        assert!(index.lookup("y").is_none());
        Ok(())
    }

    #[test]
    fn test_conflicting_owner_is_rejected() -> Result<()> {
        let first = holder("a");
        let second = holder("b");
        let mut index = IdIndex::default();
        index.register_id_mapping("x", &first)?;
        let err = index.register_id_mapping("x", &second).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::DuplicateId { id: "x".to_string() })
        );
        Ok(())
    }

    #[test]
    fn test_bulk_register_is_all_or_nothing() -> Result<()> {
        let first = holder("a");
        let second = holder("b");
        let mut index = IdIndex::default();
        index.register_id_mapping("taken", &first)?;

        let mut sub = IdIndex::default();
        sub.register_id_mapping("fresh", &second)?;
        sub.register_id_mapping("taken", &second)?;
        assert!(index.register_id_mappings(&sub).is_err());
        assert!(!index.contains("fresh"));
        Ok(())
    }

    #[test]
    fn test_deregister_only_removes_own_mappings() -> Result<()> {
        let first = holder("a");
        let second = holder("b");
        let mut index = IdIndex::default();
        index.register_id_mapping("x", &first)?;

        assert!(!index.deregister_id_mapping("x", &Arc::downgrade(&second)));
        assert!(index.contains("x"));
        assert!(index.deregister_id_mapping("x", &Arc::downgrade(&first)));
        assert!(index.is_empty());
        Ok(())
    }

    #[test]
    fn test_conflict_ignores_outgoing_mappings() -> Result<()> {
        let old = holder("old");
        let new = holder("new");
        let mut index = IdIndex::default();
        index.register_id_mapping("a1", &old)?;

        let mut incoming = IdIndex::default();
        incoming.register_id_mapping("a1", &new)?;
        let mut outgoing = IdIndex::default();
        outgoing.register_id_mapping("a1", &old)?;

        assert_eq!(index.find_conflict(&incoming, None).as_deref(), Some("a1"));
        assert_eq!(index.find_conflict(&incoming, Some(&outgoing)), None);
        Ok(())
    }

    #[test]
    fn test_lookup_of_dropped_node() -> Result<()> {
        let mut index = IdIndex::default();
        {
            let node = holder("gone");
            index.register_id_mapping("x", &node)?;
        }
        assert!(index.contains("x"));
        assert!(index.lookup("x").is_none());
        Ok(())
    }
}
