use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use super::ChildList;
use crate::error::Result;
use crate::node::{Handle, Node, NodeRef, XmlObject};
use crate::qname::QName;

/// Child list with a secondary index by element name and by schema type
///
/// For every key, the indexed sublist holds exactly the elements of the list whose element
/// name or schema type equals the key, in list order. The index is only touched after the
/// primary list accepted a change.
#[derive(Debug)]
pub struct IndexedChildList {
    inner: ChildList,
    index: IndexMap<QName, Vec<NodeRef>>,
}

impl IndexedChildList {
    pub fn new(owner: &Weak<Node>) -> Self {
        Self {
            inner: ChildList::new(owner),
            index: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeRef> {
        self.inner.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeRef> {
        self.inner.iter()
    }

    pub fn as_slice(&self) -> &[NodeRef] {
        self.inner.as_slice()
    }

    pub fn contains(&self, element: &NodeRef) -> bool {
        self.inner.contains(element)
    }

    pub fn push(&mut self, element: NodeRef) -> Result<bool> {
        self.insert(self.inner.len(), element)
    }

    pub fn insert(&mut self, index: usize, element: NodeRef) -> Result<bool> {
        let inserted = self.inner.insert(index, Arc::clone(&element))?;
        if inserted {
            self.index_element(&element);
        }
        Ok(inserted)
    }

    pub fn set(&mut self, index: usize, element: NodeRef) -> Result<NodeRef> {
        let replaced = self.inner.set(index, Arc::clone(&element))?;
        if !Arc::ptr_eq(&replaced, &element) {
            self.unindex_element(&replaced);
            self.index_element(&element);
        }
        Ok(replaced)
    }

    pub fn remove(&mut self, index: usize) -> Option<NodeRef> {
        let removed = self.inner.remove(index)?;
        self.unindex_element(&removed);
        Some(removed)
    }

    pub fn remove_element(&mut self, element: &NodeRef) -> bool {
        self.inner
            .position(element)
            .and_then(|index| self.remove(index))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.index.clear();
    }

    /// Elements whose element name or schema type is `name`, in list order
    pub fn get_by_tag(&self, name: &QName) -> &[NodeRef] {
        self.index
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Typed view of [`IndexedChildList::get_by_tag`], skipping elements of other types
    pub fn get_typed_by_tag<T: XmlObject>(&self, name: &QName) -> Vec<Handle<T>> {
        self.get_by_tag(name)
            .iter()
            .filter_map(|element| Handle::downcast(Arc::clone(element)).ok())
            .collect()
    }

    /// Names the index currently holds a non-empty sublist for
    pub fn tags(&self) -> impl Iterator<Item = &QName> {
        self.index.keys()
    }

    fn keys(element: &Node) -> Vec<QName> {
        let mut keys = vec![element.element_qname().clone()];
        if let Some(schema_type) = element.schema_type() {
            if schema_type != element.element_qname() {
                keys.push(schema_type.clone());
            }
        }
        keys
    }

    fn index_element(&mut self, element: &NodeRef) {
        for key in Self::keys(element) {
            let position = self
                .inner
                .iter()
                .take_while(|held| !Arc::ptr_eq(held, element))
                .filter(|held| held.matches(&key))
                .count();
            let sublist = self.index.entry(key).or_default();
            sublist.insert(position.min(sublist.len()), Arc::clone(element));
        }
    }

    fn unindex_element(&mut self, element: &NodeRef) {
        for key in Self::keys(element) {
            if let Some(sublist) = self.index.get_mut(&key) {
                sublist.retain(|held| !Arc::ptr_eq(held, element));
                if sublist.is_empty() {
                    self.index.shift_remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug)]
    struct Leaf;

    impl XmlObject for Leaf {}

    #[derive(Debug)]
    struct Parent {
        children: IndexedChildList,
    }

    impl XmlObject for Parent {
        fn ordered_children(&self) -> Vec<NodeRef> {
            self.children.as_slice().to_vec()
        }
    }

    fn leaf(name: &str, schema_type: Option<&str>) -> NodeRef {
        Node::new(QName::local(name), schema_type.map(QName::local), |_| {
            Box::new(Leaf)
        })
    }

    fn parent() -> Handle<Parent> {
        Handle::wrap(Node::new(QName::local("parent"), None, |owner| {
            Box::new(Parent {
                children: IndexedChildList::new(owner),
            })
        }))
    }

    fn names(nodes: &[NodeRef]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| node.element_qname().local_name().to_string())
            .collect()
    }

    #[test]
    fn test_index_by_name_and_type() -> Result<()> {
        let parent = parent();
        let a = leaf("a", Some("T"));
        let b = leaf("b", None);
        let c = leaf("c", Some("T"));
        {
            let mut body = parent.write()?;
            body.children.push(Arc::clone(&c))?;
            body.children.push(Arc::clone(&b))?;
            body.children.insert(0, Arc::clone(&a))?;
        }
        let body = parent.read()?;
        assert_eq!(names(body.children.get_by_tag(&QName::local("T"))), ["a", "c"]);
        assert_eq!(names(body.children.get_by_tag(&QName::local("b"))), ["b"]);
        assert!(body.children.get_by_tag(&QName::local("x")).is_empty());
        assert_eq!(body.children.get_typed_by_tag::<Leaf>(&QName::local("a")).len(), 1);
        Ok(())
    }

    #[test]
    fn test_set_and_remove_update_index() -> Result<()> {
        let parent = parent();
        let a = leaf("a", None);
        let b = leaf("b", None);
        let mut body = parent.write()?;
        body.children.push(Arc::clone(&a))?;
        body.children.set(0, Arc::clone(&b))?;
        assert!(body.children.get_by_tag(&QName::local("a")).is_empty());
        assert_eq!(body.children.get_by_tag(&QName::local("b")).len(), 1);

        assert!(body.children.remove_element(&b));
        assert_eq!(body.children.tags().count(), 0);
        Ok(())
    }

    #[test]
    fn test_rejected_insert_leaves_index_alone() -> Result<()> {
        let first = parent();
        let second = parent();
        let a = leaf("a", None);
        first.write()?.children.push(Arc::clone(&a))?;

        let err = second.write()?.children.push(Arc::clone(&a)).err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidTreeState));
        assert!(second.read()?.children.get_by_tag(&QName::local("a")).is_empty());
        Ok(())
    }
}
