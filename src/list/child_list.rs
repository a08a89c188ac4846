use std::slice;
use std::sync::{Arc, Weak};

use crate::error::{Error, ErrorKind, Result};
use crate::node::{attach, detach, Node, NodeRef};

/// Ordered list of child nodes of any element type
#[derive(Debug)]
pub struct ChildList {
    owner: Weak<Node>,
    elements: Vec<NodeRef>,
}

impl ChildList {
    pub fn new(owner: &Weak<Node>) -> Self {
        Self {
            owner: owner.clone(),
            elements: Vec::new(),
        }
    }

    fn owner(&self) -> Result<NodeRef> {
        self.owner
            .upgrade()
            .ok_or_else(|| Error::invalid_tree("child list owner has been dropped"))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeRef> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, NodeRef> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[NodeRef] {
        &self.elements
    }

    pub fn position(&self, element: &NodeRef) -> Option<usize> {
        self.elements
            .iter()
            .position(|held| Arc::ptr_eq(held, element))
    }

    pub fn contains(&self, element: &NodeRef) -> bool {
        self.position(element).is_some()
    }

    /// Append `element`. Returns `Ok(false)` if it is already in this list.
    pub fn push(&mut self, element: NodeRef) -> Result<bool> {
        self.insert(self.elements.len(), element)
    }

    /// Insert `element` at `index`. Returns `Ok(false)` if it is already in this list.
    pub fn insert(&mut self, index: usize, element: NodeRef) -> Result<bool> {
        if self.contains(&element) {
            return Ok(false);
        }
        let len = self.elements.len();
        if index > len {
            return Err(Error::new(ErrorKind::IndexOutOfBounds { index, len }));
        }
        attach(&*self.owner()?, &element, None)?;
        self.elements.insert(index, element);
        Ok(true)
    }

    /// Replace the element at `index`, returning the detached previous element.
    ///
    /// The outgoing element's IDs are released before the incoming ones are registered,
    /// so a replacement may reuse its predecessor's ID.
    pub fn set(&mut self, index: usize, element: NodeRef) -> Result<NodeRef> {
        let len = self.elements.len();
        let current = self
            .elements
            .get(index)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::IndexOutOfBounds { index, len }))?;
        if Arc::ptr_eq(&current, &element) {
            return Ok(current);
        }
        if self.contains(&element) {
            return Err(Error::invalid_tree(format!(
                "{} is already held at another position",
                element.element_qname()
            )));
        }
        attach(&*self.owner()?, &element, Some(&current))?;
        if let Some(slot) = self.elements.get_mut(index) {
            *slot = element;
        }
        Ok(current)
    }

    /// Remove and detach the element at `index`
    pub fn remove(&mut self, index: usize) -> Option<NodeRef> {
        if index >= self.elements.len() {
            return None;
        }
        let removed = self.elements.remove(index);
        self.release(&removed);
        Some(removed)
    }

    pub fn remove_element(&mut self, element: &NodeRef) -> bool {
        self.position(element)
            .and_then(|index| self.remove(index))
            .is_some()
    }

    /// Detach every element
    pub fn clear(&mut self) {
        for removed in std::mem::take(&mut self.elements) {
            self.release(&removed);
        }
    }

    fn release(&self, removed: &NodeRef) {
        if let Some(owner) = self.owner.upgrade() {
            detach(&owner, removed);
        }
    }
}

impl<'a> IntoIterator for &'a ChildList {
    type Item = &'a NodeRef;
    type IntoIter = slice::Iter<'a, NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
