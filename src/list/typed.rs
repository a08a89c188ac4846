use std::marker::PhantomData;
use std::sync::Weak;

use super::ChildList;
use crate::error::Result;
use crate::node::{Handle, Node, NodeRef, XmlObject};

/// Child list restricted to one element type
#[derive(Debug)]
pub struct TypedChildList<T: XmlObject> {
    inner: ChildList,
    marker: PhantomData<fn() -> T>,
}

impl<T: XmlObject> TypedChildList<T> {
    pub fn new(owner: &Weak<Node>) -> Self {
        Self {
            inner: ChildList::new(owner),
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Handle<T>> {
        self.inner.get(index).cloned().map(Handle::wrap)
    }

    pub fn iter(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.inner.iter().cloned().map(Handle::wrap)
    }

    pub fn nodes(&self) -> &[NodeRef] {
        self.inner.as_slice()
    }

    pub fn position(&self, element: &Handle<T>) -> Option<usize> {
        self.inner.position(element.node())
    }

    pub fn contains(&self, element: &Handle<T>) -> bool {
        self.inner.contains(element.node())
    }

    pub fn push(&mut self, element: Handle<T>) -> Result<bool> {
        self.inner.push(element.into_node())
    }

    pub fn insert(&mut self, index: usize, element: Handle<T>) -> Result<bool> {
        self.inner.insert(index, element.into_node())
    }

    pub fn set(&mut self, index: usize, element: Handle<T>) -> Result<Handle<T>> {
        self.inner
            .set(index, element.into_node())
            .map(Handle::wrap)
    }

    pub fn remove(&mut self, index: usize) -> Option<Handle<T>> {
        self.inner.remove(index).map(Handle::wrap)
    }

    pub fn remove_element(&mut self, element: &Handle<T>) -> bool {
        self.inner.remove_element(element.node())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
