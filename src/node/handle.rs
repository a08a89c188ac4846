//! Typed views of nodes

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use super::{Node, NodeRef, XmlObject};
use crate::error::Result;

/// A [`NodeRef`] whose body is known to be a `T`
///
/// Dereferences to [`Node`] for the tree-level operations; [`Handle::read`] and
/// [`Handle::write`] reach the typed body.
pub struct Handle<T: XmlObject> {
    node: NodeRef,
    marker: PhantomData<fn() -> T>,
}

impl<T: XmlObject> Handle<T> {
    pub(crate) fn wrap(node: NodeRef) -> Self {
        Self {
            node,
            marker: PhantomData,
        }
    }

    /// View `node` as a `T`, giving it back unchanged if its body is something else
    pub fn downcast(node: NodeRef) -> std::result::Result<Self, NodeRef> {
        if node.is::<T>() {
            Ok(Self::wrap(node))
        } else {
            Err(node)
        }
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn into_node(self) -> NodeRef {
        self.node
    }

    pub fn read(&self) -> Result<MappedRwLockReadGuard<'_, T>> {
        self.node.body::<T>()
    }

    /// Mutable body access; see [`Node::body_mut`]
    pub fn write(&self) -> Result<MappedRwLockWriteGuard<'_, T>> {
        self.node.body_mut::<T>()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl<T: XmlObject> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self::wrap(Arc::clone(&self.node))
    }
}

impl<T: XmlObject> Deref for Handle<T> {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl<T: XmlObject> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: XmlObject> Eq for Handle<T> {}

impl<T: XmlObject> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.node).finish()
    }
}

impl<T: XmlObject> From<Handle<T>> for NodeRef {
    fn from(handle: Handle<T>) -> Self {
        handle.node
    }
}
