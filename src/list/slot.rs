use std::sync::Weak;

use crate::error::{Error, Result};
use crate::node::{attach, detach, Handle, Node, NodeRef, XmlObject};

/// Optional single child of one element type
#[derive(Debug)]
pub struct ChildSlot<T: XmlObject> {
    owner: Weak<Node>,
    value: Option<Handle<T>>,
}

impl<T: XmlObject> ChildSlot<T> {
    pub fn new(owner: &Weak<Node>) -> Self {
        Self {
            owner: owner.clone(),
            value: None,
        }
    }

    pub fn get(&self) -> Option<Handle<T>> {
        self.value.clone()
    }

    pub fn node(&self) -> Option<&NodeRef> {
        self.value.as_ref().map(Handle::node)
    }

    pub fn is_some(&self) -> bool {
        self.value.is_some()
    }

    /// Replace the held child, returning the detached previous one. Setting the child that
    /// is already held changes nothing and returns `None`.
    pub fn set(&mut self, value: Option<Handle<T>>) -> Result<Option<Handle<T>>> {
        let unchanged = match (&self.value, &value) {
            (Some(current), Some(new)) => current.ptr_eq(new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(None);
        }

        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| Error::invalid_tree("child slot owner has been dropped"))?;
        match value {
            Some(new) => {
                attach(&owner, new.node(), self.node())?;
                Ok(self.value.replace(new))
            }
            None => {
                let old = self.value.take();
                if let Some(old) = &old {
                    detach(&owner, old.node());
                }
                Ok(old)
            }
        }
    }

    /// Remove and detach the held child
    pub fn take(&mut self) -> Option<Handle<T>> {
        let old = self.value.take()?;
        if let Some(owner) = self.owner.upgrade() {
            detach(&owner, old.node());
        }
        Some(old)
    }
}
