use std::slice;
use std::sync::{Arc, Weak};

use crate::error::Result;
use crate::list::ChildList;
use crate::node::{Node, NodeRef};

/// Where an unknown child sits relative to the typed children of its owner
#[derive(Clone, Debug)]
enum Anchor {
    /// Before every typed child
    Start,
    /// Directly after this typed child
    After(Weak<Node>),
    /// After every typed child
    End,
}

/// Children without a typed slot, each anchored to the typed child it follows
///
/// [`UnknownChildList::interleave`] merges them back into the typed children so a node
/// rebuilt from its object model keeps the document order it was read in. Children whose
/// anchor has since been removed from the owner move to the end.
#[derive(Debug)]
pub struct UnknownChildList {
    children: ChildList,
    anchors: Vec<Anchor>,
}

impl UnknownChildList {
    pub fn new(owner: &Weak<Node>) -> Self {
        Self {
            children: ChildList::new(owner),
            anchors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, NodeRef> {
        self.children.iter()
    }

    pub fn as_slice(&self) -> &[NodeRef] {
        self.children.as_slice()
    }

    pub fn position(&self, element: &NodeRef) -> Option<usize> {
        self.children.position(element)
    }

    pub fn contains(&self, element: &NodeRef) -> bool {
        self.children.contains(element)
    }

    /// Append `element` after every typed child
    pub fn push(&mut self, element: NodeRef) -> Result<bool> {
        self.push_anchored(Anchor::End, element)
    }

    /// Append `element` directly after the typed child `anchor`, or before every typed
    /// child if `anchor` is `None`
    pub fn push_after(&mut self, anchor: Option<&NodeRef>, element: NodeRef) -> Result<bool> {
        let anchor = anchor.map_or(Anchor::Start, |typed| Anchor::After(Arc::downgrade(typed)));
        self.push_anchored(anchor, element)
    }

    fn push_anchored(&mut self, anchor: Anchor, element: NodeRef) -> Result<bool> {
        let added = self.children.push(element)?;
        if added {
            self.anchors.push(anchor);
        }
        Ok(added)
    }

    /// Insert `element` at `index`, taking the anchor of the element it displaces
    pub fn insert(&mut self, index: usize, element: NodeRef) -> Result<bool> {
        let anchor = self.anchors.get(index).cloned().unwrap_or(Anchor::End);
        let added = self.children.insert(index, element)?;
        if added {
            self.anchors.insert(index, anchor);
        }
        Ok(added)
    }

    /// Replace the element at `index`; the replacement keeps its anchor
    pub fn set(&mut self, index: usize, element: NodeRef) -> Result<NodeRef> {
        self.children.set(index, element)
    }

    pub fn remove(&mut self, index: usize) -> Option<NodeRef> {
        let removed = self.children.remove(index)?;
        self.anchors.remove(index);
        Some(removed)
    }

    pub fn remove_element(&mut self, element: &NodeRef) -> bool {
        self.position(element)
            .and_then(|index| self.remove(index))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.anchors.clear();
    }

    /// Merge these children into `typed`, which must be in schema order
    pub fn interleave(&self, typed: Vec<NodeRef>) -> Vec<NodeRef> {
        let mut ordered = Vec::with_capacity(typed.len() + self.len());
        let mut pending: Vec<(&NodeRef, &Anchor)> =
            self.children.iter().zip(&self.anchors).collect();

        take_anchored(&mut pending, &mut ordered, |anchor| {
            matches!(anchor, Anchor::Start)
        });
        for child in typed {
            let typed_ptr = Arc::as_ptr(&child);
            ordered.push(child);
            take_anchored(&mut pending, &mut ordered, |anchor| {
                matches!(anchor, Anchor::After(after) if Weak::as_ptr(after) == typed_ptr)
            });
        }
        ordered.extend(pending.into_iter().map(|(child, _)| Arc::clone(child)));
        ordered
    }
}

fn take_anchored(
    pending: &mut Vec<(&NodeRef, &Anchor)>,
    ordered: &mut Vec<NodeRef>,
    at: impl Fn(&Anchor) -> bool,
) {
    pending.retain(|(child, anchor)| {
        if at(*anchor) {
            ordered.push(Arc::clone(*child));
            false
        } else {
            true
        }
    });
}

impl<'a> IntoIterator for &'a UnknownChildList {
    type Item = &'a NodeRef;
    type IntoIter = slice::Iter<'a, NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::holder;
    use crate::node::XmlObject;
    use crate::qname::QName;

    #[derive(Debug)]
    struct Mixed {
        typed: ChildList,
        unknown: UnknownChildList,
    }

    impl XmlObject for Mixed {
        fn ordered_children(&self) -> Vec<NodeRef> {
            self.unknown.interleave(self.typed.as_slice().to_vec())
        }
    }

    fn mixed() -> NodeRef {
        Node::new(QName::local("mixed"), None, |owner| {
            Box::new(Mixed {
                typed: ChildList::new(owner),
                unknown: UnknownChildList::new(owner),
            })
        })
    }

    fn names(node: &Node) -> Vec<String> {
        node.ordered_children()
            .iter()
            .map(|child| child.element_qname().local_name().to_string())
            .collect()
    }

    #[test]
    fn test_anchored_children_keep_their_place() -> Result<()> {
        let parent = mixed();
        let first = holder("first");
        let second = holder("second");
        {
            let mut body = parent.body_mut::<Mixed>()?;
            body.unknown.push_after(None, holder("lead"))?;
            body.typed.push(Arc::clone(&first))?;
            body.unknown.push_after(Some(&first), holder("a"))?;
            body.unknown.push_after(Some(&first), holder("b"))?;
            body.typed.push(Arc::clone(&second))?;
            body.unknown.push(holder("tail"))?;
        }
        assert_eq!(names(&parent), ["lead", "first", "a", "b", "second", "tail"]);
        Ok(())
    }

    #[test]
    fn test_removed_anchor_moves_children_to_end() -> Result<()> {
        let parent = mixed();
        let first = holder("first");
        let second = holder("second");
        {
            let mut body = parent.body_mut::<Mixed>()?;
            body.typed.push(Arc::clone(&first))?;
            body.typed.push(Arc::clone(&second))?;
            body.unknown.push_after(Some(&first), holder("a"))?;
            body.typed.remove_element(&first);
        }
        assert_eq!(names(&parent), ["second", "a"]);
        Ok(())
    }

    #[test]
    fn test_anchors_follow_removal_and_insertion() -> Result<()> {
        let parent = mixed();
        let typed = holder("typed");
        let a = holder("a");
        {
            let mut body = parent.body_mut::<Mixed>()?;
            body.typed.push(Arc::clone(&typed))?;
            body.unknown.push_after(None, Arc::clone(&a))?;
            body.unknown.push(holder("b"))?;
            assert!(!body.unknown.push_after(None, Arc::clone(&a))?);
            body.unknown.insert(0, holder("c"))?;
            assert!(body.unknown.remove_element(&a));
        }
        assert!(!a.has_parent());
        assert_eq!(names(&parent), ["c", "typed", "b"]);
        Ok(())
    }
}
