//! Tree nodes: identity, parent linkage, attributes, ID index and cached form
//!
//! A [`Node`] is always held through a [`NodeRef`]. Children are owned by the child lists
//! inside their parent's body; the parent pointer is a non-owning [`Weak`]. Every lock in a
//! node guards one concern, so walking the ancestor chain to update ID indexes or release
//! cached forms never touches a body that a caller may be mutating.

pub mod attributes;
pub mod handle;

use std::any::{type_name, Any};
use std::fmt;
use std::iter;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use tracing::{trace, warn};

pub use attributes::AttributeMap;
pub use handle::Handle;

use crate::dom::Element;
use crate::error::{Error, ErrorKind, Result};
use crate::id_index::IdIndex;
use crate::qname::QName;

/// Shared handle to a tree node
pub type NodeRef = Arc<Node>;

/// Upcast to [`Any`] for body downcasts
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Type-specific content of a node: typed attributes and child slots.
pub trait XmlObject: Any + AsAny + fmt::Debug + Send + Sync {
    /// Children in schema order, followed by extension children.
    fn ordered_children(&self) -> Vec<NodeRef> {
        Vec::new()
    }
}

/// An [`XmlObject`] that can be instantiated for any element or type name
pub trait ElementType: XmlObject + Sized {
    /// Create an empty body whose child lists belong to `owner`
    fn create(owner: &Weak<Node>) -> Self;

    fn build_with(element_name: QName, schema_type: Option<QName>) -> Handle<Self> {
        Handle::wrap(Node::new(element_name, schema_type, |owner| {
            Box::new(Self::create(owner))
        }))
    }
}

/// An [`ElementType`] with a schema-defined element name
pub trait NamedElement: ElementType {
    fn default_element_name() -> QName;

    fn build() -> Handle<Self> {
        Self::build_with(Self::default_element_name(), None)
    }
}

/// A node of the XML object tree
pub struct Node {
    element_name: QName,
    schema_type: Option<QName>,
    this: Weak<Node>,
    parent: RwLock<Weak<Node>>,
    attributes: RwLock<AttributeMap>,
    namespaces: RwLock<IndexMap<String, String>>,
    id_index: RwLock<IdIndex>,
    cached_form: RwLock<Option<Arc<Element>>>,
    body: RwLock<Box<dyn XmlObject>>,
}

impl Node {
    /// Create a detached node. `body` receives the node's own weak reference so child
    /// lists can be bound to their owner.
    pub fn new<F>(element_name: QName, schema_type: Option<QName>, body: F) -> NodeRef
    where
        F: FnOnce(&Weak<Self>) -> Box<dyn XmlObject>,
    {
        Arc::new_cyclic(|this| Self {
            element_name,
            schema_type,
            this: this.clone(),
            parent: RwLock::new(Weak::new()),
            attributes: RwLock::new(AttributeMap::default()),
            namespaces: RwLock::new(IndexMap::new()),
            id_index: RwLock::new(IdIndex::default()),
            cached_form: RwLock::new(None),
            body: RwLock::new(body(this)),
        })
    }

    pub fn element_qname(&self) -> &QName {
        &self.element_name
    }

    pub fn schema_type(&self) -> Option<&QName> {
        self.schema_type.as_ref()
    }

    /// Whether the element name or the schema type equals `name`
    pub fn matches(&self, name: &QName) -> bool {
        self.element_name == *name || self.schema_type.as_ref() == Some(name)
    }

    pub(crate) fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    // ----- parent linkage -----

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.read().upgrade()
    }

    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self) -> Vec<NodeRef> {
        let mut ancestors = Vec::new();
        let mut next = self.parent();
        while let Some(node) = next {
            next = node.parent();
            ancestors.push(node);
        }
        ancestors
    }

    /// The root of the tree this node belongs to, which may be the node itself
    pub fn root(&self) -> Option<NodeRef> {
        self.ancestors().pop().or_else(|| self.this.upgrade())
    }

    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other
            .ancestors()
            .iter()
            .any(|ancestor| std::ptr::eq(Arc::as_ptr(ancestor), self))
    }

    pub(crate) fn set_parent(&self, parent: Option<&Self>) -> Result<()> {
        let mut slot = self.parent.write();
        if let (Some(new), Some(current)) = (parent, slot.upgrade()) {
            if !std::ptr::eq(Arc::as_ptr(&current), new) {
                return Err(Error::invalid_tree(format!(
                    "{} is already a child of {}",
                    self.element_name, current.element_name
                )));
            }
        }
        *slot = parent.map(Self::weak).unwrap_or_default();
        Ok(())
    }

    /// Snapshot of the children in schema order
    pub fn ordered_children(&self) -> Vec<NodeRef> {
        self.body.read().ordered_children()
    }

    // ----- typed body access -----

    pub fn is<T: XmlObject>(&self) -> bool {
        (**self.body.read()).as_any().is::<T>()
    }

    pub fn body<T: XmlObject>(&self) -> Result<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.body.read(), |body| {
            (**body).as_any().downcast_ref::<T>()
        })
        .map_err(|_| type_mismatch::<T>())
    }

    /// Mutable body access. Acquiring the guard releases the cached form of this node and
    /// of every ancestor, since the caller is about to change what they serialize to.
    pub fn body_mut<T: XmlObject>(&self) -> Result<MappedRwLockWriteGuard<'_, T>> {
        let guard = RwLockWriteGuard::try_map(self.body.write(), |body| {
            (**body).as_any_mut().downcast_mut::<T>()
        })
        .map_err(|_| type_mismatch::<T>())?;
        self.release_cached_form(true);
        Ok(guard)
    }

    // ----- attributes -----

    pub fn attribute(&self, name: &QName) -> Option<String> {
        self.attributes.read().get(name).map(str::to_string)
    }

    pub fn attributes(&self) -> RwLockReadGuard<'_, AttributeMap> {
        self.attributes.read()
    }

    /// Set or remove an extension attribute. Attributes already flagged as ID-typed are
    /// routed through [`Node::set_id_attribute`].
    pub fn set_attribute(&self, name: QName, value: Option<&str>) -> Result<()> {
        if self.attributes.read().is_id_attribute(&name) {
            return self.set_id_attribute(name, value);
        }
        {
            let mut attributes = self.attributes.write();
            match value {
                Some(value) => attributes.insert(name, value),
                None => {
                    attributes.remove(&name);
                }
            }
        }
        self.release_cached_form(true);
        Ok(())
    }

    pub fn id_attribute_names(&self) -> Vec<QName> {
        self.attributes.read().id_names().cloned().collect()
    }

    /// Set or remove an ID-typed attribute, keeping the ID index of this node and every
    /// ancestor in step. Fails with `DuplicateId` without changing anything when another
    /// node of the tree already owns `value`.
    pub fn set_id_attribute(&self, name: QName, value: Option<&str>) -> Result<()> {
        let (old, flagged) = {
            let attributes = self.attributes.read();
            (
                attributes.get(&name).map(str::to_string),
                attributes.is_id_attribute(&name),
            )
        };
        if flagged && old.as_deref() == value {
            return Ok(());
        }
        // a value held before the attribute was flagged was never indexed
        let old = old.filter(|_| flagged);

        let ancestors = self.ancestors();
        let scopes: Vec<&Self> = iter::once(self)
            .chain(ancestors.iter().map(Arc::as_ref))
            .collect();

        if let Some(id) = value {
            for scope in &scopes {
                let conflict = scope
                    .id_index
                    .read()
                    .owner_of(id)
                    .is_some_and(|owner| !Weak::ptr_eq(owner, &self.this));
                if conflict {
                    warn!(id, element = %self.element_name, "rejecting duplicate ID");
                    return Err(Error::duplicate_id(id));
                }
            }
        }

        // another ID attribute of this node may carry the same value
        let old = old.filter(|old| {
            !self
                .attributes
                .read()
                .id_entries()
                .any(|(other, v)| *other != name && v == old.as_str())
        });
        for scope in &scopes {
            let mut index = scope.id_index.write();
            if let Some(old) = old.as_deref() {
                index.deregister_id_mapping(old, &self.this);
            }
            if let Some(id) = value {
                index.insert(id, &self.this);
            }
        }

        {
            let mut attributes = self.attributes.write();
            match value {
                Some(value) => attributes.insert_id(name, value),
                None => {
                    attributes.remove(&name);
                }
            }
        }
        self.release_cached_form(true);
        Ok(())
    }

    // ----- namespace declarations -----

    /// Namespace declarations carried by this element, in the order they were made
    pub fn namespace_declarations(&self) -> Vec<(String, String)> {
        self.namespaces
            .read()
            .iter()
            .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
            .collect()
    }

    /// Declare `prefix` (empty for the default namespace) on this element. Declarations are
    /// written even when no name of the element uses them, so QName-valued content keeps
    /// its binding.
    pub fn declare_namespace(&self, prefix: &str, uri: &str) {
        let previous = self
            .namespaces
            .write()
            .insert(prefix.to_string(), uri.to_string());
        if previous.as_deref() != Some(uri) {
            self.release_cached_form(true);
        }
    }

    pub fn remove_namespace_declaration(&self, prefix: &str) -> Option<String> {
        let removed = self.namespaces.write().shift_remove(prefix);
        if removed.is_some() {
            self.release_cached_form(true);
        }
        removed
    }

    // ----- ID index -----

    /// The index of IDs owned by this node and its descendants
    pub fn id_index(&self) -> RwLockReadGuard<'_, IdIndex> {
        self.id_index.read()
    }

    pub fn resolve_id(&self, id: &str) -> Option<NodeRef> {
        self.id_index.read().lookup(id)
    }

    /// Recompute the ID index of this subtree from the attributes of its nodes and carry
    /// the difference into every ancestor. Nothing changes if the recomputed IDs collide
    /// with each other or with IDs owned elsewhere in the tree.
    pub fn rebuild_id_index(&self) -> Result<()> {
        let mut descendants = Vec::new();
        let rebuilt = self.collect_id_indexes(&mut descendants)?;

        let ancestors = self.ancestors();
        let old = self.id_index.read().clone();
        for ancestor in &ancestors {
            if let Some(id) = ancestor.id_index.read().find_conflict(&rebuilt, Some(&old)) {
                warn!(id = %id, element = %self.element_name, "rejecting duplicate ID");
                return Err(Error::duplicate_id(&id));
            }
        }

        for (node, index) in descendants {
            *node.id_index.write() = index;
        }
        for ancestor in &ancestors {
            let mut index = ancestor.id_index.write();
            index.deregister_id_mappings(&old);
            index.merge(&rebuilt);
        }
        *self.id_index.write() = rebuilt;
        Ok(())
    }

    /// Compute the index of this subtree without storing it; the indexes of descendants
    /// are pushed onto `rebuilt`
    fn collect_id_indexes(&self, rebuilt: &mut Vec<(NodeRef, IdIndex)>) -> Result<IdIndex> {
        let mut index = IdIndex::default();
        for child in self.ordered_children() {
            let child_index = child.collect_id_indexes(rebuilt)?;
            index.register_id_mappings(&child_index)?;
            rebuilt.push((child, child_index));
        }
        for (_, value) in self.attributes.read().id_entries() {
            index.register_weak(value, &self.this)?;
        }
        Ok(index)
    }

    // ----- cached serialized form -----

    pub fn cached_form(&self) -> Option<Arc<Element>> {
        self.cached_form.read().clone()
    }

    pub fn has_cached_form(&self) -> bool {
        self.cached_form.read().is_some()
    }

    pub(crate) fn set_cached_form(&self, element: Arc<Element>) {
        *self.cached_form.write() = Some(element);
    }

    /// Drop the cached form of this node and, if `propagate_to_parent`, of every ancestor
    pub fn release_cached_form(&self, propagate_to_parent: bool) {
        if self.cached_form.write().take().is_some() {
            trace!(element = %self.element_name, "released cached form");
        }
        if propagate_to_parent {
            for ancestor in self.ancestors() {
                ancestor.cached_form.write().take();
            }
        }
    }

    /// Drop the cached form of every child, and of all descendants if `propagate`
    pub fn release_children_cached_form(&self, propagate: bool) {
        for child in self.ordered_children() {
            child.release_cached_form(false);
            if propagate {
                child.release_children_cached_form(true);
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("element_name", &self.element_name)
            .field("schema_type", &self.schema_type)
            .field("attributes", &*self.attributes.read())
            .finish_non_exhaustive()
    }
}

fn type_mismatch<T>() -> Error {
    Error::new(ErrorKind::TypeMismatch {
        expected: type_name::<T>(),
    })
}

/// Link `child` beneath `owner`, replacing `outgoing` (already a child of `owner`) if given.
///
/// Everything is validated before the first change: a failed attach leaves both trees as
/// they were.
pub(crate) fn attach(owner: &Node, child: &NodeRef, outgoing: Option<&NodeRef>) -> Result<()> {
    let owner_ancestors = owner.ancestors();
    let creates_cycle = std::ptr::eq(owner, Arc::as_ptr(child))
        || owner_ancestors
            .iter()
            .any(|ancestor| Arc::ptr_eq(ancestor, child));
    if creates_cycle {
        return Err(Error::invalid_tree(format!(
            "cannot attach {} beneath itself",
            child.element_name
        )));
    }
    if let Some(current) = child.parent() {
        return Err(Error::invalid_tree(format!(
            "{} is already a child of {}",
            child.element_name, current.element_name
        )));
    }

    let scopes: Vec<&Node> = iter::once(owner)
        .chain(owner_ancestors.iter().map(Arc::as_ref))
        .collect();
    {
        let incoming = child.id_index.read();
        let replaced = outgoing.map(|node| node.id_index.read());
        for scope in &scopes {
            let conflict = scope
                .id_index
                .read()
                .find_conflict(&incoming, replaced.as_deref());
            if let Some(id) = conflict {
                warn!(id = %id, parent = %owner.element_name, "rejecting duplicate ID");
                return Err(Error::duplicate_id(&id));
            }
        }
    }

    child.set_parent(Some(owner))?;
    if let Some(outgoing) = outgoing {
        detach(owner, outgoing);
    }
    {
        let incoming = child.id_index.read();
        for scope in &scopes {
            scope.id_index.write().merge(&incoming);
        }
    }
    child.release_cached_form(false);
    owner.release_cached_form(true);
    trace!(parent = %owner.element_name, child = %child.element_name, "attached");
    Ok(())
}

/// Unlink `child` from `owner`, handing the subtree back detached
pub(crate) fn detach(owner: &Node, child: &NodeRef) {
    let owner_ancestors = owner.ancestors();
    {
        let outgoing = child.id_index.read();
        for scope in iter::once(owner).chain(owner_ancestors.iter().map(Arc::as_ref)) {
            scope.id_index.write().deregister_id_mappings(&outgoing);
        }
    }
    *child.parent.write() = Weak::new();
    child.release_cached_form(false);
    owner.release_cached_form(true);
    trace!(parent = %owner.element_name, child = %child.element_name, "detached");
}
