//! Serialized element model

use indexmap::{IndexMap, IndexSet};

use crate::qname::QName;

/// Serialized XML element
///
/// Attribute and namespace maps keep document order. Equality treats them as maps and
/// ignores prefixes (see [`QName`]), but compares children in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: QName,
    pub attributes: IndexMap<QName, String>,
    /// Namespace declarations made on this element, keyed by prefix (`""` is the default
    /// namespace)
    pub namespaces: IndexMap<String, String>,
    /// Attributes registered as ID-typed, so `#fragment` references can be resolved
    pub id_attributes: IndexSet<QName>,
    pub children: Vec<Content>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: IndexMap::new(),
            namespaces: IndexMap::new(),
            id_attributes: IndexSet::new(),
            children: Vec::new(),
        }
    }

    /// Copy of the name, attributes and declarations, without children
    pub fn clone_without_children(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            namespaces: self.namespaces.clone(),
            id_attributes: self.id_attributes.clone(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        self.attributes.insert(name, value.into());
    }

    pub fn remove_attribute(&mut self, name: &QName) -> Option<String> {
        self.id_attributes.shift_remove(name);
        self.attributes.shift_remove(name)
    }

    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.insert(prefix.to_string(), uri.to_string());
    }

    /// Flag an existing attribute as ID-typed. Returns false if the attribute is absent.
    pub fn set_id_attribute(&mut self, name: &QName) -> bool {
        if self.attributes.contains_key(name) {
            self.id_attributes.insert(name.clone());
            true
        } else {
            false
        }
    }

    pub fn is_id_attribute(&self, name: &QName) -> bool {
        self.id_attributes.contains(name)
    }

    /// Find the element in this subtree carrying an ID-typed attribute with value `id`
    pub fn find_by_id(&self, id: &str) -> Option<&Self> {
        let matches = self
            .id_attributes
            .iter()
            .any(|name| self.attribute(name) == Some(id));
        if matches {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|content| match content {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Concatenated text children, if there are any
    pub fn text(&self) -> Option<String> {
        let mut texts = self.children.iter().filter_map(|content| match content {
            Content::Text(text) => Some(text.as_str()),
            Content::Element(_) => None,
        });
        let first = texts.next()?;
        Some(texts.fold(first.to_string(), |mut acc, text| {
            acc.push_str(text);
            acc
        }))
    }

    pub fn push_element(&mut self, element: Self) {
        self.children.push(Content::Element(element));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Content::Text(text.into()));
    }
}
