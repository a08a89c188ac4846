//! Node-level attributes: extension attributes and ID-typed attributes

use indexmap::{IndexMap, IndexSet};

use crate::dom::Element;
use crate::qname::QName;

/// Attributes held directly on a node rather than in its typed body
///
/// Mutation goes through [`crate::Node`] so ID-typed values stay in step with the ID
/// index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    values: IndexMap<QName, String>,
    id_names: IndexSet<QName>,
}

impl AttributeMap {
    pub fn get(&self, name: &QName) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name, value.as_str()))
    }

    pub fn is_id_attribute(&self, name: &QName) -> bool {
        self.id_names.contains(name)
    }

    pub fn id_names(&self) -> impl Iterator<Item = &QName> {
        self.id_names.iter()
    }

    /// ID-typed attributes with their values
    pub fn id_entries(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.id_names
            .iter()
            .filter_map(|name| self.get(name).map(|value| (name, value)))
    }

    pub(crate) fn insert(&mut self, name: QName, value: &str) {
        self.values.insert(name, value.to_string());
    }

    pub(crate) fn insert_id(&mut self, name: QName, value: &str) {
        self.id_names.insert(name.clone());
        self.values.insert(name, value.to_string());
    }

    pub(crate) fn remove(&mut self, name: &QName) -> Option<String> {
        self.id_names.shift_remove(name);
        self.values.shift_remove(name)
    }

    /// Copy every attribute onto `element`, flagging the ID-typed ones
    pub fn marshall_into(&self, element: &mut Element) {
        for (name, value) in &self.values {
            element.set_attribute(name.clone(), value.clone());
            if self.id_names.contains(name) {
                element.set_id_attribute(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_clears_id_flag() {
        let mut attributes = AttributeMap::default();
        attributes.insert_id(QName::local("ID"), "a1");
        attributes.insert(QName::new("urn:ext", "hint", Some("ext")), "x");
        assert_eq!(attributes.id_entries().count(), 1);

        assert_eq!(attributes.remove(&QName::local("ID")).as_deref(), Some("a1"));
        assert!(!attributes.is_id_attribute(&QName::local("ID")));
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_marshall_into_flags_ids() {
        let mut attributes = AttributeMap::default();
        attributes.insert_id(QName::xml_id(), "n1");
        attributes.insert(QName::local("Consent"), "urn:c");

        let mut element = Element::new(QName::local("Response"));
        attributes.marshall_into(&mut element);
        assert_eq!(element.attribute(&QName::local("Consent")), Some("urn:c"));
        assert!(element.is_id_attribute(&QName::xml_id()));
        assert!(!element.is_id_attribute(&QName::local("Consent")));
    }
}
