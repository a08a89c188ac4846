//! Structural comparison of object trees and element trees

use crate::dom::{Content, Element};
use crate::node::Node;

/// Whether two object trees have the same names, node-level attributes and children.
/// Typed body fields are not compared; marshall both trees to compare those.
pub fn trees_equal(left: &Node, right: &Node) -> bool {
    if left.element_qname() != right.element_qname()
        || left.schema_type() != right.schema_type()
        || *left.attributes() != *right.attributes()
    {
        return false;
    }
    let (l_children, r_children) = (left.ordered_children(), right.ordered_children());
    l_children.len() == r_children.len()
        && l_children
            .iter()
            .zip(r_children.iter())
            .all(|(l, r)| trees_equal(l, r))
}

/// Element equality that ignores where namespaces were declared and ID bookkeeping
pub fn elements_equivalent(left: &Element, right: &Element) -> bool {
    if left.name != right.name || left.attributes != right.attributes {
        return false;
    }
    left.children.len() == right.children.len()
        && left
            .children
            .iter()
            .zip(right.children.iter())
            .all(|(l, r)| match (l, r) {
                (Content::Element(l), Content::Element(r)) => elements_equivalent(l, r),
                (Content::Text(l), Content::Text(r)) => l == r,
                _ => false,
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::node::tests::{holder, push, with_id};
    use crate::qname::QName;

    #[test]
    fn test_trees_equal() -> Result<()> {
        let left = holder("root");
        push(&left, &with_id(holder("child"), "c1")?)?;
        let right = holder("root");
        push(&right, &with_id(holder("child"), "c1")?)?;
        assert!(trees_equal(&left, &right));

        push(&right, &holder("extra"))?;
        assert!(!trees_equal(&left, &right));
        Ok(())
    }

    #[test]
    fn test_elements_equivalent_ignores_declarations() {
        let mut left = Element::new(QName::new("urn:x", "e", Some("x")));
        left.declare_namespace("x", "urn:x");
        let right = Element::new(QName::new("urn:x", "e", Some("y")));
        assert!(elements_equivalent(&left, &right));

        let mut other = right.clone();
        other.push_text("t");
        assert!(!elements_equivalent(&left, &other));
    }
}
