//! Object tree to element tree

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::qname::{QName, XSI_NS, XSI_PREFIX};
use crate::registry::ProviderRegistry;

/// What the body of an element is made of
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentModel {
    /// Child elements, taken from [`Node::ordered_children`]
    Children,
    /// Character data written by [`Marshaller::marshall_element_content`]
    Text,
}

/// Type-specific half of marshalling.
///
/// The driver in this module creates the element, writes `xsi:type` and the node-level
/// attributes, and recurses into children; implementations only contribute what their
/// typed body holds.
pub trait Marshaller: Send + Sync {
    fn content_model(&self, _node: &Node) -> ContentModel {
        ContentModel::Children
    }

    /// Write the typed attributes of `node`
    fn marshall_attributes(&self, _node: &Node, _element: &mut Element) -> Result<()> {
        Ok(())
    }

    /// Write character content; only called for [`ContentModel::Text`]
    fn marshall_element_content(&self, _node: &Node, _element: &mut Element) -> Result<()> {
        Ok(())
    }
}

/// Marshall `node` and its subtree, reusing cached forms where they are still valid.
///
/// On success every marshalled node caches its result. On failure no cache is set.
#[instrument(level = "debug", skip_all, fields(element = %node.element_qname()))]
pub fn marshall(node: &Node, registry: &ProviderRegistry) -> Result<Arc<Element>> {
    let element = marshall_node(node, registry)?;
    debug!("marshalled");
    Ok(element)
}

/// Marshall `node` and append the result to `parent`
pub fn marshall_into(node: &Node, parent: &mut Element, registry: &ProviderRegistry) -> Result<()> {
    let element = marshall_node(node, registry)?;
    parent.push_element(Element::clone(&element));
    Ok(())
}

fn marshall_node(node: &Node, registry: &ProviderRegistry) -> Result<Arc<Element>> {
    if let Some(cached) = node.cached_form() {
        trace!(element = %node.element_qname(), "reusing cached form");
        return Ok(cached);
    }

    let marshaller = registry.marshaller_for(node).ok_or_else(|| {
        Error::marshalling(format!("no marshaller for {}", node.element_qname()))
    })?;

    let mut element = Element::new(node.element_qname().clone());
    for (prefix, uri) in node.namespace_declarations() {
        element.declare_namespace(&prefix, &uri);
    }
    if let Some(schema_type) = node.schema_type() {
        write_schema_type(schema_type, &mut element);
    }
    marshaller.marshall_attributes(node, &mut element)?;
    node.attributes().marshall_into(&mut element);

    match marshaller.content_model(node) {
        ContentModel::Text => marshaller.marshall_element_content(node, &mut element)?,
        ContentModel::Children => {
            for child in node.ordered_children() {
                let child_element = marshall_node(&child, registry)?;
                element.push_element(Element::clone(&child_element));
            }
        }
    }

    let element = Arc::new(element);
    node.set_cached_form(Arc::clone(&element));
    Ok(element)
}

fn write_schema_type(schema_type: &QName, element: &mut Element) {
    let value = match (schema_type.namespace_uri(), schema_type.prefix()) {
        (Some(uri), prefix) => {
            let prefix = prefix.unwrap_or("xst");
            element.declare_namespace(prefix, uri);
            format!("{prefix}:{}", schema_type.local_name())
        }
        (None, _) => schema_type.local_name().to_string(),
    };
    element.set_attribute(QName::new(XSI_NS, "type", Some(XSI_PREFIX)), value);
}
