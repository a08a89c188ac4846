//! Element tree to object tree

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::dom::{Content, Element};
use crate::error::{Error, ErrorKind, Result};
use crate::node::NodeRef;
use crate::qname::{QName, XML_NS, XML_PREFIX};
use crate::registry::ProviderRegistry;

/// Type-specific half of unmarshalling.
///
/// The driver builds the node through the registered builder, then feeds it attributes
/// first and child elements and text in document order.
pub trait Unmarshaller: Send + Sync {
    /// Consume one attribute. The default stores it as a node-level attribute.
    fn process_attribute(
        &self,
        node: &NodeRef,
        name: &QName,
        value: &str,
        registry: &ProviderRegistry,
    ) -> Result<()> {
        process_unknown_attribute(node, name, value, registry)
    }

    /// Adopt an already unmarshalled child. The default drops it.
    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        debug!(
            parent = %parent.element_qname(),
            child = %child.element_qname(),
            "ignoring child element"
        );
        Ok(())
    }

    fn process_element_content(&self, _node: &NodeRef, _content: &str) -> Result<()> {
        Ok(())
    }
}

/// Store an attribute no typed field claims, as an ID attribute if the registry says so
pub fn process_unknown_attribute(
    node: &NodeRef,
    name: &QName,
    value: &str,
    registry: &ProviderRegistry,
) -> Result<()> {
    if registry.is_id_attribute(name) {
        node.set_id_attribute(name.clone(), Some(value))
    } else {
        node.set_attribute(name.clone(), Some(value))
    }
}

/// Unmarshall a complete element tree.
///
/// The root must have a provider for its element name or `xsi:type`; unclaimed
/// descendants fall back to the registry's default provider. The returned root caches the
/// input, with ID-typed attributes flagged, as its serialized form.
#[instrument(level = "debug", skip_all, fields(element = %element.name))]
pub fn unmarshall(element: &Element, registry: &ProviderRegistry) -> Result<NodeRef> {
    let node = unmarshall_element(element, registry, &[], true)?;
    debug!("unmarshalled");
    Ok(node)
}

fn unmarshall_element(
    element: &Element,
    registry: &ProviderRegistry,
    scope: &[(String, String)],
    is_root: bool,
) -> Result<NodeRef> {
    let mut bindings = scope.to_vec();
    bindings.extend(
        element
            .namespaces
            .iter()
            .map(|(prefix, uri)| (prefix.clone(), uri.clone())),
    );

    let xsi_type = QName::xsi_type();
    let schema_type = element
        .attribute(&xsi_type)
        .map(|value| resolve_type(value, &bindings))
        .transpose()?;

    let provider = registry
        .provider(&element.name)
        .or_else(|| schema_type.as_ref().and_then(|t| registry.provider(t)))
        .or_else(|| {
            if is_root {
                None
            } else {
                registry.default_provider()
            }
        })
        .ok_or_else(|| {
            Error::new(ErrorKind::UnknownElement {
                name: element.name.clone(),
            })
        })?;

    trace!(element = %element.name, "building node");
    let node = provider
        .builder()
        .build_object(element.name.clone(), schema_type);
    let unmarshaller = provider.unmarshaller();

    for (prefix, uri) in &element.namespaces {
        node.declare_namespace(prefix, uri);
    }
    for (name, value) in &element.attributes {
        if *name != xsi_type {
            unmarshaller.process_attribute(&node, name, value, registry)?;
        }
    }

    let mut cached = element.clone_without_children();
    for name in node.id_attribute_names() {
        cached.set_id_attribute(&name);
    }

    for content in &element.children {
        match content {
            Content::Text(text) => {
                unmarshaller.process_element_content(&node, text)?;
                cached.push_text(text.clone());
            }
            Content::Element(child_element) => {
                let child = unmarshall_element(child_element, registry, &bindings, false)?;
                // adoption releases the child's own cached form
                let child_form = child.cached_form();
                unmarshaller.process_child_element(&node, Arc::clone(&child))?;
                match child_form {
                    Some(form) => {
                        cached.push_element(Element::clone(&form));
                        child.set_cached_form(form);
                    }
                    None => cached.push_element(child_element.clone()),
                }
            }
        }
    }

    node.set_cached_form(Arc::new(cached));
    Ok(node)
}

/// Resolve an `xsi:type` value against the namespace bindings in scope
fn resolve_type(value: &str, bindings: &[(String, String)]) -> Result<QName> {
    let value = value.trim();
    let (prefix, local) = value.split_once(':').unwrap_or(("", value));
    if local.is_empty() {
        return Err(Error::unmarshalling(format!("invalid xsi:type {value:?}")));
    }
    if prefix == XML_PREFIX {
        return Ok(QName::new(XML_NS, local, Some(XML_PREFIX)));
    }
    let uri = bindings
        .iter()
        .rev()
        .find(|(bound, _)| bound == prefix)
        .map(|(_, uri)| uri.as_str())
        .unwrap_or_default();
    if uri.is_empty() && !prefix.is_empty() {
        return Err(Error::unmarshalling(format!(
            "unbound prefix {prefix:?} in xsi:type {value:?}"
        )));
    }
    let prefix = (!prefix.is_empty()).then_some(prefix);
    Ok(QName::new(uri, local, prefix))
}
