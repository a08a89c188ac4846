use std::sync::Weak;

use super::{assertion_name, unqualified, write_optional};
use crate::dom::Element;
use crate::error::Result;
use crate::list::{ChildList, TypedChildList, UnknownChildList};
use crate::marshaller::Marshaller;
use crate::node::{ElementType, Handle, NamedElement, Node, NodeRef, XmlObject};
use crate::qname::QName;
use crate::registry::{Provider, ProviderRegistry};
use crate::unmarshaller::{process_unknown_attribute, Unmarshaller};

const NAME_ATTRIB_NAME: &str = "Name";
const NAME_FORMAT_ATTRIB_NAME: &str = "NameFormat";
const FRIENDLY_NAME_ATTRIB_NAME: &str = "FriendlyName";

/// `saml2:Attribute` with its `AttributeValue` children
#[derive(Debug)]
pub struct Attribute {
    name: Option<String>,
    name_format: Option<String>,
    friendly_name: Option<String>,
    attribute_values: ChildList,
}

impl Attribute {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn name_format(&self) -> Option<&str> {
        self.name_format.as_deref()
    }

    pub fn set_name_format(&mut self, format: Option<String>) {
        self.name_format = format;
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    pub fn set_friendly_name(&mut self, name: Option<String>) {
        self.friendly_name = name;
    }

    /// Values of any element type, usually `saml2:AttributeValue`
    pub fn attribute_values(&self) -> &ChildList {
        &self.attribute_values
    }

    pub fn attribute_values_mut(&mut self) -> &mut ChildList {
        &mut self.attribute_values
    }
}

impl XmlObject for Attribute {
    fn ordered_children(&self) -> Vec<NodeRef> {
        self.attribute_values.as_slice().to_vec()
    }
}

impl ElementType for Attribute {
    fn create(owner: &Weak<Node>) -> Self {
        Self {
            name: None,
            name_format: None,
            friendly_name: None,
            attribute_values: ChildList::new(owner),
        }
    }
}

impl NamedElement for Attribute {
    fn default_element_name() -> QName {
        assertion_name("Attribute")
    }
}

#[derive(Debug, Default)]
pub struct AttributeMarshaller;

impl Marshaller for AttributeMarshaller {
    fn marshall_attributes(&self, node: &Node, element: &mut Element) -> Result<()> {
        let attribute = node.body::<Attribute>()?;
        write_optional(element, NAME_ATTRIB_NAME, attribute.name());
        write_optional(element, NAME_FORMAT_ATTRIB_NAME, attribute.name_format());
        write_optional(element, FRIENDLY_NAME_ATTRIB_NAME, attribute.friendly_name());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AttributeUnmarshaller;

impl Unmarshaller for AttributeUnmarshaller {
    fn process_attribute(
        &self,
        node: &NodeRef,
        name: &QName,
        value: &str,
        registry: &ProviderRegistry,
    ) -> Result<()> {
        let value_owned = Some(value.to_string());
        match unqualified(name) {
            Some(NAME_ATTRIB_NAME) => node.body_mut::<Attribute>()?.name = value_owned,
            Some(NAME_FORMAT_ATTRIB_NAME) => {
                node.body_mut::<Attribute>()?.name_format = value_owned;
            }
            Some(FRIENDLY_NAME_ATTRIB_NAME) => {
                node.body_mut::<Attribute>()?.friendly_name = value_owned;
            }
            _ => process_unknown_attribute(node, name, value, registry)?,
        }
        Ok(())
    }

    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        parent
            .body_mut::<Attribute>()?
            .attribute_values
            .push(child)?;
        Ok(())
    }
}

/// `saml2:AttributeStatement`
#[derive(Debug)]
pub struct AttributeStatement {
    attributes: TypedChildList<Attribute>,
    unknown_children: UnknownChildList,
}

impl AttributeStatement {
    pub fn attributes(&self) -> &TypedChildList<Attribute> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut TypedChildList<Attribute> {
        &mut self.attributes
    }

    /// Encrypted attributes and other children without a typed slot
    pub fn unknown_children(&self) -> &UnknownChildList {
        &self.unknown_children
    }

    pub fn unknown_children_mut(&mut self) -> &mut UnknownChildList {
        &mut self.unknown_children
    }
}

impl XmlObject for AttributeStatement {
    fn ordered_children(&self) -> Vec<NodeRef> {
        self.unknown_children
            .interleave(self.attributes.nodes().to_vec())
    }
}

impl ElementType for AttributeStatement {
    fn create(owner: &Weak<Node>) -> Self {
        Self {
            attributes: TypedChildList::new(owner),
            unknown_children: UnknownChildList::new(owner),
        }
    }
}

impl NamedElement for AttributeStatement {
    fn default_element_name() -> QName {
        assertion_name("AttributeStatement")
    }
}

#[derive(Debug, Default)]
pub struct AttributeStatementMarshaller;

impl Marshaller for AttributeStatementMarshaller {}

#[derive(Debug, Default)]
pub struct AttributeStatementUnmarshaller;

impl Unmarshaller for AttributeStatementUnmarshaller {
    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        let mut statement = parent.body_mut::<AttributeStatement>()?;
        match Handle::<Attribute>::downcast(child) {
            Ok(attribute) => statement.attributes.push(attribute)?,
            Err(other) => {
                let anchor = statement.attributes.nodes().last().cloned();
                statement.unknown_children.push_after(anchor.as_ref(), other)?
            }
        };
        Ok(())
    }
}

pub(super) fn attribute_provider() -> Provider {
    Provider::of::<Attribute>(AttributeMarshaller, AttributeUnmarshaller)
}

pub(super) fn statement_provider() -> Provider {
    Provider::of::<AttributeStatement>(
        AttributeStatementMarshaller,
        AttributeStatementUnmarshaller,
    )
}
