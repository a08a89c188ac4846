use std::sync::Weak;

use super::{assertion_name, unqualified, write_optional};
use crate::dom::Element;
use crate::error::Result;
use crate::marshaller::{ContentModel, Marshaller};
use crate::node::{ElementType, NamedElement, Node, NodeRef, XmlObject};
use crate::qname::QName;
use crate::registry::{Provider, ProviderRegistry};
use crate::unmarshaller::{process_unknown_attribute, Unmarshaller};

const FORMAT_ATTRIB_NAME: &str = "Format";
const NAME_QUALIFIER_ATTRIB_NAME: &str = "NameQualifier";
const SP_NAME_QUALIFIER_ATTRIB_NAME: &str = "SPNameQualifier";

/// `saml2:Issuer`: the entity that produced a message or assertion
#[derive(Debug, Default)]
pub struct Issuer {
    value: Option<String>,
    format: Option<String>,
    name_qualifier: Option<String>,
    sp_name_qualifier: Option<String>,
}

impl Issuer {
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn set_format(&mut self, format: Option<String>) {
        self.format = format;
    }

    pub fn name_qualifier(&self) -> Option<&str> {
        self.name_qualifier.as_deref()
    }

    pub fn set_name_qualifier(&mut self, qualifier: Option<String>) {
        self.name_qualifier = qualifier;
    }

    pub fn sp_name_qualifier(&self) -> Option<&str> {
        self.sp_name_qualifier.as_deref()
    }

    pub fn set_sp_name_qualifier(&mut self, qualifier: Option<String>) {
        self.sp_name_qualifier = qualifier;
    }
}

impl XmlObject for Issuer {}

impl ElementType for Issuer {
    fn create(_owner: &Weak<Node>) -> Self {
        Self::default()
    }
}

impl NamedElement for Issuer {
    fn default_element_name() -> QName {
        assertion_name("Issuer")
    }
}

#[derive(Debug, Default)]
pub struct IssuerMarshaller;

impl Marshaller for IssuerMarshaller {
    fn content_model(&self, _node: &Node) -> ContentModel {
        ContentModel::Text
    }

    fn marshall_attributes(&self, node: &Node, element: &mut Element) -> Result<()> {
        let issuer = node.body::<Issuer>()?;
        write_optional(element, FORMAT_ATTRIB_NAME, issuer.format());
        write_optional(element, NAME_QUALIFIER_ATTRIB_NAME, issuer.name_qualifier());
        write_optional(element, SP_NAME_QUALIFIER_ATTRIB_NAME, issuer.sp_name_qualifier());
        Ok(())
    }

    fn marshall_element_content(&self, node: &Node, element: &mut Element) -> Result<()> {
        if let Some(value) = node.body::<Issuer>()?.value() {
            element.push_text(value);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct IssuerUnmarshaller;

impl Unmarshaller for IssuerUnmarshaller {
    fn process_attribute(
        &self,
        node: &NodeRef,
        name: &QName,
        value: &str,
        registry: &ProviderRegistry,
    ) -> Result<()> {
        let value_owned = Some(value.to_string());
        match unqualified(name) {
            Some(FORMAT_ATTRIB_NAME) => node.body_mut::<Issuer>()?.format = value_owned,
            Some(NAME_QUALIFIER_ATTRIB_NAME) => {
                node.body_mut::<Issuer>()?.name_qualifier = value_owned;
            }
            Some(SP_NAME_QUALIFIER_ATTRIB_NAME) => {
                node.body_mut::<Issuer>()?.sp_name_qualifier = value_owned;
            }
            _ => process_unknown_attribute(node, name, value, registry)?,
        }
        Ok(())
    }

    fn process_element_content(&self, node: &NodeRef, content: &str) -> Result<()> {
        node.body_mut::<Issuer>()?
            .value
            .get_or_insert_with(String::new)
            .push_str(content);
        Ok(())
    }
}

pub(super) fn provider() -> Provider {
    Provider::of::<Issuer>(IssuerMarshaller, IssuerUnmarshaller)
}
