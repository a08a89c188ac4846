use std::sync::Weak;

use time::OffsetDateTime;

use super::{
    assertion_name, parse_date_time, statement_name, unqualified, write_date_time,
    write_optional, AttributeStatement, AuthnStatement, Issuer, ID_ATTRIB_NAME,
    ISSUE_INSTANT_ATTRIB_NAME, SAML_VERSION, VERSION_ATTRIB_NAME,
};
use crate::dom::Element;
use crate::error::Result;
use crate::list::{ChildSlot, IndexedChildList, UnknownChildList};
use crate::marshaller::Marshaller;
use crate::node::{ElementType, Handle, NamedElement, Node, NodeRef, XmlObject};
use crate::qname::QName;
use crate::registry::{Provider, ProviderRegistry};
use crate::unmarshaller::{process_unknown_attribute, Unmarshaller};

/// `saml2:Assertion`
///
/// Statements of every kind share one list in document order; [`Assertion::statements`]
/// can be queried by element name or `xsi:type`.
#[derive(Debug)]
pub struct Assertion {
    version: Option<String>,
    issue_instant: Option<OffsetDateTime>,
    issuer: ChildSlot<Issuer>,
    statements: IndexedChildList,
    unknown_children: UnknownChildList,
}

impl Assertion {
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    pub fn issue_instant(&self) -> Option<OffsetDateTime> {
        self.issue_instant
    }

    pub fn set_issue_instant(&mut self, instant: Option<OffsetDateTime>) {
        self.issue_instant = instant;
    }

    pub fn issuer(&self) -> Option<Handle<Issuer>> {
        self.issuer.get()
    }

    /// Replace the issuer, returning the detached previous one
    pub fn set_issuer(&mut self, issuer: Option<Handle<Issuer>>) -> Result<Option<Handle<Issuer>>> {
        self.issuer.set(issuer)
    }

    pub fn statements(&self) -> &IndexedChildList {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut IndexedChildList {
        &mut self.statements
    }

    pub fn authn_statements(&self) -> Vec<Handle<AuthnStatement>> {
        self.statements
            .get_typed_by_tag(&AuthnStatement::default_element_name())
    }

    pub fn attribute_statements(&self) -> Vec<Handle<AttributeStatement>> {
        self.statements
            .get_typed_by_tag(&AttributeStatement::default_element_name())
    }

    /// Subject, conditions, signature and other children without a typed slot
    pub fn unknown_children(&self) -> &UnknownChildList {
        &self.unknown_children
    }

    pub fn unknown_children_mut(&mut self) -> &mut UnknownChildList {
        &mut self.unknown_children
    }

    fn typed_children(&self) -> Vec<NodeRef> {
        let mut children: Vec<NodeRef> = self.issuer.node().cloned().into_iter().collect();
        children.extend(self.statements.iter().cloned());
        children
    }
}

impl XmlObject for Assertion {
    fn ordered_children(&self) -> Vec<NodeRef> {
        self.unknown_children.interleave(self.typed_children())
    }
}

impl ElementType for Assertion {
    fn create(owner: &Weak<Node>) -> Self {
        Self {
            version: Some(SAML_VERSION.to_string()),
            issue_instant: None,
            issuer: ChildSlot::new(owner),
            statements: IndexedChildList::new(owner),
            unknown_children: UnknownChildList::new(owner),
        }
    }
}

impl NamedElement for Assertion {
    fn default_element_name() -> QName {
        assertion_name("Assertion")
    }
}

/// Where an unmarshalled child of an assertion goes
enum AssertionChild {
    Issuer(Handle<Issuer>),
    Statement(NodeRef),
    Unknown(NodeRef),
}

impl AssertionChild {
    fn classify(child: NodeRef) -> Self {
        let child = if *child.element_qname() == Issuer::default_element_name() {
            match Handle::<Issuer>::downcast(child) {
                Ok(issuer) => return Self::Issuer(issuer),
                Err(child) => child,
            }
        } else {
            child
        };
        if child.is::<AuthnStatement>()
            || child.is::<AttributeStatement>()
            || *child.element_qname() == statement_name()
        {
            Self::Statement(child)
        } else {
            Self::Unknown(child)
        }
    }
}

#[derive(Debug, Default)]
pub struct AssertionMarshaller;

impl Marshaller for AssertionMarshaller {
    fn marshall_attributes(&self, node: &Node, element: &mut Element) -> Result<()> {
        let assertion = node.body::<Assertion>()?;
        write_optional(element, VERSION_ATTRIB_NAME, assertion.version());
        write_date_time(
            element,
            ISSUE_INSTANT_ATTRIB_NAME,
            assertion.issue_instant.as_ref(),
        )
    }
}

#[derive(Debug, Default)]
pub struct AssertionUnmarshaller;

impl Unmarshaller for AssertionUnmarshaller {
    fn process_attribute(
        &self,
        node: &NodeRef,
        name: &QName,
        value: &str,
        registry: &ProviderRegistry,
    ) -> Result<()> {
        match unqualified(name) {
            Some(ID_ATTRIB_NAME) => node.set_id_attribute(name.clone(), Some(value))?,
            Some(VERSION_ATTRIB_NAME) => {
                node.body_mut::<Assertion>()?.version = Some(value.to_string());
            }
            Some(ISSUE_INSTANT_ATTRIB_NAME) => {
                let instant = parse_date_time(name, value)?;
                node.body_mut::<Assertion>()?.issue_instant = Some(instant);
            }
            _ => process_unknown_attribute(node, name, value, registry)?,
        }
        Ok(())
    }

    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        let mut assertion = parent.body_mut::<Assertion>()?;
        match AssertionChild::classify(child) {
            AssertionChild::Issuer(issuer) => {
                assertion.issuer.set(Some(issuer))?;
            }
            AssertionChild::Statement(statement) => {
                assertion.statements.push(statement)?;
            }
            AssertionChild::Unknown(other) => {
                let anchor = assertion.typed_children().pop();
                assertion.unknown_children.push_after(anchor.as_ref(), other)?;
            }
        }
        Ok(())
    }
}

pub(super) fn provider() -> Provider {
    Provider::of::<Assertion>(AssertionMarshaller, AssertionUnmarshaller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;
    use crate::marshaller::marshall;
    use crate::unmarshaller::unmarshall;

    const ASSERTION: &str = "<saml2:Assertion xmlns:saml2=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
        ID=\"a1\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:30:00Z\">\
        <saml2:Issuer>https://idp.example.org</saml2:Issuer>\
        <saml2:Subject><saml2:NameID>alice</saml2:NameID></saml2:Subject>\
        <saml2:AuthnStatement AuthnInstant=\"2024-05-01T12:29:00Z\" SessionIndex=\"s1\"/>\
        <saml2:AttributeStatement><saml2:Attribute Name=\"mail\"/></saml2:AttributeStatement>\
        </saml2:Assertion>";

    #[test]
    fn test_children_are_classified() -> Result<()> {
        let registry = ProviderRegistry::with_defaults();
        let node = unmarshall(&dom::from_str(ASSERTION)?, &registry)?;
        let assertion = node.body::<Assertion>()?;

        assert_eq!(
            assertion.issuer().and_then(|i| i.read().ok().and_then(|i| i.value().map(str::to_string))),
            Some("https://idp.example.org".to_string())
        );
        assert_eq!(assertion.statements().len(), 2);
        assert_eq!(assertion.authn_statements().len(), 1);
        assert_eq!(assertion.attribute_statements().len(), 1);
        assert_eq!(assertion.unknown_children().len(), 1);
        assert!(assertion.issue_instant().is_some());
        Ok(())
    }

    #[test]
    fn test_remarshall_after_change_uses_schema_order() -> Result<()> {
        let registry = ProviderRegistry::with_defaults();
        let node = unmarshall(&dom::from_str(ASSERTION)?, &registry)?;
        node.body_mut::<Assertion>()?.set_version(Some("2.0".to_string()));

        let element = marshall(&node, &registry)?;
        let names: Vec<&str> = element
            .child_elements()
            .map(|child| child.name.local_name())
            .collect();
        assert_eq!(names, ["Issuer", "AuthnStatement", "AttributeStatement", "Subject"]);
        assert!(element.find_by_id("a1").is_some());
        Ok(())
    }

    #[test]
    fn test_new_assertion_defaults() -> Result<()> {
        let assertion = Assertion::build();
        assertion.set_id(Some("_new"))?;
        let element = marshall(&assertion, &ProviderRegistry::with_defaults())?;
        assert_eq!(
            dom::to_string(&element),
            "<saml2:Assertion xmlns:saml2=\"urn:oasis:names:tc:SAML:2.0:assertion\" Version=\"2.0\" ID=\"_new\"/>"
        );
        Ok(())
    }
}
