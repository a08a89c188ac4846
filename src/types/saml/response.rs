use std::sync::Weak;

use time::OffsetDateTime;

use super::{
    parse_date_time, protocol_name, unqualified, write_date_time, write_optional, Assertion,
    Issuer, ID_ATTRIB_NAME, ISSUE_INSTANT_ATTRIB_NAME, SAML_VERSION, VERSION_ATTRIB_NAME,
};
use crate::dom::Element;
use crate::error::Result;
use crate::list::{ChildSlot, TypedChildList, UnknownChildList};
use crate::marshaller::Marshaller;
use crate::node::{ElementType, Handle, NamedElement, Node, NodeRef, XmlObject};
use crate::qname::QName;
use crate::registry::{Provider, ProviderRegistry};
use crate::unmarshaller::{process_unknown_attribute, Unmarshaller};

const IN_RESPONSE_TO_ATTRIB_NAME: &str = "InResponseTo";
const DESTINATION_ATTRIB_NAME: &str = "Destination";
const CONSENT_ATTRIB_NAME: &str = "Consent";

/// `saml2p:Response`
#[derive(Debug)]
pub struct Response {
    version: Option<String>,
    issue_instant: Option<OffsetDateTime>,
    in_response_to: Option<String>,
    destination: Option<String>,
    consent: Option<String>,
    issuer: ChildSlot<Issuer>,
    assertions: TypedChildList<Assertion>,
    unknown_children: UnknownChildList,
}

impl Response {
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

    pub fn in_response_to(&self) -> Option<&str> {
        self.in_response_to.as_deref()
    }

    pub fn set_in_response_to(&mut self, id: Option<String>) {
        self.in_response_to = id;
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn set_destination(&mut self, destination: Option<String>) {
        self.destination = destination;
    }

    pub fn consent(&self) -> Option<&str> {
        self.consent.as_deref()
    }

    pub fn set_consent(&mut self, consent: Option<String>) {
        self.consent = consent;
    }

    pub fn issuer(&self) -> Option<Handle<Issuer>> {
        self.issuer.get()
    }

    pub fn set_issuer(&mut self, issuer: Option<Handle<Issuer>>) -> Result<Option<Handle<Issuer>>> {
        self.issuer.set(issuer)
    }

    pub fn assertions(&self) -> &TypedChildList<Assertion> {
        &self.assertions
    }

    pub fn assertions_mut(&mut self) -> &mut TypedChildList<Assertion> {
        &mut self.assertions
    }

    /// Status, extensions, encrypted assertions and other children without a typed slot
    pub fn unknown_children(&self) -> &UnknownChildList {
        &self.unknown_children
    }

    pub fn unknown_children_mut(&mut self) -> &mut UnknownChildList {
        &mut self.unknown_children
    }

    fn typed_children(&self) -> Vec<NodeRef> {
        let mut children: Vec<NodeRef> = self.issuer.node().cloned().into_iter().collect();
        children.extend(self.assertions.nodes().iter().cloned());
        children
    }
}

impl XmlObject for Response {
    fn ordered_children(&self) -> Vec<NodeRef> {
        self.unknown_children.interleave(self.typed_children())
    }
}

impl ElementType for Response {
    fn create(owner: &Weak<Node>) -> Self {
        Self {
            version: Some(SAML_VERSION.to_string()),
            issue_instant: None,
            in_response_to: None,
            destination: None,
            consent: None,
            issuer: ChildSlot::new(owner),
            assertions: TypedChildList::new(owner),
            unknown_children: UnknownChildList::new(owner),
        }
    }
}

impl NamedElement for Response {
    fn default_element_name() -> QName {
        protocol_name("Response")
    }
}

enum ResponseChild {
    Issuer(Handle<Issuer>),
    Assertion(Handle<Assertion>),
    Unknown(NodeRef),
}

impl ResponseChild {
    fn classify(child: NodeRef) -> Self {
        let child = match Handle::<Assertion>::downcast(child) {
            Ok(assertion) => return Self::Assertion(assertion),
            Err(child) => child,
        };
        if *child.element_qname() != Issuer::default_element_name() {
            return Self::Unknown(child);
        }
        match Handle::<Issuer>::downcast(child) {
            Ok(issuer) => Self::Issuer(issuer),
            Err(child) => Self::Unknown(child),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResponseMarshaller;

impl Marshaller for ResponseMarshaller {
    fn marshall_attributes(&self, node: &Node, element: &mut Element) -> Result<()> {
        let response = node.body::<Response>()?;
        write_optional(element, VERSION_ATTRIB_NAME, response.version());
        write_date_time(
            element,
            ISSUE_INSTANT_ATTRIB_NAME,
            response.issue_instant.as_ref(),
        )?;
        write_optional(element, IN_RESPONSE_TO_ATTRIB_NAME, response.in_response_to());
        write_optional(element, DESTINATION_ATTRIB_NAME, response.destination());
        write_optional(element, CONSENT_ATTRIB_NAME, response.consent());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ResponseUnmarshaller;

impl Unmarshaller for ResponseUnmarshaller {
    fn process_attribute(
        &self,
        node: &NodeRef,
        name: &QName,
        value: &str,
        registry: &ProviderRegistry,
    ) -> Result<()> {
        let value_owned = Some(value.to_string());
        match unqualified(name) {
            Some(ID_ATTRIB_NAME) => node.set_id_attribute(name.clone(), Some(value))?,
            Some(VERSION_ATTRIB_NAME) => node.body_mut::<Response>()?.version = value_owned,
            Some(ISSUE_INSTANT_ATTRIB_NAME) => {
                let instant = parse_date_time(name, value)?;
                node.body_mut::<Response>()?.issue_instant = Some(instant);
            }
            Some(IN_RESPONSE_TO_ATTRIB_NAME) => {
                node.body_mut::<Response>()?.in_response_to = value_owned;
            }
            Some(DESTINATION_ATTRIB_NAME) => {
                node.body_mut::<Response>()?.destination = value_owned;
            }
            Some(CONSENT_ATTRIB_NAME) => node.body_mut::<Response>()?.consent = value_owned,
            _ => process_unknown_attribute(node, name, value, registry)?,
        }
        Ok(())
    }

    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        let mut response = parent.body_mut::<Response>()?;
        match ResponseChild::classify(child) {
            ResponseChild::Issuer(issuer) => {
                response.issuer.set(Some(issuer))?;
            }
            ResponseChild::Assertion(assertion) => {
                response.assertions.push(assertion)?;
            }
            ResponseChild::Unknown(other) => {
                let anchor = response.typed_children().pop();
                response.unknown_children.push_after(anchor.as_ref(), other)?;
            }
        }
        Ok(())
    }
}

pub(super) fn provider() -> Provider {
    Provider::of::<Response>(ResponseMarshaller, ResponseUnmarshaller)
}
