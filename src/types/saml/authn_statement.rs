use std::sync::Weak;

use time::OffsetDateTime;

use super::{assertion_name, parse_date_time, unqualified, write_date_time, write_optional};
use crate::dom::Element;
use crate::error::Result;
use crate::list::ChildList;
use crate::marshaller::Marshaller;
use crate::node::{ElementType, NamedElement, Node, NodeRef, XmlObject};
use crate::qname::QName;
use crate::registry::{Provider, ProviderRegistry};
use crate::unmarshaller::{process_unknown_attribute, Unmarshaller};

const AUTHN_INSTANT_ATTRIB_NAME: &str = "AuthnInstant";
const SESSION_INDEX_ATTRIB_NAME: &str = "SessionIndex";
const SESSION_NOT_ON_OR_AFTER_ATTRIB_NAME: &str = "SessionNotOnOrAfter";

/// `saml2:AuthnStatement`
///
/// Authentication context and subject locality are kept as generic children.
#[derive(Debug)]
pub struct AuthnStatement {
    authn_instant: Option<OffsetDateTime>,
    session_index: Option<String>,
    session_not_on_or_after: Option<OffsetDateTime>,
    unknown_children: ChildList,
}

impl AuthnStatement {
    pub fn authn_instant(&self) -> Option<OffsetDateTime> {
        self.authn_instant
    }

    pub fn set_authn_instant(&mut self, instant: Option<OffsetDateTime>) {
        self.authn_instant = instant;
    }

    pub fn session_index(&self) -> Option<&str> {
        self.session_index.as_deref()
    }

    pub fn set_session_index(&mut self, index: Option<String>) {
        self.session_index = index;
    }

    pub fn session_not_on_or_after(&self) -> Option<OffsetDateTime> {
        self.session_not_on_or_after
    }

    pub fn set_session_not_on_or_after(&mut self, instant: Option<OffsetDateTime>) {
        self.session_not_on_or_after = instant;
    }

    pub fn unknown_children(&self) -> &ChildList {
        &self.unknown_children
    }

    pub fn unknown_children_mut(&mut self) -> &mut ChildList {
        &mut self.unknown_children
    }
}

impl XmlObject for AuthnStatement {
    fn ordered_children(&self) -> Vec<NodeRef> {
        self.unknown_children.as_slice().to_vec()
    }
}

impl ElementType for AuthnStatement {
    fn create(owner: &Weak<Node>) -> Self {
        Self {
            authn_instant: None,
            session_index: None,
            session_not_on_or_after: None,
            unknown_children: ChildList::new(owner),
        }
    }
}

impl NamedElement for AuthnStatement {
    fn default_element_name() -> QName {
        assertion_name("AuthnStatement")
    }
}

#[derive(Debug, Default)]
pub struct AuthnStatementMarshaller;

impl Marshaller for AuthnStatementMarshaller {
    fn marshall_attributes(&self, node: &Node, element: &mut Element) -> Result<()> {
        let statement = node.body::<AuthnStatement>()?;
        write_date_time(
            element,
            AUTHN_INSTANT_ATTRIB_NAME,
            statement.authn_instant.as_ref(),
        )?;
        write_optional(element, SESSION_INDEX_ATTRIB_NAME, statement.session_index());
        write_date_time(
            element,
            SESSION_NOT_ON_OR_AFTER_ATTRIB_NAME,
            statement.session_not_on_or_after.as_ref(),
        )
    }
}

#[derive(Debug, Default)]
pub struct AuthnStatementUnmarshaller;

impl Unmarshaller for AuthnStatementUnmarshaller {
    fn process_attribute(
        &self,
        node: &NodeRef,
        name: &QName,
        value: &str,
        registry: &ProviderRegistry,
    ) -> Result<()> {
        match unqualified(name) {
            Some(AUTHN_INSTANT_ATTRIB_NAME) => {
                let instant = parse_date_time(name, value)?;
                node.body_mut::<AuthnStatement>()?.authn_instant = Some(instant);
            }
            Some(SESSION_INDEX_ATTRIB_NAME) => {
                node.body_mut::<AuthnStatement>()?.session_index = Some(value.to_string());
            }
            Some(SESSION_NOT_ON_OR_AFTER_ATTRIB_NAME) => {
                let instant = parse_date_time(name, value)?;
                node.body_mut::<AuthnStatement>()?.session_not_on_or_after = Some(instant);
            }
            _ => process_unknown_attribute(node, name, value, registry)?,
        }
        Ok(())
    }

    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        parent
            .body_mut::<AuthnStatement>()?
            .unknown_children
            .push(child)?;
        Ok(())
    }
}

pub(super) fn provider() -> Provider {
    Provider::of::<AuthnStatement>(AuthnStatementMarshaller, AuthnStatementUnmarshaller)
}
