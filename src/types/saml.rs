//! SAML 2.0 assertion and protocol element types

mod assertion;
mod attribute;
mod authn_statement;
mod issuer;
mod response;

pub use assertion::{Assertion, AssertionMarshaller, AssertionUnmarshaller};
pub use attribute::{
    Attribute, AttributeMarshaller, AttributeStatement, AttributeStatementMarshaller,
    AttributeStatementUnmarshaller, AttributeUnmarshaller,
};
pub use authn_statement::{AuthnStatement, AuthnStatementMarshaller, AuthnStatementUnmarshaller};
pub use issuer::{Issuer, IssuerMarshaller, IssuerUnmarshaller};
pub use response::{Response, ResponseMarshaller, ResponseUnmarshaller};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::node::{Handle, NamedElement, XmlObject};
use crate::qname::{QName, SAML20P_NS, SAML20P_PREFIX, SAML20_NS, SAML20_PREFIX};
use crate::registry::ProviderRegistry;

pub const ID_ATTRIB_NAME: &str = "ID";
pub const VERSION_ATTRIB_NAME: &str = "Version";
pub const ISSUE_INSTANT_ATTRIB_NAME: &str = "IssueInstant";

/// SAML version written by newly built assertions and responses
pub const SAML_VERSION: &str = "2.0";

pub fn assertion_name(local: &str) -> QName {
    QName::new(SAML20_NS, local, Some(SAML20_PREFIX))
}

pub fn protocol_name(local: &str) -> QName {
    QName::new(SAML20P_NS, local, Some(SAML20P_PREFIX))
}

/// The abstract `saml2:Statement` element, used with `xsi:type` for custom statements
pub fn statement_name() -> QName {
    assertion_name("Statement")
}

/// Element types carrying a schema `ID` attribute
pub trait Identified: XmlObject {}

impl Identified for Assertion {}
impl Identified for Response {}

impl<T: Identified> Handle<T> {
    pub fn id(&self) -> Option<String> {
        self.attribute(&QName::local(ID_ATTRIB_NAME))
    }

    /// Set the `ID`, registering it in the ID index of this node and its ancestors
    pub fn set_id(&self, id: Option<&str>) -> Result<()> {
        self.set_id_attribute(QName::local(ID_ATTRIB_NAME), id)
    }
}

/// Local name of an attribute in no namespace
fn unqualified(name: &QName) -> Option<&str> {
    name.namespace_uri().is_none().then(|| name.local_name())
}

fn parse_date_time(name: &QName, value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|e| {
        Error::unmarshalling(format!("invalid {name} value {value:?}: {e}"))
    })
}

fn write_date_time(element: &mut Element, local: &str, value: Option<&OffsetDateTime>) -> Result<()> {
    if let Some(value) = value {
        let formatted = value
            .format(&Rfc3339)
            .map_err(|e| Error::marshalling(format!("cannot format {local}: {e}")))?;
        element.set_attribute(QName::local(local), formatted);
    }
    Ok(())
}

fn write_optional(element: &mut Element, local: &str, value: Option<&str>) {
    if let Some(value) = value {
        element.set_attribute(QName::local(local), value);
    }
}

/// Register every SAML type under its element name and its schema type name
pub fn register(registry: &ProviderRegistry) {
    let providers = [
        (Issuer::default_element_name(), "NameIDType", issuer::provider()),
        (
            AuthnStatement::default_element_name(),
            "AuthnStatementType",
            authn_statement::provider(),
        ),
        (
            Attribute::default_element_name(),
            "AttributeType",
            attribute::attribute_provider(),
        ),
        (
            AttributeStatement::default_element_name(),
            "AttributeStatementType",
            attribute::statement_provider(),
        ),
        (
            Assertion::default_element_name(),
            "AssertionType",
            assertion::provider(),
        ),
    ];
    for (element_name, type_name, provider) in providers {
        registry.register(assertion_name(type_name), provider.clone());
        registry.register(element_name, provider);
    }
    registry.register(protocol_name("ResponseType"), response::provider());
    registry.register(Response::default_element_name(), response::provider());
}
