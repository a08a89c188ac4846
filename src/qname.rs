//! Qualified names and well-known namespaces

use std::fmt;
use std::hash::{Hash, Hasher};

/// XML namespace
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XML_PREFIX: &str = "xml";

/// XMLNS namespace
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
pub const XMLNS_PREFIX: &str = "xmlns";

/// XML Schema instance namespace
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XSI_PREFIX: &str = "xsi";

/// SAML 2.0 assertion namespace
pub const SAML20_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
pub const SAML20_PREFIX: &str = "saml2";

/// SAML 2.0 protocol namespace
pub const SAML20P_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
pub const SAML20P_PREFIX: &str = "saml2p";

/// A namespace-qualified name.
///
/// Equality and hashing consider only the namespace URI and local name; the prefix is a
/// serialization preference.
#[derive(Clone, Debug, Default)]
pub struct QName {
    namespace_uri: Option<String>,
    local_name: String,
    prefix: Option<String>,
}

impl QName {
    pub fn new(namespace_uri: &str, local_name: &str, prefix: Option<&str>) -> Self {
        Self {
            namespace_uri: (!namespace_uri.is_empty()).then(|| namespace_uri.to_string()),
            local_name: local_name.to_string(),
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    /// Name in no namespace, as used by most SAML attributes
    pub fn local(local_name: &str) -> Self {
        Self::new("", local_name, None)
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }

    /// `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn xsi_type() -> Self {
        Self::new(XSI_NS, "type", Some(XSI_PREFIX))
    }

    pub fn xml_id() -> Self {
        Self::new(XML_NS, "id", Some(XML_PREFIX))
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace_uri.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace_uri {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}
