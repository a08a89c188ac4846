//! xmlobject: an XML object tree for SAML documents
//!
//! This crate provides functionality to:
//! - Build trees of typed XML elements with single-parent ownership
//! - Track ID attributes per subtree so `#fragment` references resolve after edits
//! - Unmarshall element trees into object trees and marshall them back, reusing the
//!   cached serialized form of untouched subtrees
//! - Register providers for new element types
//!
//! # Examples
//! ```
//! use xmlobject::types::saml::Response;
//! use xmlobject::Result;
//!
//! fn example() -> Result<()> {
//!     let root = xmlobject::from_str(
//!         r#"<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" ID="r1"/>"#,
//!     )?;
//!     assert!(root.is::<Response>());
//!     assert!(root.resolve_id("r1").is_some());
//!     println!("{}", xmlobject::to_string(&root)?);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

use std::sync::Arc;

use tracing::{debug, error, instrument};

pub mod compare;
pub mod config;
pub mod dom;
pub mod error;
pub mod id_index;
pub mod list;
pub mod marshaller;
pub mod node;
pub mod qname;
pub mod registry;
pub mod types;
pub mod unmarshaller;

// Re-exports
pub use compare::{elements_equivalent, trees_equal};
pub use config::{ParserConfig, WriterConfig};
pub use dom::{Content, Element};
pub use error::{Error, ErrorKind, Result};
pub use id_index::IdIndex;
pub use list::{ChildList, ChildSlot, IndexedChildList, TypedChildList, UnknownChildList};
pub use marshaller::{ContentModel, Marshaller};
pub use node::{ElementType, Handle, NamedElement, Node, NodeRef, XmlObject};
pub use qname::QName;
pub use registry::{Builder, Provider, ProviderRegistry, TypeBuilder};
pub use unmarshaller::Unmarshaller;

/// Parse and unmarshall a document with the global registry
pub fn from_str(s: &str) -> Result<NodeRef> {
    unmarshall(&dom::from_str(s)?)
}

/// Unmarshall an element tree with the global registry
pub fn unmarshall(element: &Element) -> Result<NodeRef> {
    unmarshaller::unmarshall(element, ProviderRegistry::global())
}

/// Marshall a node with the global registry
pub fn marshall(node: &Node) -> Result<Arc<Element>> {
    marshaller::marshall(node, ProviderRegistry::global())
}

/// Marshall a node with the global registry and serialize it on one line
pub fn to_string(node: &Node) -> Result<String> {
    Ok(dom::to_string(&*marshall(node)?))
}

/// Marshall a node with the global registry and serialize it with `config`
pub fn to_string_with_config(node: &Node, config: WriterConfig) -> Result<String> {
    Ok(dom::Writer::new(config).write(&*marshall(node)?))
}

#[instrument]
pub fn parse_file(path: &str) -> Result<NodeRef> {
    debug!("reading {path}");
    let content = std::fs::read_to_string(path).map_err(|e| {
        error!("failed to read file: {e}");
        Error::new(ErrorKind::Io(e.to_string()))
    })?;
    from_str(&content)
}
