#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::sync::Arc;

use time::{Date, Month};
use xmlobject::types::any::AnyElement;
use xmlobject::types::saml::{Assertion, AttributeStatement, Response};
use xmlobject::{
    dom, elements_equivalent, marshaller, trees_equal, unmarshaller, Element, ErrorKind,
    NamedElement, NodeRef, ProviderRegistry, QName, WriterConfig,
};

const SAML: &str = "xmlns:saml2=\"urn:oasis:names:tc:SAML:2.0:assertion\"";
const SAMLP: &str = "xmlns:saml2p=\"urn:oasis:names:tc:SAML:2.0:protocol\"";

fn unmarshall(input: &str, registry: &ProviderRegistry) -> (Element, NodeRef) {
    let element = dom::from_str(input).unwrap();
    let node = unmarshaller::unmarshall(&element, registry).unwrap();
    (element, node)
}

/// Marshall from the object tree alone, ignoring every cached form
fn rebuild(node: &NodeRef, registry: &ProviderRegistry) -> Arc<Element> {
    node.release_cached_form(false);
    node.release_children_cached_form(true);
    marshaller::marshall(node, registry).unwrap()
}

fn child_names(element: &Element) -> Vec<&str> {
    element
        .child_elements()
        .map(|child| child.name.local_name())
        .collect()
}

#[test]
fn test_leaf_with_attributes_only() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2:AuthnStatement {SAML} AuthnInstant=\"2024-05-01T12:29:00Z\" \
         SessionIndex=\"s1\" SessionNotOnOrAfter=\"2024-05-01T20:00:00Z\"/>"
    );
    let (element, node) = unmarshall(&input, &registry);

    let rebuilt = rebuild(&node, &registry);
    assert!(elements_equivalent(&element, &rebuilt));
    assert_eq!(dom::to_string(&rebuilt), input);
}

#[test]
fn test_one_typed_list() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2:AttributeStatement {SAML}>\
         <saml2:Attribute Name=\"mail\" NameFormat=\"urn:oasis:names:tc:SAML:2.0:attrname-format:basic\">\
         <saml2:AttributeValue xmlns:xs=\"http://www.w3.org/2001/XMLSchema\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:type=\"xs:string\">a@example.org</saml2:AttributeValue>\
         </saml2:Attribute>\
         <saml2:Attribute Name=\"role\" FriendlyName=\"Role\">\
         <saml2:AttributeValue>admin</saml2:AttributeValue>\
         <saml2:AttributeValue>user</saml2:AttributeValue>\
         </saml2:Attribute>\
         </saml2:AttributeStatement>"
    );
    let (element, node) = unmarshall(&input, &registry);
    {
        let statement = node.body::<AttributeStatement>().unwrap();
        assert_eq!(statement.attributes().len(), 2);
        let role = statement.attributes().get(1).unwrap();
        assert_eq!(role.read().unwrap().friendly_name(), Some("Role"));
        assert_eq!(role.read().unwrap().attribute_values().len(), 2);
        let value = statement.attributes().get(0).unwrap().read().unwrap().attribute_values()
            .get(0)
            .cloned()
            .unwrap();
        assert_eq!(value.schema_type().map(|t| t.local_name()), Some("string"));
        assert_eq!(
            value.body::<AnyElement>().unwrap().text_content(),
            Some("a@example.org")
        );
    }

    let rebuilt = rebuild(&node, &registry);
    assert!(elements_equivalent(&element, &rebuilt));
}

#[test]
fn test_two_typed_collections_in_schema_order() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2p:Response {SAMLP} {SAML} ID=\"r1\" Version=\"2.0\" \
         IssueInstant=\"2024-05-01T12:30:00Z\" Destination=\"https://sp.example.org/acs\">\
         <saml2:Issuer>https://idp.example.org</saml2:Issuer>\
         <saml2:Assertion ID=\"a1\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:30:00Z\">\
         <saml2:Issuer>https://idp.example.org</saml2:Issuer>\
         <saml2:AuthnStatement AuthnInstant=\"2024-05-01T12:29:00Z\" SessionIndex=\"s1\"/>\
         </saml2:Assertion>\
         <saml2:Assertion ID=\"a2\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:30:00Z\"/>\
         </saml2p:Response>"
    );
    let (element, node) = unmarshall(&input, &registry);
    {
        let response = node.body::<Response>().unwrap();
        assert!(response.issuer().is_some());
        assert_eq!(response.assertions().len(), 2);
        assert_eq!(response.destination(), Some("https://sp.example.org/acs"));
    }
    assert_eq!(node.id_index().len(), 2 + 1);

    let rebuilt = rebuild(&node, &registry);
    assert!(elements_equivalent(&element, &rebuilt));
    assert!(rebuilt.find_by_id("a2").is_some());

    let (_, reread) = unmarshall(&dom::to_string(&rebuilt), &registry);
    assert!(trees_equal(&node, &reread));
}

#[test]
fn test_unknown_children_interspersed() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2p:Response {SAMLP} {SAML} ID=\"r1\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:30:00Z\">\
         <saml2:Issuer>https://idp.example.org</saml2:Issuer>\
         <saml2p:Status><saml2p:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/></saml2p:Status>\
         <saml2:Assertion ID=\"a1\" Version=\"2.0\"/>\
         </saml2p:Response>"
    );
    let (element, node) = unmarshall(&input, &registry);
    assert_eq!(node.body::<Response>().unwrap().unknown_children().len(), 1);

    // untouched trees reproduce the input order from the cached form
    let marshalled = marshaller::marshall(&node, &registry).unwrap();
    assert_eq!(dom::to_string(&marshalled), input);
    assert_eq!(child_names(&marshalled), ["Issuer", "Status", "Assertion"]);

    let rebuilt = rebuild(&node, &registry);
    assert_eq!(child_names(&rebuilt), ["Issuer", "Status", "Assertion"]);
    let status = rebuilt.child_elements().nth(1).unwrap();
    let original_status = element.child_elements().nth(1).unwrap();
    assert!(elements_equivalent(status, original_status));
    assert!(elements_equivalent(&element, &rebuilt));
}

#[test]
fn test_unknown_children_keep_place_after_parent_change() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2p:Response {SAMLP} {SAML} ID=\"r1\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:30:00Z\">\
         <saml2:Issuer>https://idp.example.org</saml2:Issuer>\
         <saml2p:Status><saml2p:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/></saml2p:Status>\
         <saml2:Assertion ID=\"a1\" Version=\"2.0\"/>\
         </saml2p:Response>"
    );
    let (_, node) = unmarshall(&input, &registry);
    node.body_mut::<Response>()
        .unwrap()
        .set_destination(Some("https://sp.example.org/acs".to_string()));

    // untouched children still serialize from what was read
    assert!(node.resolve_id("a1").unwrap().has_cached_form());
    let marshalled = marshaller::marshall(&node, &registry).unwrap();
    assert_eq!(child_names(&marshalled), ["Issuer", "Status", "Assertion"]);
    assert_eq!(
        marshalled.attribute(&QName::local("Destination")),
        Some("https://sp.example.org/acs")
    );
}

#[test]
fn test_signature_stays_between_issuer_and_subject() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2p:Response {SAMLP} {SAML} ID=\"r1\" Version=\"2.0\">\
         <saml2:Assertion ID=\"a1\" Version=\"2.0\">\
         <saml2:Issuer>https://idp.example.org</saml2:Issuer>\
         <ds:Signature xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\"><ds:SignatureValue>c2ln</ds:SignatureValue></ds:Signature>\
         <saml2:Subject><saml2:NameID>alice</saml2:NameID></saml2:Subject>\
         <saml2:AuthnStatement AuthnInstant=\"2024-05-01T12:29:00Z\"/>\
         </saml2:Assertion>\
         </saml2p:Response>"
    );
    let (element, node) = unmarshall(&input, &registry);
    node.body_mut::<Response>()
        .unwrap()
        .set_consent(Some("urn:oasis:names:tc:SAML:2.0:consent:obtained".to_string()));

    let assertion = node.resolve_id("a1").unwrap();
    assert!(assertion.has_cached_form());
    let signed = marshaller::marshall(&assertion, &registry).unwrap();
    assert_eq!(
        child_names(&signed),
        ["Issuer", "Signature", "Subject", "AuthnStatement"]
    );
    let original = element.child_elements().next().unwrap();
    assert!(elements_equivalent(&signed, original));

    let rebuilt = rebuild(&assertion, &registry);
    assert_eq!(
        child_names(&rebuilt),
        ["Issuer", "Signature", "Subject", "AuthnStatement"]
    );
}

#[test]
fn test_namespace_declarations_survive_remarshalling() {
    let registry = ProviderRegistry::with_defaults();
    let input = format!(
        "<saml2p:Response {SAMLP} xmlns:xs=\"http://www.w3.org/2001/XMLSchema\" ID=\"r1\" Version=\"2.0\">\
         <ext:Note xmlns:ext=\"urn:ext\">xs:string</ext:Note>\
         </saml2p:Response>"
    );
    let (_, node) = unmarshall(&input, &registry);
    assert!(node
        .namespace_declarations()
        .contains(&("xs".to_string(), "http://www.w3.org/2001/XMLSchema".to_string())));
    node.body_mut::<Response>()
        .unwrap()
        .set_consent(Some("urn:oasis:names:tc:SAML:2.0:consent:obtained".to_string()));

    let output = dom::to_string(&marshaller::marshall(&node, &registry).unwrap());
    assert!(output.contains("xmlns:xs=\"http://www.w3.org/2001/XMLSchema\""));
    assert!(output.contains("<ext:Note xmlns:ext=\"urn:ext\">xs:string</ext:Note>"));

    let rebuilt = dom::to_string(&rebuild(&node, &registry));
    assert!(rebuilt.contains("xmlns:xs=\"http://www.w3.org/2001/XMLSchema\""));
}

#[test]
fn test_global_registry_string_roundtrip() {
    let input = format!("<saml2p:Response {SAMLP} ID=\"r9\" Version=\"2.0\"/>");
    let node = xmlobject::from_str(&input).unwrap();
    assert!(node.is::<Response>());
    assert_eq!(xmlobject::to_string(&node).unwrap(), input);
    let pretty = xmlobject::to_string_with_config(&node, WriterConfig::pretty()).unwrap();
    assert_eq!(pretty, format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{input}"));
}

#[test]
fn test_malformed_issue_instant_fails_unmarshalling() {
    let input = format!("<saml2:Assertion {SAML} ID=\"a1\" IssueInstant=\"not-a-date\"/>");
    let err = xmlobject::from_str(&input).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Unmarshalling);
}

#[test]
fn test_unformattable_issue_instant_fails_marshalling() {
    let registry = ProviderRegistry::with_defaults();
    let response = Response::build();
    let assertion = Assertion::build();
    let instant = Date::from_calendar_date(-1, Month::January, 1)
        .unwrap()
        .midnight()
        .assume_utc();
    assertion.write().unwrap().set_issue_instant(Some(instant));
    response
        .write()
        .unwrap()
        .assertions_mut()
        .push(assertion.clone())
        .unwrap();

    let err = marshaller::marshall(&response, &registry).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Marshalling);
    assert!(!assertion.has_cached_form());
    assert!(!response.has_cached_form());
}

#[test]
fn test_unknown_root_element() {
    let err = xmlobject::from_str("<Envelope xmlns=\"urn:other\"/>").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownElement { .. }));
}
