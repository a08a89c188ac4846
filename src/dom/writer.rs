//! XML writer with namespace fix-up

use crate::config::WriterConfig;
use crate::dom::model::{Content, Element};
use crate::qname::{QName, XML_NS, XML_PREFIX};

/// Serializes [`Element`] trees.
///
/// Declarations recorded in [`Element::namespaces`] are written unless an identical
/// binding is already in scope; any namespace used by an element or attribute name that is
/// not in scope is declared on the spot.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    config: WriterConfig,
}

impl Writer {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn write(&self, element: &Element) -> String {
        let mut out = String::new();
        if self.config.xml_declaration {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
            if self.config.indent_spaces.is_some() {
                out.push('\n');
            }
        }
        let mut scope = Vec::new();
        self.write_element(element, &mut scope, 0, &mut out);
        out
    }

    fn write_element(
        &self,
        element: &Element,
        scope: &mut Vec<(String, String)>,
        depth: usize,
        out: &mut String,
    ) {
        let frame = scope.len();
        let mut declarations: Vec<(String, String)> = Vec::new();

        for (prefix, uri) in &element.namespaces {
            declare(scope, &mut declarations, prefix, uri);
        }

        let element_name = element_tag(&element.name, scope, &mut declarations);

        let mut attributes = Vec::with_capacity(element.attributes.len());
        for (name, value) in &element.attributes {
            attributes.push((attribute_tag(name, scope, &mut declarations), value));
        }

        out.push('<');
        out.push_str(&element_name);
        for (prefix, uri) in &declarations {
            if prefix.is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                out.push_str(" xmlns:");
                out.push_str(prefix);
                out.push_str("=\"");
            }
            escape_attribute(uri, out);
            out.push('"');
        }
        for (name, value) in attributes {
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }

        if element.children.is_empty() {
            out.push_str("/>");
            scope.truncate(frame);
            return;
        }
        out.push('>');

        // mixed or simple content is written verbatim so no whitespace is introduced
        let has_text = element
            .children
            .iter()
            .any(|content| matches!(content, Content::Text(_)));
        let indent = self.config.indent_spaces.filter(|_| !has_text);

        for content in &element.children {
            match content {
                Content::Text(text) => escape_text(text, out),
                Content::Element(child) => {
                    if let Some(spaces) = indent {
                        out.push('\n');
                        out.push_str(&" ".repeat((depth + 1) * spaces));
                    }
                    self.write_element(child, scope, depth + 1, out);
                }
            }
        }

        if let Some(spaces) = indent {
            out.push('\n');
            out.push_str(&" ".repeat(depth * spaces));
        }
        out.push_str("</");
        out.push_str(&element_name);
        out.push('>');
        scope.truncate(frame);
    }
}

fn lookup<'s>(scope: &'s [(String, String)], prefix: &str) -> Option<&'s str> {
    if prefix == XML_PREFIX {
        return Some(XML_NS);
    }
    scope
        .iter()
        .rev()
        .find(|(bound, _)| bound == prefix)
        .map(|(_, uri)| uri.as_str())
        .filter(|uri| !uri.is_empty())
}

fn declare(
    scope: &mut Vec<(String, String)>,
    declarations: &mut Vec<(String, String)>,
    prefix: &str,
    uri: &str,
) {
    // an empty uri only undeclares a binding that is actually in scope
    if prefix == XML_PREFIX || lookup(scope, prefix) == Some(uri).filter(|u| !u.is_empty()) {
        return;
    }
    if let Some(existing) = declarations.iter_mut().find(|(p, _)| p == prefix) {
        existing.1 = uri.to_string();
    } else {
        declarations.push((prefix.to_string(), uri.to_string()));
    }
    scope.push((prefix.to_string(), uri.to_string()));
}

fn element_tag(
    name: &QName,
    scope: &mut Vec<(String, String)>,
    declarations: &mut Vec<(String, String)>,
) -> String {
    let prefix = name.prefix().unwrap_or_default();
    match name.namespace_uri() {
        Some(uri) => {
            if lookup(scope, prefix) != Some(uri) {
                declare(scope, declarations, prefix, uri);
            }
            qualified(prefix, name.local_name())
        }
        None => {
            if lookup(scope, "").is_some() {
                declare(scope, declarations, "", "");
            }
            name.local_name().to_string()
        }
    }
}

fn attribute_tag(
    name: &QName,
    scope: &mut Vec<(String, String)>,
    declarations: &mut Vec<(String, String)>,
) -> String {
    let Some(uri) = name.namespace_uri() else {
        return name.local_name().to_string();
    };

    let prefix = match name.prefix() {
        Some(prefix) => prefix.to_string(),
        None => {
            let in_scope: &[(String, String)] = scope;
            in_scope
                .iter()
                .rev()
                .find(|(p, u)| !p.is_empty() && u == uri && lookup(in_scope, p) == Some(uri))
                .map(|(p, _)| p.clone())
                .unwrap_or_else(|| generated_prefix(in_scope))
        }
    };
    if lookup(scope, &prefix) != Some(uri) {
        declare(scope, declarations, &prefix, uri);
    }
    qualified(&prefix, name.local_name())
}

fn generated_prefix(scope: &[(String, String)]) -> String {
    let mut n = 0usize;
    loop {
        let candidate = format!("ns{n}");
        if lookup(scope, &candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}
