//! Namespace-aware XML reader

use crate::config::ParserConfig;
use crate::dom::cursor::Cursor;
use crate::dom::model::Element;
use crate::error::{Error, ErrorKind, Pos, Result};
use crate::qname::{QName, XMLNS_PREFIX, XML_NS, XML_PREFIX};

/// Attribute as written, before prefix resolution
#[derive(Debug)]
struct RawAttribute {
    name: String,
    value: String,
    pos: Pos,
}

/// XML reader producing [`Element`] trees
#[derive(Debug)]
pub struct Reader<'a> {
    cursor: Cursor<'a>,
    config: ParserConfig,
    /// In-scope namespace bindings, innermost last
    bindings: Vec<(String, String)>,
}

impl<'a> Reader<'a> {
    /// Create a new reader with default limits
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, ParserConfig::default())
    }

    pub fn with_config(input: &'a [u8], config: ParserConfig) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            bindings: Vec::new(),
        }
    }

    /// Parse a document and return its root element
    pub fn parse(&mut self) -> Result<Element> {
        self.config.validate_size(self.cursor.remaining().len())?;
        self.skip_misc()?;
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here("expected root element"));
        }

        let root = self.parse_element(1)?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here("content after root element"));
        }
        Ok(root)
    }

    /// Skip whitespace, comments, processing instructions and doctype outside the root
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                if !self.config.allow_doctype {
                    return Err(Error::at(
                        ErrorKind::DoctypeNotAllowed,
                        self.cursor.position(),
                        ErrorKind::DoctypeNotAllowed.to_string(),
                    ));
                }
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self, depth: usize) -> Result<Element> {
        let start = self.cursor.position();
        self.config.validate_depth(depth, start)?;
        self.expect_byte(b'<')?;

        let raw_name = self.parse_name()?;
        let raw_attributes = self.parse_attributes()?;
        self.config
            .validate_attributes(raw_attributes.len(), start)?;

        let frame = self.bindings.len();
        let mut element = Element::new(QName::default());
        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for attr in raw_attributes {
            if attr.name == XMLNS_PREFIX {
                element.declare_namespace("", &attr.value);
                self.bindings.push((String::new(), attr.value));
            } else if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                element.declare_namespace(prefix, &attr.value);
                self.bindings.push((prefix.to_string(), attr.value));
            } else {
                attributes.push(attr);
            }
        }

        let result = self.parse_element_body(element, &raw_name, attributes, depth, start);
        self.bindings.truncate(frame);
        result
    }

    fn parse_element_body(
        &mut self,
        mut element: Element,
        raw_name: &str,
        attributes: Vec<RawAttribute>,
        depth: usize,
        start: Pos,
    ) -> Result<Element> {
        element.name = self.resolve_name(raw_name, true, start)?;
        for attr in attributes {
            let name = self.resolve_name(&attr.name, false, attr.pos)?;
            if element.attributes.contains_key(&name) {
                return Err(Error::at(ErrorKind::Syntax, attr.pos, "duplicate attribute"));
            }
            element.attributes.insert(name, attr.value);
        }

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(element);
        }
        self.expect_byte(b'>')?;

        let mut text = String::new();
        loop {
            if self.cursor.starts_with(b"</") {
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != raw_name {
                    return Err(self.error_here("mismatched closing tag"));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
                continue;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                self.cursor.advance_by(9);
                let raw = self.read_until(b"]]>")?;
                text.push_str(&bytes_to_string(raw, self.cursor.position())?);
                continue;
            }

            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
                continue;
            }

            if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("unexpected markup declaration"));
            }

            if self.cursor.current() == Some(b'<') {
                flush_text(&mut element, &mut text);
                let child = self.parse_element(depth + 1)?;
                element.push_element(child);
                continue;
            }

            if self.cursor.is_eof() {
                return Err(self.error_here("unterminated element"));
            }

            text.push_str(&self.parse_text()?);
        }

        flush_text(&mut element, &mut text);
        Ok(element)
    }

    fn parse_attributes(&mut self) -> Result<Vec<RawAttribute>> {
        let mut attrs: Vec<RawAttribute> = Vec::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input")),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.iter().any(|attr| attr.name == name) {
                return Err(Error::at(ErrorKind::Syntax, pos, "duplicate attribute"));
            }
            attrs.push(RawAttribute { name, value, pos });
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw, pos)?;
                return decode_entities(&text, pos);
            }
            if b == b'<' {
                return Err(self.error_here("'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here("unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let text = bytes_to_string(self.cursor.slice_from(start), pos)?;
        decode_entities(&text, pos)
    }

    fn parse_name(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            _ => return Err(Error::at(ErrorKind::Syntax, pos, "expected name")),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), pos)
    }

    fn resolve_name(&self, raw: &str, is_element: bool, pos: Pos) -> Result<QName> {
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, raw),
        };
        if local.is_empty() || local.contains(':') || prefix == Some("") {
            return Err(Error::at(ErrorKind::Syntax, pos, "malformed qualified name"));
        }

        match prefix {
            Some(prefix) => match self.lookup(prefix) {
                Some(uri) => Ok(QName::new(uri, local, Some(prefix))),
                None => {
                    let kind = ErrorKind::UnboundPrefix {
                        prefix: prefix.to_string(),
                    };
                    let message = kind.to_string();
                    Err(Error::at(kind, pos, message))
                }
            },
            // unprefixed attributes are never in the default namespace
            None if is_element => Ok(QName::new(self.lookup("").unwrap_or_default(), local, None)),
            None => Ok(QName::local(local)),
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NS);
        }
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let mut subset_depth = 0usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => subset_depth += 1,
                b']' => subset_depth = subset_depth.saturating_sub(1),
                b'>' if subset_depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here("unterminated doctype"))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.read_until(pattern).map(|_| ())
    }

    fn read_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here("unexpected token"))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        Error::at(ErrorKind::Syntax, self.cursor.position(), message)
    }
}

fn flush_text(element: &mut Element, text: &mut String) {
    if !text.trim().is_empty() {
        element.push_text(std::mem::take(text));
    }
    text.clear();
}

fn bytes_to_string(bytes: &[u8], pos: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::at(ErrorKind::Syntax, pos, "invalid utf-8"))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        let mut entity = String::new();
        let mut terminated = false;
        for next in chars.by_ref() {
            if next == ';' {
                terminated = true;
                break;
            }
            entity.push(next);
        }

        let decoded = match entity.as_str() {
            _ if !terminated => None,
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(&entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => return Err(Error::at(ErrorKind::Syntax, pos, "invalid xml entity")),
        }
    }

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
