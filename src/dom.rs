//! Serialized element model with a namespace-aware reader and writer

pub mod cursor;
pub mod model;
pub mod reader;
pub mod writer;

pub use model::{Content, Element};
pub use reader::Reader;
pub use writer::Writer;

use crate::config::{ParserConfig, WriterConfig};
use crate::error::Result;

/// Parse an element tree from string
pub fn from_str(s: &str) -> Result<Element> {
    Reader::new(s.as_bytes()).parse()
}

/// Parse an element tree from bytes with custom limits
pub fn from_bytes_with_config(bytes: &[u8], config: ParserConfig) -> Result<Element> {
    Reader::with_config(bytes, config).parse()
}

/// Serialize an element tree on a single line without XML declaration
pub fn to_string(element: &Element) -> String {
    Writer::new(WriterConfig::default()).write(element)
}
