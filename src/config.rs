//! Reader limits and writer options

use crate::error::{Error, ErrorKind, Pos, Result};

pub const DEFAULT_MAX_DEPTH: usize = 100;
pub const DEFAULT_MAX_SIZE: usize = 10 * 1024 * 1024; // 10MB
pub const DEFAULT_MAX_ATTRIBUTES: usize = 256;

/// Configuration for reader limits and validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum element nesting depth
    pub max_depth: usize,
    /// Maximum input size in bytes
    pub max_size: usize,
    /// Maximum number of attributes on one element
    pub max_attributes: usize,
    /// Whether `<!DOCTYPE ...>` is skipped instead of rejected
    pub allow_doctype: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_size: DEFAULT_MAX_SIZE,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            allow_doctype: false,
        }
    }
}

impl ParserConfig {
    pub fn validate_size(&self, size: usize) -> Result<()> {
        if size > self.max_size {
            return Err(Error::new(ErrorKind::MaxSizeExceeded { max: self.max_size }));
        }
        Ok(())
    }

    pub fn validate_depth(&self, depth: usize, pos: Pos) -> Result<()> {
        if depth > self.max_depth {
            let kind = ErrorKind::MaxDepthExceeded {
                max: self.max_depth,
            };
            let message = kind.to_string();
            return Err(Error::at(kind, pos, message));
        }
        Ok(())
    }

    pub fn validate_attributes(&self, count: usize, pos: Pos) -> Result<()> {
        if count > self.max_attributes {
            let kind = ErrorKind::MaxAttributesExceeded {
                max: self.max_attributes,
            };
            let message = kind.to_string();
            return Err(Error::at(kind, pos, message));
        }
        Ok(())
    }
}

/// Configuration options for writing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriterConfig {
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>`
    pub xml_declaration: bool,
    /// Number of spaces per nesting level; `None` writes everything on one line
    pub indent_spaces: Option<usize>,
}

impl WriterConfig {
    pub fn pretty() -> Self {
        Self {
            xml_declaration: true,
            indent_spaces: Some(2),
        }
    }
}
