//! Error types for xmlobject

use std::fmt;
use thiserror::Error;

use crate::qname::QName;

/// Position in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Multi-parenting, cycles or a child-list inconsistency
    InvalidTreeState,
    /// An ID attribute value already owned by another node of the same subtree
    DuplicateId { id: String },
    /// No provider is registered for a root element
    UnknownElement { name: QName },
    /// A node's body is not of the expected element type
    TypeMismatch { expected: &'static str },
    IndexOutOfBounds { index: usize, len: usize },
    Marshalling,
    Unmarshalling,
    Syntax,
    UnboundPrefix { prefix: String },
    DoctypeNotAllowed,
    MaxDepthExceeded { max: usize },
    MaxSizeExceeded { max: usize },
    MaxAttributesExceeded { max: usize },
    Io(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTreeState => write!(f, "invalid tree state"),
            Self::DuplicateId { id } => write!(f, "duplicate ID: {id}"),
            Self::UnknownElement { name } => write!(f, "no provider for element {name}"),
            Self::TypeMismatch { expected } => write!(f, "expected element type {expected}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::Marshalling => write!(f, "marshalling failed"),
            Self::Unmarshalling => write!(f, "unmarshalling failed"),
            Self::Syntax => write!(f, "malformed xml"),
            Self::UnboundPrefix { prefix } => write!(f, "unbound namespace prefix: {prefix}"),
            Self::DoctypeNotAllowed => write!(f, "DOCTYPE declarations are not allowed"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::MaxAttributesExceeded { max } => {
                write!(f, "max attributes per element exceeded: {max}")
            }
            Self::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

/// Main error type for xmlobject
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Option<Span>,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span: None,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            span: None,
            message: message.into(),
        }
    }

    /// Create error at specific input position
    pub fn at(kind: ErrorKind, pos: Pos, message: impl Into<String>) -> Self {
        Self {
            kind,
            span: Some(Span::at(pos)),
            message: message.into(),
        }
    }

    pub fn invalid_tree(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::InvalidTreeState, message)
    }

    pub fn duplicate_id(id: &str) -> Self {
        Self::new(ErrorKind::DuplicateId { id: id.to_string() })
    }

    pub fn marshalling(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Marshalling, message)
    }

    pub fn unmarshalling(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Unmarshalling, message)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "error at {}: {}", span.start, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result type alias for xmlobject
pub type Result<T> = std::result::Result<T, Error>;
