//! Error types for model configuration, object mapping and XML text handling.

use std::fmt::{self, Display};
use std::io;

/// Result type alias for xml_model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for model configuration, serialization and deserialization.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    position: Option<Position>,
}

/// Position information for errors raised while reading XML text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset from start.
    pub offset: usize,
}

/// The kind of error that occurred.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error occurred.
    Io(io::Error),
    /// Unexpected end of input.
    UnexpectedEof,
    /// Invalid XML syntax.
    Syntax(String),
    /// Invalid XML name.
    InvalidName(String),
    /// Unclosed tag.
    UnclosedTag(String),
    /// Mismatched closing tag.
    MismatchedTag {
        /// The expected tag name.
        expected: String,
        /// The actual tag name found.
        found: String,
    },
    /// Invalid escape sequence.
    InvalidEscape(String),
    /// Invalid UTF-8.
    InvalidUtf8,
    /// A value was absent where one is required.
    NullValue,
    /// The serializer has no model registry configured.
    MissingModel,
    /// A node name is not present in the wire-name index.
    UnresolvedWireName(String),
    /// A type is not registered as an entity.
    UnknownEntity(String),
    /// A node lacks the attribute or element backing a constructor parameter.
    MissingRequiredMember {
        /// Entity being deserialized.
        entity: String,
        /// Constructor parameter index.
        index: usize,
        /// Property associated with the parameter.
        property: String,
        /// Wire name that was looked up.
        wire_name: String,
    },
    /// The constructor parameter indices are not dense.
    MissingConstructorParameter {
        /// Entity being deserialized.
        entity: String,
        /// First index without parameter info.
        index: usize,
    },
    /// The type has neither a registered constructor nor a no-arg instantiation.
    NotConstructible(String),
    /// A member without a setter was targeted for assignment.
    ReadOnlyMember {
        /// Owning entity.
        entity: String,
        /// Member name.
        property: String,
    },
    /// A member type is an abstract contract and not a collection shape.
    UnsupportedMemberType {
        /// Owning entity.
        entity: String,
        /// Member name.
        property: String,
        /// Declared member type.
        member_type: String,
    },
    /// The model is configured inconsistently.
    InvalidConfiguration(String),
    /// A value has a different runtime type than expected.
    TypeMismatch {
        /// Expected type path.
        expected: String,
        /// Actual type path.
        found: String,
    },
    /// Text could not be converted to the target scalar type.
    Format {
        /// Target type path.
        target: String,
        /// Offending text.
        text: String,
        /// Reason reported by the parser.
        reason: String,
    },
    /// The type has no textual form.
    Unconvertible(String),
    /// Custom error message.
    Custom(String),
}

impl Error {
    /// Creates a new error with the given kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, position: None }
    }

    /// Attaches position information.
    #[inline]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the position where the error occurred.
    #[inline]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns true for failures delegated from scalar conversion.
    pub fn is_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::Format { .. } | ErrorKind::Unconvertible(_))
    }

    /// Creates an unexpected EOF error.
    #[inline]
    pub fn unexpected_eof() -> Self {
        Self::new(ErrorKind::UnexpectedEof)
    }

    /// Creates a syntax error.
    #[inline]
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Syntax(msg.into()))
    }

    /// Creates an invalid name error.
    #[inline]
    pub fn invalid_name<S: Into<String>>(name: S) -> Self {
        Self::new(ErrorKind::InvalidName(name.into()))
    }

    /// Creates an unclosed tag error.
    #[inline]
    pub fn unclosed_tag<S: Into<String>>(tag: S) -> Self {
        Self::new(ErrorKind::UnclosedTag(tag.into()))
    }

    /// Creates a mismatched tag error.
    #[inline]
    pub fn mismatched_tag<S: Into<String>>(expected: S, found: S) -> Self {
        Self::new(ErrorKind::MismatchedTag {
            expected: expected.into(),
            found: found.into(),
        })
    }

    /// Creates an invalid escape error.
    #[inline]
    pub fn invalid_escape<S: Into<String>>(seq: S) -> Self {
        Self::new(ErrorKind::InvalidEscape(seq.into()))
    }

    /// Creates a null value error.
    #[inline]
    pub fn null_value() -> Self {
        Self::new(ErrorKind::NullValue)
    }

    /// Creates a missing model error.
    #[inline]
    pub fn missing_model() -> Self {
        Self::new(ErrorKind::MissingModel)
    }

    /// Creates an unresolved wire name error.
    #[inline]
    pub fn unresolved_wire_name<S: Into<String>>(name: S) -> Self {
        Self::new(ErrorKind::UnresolvedWireName(name.into()))
    }

    /// Creates an unknown entity error.
    #[inline]
    pub fn unknown_entity<S: Into<String>>(type_path: S) -> Self {
        Self::new(ErrorKind::UnknownEntity(type_path.into()))
    }

    /// Creates a missing required member error.
    pub fn missing_required_member<S: Into<String>>(
        entity: S,
        index: usize,
        property: S,
        wire_name: S,
    ) -> Self {
        Self::new(ErrorKind::MissingRequiredMember {
            entity: entity.into(),
            index,
            property: property.into(),
            wire_name: wire_name.into(),
        })
    }

    /// Creates a missing constructor parameter error.
    #[inline]
    pub fn missing_constructor_parameter<S: Into<String>>(entity: S, index: usize) -> Self {
        Self::new(ErrorKind::MissingConstructorParameter {
            entity: entity.into(),
            index,
        })
    }

    /// Creates a not constructible error.
    #[inline]
    pub fn not_constructible<S: Into<String>>(type_path: S) -> Self {
        Self::new(ErrorKind::NotConstructible(type_path.into()))
    }

    /// Creates a read-only member error.
    #[inline]
    pub fn read_only_member<S: Into<String>>(entity: S, property: S) -> Self {
        Self::new(ErrorKind::ReadOnlyMember {
            entity: entity.into(),
            property: property.into(),
        })
    }

    /// Creates an unsupported member type error.
    pub fn unsupported_member_type<S: Into<String>>(entity: S, property: S, member_type: S) -> Self {
        Self::new(ErrorKind::UnsupportedMemberType {
            entity: entity.into(),
            property: property.into(),
            member_type: member_type.into(),
        })
    }

    /// Creates an invalid configuration error.
    #[inline]
    pub fn invalid_configuration<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::InvalidConfiguration(msg.into()))
    }

    /// Creates a type mismatch error.
    #[inline]
    pub fn type_mismatch<S: Into<String>>(expected: S, found: S) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        })
    }

    /// Creates a format error.
    pub fn format<S: Into<String>, R: Display>(target: S, text: S, reason: R) -> Self {
        Self::new(ErrorKind::Format {
            target: target.into(),
            text: text.into(),
            reason: reason.to_string(),
        })
    }

    /// Creates an unconvertible type error.
    #[inline]
    pub fn unconvertible<S: Into<String>>(type_path: S) -> Self {
        Self::new(ErrorKind::Unconvertible(type_path.into()))
    }

    /// Creates a custom error.
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Custom(msg.into()))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(e) => write!(f, "I/O error: {}", e),
            ErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
            ErrorKind::Syntax(msg) => write!(f, "syntax error: {}", msg),
            ErrorKind::InvalidName(name) => write!(f, "invalid XML name: {}", name),
            ErrorKind::UnclosedTag(tag) => write!(f, "unclosed tag: <{}>", tag),
            ErrorKind::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{}>, found </{}>", expected, found)
            }
            ErrorKind::InvalidEscape(seq) => write!(f, "invalid escape sequence: {}", seq),
            ErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
            ErrorKind::NullValue => write!(f, "value must not be null"),
            ErrorKind::MissingModel => write!(f, "no model registry is configured"),
            ErrorKind::UnresolvedWireName(name) => {
                write!(f, "no type is registered for wire name '{}'", name)
            }
            ErrorKind::UnknownEntity(ty) => write!(f, "type {} is not registered as an entity", ty),
            ErrorKind::MissingRequiredMember { entity, index, property, wire_name } => write!(
                f,
                "constructor argument[{}] of {} is associated with property {}, but '{}' was not found",
                index, entity, property, wire_name
            ),
            ErrorKind::MissingConstructorParameter { entity, index } => {
                write!(f, "constructor argument[{}] of {} is not configured", index, entity)
            }
            ErrorKind::NotConstructible(ty) => write!(f, "type {} cannot be constructed", ty),
            ErrorKind::ReadOnlyMember { entity, property } => {
                write!(f, "property {} of {} has no setter", property, entity)
            }
            ErrorKind::UnsupportedMemberType { entity, property, member_type } => write!(
                f,
                "property {} of {} has abstract type {} which is not a collection shape",
                property, entity, member_type
            ),
            ErrorKind::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            ErrorKind::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            ErrorKind::Format { target, text, reason } => {
                write!(f, "cannot convert '{}' to {}: {}", text, target, reason)
            }
            ErrorKind::Unconvertible(ty) => write!(f, "type {} has no textual form", ty),
            ErrorKind::Custom(msg) => write!(f, "{}", msg),
        }?;

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {} (offset {})", pos.line, pos.column, pos.offset)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::new(ErrorKind::Io(e))
    }
}
