use serde::{Deserialize, Serialize};

/// Whether a property holds one value or a list of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    Single,
    Multi,
}

/// When a property may be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Updatability {
    /// Maintained by the repository only.
    ReadOnly,
    /// Writable at any time.
    ReadWrite,
    /// Writable only on a private working copy.
    WhenCheckedOut,
    /// Writable only when the object is created.
    OnCreate,
}

/// The value type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Id,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Uri,
    Html,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Id => "id",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Uri => "uri",
            Self::Html => "html",
        }
    }
}

/// Whether documents of a type may, must, or must not carry content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentStreamAllowed {
    NotAllowed,
    Allowed,
    Required,
}
