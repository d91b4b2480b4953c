use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The CMIS base type an object type derives from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseTypeId {
    Document,
    Folder,
    Relationship,
    Policy,
    Item,
    Secondary,
}

impl BaseTypeId {
    /// The CMIS identifier, e.g. `cmis:document`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "cmis:document",
            Self::Folder => "cmis:folder",
            Self::Relationship => "cmis:relationship",
            Self::Policy => "cmis:policy",
            Self::Item => "cmis:item",
            Self::Secondary => "cmis:secondary",
        }
    }

    /// Returns `true` for base types whose objects can live in folders.
    pub fn is_fileable(&self) -> bool {
        matches!(self, Self::Document | Self::Folder | Self::Item)
    }

    /// All base types in declaration order.
    pub fn all() -> [BaseTypeId; 6] {
        [
            Self::Document,
            Self::Folder,
            Self::Relationship,
            Self::Policy,
            Self::Item,
            Self::Secondary,
        ]
    }
}

impl fmt::Display for BaseTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseTypeId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| TypeError::UnknownEnumValue {
                kind: "base type",
                value: s.to_string(),
            })
    }
}

/// Versioning state requested when a document is created or checked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersioningState {
    /// The document is not versionable.
    None,
    /// Create a major version (`1.0`).
    Major,
    /// Create a minor version (`0.1`).
    Minor,
    /// Create the document directly as a private working copy.
    CheckedOut,
}

/// Which endpoint of a relationship an object must be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipDirection {
    Source,
    Target,
    Either,
}

impl RelationshipDirection {
    /// Returns `true` if a relationship with the given endpoints matches
    /// `object` in this direction.
    pub fn matches<T: PartialEq>(&self, object: &T, source: &T, target: &T) -> bool {
        match self {
            Self::Source => source == object,
            Self::Target => target == object,
            Self::Either => source == object || target == object,
        }
    }
}

/// How `deleteTree` treats objects filed in more than one folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnfileObject {
    Unfile,
    DeleteSingleFiled,
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_type_roundtrip_through_str() {
        for base in BaseTypeId::all() {
            assert_eq!(base.as_str().parse::<BaseTypeId>().unwrap(), base);
        }
    }

    #[test]
    fn unknown_base_type_is_rejected() {
        let err = "cmis:widget".parse::<BaseTypeId>().unwrap_err();
        assert!(err.to_string().contains("cmis:widget"));
    }

    #[test]
    fn only_documents_folders_items_are_fileable() {
        assert!(BaseTypeId::Document.is_fileable());
        assert!(BaseTypeId::Folder.is_fileable());
        assert!(BaseTypeId::Item.is_fileable());
        assert!(!BaseTypeId::Policy.is_fileable());
        assert!(!BaseTypeId::Relationship.is_fileable());
    }

    #[test]
    fn relationship_direction_matching() {
        assert!(RelationshipDirection::Source.matches(&1, &1, &2));
        assert!(!RelationshipDirection::Source.matches(&2, &1, &2));
        assert!(RelationshipDirection::Target.matches(&2, &1, &2));
        assert!(RelationshipDirection::Either.matches(&2, &1, &2));
        assert!(!RelationshipDirection::Either.matches(&3, &1, &2));
    }
}
