//! Foundation types for the in-memory CMIS repository.
//!
//! This crate provides the identifier, property, access-control, and content
//! types shared by the object store and the object service. Every other crate
//! in the workspace depends on `cmis-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Store-assigned identifier of a repository object
//! - [`AclId`] -- Reference into the ACL registry (`0` is the open default ACL)
//! - [`ChangeToken`] -- Per-object optimistic concurrency stamp
//! - [`PropertyValue`] / [`PropertyData`] / [`Properties`] -- Typed property bags
//! - [`Ace`] / [`Permission`] -- Access control entries
//! - [`ContentStream`] -- Document content with mime type and file name
//! - [`BaseTypeId`], [`VersioningState`], [`RelationshipDirection`] -- CMIS enums

pub mod acl;
pub mod base;
pub mod content;
pub mod error;
pub mod object;
pub mod property;
pub mod schema;
pub mod token;

pub use acl::{principals, Ace, AclPropagation, Permission};
pub use base::{BaseTypeId, RelationshipDirection, UnfileObject, VersioningState};
pub use content::ContentStream;
pub use error::TypeError;
pub use object::{AclId, ObjectId};
pub use property::{property_ids, Properties, PropertyData, PropertyValue};
pub use schema::{Cardinality, ContentStreamAllowed, PropertyType, Updatability};
pub use token::ChangeToken;
