//! Object service for the in-memory CMIS repository.
//!
//! Every request passes through the [`ObjectService`] before it reaches the
//! store. The service resolves the caller, checks access, validates
//! properties against the [`TypeRegistry`], and turns store failures into
//! CMIS error categories ([`ServiceError`]).
//!
//! # Quick Start
//!
//! ```rust
//! use cmis_service::{CallContext, CreateExtras, ObjectService, RepositoryConfig};
//! use cmis_types::{property_ids, ContentStream, Properties, PropertyData, VersioningState};
//!
//! let service = ObjectService::new(RepositoryConfig::default()).unwrap();
//! let ctx = CallContext::user("alice");
//! let props = Properties::new()
//!     .with(PropertyData::string(property_ids::NAME, "report.txt"))
//!     .with(PropertyData::id_value(property_ids::OBJECT_TYPE_ID, "cmis:document"));
//! let id = service
//!     .create_document(
//!         &ctx,
//!         &props,
//!         Some(service.root_folder_id()),
//!         Some(ContentStream::new("report.txt", "text/plain", b"hello".to_vec())),
//!         VersioningState::None,
//!         CreateExtras::default(),
//!     )
//!     .unwrap();
//! let object = service.get_object_by_path(&ctx, "/report.txt").unwrap();
//! assert_eq!(object.id(), id);
//! ```

pub mod allowable;
pub mod config;
pub mod context;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

// Re-exports for convenience.
pub use allowable::AllowableActions;
pub use config::RepositoryConfig;
pub use context::CallContext;
pub use error::{ServiceError, ServiceResult};
pub use service::{
    BulkUpdateResult, CreateExtras, ObjectData, ObjectList, ObjectParent, ObjectService, ObjectTreeNode,
    Rendition,
};
pub use types::{PropertyDefinition, TypeDefinition, TypeRegistry};
