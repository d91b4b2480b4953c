//! Concurrent in-memory object store for the CMIS repository.
//!
//! This crate holds every repository object (folders, documents, version
//! series and their versions, items, policies, relationships) in a
//! `DashMap` keyed by [`ObjectId`](cmis_types::ObjectId). It enforces the
//! structural rules of the repository: sibling name uniqueness, a single
//! acyclic folder tree, version series state, and ACL resolution.
//!
//! # Store Traits
//!
//! - [`ObjectStore`] -- create, persist, update, delete, relationships
//! - [`FilingStore`] -- children, paths, move, rename, multi-filing, delete tree
//! - [`VersioningStore`] -- checkout, checkin, cancel, version listing
//! - [`AclStore`] -- permission checks and ACL application
//!
//! [`InMemoryObjectStore`] implements all four; [`RepositoryStore`] names
//! the combination.
//!
//! # Design Rules
//!
//! 1. Objects are built as drafts and only become visible on `persist`.
//! 2. Every check-then-mutate sequence runs under one coarse lock.
//! 3. Reads never take the coarse lock and may see slightly stale state.
//! 4. Updates work on a copy; a failed check stores nothing.
//! 5. Objects refer to each other by id only. A dangling id is `NotFound`.

pub mod acl;
pub mod error;
pub mod ids;
pub mod memory;
pub mod names;
pub mod object;
pub mod options;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use acl::{AclRegistry, InMemoryAcl};
pub use error::{StoreError, StoreResult};
pub use ids::IdAllocator;
pub use memory::InMemoryObjectStore;
pub use object::{
    DocumentData, DocumentVersion, FolderData, InitialVersion, ItemData, NewObject, ObjectDraft,
    ObjectKind, ObjectMeta, PolicyData, RelationshipData, StoredObject, VersionLabel, VersionRef,
    VersionSeries,
};
pub use options::StoreOptions;
pub use traits::{
    AclStore, ChildrenPage, FilingStore, ObjectStore, Paging, RepositoryStore, TreeNode,
    VersioningStore,
};
