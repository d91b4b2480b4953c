use cmis_types::{
    Ace, AclPropagation, ChangeToken, ContentStream, ObjectId, Permission, Properties,
    RelationshipDirection, UnfileObject, VersioningState,
};

use crate::acl::InMemoryAcl;
use crate::error::{StoreError, StoreResult};
use crate::object::{NewObject, ObjectDraft, StoredObject};

/// Window into a sorted child listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Paging {
    pub skip: usize,
    /// `None` returns everything after `skip`.
    pub max_items: Option<usize>,
}

impl Paging {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(skip: usize, max_items: Option<usize>) -> Self {
        Self { skip, max_items }
    }
}

/// One page of a child listing plus the size of the full listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildrenPage {
    pub objects: Vec<StoredObject>,
    pub total: usize,
    pub has_more: bool,
}

/// A node of a descendants listing.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub object: StoredObject,
    pub children: Vec<TreeNode>,
}

/// Object lifecycle: creation, lookup, update, and deletion.
///
/// All implementations must satisfy these invariants:
/// - Object ids are assigned once, at `persist`, and never reused.
/// - The change token of an object strictly increases with every
///   persisted mutation.
/// - No two fileable children of a folder share a name. Creation checks
///   this twice: once when the draft is built and again atomically inside
///   `persist`.
/// - A failed update leaves the stored object untouched.
/// - The root folder is never deleted.
pub trait ObjectStore: Send + Sync {
    fn repository_id(&self) -> &str;

    fn root_folder_id(&self) -> ObjectId;

    /// Read an object by id.
    ///
    /// Returns `Err(NotFound)` if no object has the id.
    fn get_object(&self, id: ObjectId) -> StoreResult<StoredObject>;

    fn exists(&self, id: ObjectId) -> bool {
        self.get_object(id).is_ok()
    }

    /// Number of stored objects, the root folder included.
    fn object_count(&self) -> usize;

    /// Build a folder draft below `parent_id`.
    fn create_folder(
        &self,
        new: NewObject,
        parent_id: ObjectId,
        allowed_child_type_ids: Vec<String>,
    ) -> StoreResult<ObjectDraft>;

    /// Build an unversioned document draft. An empty `parent_ids` creates an
    /// unfiled document.
    fn create_document(
        &self,
        new: NewObject,
        parent_ids: Vec<ObjectId>,
        content: Option<ContentStream>,
    ) -> StoreResult<ObjectDraft>;

    /// Build a version series draft whose first version is created by
    /// `persist` in the given versioning state.
    fn create_versioned_document(
        &self,
        new: NewObject,
        parent_ids: Vec<ObjectId>,
        content: Option<ContentStream>,
        state: VersioningState,
    ) -> StoreResult<ObjectDraft>;

    fn create_item(&self, new: NewObject, parent_ids: Vec<ObjectId>) -> StoreResult<ObjectDraft>;

    fn create_policy(&self, new: NewObject, policy_text: Option<String>) -> StoreResult<ObjectDraft>;

    /// Build a relationship draft. Both endpoints must exist now; later
    /// deletion of an endpoint leaves the relationship dangling.
    fn create_relationship(
        &self,
        new: NewObject,
        source_id: ObjectId,
        target_id: ObjectId,
    ) -> StoreResult<ObjectDraft>;

    /// Insert a draft, assigning its id and first change token.
    ///
    /// For a version series draft the id of the first version is returned.
    fn persist(&self, draft: ObjectDraft) -> StoreResult<ObjectId>;

    /// Apply `update` to a copy of the object and store the result.
    ///
    /// When `expected` is given it must equal the current change token. A
    /// changed name is checked for syntax and sibling uniqueness; renaming a
    /// version renames its whole series. Nothing is stored if any check or
    /// the closure fails.
    fn update_object<F>(
        &self,
        id: ObjectId,
        expected: Option<ChangeToken>,
        user: &str,
        update: F,
    ) -> StoreResult<StoredObject>
    where
        F: FnOnce(&mut StoredObject) -> StoreResult<()>;

    /// Delete one object. For versions `all_versions` deletes the series.
    fn delete_object(&self, id: ObjectId, all_versions: bool) -> StoreResult<()>;

    /// Remove every object except the root folder and forget all ACLs.
    fn clear(&self);

    /// Returns `true` if any object uses `type_id` as primary or secondary
    /// type.
    fn is_type_in_use(&self, type_id: &str) -> bool;

    /// Relationships with `id` as an endpoint in `direction`, optionally
    /// restricted to the given type ids and to objects `user` may read.
    fn relationships(
        &self,
        id: ObjectId,
        type_ids: &[String],
        direction: RelationshipDirection,
        user: Option<&str>,
    ) -> Vec<StoredObject>;

    /// Replace the content of a document or version.
    fn set_content(
        &self,
        id: ObjectId,
        content: Option<ContentStream>,
        expected: Option<ChangeToken>,
        user: &str,
    ) -> StoreResult<StoredObject> {
        self.update_object(id, expected, user, |obj| match obj.kind.content_mut() {
            Some(slot) => {
                *slot = content;
                Ok(())
            }
            None => Err(StoreError::Constraint(format!(
                "object {} cannot hold content",
                obj.id
            ))),
        })
    }

    /// Append a chunk to the content of a document or version.
    ///
    /// Missing content is created from the chunk. `is_last_chunk` is
    /// accepted for protocol compatibility and has no effect.
    fn append_content(
        &self,
        id: ObjectId,
        chunk: &ContentStream,
        is_last_chunk: bool,
        expected: Option<ChangeToken>,
        user: &str,
    ) -> StoreResult<StoredObject> {
        tracing::debug!(%id, bytes = chunk.len(), is_last_chunk, "appending content");
        self.update_object(id, expected, user, |obj| match obj.kind.content_mut() {
            Some(Some(existing)) => {
                existing.append(chunk);
                Ok(())
            }
            Some(slot) => {
                *slot = Some(chunk.clone());
                Ok(())
            }
            None => Err(StoreError::Constraint(format!(
                "object {} cannot hold content",
                obj.id
            ))),
        })
    }
}

/// Folder hierarchy: listing, path resolution, and filing changes.
pub trait FilingStore: ObjectStore {
    /// Children of a folder sorted by name.
    ///
    /// Version series appear as their PWC (when `use_pwc` and checked out)
    /// or their latest version. With `user`, only readable children are
    /// listed and counted.
    fn children(
        &self,
        folder_id: ObjectId,
        paging: Paging,
        user: Option<&str>,
        use_pwc: bool,
    ) -> StoreResult<ChildrenPage>;

    /// Like [`children`](Self::children) but listing folders only.
    fn folder_children(
        &self,
        folder_id: ObjectId,
        paging: Paging,
        user: Option<&str>,
    ) -> StoreResult<ChildrenPage>;

    /// Descendants of a folder down to `depth` levels (`-1` is unlimited).
    fn descendants(
        &self,
        folder_id: ObjectId,
        depth: i32,
        user: Option<&str>,
        folders_only: bool,
    ) -> StoreResult<Vec<TreeNode>> {
        if depth == 0 || depth < -1 {
            return Err(StoreError::InvalidArgument(format!(
                "depth must be -1 or positive, got {depth}"
            )));
        }
        let page = if folders_only {
            self.folder_children(folder_id, Paging::all(), user)?
        } else {
            self.children(folder_id, Paging::all(), user, false)?
        };

        let mut nodes = Vec::with_capacity(page.objects.len());
        for object in page.objects {
            let children = if object.is_folder() && depth != 1 {
                let next = if depth == -1 { -1 } else { depth - 1 };
                self.descendants(object.id, next, user, folders_only)?
            } else {
                Vec::new()
            };
            nodes.push(TreeNode { object, children });
        }
        Ok(nodes)
    }

    /// Resolve an absolute path such as `/A/B/doc.txt`.
    fn object_by_path(&self, path: &str, user: Option<&str>) -> StoreResult<StoredObject>;

    /// Absolute path of a fileable object, through its first parent.
    fn object_path(&self, id: ObjectId) -> StoreResult<String>;

    /// Parent folder ids; versions report their series' parents.
    fn parent_ids(&self, id: ObjectId) -> StoreResult<Vec<ObjectId>>;

    /// Returns `true` if `candidate` lies strictly below folder `ancestor`.
    fn is_descendant(&self, ancestor: ObjectId, candidate: ObjectId) -> bool;

    /// Move an object from `source_id` to `target_id`.
    fn move_object(
        &self,
        id: ObjectId,
        source_id: ObjectId,
        target_id: ObjectId,
        user: &str,
    ) -> StoreResult<StoredObject>;

    /// Rename an object, checking every parent for a collision.
    fn rename(&self, id: ObjectId, new_name: &str, user: &str) -> StoreResult<StoredObject> {
        let new_name = new_name.to_string();
        self.update_object(id, None, user, move |obj| {
            obj.meta.name = new_name;
            Ok(())
        })
    }

    /// File an object into one more folder.
    fn add_parent(&self, id: ObjectId, folder_id: ObjectId, user: &str) -> StoreResult<StoredObject>;

    /// Remove an object from one of its folders.
    fn remove_parent(&self, id: ObjectId, folder_id: ObjectId, user: &str) -> StoreResult<StoredObject>;

    /// Delete a folder and everything below it, children first.
    ///
    /// Returns the ids that could not be deleted. With
    /// `continue_on_failure = false` the walk stops at the first failure.
    fn delete_tree(
        &self,
        folder_id: ObjectId,
        all_versions: bool,
        unfile: UnfileObject,
        continue_on_failure: bool,
        user: &str,
    ) -> StoreResult<Vec<ObjectId>>;
}

/// Version series transitions.
pub trait VersioningStore: ObjectStore {
    /// The series an id belongs to (the id itself for a series).
    fn series_of(&self, id: ObjectId) -> StoreResult<StoredObject>;

    /// Create a private working copy of the latest version.
    fn checkout(&self, id: ObjectId, user: &str) -> StoreResult<ObjectId>;

    /// Turn a private working copy into the next version.
    fn checkin(
        &self,
        pwc_id: ObjectId,
        major: bool,
        properties: Option<Properties>,
        content: Option<ContentStream>,
        comment: Option<String>,
        user: &str,
    ) -> StoreResult<ObjectId>;

    /// Discard a private working copy.
    fn cancel_checkout(&self, pwc_id: ObjectId, user: &str) -> StoreResult<()>;

    /// Every version of a series, newest first, the PWC leading.
    fn all_versions(&self, id: ObjectId) -> StoreResult<Vec<StoredObject>>;

    fn latest_version(&self, id: ObjectId, major_only: bool) -> StoreResult<StoredObject>;

    /// Private working copies readable by `user`, sorted by name.
    fn checked_out_documents(&self, folder_id: Option<ObjectId>, user: Option<&str>) -> Vec<StoredObject>;
}

/// ACL resolution and application.
pub trait AclStore: ObjectStore {
    fn is_admin(&self, principal: &str) -> bool;

    /// The ACL governing an object; versions use their series' ACL.
    fn acl_of(&self, id: ObjectId) -> StoreResult<InMemoryAcl>;

    fn has_access(&self, id: ObjectId, principal: &str, permission: Permission) -> StoreResult<bool>;

    fn check_access(&self, id: ObjectId, principal: &str, permission: Permission) -> StoreResult<()> {
        if self.has_access(id, principal, permission)? {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                principal: principal.to_string(),
                permission,
                id,
            })
        }
    }

    /// Add and remove entries, optionally propagating to descendants on
    /// which `principal` holds `cmis:all`. Fails with `PermissionDenied`
    /// unless `principal` holds `cmis:all` on the object itself.
    fn apply_acl(
        &self,
        id: ObjectId,
        add: &[Ace],
        remove: &[Ace],
        propagation: AclPropagation,
        principal: &str,
    ) -> StoreResult<InMemoryAcl>;

    /// Replace the object's ACL with exactly `aces`.
    fn set_acl(
        &self,
        id: ObjectId,
        aces: &[Ace],
        propagation: AclPropagation,
        principal: &str,
    ) -> StoreResult<InMemoryAcl> {
        let current = self.acl_of(id)?.aces;
        let add: Vec<Ace> = aces.iter().filter(|a| !current.contains(*a)).cloned().collect();
        let remove: Vec<Ace> = current.iter().filter(|a| !aces.contains(*a)).cloned().collect();
        self.apply_acl(id, &add, &remove, propagation, principal)
    }
}

/// Everything the object service needs from a store.
pub trait RepositoryStore: FilingStore + VersioningStore + AclStore {}

impl<T: FilingStore + VersioningStore + AclStore> RepositoryStore for T {}
