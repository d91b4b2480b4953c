//! `DashMap`-backed implementation of every store trait.
//!
//! Reads go straight to the map and see eventually consistent snapshots.
//! Every compound check-then-mutate sequence runs under one coarse
//! `parking_lot::Mutex`, which is never held across a call that takes it
//! again. Objects are always cloned out of the map before further lookups,
//! so no shard guard is held while another shard is touched.

mod access;
mod filing;
mod versioning;

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use cmis_types::{AclId, ChangeToken, ContentStream, ObjectId, Permission, RelationshipDirection, VersioningState};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::acl::AclRegistry;
use crate::error::{StoreError, StoreResult};
use crate::ids::IdAllocator;
use crate::names::validate_name;
use crate::object::{
    DocumentData, DocumentVersion, FolderData, InitialVersion, ItemData, NewObject, ObjectDraft,
    ObjectKind, ObjectMeta, PolicyData, RelationshipData, StoredObject, VersionLabel, VersionRef,
};
use crate::options::StoreOptions;
use crate::traits::ObjectStore;

/// Name of the root folder.
pub const ROOT_FOLDER_NAME: &str = "RootFolder";

/// In-memory CMIS object store.
pub struct InMemoryObjectStore {
    repository_id: String,
    options: StoreOptions,
    objects: DashMap<ObjectId, StoredObject>,
    lock: Mutex<()>,
    acls: AclRegistry,
    ids: IdAllocator,
    root_id: ObjectId,
}

impl InMemoryObjectStore {
    /// Create a store holding only a root folder, with default options.
    pub fn new(repository_id: impl Into<String>) -> Self {
        Self::with_options(repository_id, StoreOptions::default())
    }

    pub fn with_options(repository_id: impl Into<String>, options: StoreOptions) -> Self {
        let ids = IdAllocator::new();
        let root_id = ids.next_object_id();
        let store = Self {
            repository_id: repository_id.into(),
            options,
            objects: DashMap::new(),
            lock: Mutex::new(()),
            acls: AclRegistry::new(),
            ids,
            root_id,
        };
        store.insert_root();
        store
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn acl_registry(&self) -> &AclRegistry {
        &self.acls
    }

    fn insert_root(&self) {
        let meta = ObjectMeta::new(
            ROOT_FOLDER_NAME,
            cmis_types::BaseTypeId::Folder.as_str(),
            &self.options.admin_principal,
            Utc::now(),
        );
        let root = StoredObject {
            id: self.root_id,
            change_token: ChangeToken::first(),
            meta,
            kind: ObjectKind::Folder(FolderData {
                parent_id: None,
                allowed_child_type_ids: Vec::new(),
            }),
        };
        self.objects.insert(self.root_id, root);
    }

    // ----------------------------------------------------------------
    // Internal helpers shared by the trait impls
    // ----------------------------------------------------------------

    pub(crate) fn load(&self, id: ObjectId) -> StoreResult<StoredObject> {
        self.objects
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Write back a modified object with a bumped token and fresh stamp.
    pub(crate) fn save(&self, mut object: StoredObject, user: &str) -> StoredObject {
        object.change_token = object.change_token.next();
        object.meta.touch(user, Utc::now());
        self.objects.insert(object.id, object.clone());
        object
    }

    pub(crate) fn remove(&self, id: ObjectId) {
        self.objects.remove(&id);
    }

    pub(crate) fn require_folder(&self, id: ObjectId) -> StoreResult<StoredObject> {
        let folder = self.load(id)?;
        if folder.is_folder() {
            Ok(folder)
        } else {
            Err(StoreError::InvalidArgument(format!("object {id} is not a folder")))
        }
    }

    /// The fileable object standing for `object`: the series of a version,
    /// otherwise the object itself.
    pub(crate) fn filed_as(&self, object: StoredObject) -> StoreResult<StoredObject> {
        match &object.kind {
            ObjectKind::Version(v) => self.load(v.series_id),
            _ => Ok(object),
        }
    }

    /// Snapshot of every object filed directly in `folder_id`.
    pub(crate) fn raw_children(&self, folder_id: ObjectId) -> Vec<StoredObject> {
        let mut children: Vec<StoredObject> = self
            .objects
            .iter()
            .filter(|entry| entry.value().has_parent(folder_id))
            .map(|entry| entry.value().clone())
            .collect();
        children.sort_by(|a, b| a.name().cmp(b.name()).then(a.id.cmp(&b.id)));
        children
    }

    pub(crate) fn has_children(&self, folder_id: ObjectId) -> bool {
        self.objects.iter().any(|entry| entry.value().has_parent(folder_id))
    }

    /// Returns `true` if a fileable child of `folder_id` other than
    /// `exclude` is called `name`.
    pub(crate) fn has_named_child(&self, folder_id: ObjectId, name: &str, exclude: Option<ObjectId>) -> bool {
        self.objects.iter().any(|entry| {
            let obj = entry.value();
            Some(obj.id) != exclude && obj.has_parent(folder_id) && obj.name() == name
        })
    }

    fn check_unique_in(&self, parents: &[ObjectId], name: &str, exclude: Option<ObjectId>) -> StoreResult<()> {
        for &folder in parents {
            if self.has_named_child(folder, name, exclude) {
                return Err(StoreError::NameConstraintViolation {
                    name: name.to_string(),
                    folder,
                });
            }
        }
        Ok(())
    }

    fn check_parents(&self, parents: &[ObjectId], name: &str) -> StoreResult<()> {
        for &parent in parents {
            self.require_folder(parent)?;
        }
        if parents.is_empty() && !self.options.unfiling {
            return Err(StoreError::NotSupported("unfiled objects are not supported".into()));
        }
        if parents.len() > 1 && !self.options.multi_filing {
            return Err(StoreError::NotSupported("multi-filing is not supported".into()));
        }
        self.check_unique_in(parents, name, None)
    }

    fn check_policies(&self, policies: &[ObjectId]) -> StoreResult<()> {
        for &id in policies {
            let policy = self.load(id)?;
            if !matches!(policy.kind, ObjectKind::Policy(_)) {
                return Err(StoreError::InvalidArgument(format!("object {id} is not a policy")));
            }
        }
        Ok(())
    }

    /// The ACL id that governs `object`. A version whose series is gone is
    /// `NotFound`.
    pub(crate) fn effective_acl_id(&self, object: &StoredObject) -> StoreResult<AclId> {
        match &object.kind {
            ObjectKind::Version(v) => Ok(self.load(v.series_id)?.meta.acl_id),
            _ => Ok(object.meta.acl_id),
        }
    }

    /// Whether `principal` holds `permission` on an already loaded object.
    pub(crate) fn can(&self, object: &StoredObject, principal: &str, permission: Permission) -> StoreResult<bool> {
        if principal == self.options.admin_principal {
            return Ok(true);
        }
        let acl_id = self.effective_acl_id(object)?;
        Ok(self.acls.has_permission(acl_id, principal, permission))
    }

    /// Listing filter: `true` without a user, otherwise whether the user may
    /// read `object`. An unresolvable ACL hides the object.
    pub(crate) fn readable_by(&self, object: &StoredObject, user: Option<&str>) -> bool {
        match user {
            None => true,
            Some(u) => matches!(self.can(object, u, Permission::Read), Ok(true)),
        }
    }

    fn initial_acl(&self, new: &NewObject, base: Option<ObjectId>) -> StoreResult<AclId> {
        let current = match base {
            Some(parent) => Some(self.load(parent)?.meta.acl_id),
            None => None,
        };
        Ok(self
            .acls
            .compute_acl_id(current, &new.add_aces, &new.remove_aces, &self.ids))
    }

    fn filed_draft(
        &self,
        new: NewObject,
        parent_ids: &[ObjectId],
        kind: ObjectKind,
    ) -> StoreResult<ObjectDraft> {
        validate_name(&new.name, self.options.max_name_length)?;
        self.check_parents(parent_ids, &new.name)?;
        self.check_policies(&new.policies)?;
        let acl_id = self.initial_acl(&new, parent_ids.first().copied())?;
        Ok(ObjectDraft::new(new.into_meta(acl_id, Utc::now()), kind))
    }

    /// Remove a version (or the whole series) while the lock is held.
    fn delete_version(&self, version_id: ObjectId, version: &DocumentVersion, all_versions: bool) -> StoreResult<()> {
        let mut series = self.load(version.series_id)?;
        let user = series.meta.modified_by.clone();
        let Some(data) = series.kind.as_series_mut() else {
            return Err(StoreError::Versioning(format!(
                "object {} is not a version series",
                version.series_id
            )));
        };

        if all_versions {
            for id in data.all_ids() {
                self.remove(id);
            }
            self.remove(series.id);
            return Ok(());
        }

        if data.pwc_id == Some(version_id) {
            data.pwc_id = None;
            data.checked_out_by = None;
        } else {
            data.versions.retain(|v| v.id != version_id);
        }
        self.remove(version_id);

        if data.versions.is_empty() && data.pwc_id.is_none() {
            debug!(series = %series.id, "last version deleted, removing series");
            self.remove(series.id);
        } else {
            self.save(series, &user);
        }
        Ok(())
    }

    /// Propagate a renamed version or series name to the rest of the series.
    fn sync_series_name(&self, changed: &StoredObject, user: &str) -> StoreResult<()> {
        let series_id = match &changed.kind {
            ObjectKind::Version(v) => v.series_id,
            ObjectKind::VersionSeries(_) => changed.id,
            _ => return Ok(()),
        };
        let series = self.load(series_id)?;
        let members = series.kind.as_series().map(|s| s.all_ids()).unwrap_or_default();
        for id in std::iter::once(series_id).chain(members) {
            if id == changed.id {
                continue;
            }
            let mut member = self.load(id)?;
            member.meta.name = changed.meta.name.clone();
            self.save(member, user);
        }
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("repository_id", &self.repository_id)
            .field("object_count", &self.objects.len())
            .field("root_id", &self.root_id)
            .finish()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn repository_id(&self) -> &str {
        &self.repository_id
    }

    fn root_folder_id(&self) -> ObjectId {
        self.root_id
    }

    fn get_object(&self, id: ObjectId) -> StoreResult<StoredObject> {
        self.load(id)
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn create_folder(
        &self,
        new: NewObject,
        parent_id: ObjectId,
        allowed_child_type_ids: Vec<String>,
    ) -> StoreResult<ObjectDraft> {
        debug!(name = %new.name, parent = %parent_id, "building folder");
        self.filed_draft(
            new,
            &[parent_id],
            ObjectKind::Folder(FolderData {
                parent_id: Some(parent_id),
                allowed_child_type_ids,
            }),
        )
    }

    fn create_document(
        &self,
        new: NewObject,
        parent_ids: Vec<ObjectId>,
        content: Option<ContentStream>,
    ) -> StoreResult<ObjectDraft> {
        debug!(name = %new.name, parents = parent_ids.len(), "building document");
        let kind = ObjectKind::Document(DocumentData {
            parent_ids: parent_ids.clone(),
            content,
        });
        self.filed_draft(new, &parent_ids, kind)
    }

    fn create_versioned_document(
        &self,
        new: NewObject,
        parent_ids: Vec<ObjectId>,
        content: Option<ContentStream>,
        state: VersioningState,
    ) -> StoreResult<ObjectDraft> {
        if state == VersioningState::None {
            return Err(StoreError::Constraint(
                "a versioned document needs a versioning state".into(),
            ));
        }
        debug!(name = %new.name, ?state, "building version series");
        let kind = ObjectKind::VersionSeries(crate::object::VersionSeries {
            parent_ids: parent_ids.clone(),
            versions: Vec::new(),
            pwc_id: None,
            checked_out_by: None,
        });
        let mut draft = self.filed_draft(new, &parent_ids, kind)?;
        draft.initial_version = Some(InitialVersion { content, state });
        Ok(draft)
    }

    fn create_item(&self, new: NewObject, parent_ids: Vec<ObjectId>) -> StoreResult<ObjectDraft> {
        debug!(name = %new.name, "building item");
        let kind = ObjectKind::Item(ItemData {
            parent_ids: parent_ids.clone(),
        });
        self.filed_draft(new, &parent_ids, kind)
    }

    fn create_policy(&self, new: NewObject, policy_text: Option<String>) -> StoreResult<ObjectDraft> {
        validate_name(&new.name, self.options.max_name_length)?;
        self.check_policies(&new.policies)?;
        let acl_id = self.initial_acl(&new, None)?;
        Ok(ObjectDraft::new(
            new.into_meta(acl_id, Utc::now()),
            ObjectKind::Policy(PolicyData { policy_text }),
        ))
    }

    fn create_relationship(
        &self,
        new: NewObject,
        source_id: ObjectId,
        target_id: ObjectId,
    ) -> StoreResult<ObjectDraft> {
        validate_name(&new.name, self.options.max_name_length)?;
        self.load(source_id)?;
        self.load(target_id)?;
        self.check_policies(&new.policies)?;
        let acl_id = self.initial_acl(&new, None)?;
        Ok(ObjectDraft::new(
            new.into_meta(acl_id, Utc::now()),
            ObjectKind::Relationship(RelationshipData { source_id, target_id }),
        ))
    }

    fn persist(&self, draft: ObjectDraft) -> StoreResult<ObjectId> {
        validate_name(draft.name(), self.options.max_name_length)?;
        if let ObjectKind::Folder(FolderData { parent_id: None, .. }) = draft.kind {
            return Err(StoreError::InvalidArgument("a folder needs a parent folder".into()));
        }

        let _guard = self.lock.lock();
        for &parent in draft.kind.parent_ids() {
            self.require_folder(parent)?;
        }
        self.check_unique_in(draft.kind.parent_ids(), draft.name(), None)?;

        let ObjectDraft {
            meta,
            mut kind,
            initial_version,
        } = draft;
        let id = self.ids.next_object_id();

        let Some(initial) = initial_version else {
            debug!(%id, name = %meta.name, "persisted object");
            self.objects.insert(
                id,
                StoredObject {
                    id,
                    change_token: ChangeToken::first(),
                    meta,
                    kind,
                },
            );
            return Ok(id);
        };

        let version_id = self.ids.next_object_id();
        let label = match initial.state {
            VersioningState::CheckedOut => None,
            VersioningState::Minor => Some(VersionLabel::initial(false)),
            VersioningState::Major | VersioningState::None => Some(VersionLabel::initial(true)),
        };
        let Some(series) = kind.as_series_mut() else {
            return Err(StoreError::InvalidArgument(
                "an initial version needs a version series".into(),
            ));
        };
        match label {
            Some(label) => series.versions.push(VersionRef { id: version_id, label }),
            None => {
                series.pwc_id = Some(version_id);
                series.checked_out_by = Some(meta.created_by.clone());
            }
        }

        let version = StoredObject {
            id: version_id,
            change_token: ChangeToken::first(),
            meta: meta.clone(),
            kind: ObjectKind::Version(DocumentVersion {
                series_id: id,
                content: initial.content,
                label,
                checkin_comment: None,
            }),
        };
        self.objects.insert(
            id,
            StoredObject {
                id,
                change_token: ChangeToken::first(),
                meta,
                kind,
            },
        );
        self.objects.insert(version_id, version);
        debug!(series = %id, version = %version_id, "persisted version series");
        Ok(version_id)
    }

    fn update_object<F>(
        &self,
        id: ObjectId,
        expected: Option<ChangeToken>,
        user: &str,
        update: F,
    ) -> StoreResult<StoredObject>
    where
        F: FnOnce(&mut StoredObject) -> StoreResult<()>,
    {
        let _guard = self.lock.lock();
        let current = self.load(id)?;
        if let Some(given) = expected {
            if given != current.change_token {
                return Err(StoreError::UpdateConflict {
                    id,
                    given,
                    current: current.change_token,
                });
            }
        }

        let mut updated = current.clone();
        update(&mut updated)?;
        updated.id = current.id;
        updated.change_token = current.change_token;

        let renamed = updated.meta.name != current.meta.name;
        if renamed {
            if id == self.root_id {
                return Err(StoreError::Constraint("the root folder cannot be renamed".into()));
            }
            validate_name(&updated.meta.name, self.options.max_name_length)?;
            let filed = self.filed_as(current.clone())?;
            self.check_unique_in(filed.parent_ids(), &updated.meta.name, Some(filed.id))?;
        }

        let saved = self.save(updated, user);
        if renamed {
            self.sync_series_name(&saved, user)?;
        }
        debug!(%id, token = %saved.change_token, renamed, "updated object");
        Ok(saved)
    }

    fn delete_object(&self, id: ObjectId, all_versions: bool) -> StoreResult<()> {
        if id == self.root_id {
            return Err(StoreError::NotSupported("the root folder cannot be deleted".into()));
        }

        let _guard = self.lock.lock();
        let object = self.load(id)?;
        match &object.kind {
            ObjectKind::Folder(_) => {
                if self.has_children(id) {
                    return Err(StoreError::Constraint(format!("folder {id} is not empty")));
                }
                self.remove(id);
            }
            ObjectKind::VersionSeries(series) => {
                for version in series.all_ids() {
                    self.remove(version);
                }
                self.remove(id);
            }
            ObjectKind::Version(version) => self.delete_version(id, version, all_versions)?,
            ObjectKind::Document(_) | ObjectKind::Item(_) | ObjectKind::Policy(_) | ObjectKind::Relationship(_) => {
                self.remove(id)
            }
        }
        debug!(%id, all_versions, "deleted object");
        Ok(())
    }

    fn clear(&self) {
        let _guard = self.lock.lock();
        self.objects.clear();
        self.acls.clear();
        self.insert_root();
        info!(repository = %self.repository_id, "store cleared");
    }

    fn is_type_in_use(&self, type_id: &str) -> bool {
        self.objects.iter().any(|entry| {
            let meta = &entry.value().meta;
            meta.type_id == type_id || meta.secondary_type_ids.iter().any(|t| t == type_id)
        })
    }

    fn relationships(
        &self,
        id: ObjectId,
        type_ids: &[String],
        direction: RelationshipDirection,
        user: Option<&str>,
    ) -> Vec<StoredObject> {
        let candidates: Vec<StoredObject> = self
            .objects
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .kind
                    .as_relationship()
                    .is_some_and(|rel| direction.matches(&id, &rel.source_id, &rel.target_id))
            })
            .map(|entry| entry.value().clone())
            .collect();

        let types: HashSet<&str> = type_ids.iter().map(String::as_str).collect();
        let mut result: Vec<StoredObject> = candidates
            .into_iter()
            .filter(|rel| types.is_empty() || types.contains(rel.type_id()))
            .filter(|rel| self.readable_by(rel, user))
            .collect();
        result.sort_by_key(|rel| rel.id);
        result
    }
}
