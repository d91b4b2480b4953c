//! The object service: CMIS operations over a [`RepositoryStore`].
//!
//! Each operation resolves its targets, checks the caller's access, validates
//! properties against the [`TypeRegistry`], and delegates the structural
//! change to the store. Read operations return [`ObjectData`], which carries
//! the full property set including folder paths and version series state.

mod create;
mod update;
mod versioning;

use std::sync::Arc;

use cmis_store::{
    AclStore, ChildrenPage, FilingStore, InMemoryObjectStore, ObjectKind, ObjectStore, Paging,
    RepositoryStore, StoredObject, TreeNode, VersioningStore,
};
use cmis_types::{
    property_ids as pid, Ace, ChangeToken, ContentStream, ContentStreamAllowed, ObjectId,
    Permission, Properties, PropertyData, PropertyValue, RelationshipDirection,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allowable::{ActionInput, AllowableActions};
use crate::config::RepositoryConfig;
use crate::context::CallContext;
use crate::error::{ServiceError, ServiceResult};
use crate::types::{TypeDefinition, TypeRegistry};

pub use create::CreateExtras;
pub use update::BulkUpdateResult;

/// An object together with its complete property set.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectData {
    pub object: StoredObject,
    pub properties: Properties,
}

impl ObjectData {
    pub fn id(&self) -> ObjectId {
        self.object.id
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn change_token(&self) -> ChangeToken {
        self.object.change_token
    }

    pub fn property(&self, id: &str) -> Option<&PropertyData> {
        self.properties.get(id)
    }

    pub fn bool_property(&self, id: &str) -> Option<bool> {
        self.property(id).and_then(PropertyData::first).and_then(PropertyValue::as_bool)
    }
}

/// One page of a listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectList {
    pub objects: Vec<ObjectData>,
    /// Size of the full listing.
    pub num_items: usize,
    pub has_more: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectTreeNode {
    pub object: ObjectData,
    pub children: Vec<ObjectTreeNode>,
}

/// A parent folder and the name the object is filed under.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectParent {
    pub parent: ObjectData,
    pub relative_path_segment: String,
}

/// An alternative representation of a document. None are produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub stream_id: String,
    pub mime_type: String,
    pub length: u64,
    pub kind: String,
    pub title: Option<String>,
}

/// CMIS object service over a shared store.
pub struct ObjectService<S = InMemoryObjectStore> {
    store: Arc<S>,
    types: Arc<TypeRegistry>,
    config: RepositoryConfig,
}

impl ObjectService<InMemoryObjectStore> {
    /// A service over a fresh in-memory store configured by `config`.
    pub fn new(config: RepositoryConfig) -> ServiceResult<Self> {
        config.validate()?;
        let store = InMemoryObjectStore::with_options(config.repository_id.clone(), config.store_options());
        Ok(Self {
            store: Arc::new(store),
            types: Arc::new(TypeRegistry::new()),
            config,
        })
    }
}

impl<S: RepositoryStore> ObjectService<S> {
    /// A service over an existing store and type registry.
    pub fn with_store(store: Arc<S>, types: Arc<TypeRegistry>, config: RepositoryConfig) -> ServiceResult<Self> {
        config.validate()?;
        Ok(Self { store, types, config })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn repository_id(&self) -> &str {
        self.store.repository_id()
    }

    pub fn root_folder_id(&self) -> ObjectId {
        self.store.root_folder_id()
    }

    // ----------------------------------------------------------------
    // Type definitions
    // ----------------------------------------------------------------

    pub fn get_type_definition(&self, type_id: &str) -> ServiceResult<TypeDefinition> {
        self.types
            .get(type_id)
            .ok_or_else(|| ServiceError::NotFound(format!("type {type_id}")))
    }

    pub fn add_type(&self, definition: TypeDefinition) -> ServiceResult<()> {
        self.types.add_type(definition)
    }

    /// Remove a custom type no object uses.
    pub fn remove_type(&self, type_id: &str) -> ServiceResult<()> {
        self.types.remove_type(type_id, self.store.is_type_in_use(type_id))
    }

    // ----------------------------------------------------------------
    // Shared helpers
    // ----------------------------------------------------------------

    pub(crate) fn principal<'a>(&'a self, ctx: &'a CallContext) -> &'a str {
        ctx.principal(&self.config.anonymous_user)
    }

    /// Load an object after checking that the caller holds `permission`.
    pub(crate) fn load_checked(
        &self,
        id: ObjectId,
        ctx: &CallContext,
        permission: Permission,
    ) -> ServiceResult<StoredObject> {
        let object = self.store.get_object(id)?;
        self.store.check_access(id, self.principal(ctx), permission)?;
        Ok(object)
    }

    /// Load a folder the caller may write to.
    pub(crate) fn writable_folder(&self, id: ObjectId, ctx: &CallContext) -> ServiceResult<StoredObject> {
        let folder = self.load_checked(id, ctx, Permission::Write)?;
        if !folder.is_folder() {
            return Err(ServiceError::InvalidArgument(format!("object {id} is not a folder")));
        }
        Ok(folder)
    }

    /// Fail unless `folder` accepts children of `type_id`.
    pub(crate) fn check_child_type(&self, folder: &StoredObject, type_id: &str) -> ServiceResult<()> {
        let Some(data) = folder.kind.as_folder() else {
            return Ok(());
        };
        let allowed = data.allowed_child_type_ids.is_empty()
            || data
                .allowed_child_type_ids
                .iter()
                .any(|allowed| self.types.is_subtype_of(type_id, allowed));
        if allowed {
            Ok(())
        } else {
            Err(ServiceError::Constraint(format!(
                "folder {} does not accept children of type {type_id}",
                folder.id
            )))
        }
    }

    /// The content allowance of an object's type.
    pub(crate) fn content_allowance(&self, object: &StoredObject) -> ContentStreamAllowed {
        self.types
            .get(object.type_id())
            .map_or(ContentStreamAllowed::Allowed, |t| t.content_stream_allowed)
    }

    /// Version series objects are never handed out; their latest version is.
    fn visible(&self, object: StoredObject) -> ServiceResult<StoredObject> {
        match object.kind {
            ObjectKind::VersionSeries(_) => Ok(self.store.latest_version(object.id, false)?),
            _ => Ok(object),
        }
    }

    /// Complete the property set of an object.
    pub(crate) fn object_data(&self, object: StoredObject) -> ServiceResult<ObjectData> {
        let mut properties = object.properties();
        match &object.kind {
            ObjectKind::Folder(_) => {
                properties.insert(PropertyData::string(pid::PATH, self.store.object_path(object.id)?));
            }
            ObjectKind::Version(version) => {
                let series = self.store.get_object(version.series_id)?;
                if let Some(data) = series.kind.as_series() {
                    let latest = data.latest(false).map(|v| v.id) == Some(object.id);
                    let latest_major = data.latest(true).map(|v| v.id) == Some(object.id);
                    properties.insert(bool_prop(pid::IS_LATEST_VERSION, latest));
                    properties.insert(bool_prop(pid::IS_LATEST_MAJOR_VERSION, latest_major));
                    properties.insert(bool_prop(pid::IS_VERSION_SERIES_CHECKED_OUT, data.is_checked_out()));
                    if let Some(user) = &data.checked_out_by {
                        properties.insert(PropertyData::string(pid::VERSION_SERIES_CHECKED_OUT_BY, user.clone()));
                    }
                    if let Some(pwc) = data.pwc_id {
                        properties.insert(PropertyData::id_value(pid::VERSION_SERIES_CHECKED_OUT_ID, pwc.to_string()));
                    }
                }
                properties.insert(bool_prop(pid::IS_IMMUTABLE, false));
            }
            ObjectKind::Document(_) => {
                properties.insert(PropertyData::id_value(pid::VERSION_SERIES_ID, object.id.to_string()));
                for id in [pid::IS_LATEST_VERSION, pid::IS_MAJOR_VERSION, pid::IS_LATEST_MAJOR_VERSION] {
                    properties.insert(bool_prop(id, true));
                }
                for id in [pid::IS_PRIVATE_WORKING_COPY, pid::IS_VERSION_SERIES_CHECKED_OUT, pid::IS_IMMUTABLE] {
                    properties.insert(bool_prop(id, false));
                }
            }
            _ => {}
        }
        Ok(ObjectData { object, properties })
    }

    fn object_list(&self, page: ChildrenPage) -> ServiceResult<ObjectList> {
        let objects = page
            .objects
            .into_iter()
            .map(|o| self.object_data(o))
            .collect::<ServiceResult<Vec<_>>>()?;
        Ok(ObjectList {
            objects,
            num_items: page.total,
            has_more: page.has_more,
        })
    }

    fn tree(&self, nodes: Vec<TreeNode>) -> ServiceResult<Vec<ObjectTreeNode>> {
        nodes
            .into_iter()
            .map(|node| {
                Ok(ObjectTreeNode {
                    object: self.object_data(node.object)?,
                    children: self.tree(node.children)?,
                })
            })
            .collect()
    }

    /// The strongest permission the caller holds on an object.
    fn permission_of(&self, id: ObjectId, principal: &str) -> ServiceResult<Option<Permission>> {
        for permission in [Permission::All, Permission::Write, Permission::Read] {
            if self.store.has_access(id, principal, permission)? {
                return Ok(Some(permission));
            }
        }
        Ok(None)
    }

    // ----------------------------------------------------------------
    // Object reads
    // ----------------------------------------------------------------

    pub fn get_object(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<ObjectData> {
        let object = self.load_checked(id, ctx, Permission::Read)?;
        self.object_data(self.visible(object)?)
    }

    pub fn get_object_by_path(&self, ctx: &CallContext, path: &str) -> ServiceResult<ObjectData> {
        let object = self.store.object_by_path(path, Some(self.principal(ctx)))?;
        self.object_data(self.visible(object)?)
    }

    /// Properties of an object, restricted to `filter` unless it is empty or
    /// contains `*`.
    pub fn get_properties(&self, ctx: &CallContext, id: ObjectId, filter: &[&str]) -> ServiceResult<Properties> {
        let data = self.get_object(ctx, id)?;
        if filter.is_empty() || filter.contains(&"*") {
            return Ok(data.properties);
        }
        Ok(data
            .properties
            .iter()
            .filter(|p| filter.contains(&p.id.as_str()))
            .cloned()
            .collect())
    }

    /// The content of a document, or a byte range of it.
    ///
    /// Rendition streams are never produced, so any `stream_id` fails.
    pub fn get_content_stream(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        stream_id: Option<&str>,
        offset: u64,
        length: Option<u64>,
    ) -> ServiceResult<ContentStream> {
        let object = self.visible(self.load_checked(id, ctx, Permission::Read)?)?;
        if let Some(stream_id) = stream_id {
            return Err(ServiceError::Constraint(format!("no rendition {stream_id} for object {id}")));
        }
        let content = object
            .kind
            .content()
            .ok_or_else(|| ServiceError::Constraint(format!("object {id} has no content")))?;
        debug!(%id, offset, ?length, "reading content");
        Ok(content.range(offset, length))
    }

    pub fn get_renditions(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<Vec<Rendition>> {
        self.load_checked(id, ctx, Permission::Read)?;
        Ok(Vec::new())
    }

    pub fn get_allowable_actions(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<AllowableActions> {
        let principal = self.principal(ctx);
        let object = self.visible(self.store.get_object(id)?)?;
        let series = match &object.kind {
            ObjectKind::Version(v) => Some(self.store.get_object(v.series_id)?),
            _ => None,
        };
        let permission = self.permission_of(object.id, principal)?;
        Ok(AllowableActions::compute(ActionInput {
            object: &object,
            series: series.as_ref().and_then(|s| s.kind.as_series()),
            principal,
            is_admin: self.store.is_admin(principal),
            permission,
            is_root: object.id == self.root_folder_id(),
            multi_filing: self.config.multi_filing,
            unfiling: self.config.unfiling,
            content_allowed: self.content_allowance(&object),
        }))
    }

    // ----------------------------------------------------------------
    // Navigation
    // ----------------------------------------------------------------

    /// Children of a folder sorted by name. A missing `max_items` falls back
    /// to the configured default page size.
    pub fn get_children(
        &self,
        ctx: &CallContext,
        folder_id: ObjectId,
        skip: usize,
        max_items: Option<usize>,
    ) -> ServiceResult<ObjectList> {
        self.load_checked(folder_id, ctx, Permission::Read)?;
        let paging = Paging::new(skip, max_items.or(self.config.default_max_items));
        let page = self
            .store
            .children(folder_id, paging, Some(self.principal(ctx)), false)?;
        self.object_list(page)
    }

    /// Child folders of a folder sorted by name.
    pub fn get_folder_children(
        &self,
        ctx: &CallContext,
        folder_id: ObjectId,
        skip: usize,
        max_items: Option<usize>,
    ) -> ServiceResult<ObjectList> {
        self.load_checked(folder_id, ctx, Permission::Read)?;
        let paging = Paging::new(skip, max_items.or(self.config.default_max_items));
        let page = self
            .store
            .folder_children(folder_id, paging, Some(self.principal(ctx)))?;
        self.object_list(page)
    }

    /// Descendants down to `depth` levels; `-1` is unlimited.
    pub fn get_descendants(&self, ctx: &CallContext, folder_id: ObjectId, depth: i32) -> ServiceResult<Vec<ObjectTreeNode>> {
        self.load_checked(folder_id, ctx, Permission::Read)?;
        let nodes = self
            .store
            .descendants(folder_id, depth, Some(self.principal(ctx)), false)?;
        self.tree(nodes)
    }

    /// Like [`get_descendants`](Self::get_descendants) but folders only.
    pub fn get_folder_tree(&self, ctx: &CallContext, folder_id: ObjectId, depth: i32) -> ServiceResult<Vec<ObjectTreeNode>> {
        self.load_checked(folder_id, ctx, Permission::Read)?;
        let nodes = self
            .store
            .descendants(folder_id, depth, Some(self.principal(ctx)), true)?;
        self.tree(nodes)
    }

    pub fn get_folder_parent(&self, ctx: &CallContext, folder_id: ObjectId) -> ServiceResult<ObjectData> {
        let folder = self.load_checked(folder_id, ctx, Permission::Read)?;
        let parent = folder
            .kind
            .as_folder()
            .ok_or_else(|| ServiceError::InvalidArgument(format!("object {folder_id} is not a folder")))?
            .parent_id
            .ok_or_else(|| ServiceError::InvalidArgument("the root folder has no parent".into()))?;
        let parent = self.load_checked(parent, ctx, Permission::Read)?;
        self.object_data(parent)
    }

    /// Parent folders the caller may read, with the name the object is filed
    /// under.
    pub fn get_object_parents(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<Vec<ObjectParent>> {
        let object = self.load_checked(id, ctx, Permission::Read)?;
        let principal = self.principal(ctx);
        let mut parents = Vec::new();
        for parent_id in self.store.parent_ids(id)? {
            if !self.store.has_access(parent_id, principal, Permission::Read)? {
                continue;
            }
            parents.push(ObjectParent {
                parent: self.object_data(self.store.get_object(parent_id)?)?,
                relative_path_segment: object.name().to_string(),
            });
        }
        Ok(parents)
    }

    /// Private working copies the caller may read, optionally in one folder.
    pub fn get_checked_out_docs(&self, ctx: &CallContext, folder_id: Option<ObjectId>) -> ServiceResult<Vec<ObjectData>> {
        if let Some(folder_id) = folder_id {
            self.load_checked(folder_id, ctx, Permission::Read)?;
        }
        self.store
            .checked_out_documents(folder_id, Some(self.principal(ctx)))
            .into_iter()
            .map(|o| self.object_data(o))
            .collect()
    }

    /// Relationships with `id` as an endpoint.
    ///
    /// `type_id` restricts the result to one type, plus its subtypes when
    /// `include_subtypes` is set.
    pub fn get_relationships(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        type_id: Option<&str>,
        include_subtypes: bool,
        direction: RelationshipDirection,
    ) -> ServiceResult<Vec<ObjectData>> {
        self.load_checked(id, ctx, Permission::Read)?;
        let type_ids = match type_id {
            Some(t) if include_subtypes => self.types.type_and_descendants(t),
            Some(t) => vec![t.to_string()],
            None => Vec::new(),
        };
        self.store
            .relationships(id, &type_ids, direction, Some(self.principal(ctx)))
            .into_iter()
            .map(|o| self.object_data(o))
            .collect()
    }

    pub fn get_acl(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<Vec<Ace>> {
        self.load_checked(id, ctx, Permission::Read)?;
        Ok(self.store.acl_of(id)?.to_vec())
    }
}

fn bool_prop(id: &str, value: bool) -> PropertyData {
    PropertyData::single(id, PropertyValue::Boolean(value))
}

impl<S> std::fmt::Debug for ObjectService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectService")
            .field("repository_id", &self.config.repository_id)
            .field("types", &self.types.len())
            .finish()
    }
}
