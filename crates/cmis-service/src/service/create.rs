use cmis_store::{NewObject, ObjectKind, ObjectStore, RepositoryStore, StoredObject};
use cmis_types::{
    property_ids as pid, Ace, BaseTypeId, ContentStream, ContentStreamAllowed, ObjectId, Permission,
    Properties, PropertyData, PropertyValue, VersioningState,
};
use tracing::{debug, info};

use super::ObjectService;
use crate::context::{expand_acl_macros, CallContext};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{validate_create, CreateProperties};

/// Policies and ACL entries applied to a new object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateExtras {
    pub policies: Vec<ObjectId>,
    pub add_aces: Vec<Ace>,
    pub remove_aces: Vec<Ace>,
}

impl CreateExtras {
    pub fn with_aces(add: Vec<Ace>, remove: Vec<Ace>) -> Self {
        Self {
            add_aces: add,
            remove_aces: remove,
            ..Self::default()
        }
    }
}

fn parse_id(properties: &Properties, id: &str) -> ServiceResult<ObjectId> {
    let value = properties
        .first_str(id)
        .ok_or_else(|| ServiceError::InvalidArgument(format!("{id} is required")))?;
    Ok(value.parse()?)
}

impl<S: RepositoryStore> ObjectService<S> {
    fn new_object(&self, validated: &CreateProperties, principal: &str, extras: CreateExtras) -> NewObject {
        let mut new = NewObject::new(validated.name.clone(), validated.type_def.id.clone(), principal)
            .with_properties(validated.custom.clone())
            .with_policies(extras.policies)
            .with_aces(
                expand_acl_macros(&extras.add_aces, principal),
                expand_acl_macros(&extras.remove_aces, principal),
            );
        new.secondary_type_ids = validated.secondary_type_ids.clone();
        new.description = validated.description.clone();
        new
    }

    /// Resolve an optional parent folder and check it accepts `type_id`.
    fn parent_for(&self, ctx: &CallContext, folder_id: Option<ObjectId>, type_id: &str) -> ServiceResult<Vec<ObjectId>> {
        match folder_id {
            Some(id) => {
                let folder = self.writable_folder(id, ctx)?;
                self.check_child_type(&folder, type_id)?;
                Ok(vec![id])
            }
            None => Ok(Vec::new()),
        }
    }

    /// Create a document, versioned when its type is versionable.
    ///
    /// A versionable type created with `VersioningState::None` starts as a
    /// major version. Content gets the document name and
    /// `application/octet-stream` when it lacks a file name or mime type.
    pub fn create_document(
        &self,
        ctx: &CallContext,
        properties: &Properties,
        folder_id: Option<ObjectId>,
        content: Option<ContentStream>,
        versioning_state: VersioningState,
        extras: CreateExtras,
    ) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let validated = validate_create(&self.types, properties, BaseTypeId::Document)?;
        let type_def = &validated.type_def;
        let parents = self.parent_for(ctx, folder_id, &type_def.id)?;

        match (type_def.content_stream_allowed, &content) {
            (ContentStreamAllowed::NotAllowed, Some(_)) => {
                return Err(ServiceError::Constraint(format!("type {} does not allow content", type_def.id)))
            }
            (ContentStreamAllowed::Required, None) => {
                return Err(ServiceError::Constraint(format!("type {} requires content", type_def.id)))
            }
            _ => {}
        }
        if !type_def.versionable && versioning_state != VersioningState::None {
            return Err(ServiceError::Constraint(format!("type {} is not versionable", type_def.id)));
        }

        let content = content.map(|c| c.with_defaults(&validated.name));
        let new = self.new_object(&validated, principal, extras);
        let draft = if type_def.versionable {
            let state = match versioning_state {
                VersioningState::None => VersioningState::Major,
                state => state,
            };
            self.store.create_versioned_document(new, parents, content, state)?
        } else {
            self.store.create_document(new, parents, content)?
        };
        let id = self.store.persist(draft)?;
        debug!(%id, name = %validated.name, %principal, "created document");
        Ok(id)
    }

    /// Create a document copying the properties and content of `source_id`.
    ///
    /// `properties` override the copied ones.
    pub fn create_document_from_source(
        &self,
        ctx: &CallContext,
        source_id: ObjectId,
        properties: &Properties,
        folder_id: Option<ObjectId>,
        versioning_state: VersioningState,
        extras: CreateExtras,
    ) -> ServiceResult<ObjectId> {
        let source = self.visible(self.load_checked(source_id, ctx, Permission::Read)?)?;
        if !matches!(source.kind, ObjectKind::Document(_) | ObjectKind::Version(_)) {
            return Err(ServiceError::InvalidArgument(format!("object {source_id} is not a document")));
        }

        let mut merged = copied_properties(&source);
        merged.merge(properties);
        let content = source.kind.content().cloned();
        self.create_document(ctx, &merged, folder_id, content, versioning_state, extras)
    }

    pub fn create_folder(
        &self,
        ctx: &CallContext,
        properties: &Properties,
        folder_id: ObjectId,
        extras: CreateExtras,
    ) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let validated = validate_create(&self.types, properties, BaseTypeId::Folder)?;
        let parent = self.writable_folder(folder_id, ctx)?;
        self.check_child_type(&parent, &validated.type_def.id)?;

        let allowed = validated
            .system
            .get(pid::ALLOWED_CHILD_OBJECT_TYPE_IDS)
            .map(PropertyData::strings)
            .unwrap_or_default();
        for type_id in &allowed {
            self.types.require(type_id)?;
        }

        let new = self.new_object(&validated, principal, extras);
        let draft = self.store.create_folder(new, folder_id, allowed)?;
        let id = self.store.persist(draft)?;
        debug!(%id, name = %validated.name, parent = %folder_id, "created folder");
        Ok(id)
    }

    pub fn create_item(
        &self,
        ctx: &CallContext,
        properties: &Properties,
        folder_id: Option<ObjectId>,
        extras: CreateExtras,
    ) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let validated = validate_create(&self.types, properties, BaseTypeId::Item)?;
        let parents = self.parent_for(ctx, folder_id, &validated.type_def.id)?;
        let new = self.new_object(&validated, principal, extras);
        let draft = self.store.create_item(new, parents)?;
        let id = self.store.persist(draft)?;
        debug!(%id, name = %validated.name, "created item");
        Ok(id)
    }

    /// Create an unfiled policy object.
    pub fn create_policy(&self, ctx: &CallContext, properties: &Properties, extras: CreateExtras) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let validated = validate_create(&self.types, properties, BaseTypeId::Policy)?;
        let text = validated.system.first_str(pid::POLICY_TEXT).map(str::to_string);
        let new = self.new_object(&validated, principal, extras);
        let draft = self.store.create_policy(new, text)?;
        let id = self.store.persist(draft)?;
        debug!(%id, name = %validated.name, "created policy");
        Ok(id)
    }

    /// Create a relationship between two existing objects the caller can
    /// read.
    pub fn create_relationship(
        &self,
        ctx: &CallContext,
        properties: &Properties,
        extras: CreateExtras,
    ) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let validated = validate_create(&self.types, properties, BaseTypeId::Relationship)?;
        let source_id = parse_id(&validated.system, pid::SOURCE_ID)?;
        let target_id = parse_id(&validated.system, pid::TARGET_ID)?;

        let source = self.endpoint(ctx, source_id)?;
        let target = self.endpoint(ctx, target_id)?;
        let type_def = &validated.type_def;
        self.check_endpoint_type(&source, &type_def.allowed_source_types, "source")?;
        self.check_endpoint_type(&target, &type_def.allowed_target_types, "target")?;

        let new = self.new_object(&validated, principal, extras);
        let draft = self.store.create_relationship(new, source_id, target_id)?;
        let id = self.store.persist(draft)?;
        info!(%id, source = %source_id, target = %target_id, "created relationship");
        Ok(id)
    }

    fn endpoint(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<StoredObject> {
        if !self.store.exists(id) {
            return Err(ServiceError::InvalidArgument(format!("relationship endpoint {id} does not exist")));
        }
        self.load_checked(id, ctx, Permission::Read)
    }

    fn check_endpoint_type(&self, object: &StoredObject, allowed: &[String], role: &str) -> ServiceResult<()> {
        if allowed.is_empty() || allowed.iter().any(|t| self.types.is_subtype_of(object.type_id(), t)) {
            Ok(())
        } else {
            Err(ServiceError::Constraint(format!(
                "type {} is not an allowed relationship {role}",
                object.type_id()
            )))
        }
    }
}

/// Name, type, description, secondary types and custom properties of a
/// document, as input for a copy.
fn copied_properties(source: &StoredObject) -> Properties {
    let meta = &source.meta;
    let mut props = meta.properties.clone();
    props.insert(PropertyData::string(pid::NAME, meta.name.clone()));
    props.insert(PropertyData::id_value(pid::OBJECT_TYPE_ID, meta.type_id.clone()));
    if !meta.secondary_type_ids.is_empty() {
        props.insert(PropertyData::multi(
            pid::SECONDARY_OBJECT_TYPE_IDS,
            meta.secondary_type_ids.iter().cloned().map(PropertyValue::Id).collect(),
        ));
    }
    if let Some(description) = &meta.description {
        props.insert(PropertyData::string(pid::DESCRIPTION, description.clone()));
    }
    props
}
