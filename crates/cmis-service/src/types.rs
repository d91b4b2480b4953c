//! The repository type system.
//!
//! Every object has a primary type derived from one of the six CMIS base
//! types and any number of secondary types. Types declare the properties an
//! object may carry and, for documents and relationships, a few behavioural
//! switches (versionability, content allowance, endpoint restrictions).

use std::collections::BTreeMap;

use cmis_types::{
    property_ids as pid, BaseTypeId, Cardinality, ContentStreamAllowed, PropertyType, PropertyValue,
    Updatability,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// Declaration of one property of a type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: String,
    pub property_type: PropertyType,
    pub cardinality: Cardinality,
    pub updatability: Updatability,
    pub required: bool,
    /// Values applied on create when the caller supplies none.
    pub default_value: Vec<PropertyValue>,
}

impl PropertyDefinition {
    pub fn new(
        id: impl Into<String>,
        property_type: PropertyType,
        cardinality: Cardinality,
        updatability: Updatability,
    ) -> Self {
        Self {
            id: id.into(),
            property_type,
            cardinality,
            updatability,
            required: false,
            default_value: Vec::new(),
        }
    }

    /// A single-valued, read-write property.
    pub fn single(id: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(id, property_type, Cardinality::Single, Updatability::ReadWrite)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, values: Vec<PropertyValue>) -> Self {
        self.default_value = values;
        self
    }

    pub fn with_updatability(mut self, updatability: Updatability) -> Self {
        self.updatability = updatability;
        self
    }

    fn read_only(id: &str, property_type: PropertyType) -> Self {
        Self::new(id, property_type, Cardinality::Single, Updatability::ReadOnly)
    }
}

/// An object type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub id: String,
    pub base: BaseTypeId,
    /// `None` for base types.
    pub parent_id: Option<String>,
    pub display_name: String,
    pub property_definitions: BTreeMap<String, PropertyDefinition>,
    pub versionable: bool,
    pub content_stream_allowed: ContentStreamAllowed,
    /// Allowed relationship source types; empty allows any.
    pub allowed_source_types: Vec<String>,
    /// Allowed relationship target types; empty allows any.
    pub allowed_target_types: Vec<String>,
}

impl TypeDefinition {
    /// A custom type deriving directly from `base`.
    pub fn new(id: impl Into<String>, base: BaseTypeId) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            base,
            parent_id: Some(base.as_str().to_string()),
            property_definitions: BTreeMap::new(),
            versionable: false,
            content_stream_allowed: default_content_allowance(base),
            allowed_source_types: Vec::new(),
            allowed_target_types: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_property(mut self, definition: PropertyDefinition) -> Self {
        self.property_definitions.insert(definition.id.clone(), definition);
        self
    }

    pub fn versionable(mut self, versionable: bool) -> Self {
        self.versionable = versionable;
        self
    }

    pub fn with_content(mut self, allowed: ContentStreamAllowed) -> Self {
        self.content_stream_allowed = allowed;
        self
    }

    pub fn with_endpoints(mut self, sources: Vec<String>, targets: Vec<String>) -> Self {
        self.allowed_source_types = sources;
        self.allowed_target_types = targets;
        self
    }

    pub fn property(&self, id: &str) -> Option<&PropertyDefinition> {
        self.property_definitions.get(id)
    }

    pub fn is_base(&self) -> bool {
        self.parent_id.is_none()
    }

    fn base_type(base: BaseTypeId) -> Self {
        let mut def = Self::new(base.as_str(), base);
        def.parent_id = None;
        for prop in base_properties(base) {
            def.property_definitions.insert(prop.id.clone(), prop);
        }
        def
    }
}

fn default_content_allowance(base: BaseTypeId) -> ContentStreamAllowed {
    match base {
        BaseTypeId::Document => ContentStreamAllowed::Allowed,
        _ => ContentStreamAllowed::NotAllowed,
    }
}

fn base_properties(base: BaseTypeId) -> Vec<PropertyDefinition> {
    use PropertyType::{Boolean, DateTime, Id, Integer, String};

    if base == BaseTypeId::Secondary {
        return Vec::new();
    }

    let mut props = vec![
        PropertyDefinition::single(pid::NAME, String).required(),
        PropertyDefinition::single(pid::DESCRIPTION, String),
        PropertyDefinition::read_only(pid::OBJECT_ID, Id),
        PropertyDefinition::single(pid::OBJECT_TYPE_ID, Id)
            .required()
            .with_updatability(Updatability::OnCreate),
        PropertyDefinition::read_only(pid::BASE_TYPE_ID, Id),
        PropertyDefinition::new(pid::SECONDARY_OBJECT_TYPE_IDS, Id, Cardinality::Multi, Updatability::ReadWrite),
        PropertyDefinition::read_only(pid::CREATED_BY, String),
        PropertyDefinition::read_only(pid::CREATION_DATE, DateTime),
        PropertyDefinition::read_only(pid::LAST_MODIFIED_BY, String),
        PropertyDefinition::read_only(pid::LAST_MODIFICATION_DATE, DateTime),
        PropertyDefinition::read_only(pid::CHANGE_TOKEN, String),
    ];

    match base {
        BaseTypeId::Folder => {
            props.push(PropertyDefinition::read_only(pid::PARENT_ID, Id));
            props.push(PropertyDefinition::read_only(pid::PATH, String));
            props.push(PropertyDefinition::new(
                pid::ALLOWED_CHILD_OBJECT_TYPE_IDS,
                Id,
                Cardinality::Multi,
                Updatability::OnCreate,
            ));
        }
        BaseTypeId::Document => {
            for (id, ty) in [
                (pid::IS_IMMUTABLE, Boolean),
                (pid::IS_LATEST_VERSION, Boolean),
                (pid::IS_MAJOR_VERSION, Boolean),
                (pid::IS_LATEST_MAJOR_VERSION, Boolean),
                (pid::IS_PRIVATE_WORKING_COPY, Boolean),
                (pid::VERSION_LABEL, String),
                (pid::VERSION_SERIES_ID, Id),
                (pid::IS_VERSION_SERIES_CHECKED_OUT, Boolean),
                (pid::VERSION_SERIES_CHECKED_OUT_BY, String),
                (pid::VERSION_SERIES_CHECKED_OUT_ID, Id),
                (pid::CHECKIN_COMMENT, String),
                (pid::CONTENT_STREAM_LENGTH, Integer),
                (pid::CONTENT_STREAM_MIME_TYPE, String),
                (pid::CONTENT_STREAM_FILE_NAME, String),
            ] {
                props.push(PropertyDefinition::read_only(id, ty));
            }
        }
        BaseTypeId::Relationship => {
            for id in [pid::SOURCE_ID, pid::TARGET_ID] {
                props.push(
                    PropertyDefinition::single(id, Id)
                        .required()
                        .with_updatability(Updatability::OnCreate),
                );
            }
        }
        BaseTypeId::Policy => props.push(PropertyDefinition::single(pid::POLICY_TEXT, String)),
        BaseTypeId::Item | BaseTypeId::Secondary => {}
    }
    props
}

/// Thread-safe registry of type definitions.
#[derive(Debug)]
pub struct TypeRegistry {
    types: RwLock<BTreeMap<String, TypeDefinition>>,
}

impl TypeRegistry {
    /// A registry holding the six base types.
    pub fn new() -> Self {
        let types = BaseTypeId::all()
            .into_iter()
            .map(|base| (base.as_str().to_string(), TypeDefinition::base_type(base)))
            .collect();
        Self {
            types: RwLock::new(types),
        }
    }

    pub fn get(&self, id: &str) -> Option<TypeDefinition> {
        self.types.read().get(id).cloned()
    }

    /// Look up a type, failing with `InvalidArgument` if unknown.
    pub fn require(&self, id: &str) -> ServiceResult<TypeDefinition> {
        self.get(id)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("unknown type: {id}")))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Register a custom type.
    ///
    /// The parent must exist and share the base type. Property definitions
    /// of the parent are inherited and must not be redeclared.
    pub fn add_type(&self, mut definition: TypeDefinition) -> ServiceResult<()> {
        if definition.id.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("type id must not be empty".into()));
        }
        let mut types = self.types.write();
        if types.contains_key(&definition.id) {
            return Err(ServiceError::InvalidArgument(format!(
                "type {} already exists",
                definition.id
            )));
        }
        let parent_id = definition
            .parent_id
            .clone()
            .ok_or_else(|| ServiceError::InvalidArgument("a custom type needs a parent".into()))?;
        let parent = types
            .get(&parent_id)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("unknown parent type: {parent_id}")))?;
        if parent.base != definition.base {
            return Err(ServiceError::InvalidArgument(format!(
                "type {} has base {} but its parent {} has base {}",
                definition.id, definition.base, parent.id, parent.base
            )));
        }
        for (id, inherited) in &parent.property_definitions {
            if definition.property_definitions.contains_key(id) {
                return Err(ServiceError::InvalidArgument(format!(
                    "property {id} is already defined by {}",
                    parent.id
                )));
            }
            definition.property_definitions.insert(id.clone(), inherited.clone());
        }
        debug!(type_id = %definition.id, parent = %parent_id, "registered type");
        types.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Remove a custom type that has no subtypes and no objects.
    pub fn remove_type(&self, id: &str, in_use: bool) -> ServiceResult<()> {
        let mut types = self.types.write();
        let Some(definition) = types.get(id) else {
            return Err(ServiceError::NotFound(format!("type {id}")));
        };
        if definition.is_base() {
            return Err(ServiceError::Constraint(format!("base type {id} cannot be removed")));
        }
        if types.values().any(|t| t.parent_id.as_deref() == Some(id)) {
            return Err(ServiceError::Constraint(format!("type {id} has subtypes")));
        }
        if in_use {
            return Err(ServiceError::Constraint(format!("type {id} is in use")));
        }
        types.remove(id);
        debug!(type_id = %id, "removed type");
        Ok(())
    }

    /// Returns `true` if `type_id` is `ancestor` or derives from it.
    pub fn is_subtype_of(&self, type_id: &str, ancestor: &str) -> bool {
        let types = self.types.read();
        let mut current = Some(type_id.to_string());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = types.get(&id).and_then(|t| t.parent_id.clone());
        }
        false
    }

    /// `type_id` followed by every type deriving from it.
    pub fn type_and_descendants(&self, type_id: &str) -> Vec<String> {
        let ids: Vec<String> = self.types.read().keys().cloned().collect();
        ids.into_iter()
            .filter(|id| self.is_subtype_of(id, type_id))
            .collect()
    }

    /// Find a property definition on any of the given types.
    pub fn property_definition(&self, type_ids: &[String], property_id: &str) -> Option<PropertyDefinition> {
        let types = self.types.read();
        type_ids
            .iter()
            .filter_map(|id| types.get(id))
            .find_map(|t| t.property(property_id).cloned())
    }

    /// Every property definition of the given types, first declaration wins.
    pub fn property_definitions(&self, type_ids: &[String]) -> Vec<PropertyDefinition> {
        let types = self.types.read();
        let mut seen = BTreeMap::new();
        for t in type_ids.iter().filter_map(|id| types.get(id)) {
            for (id, def) in &t.property_definitions {
                seen.entry(id.clone()).or_insert_with(|| def.clone());
            }
        }
        seen.into_values().collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
