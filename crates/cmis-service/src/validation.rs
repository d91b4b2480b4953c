//! Property validation against the type system.
//!
//! Creation and update requests carry a flat property bag. Validation checks
//! every entry against the definitions of the object's primary and secondary
//! types and splits the bag into what the store keeps in dedicated fields
//! (name, description, secondary types, kind-specific system values) and the
//! custom properties stored verbatim.

use cmis_store::StoredObject;
use cmis_types::{
    property_ids as pid, BaseTypeId, Cardinality, Properties, PropertyData, Updatability,
};

use crate::error::{ServiceError, ServiceResult};
use crate::types::{PropertyDefinition, TypeDefinition, TypeRegistry};

/// Properties the store keeps outside the custom property bag.
const MAPPED: [&str; 8] = [
    pid::NAME,
    pid::OBJECT_TYPE_ID,
    pid::SECONDARY_OBJECT_TYPE_IDS,
    pid::DESCRIPTION,
    pid::POLICY_TEXT,
    pid::SOURCE_ID,
    pid::TARGET_ID,
    pid::ALLOWED_CHILD_OBJECT_TYPE_IDS,
];

/// A validated creation request.
#[derive(Clone, Debug)]
pub struct CreateProperties {
    pub name: String,
    pub type_def: TypeDefinition,
    pub secondary_type_ids: Vec<String>,
    pub description: Option<String>,
    /// Values of `cmis:policyText`, `cmis:sourceId`, `cmis:targetId`, and
    /// `cmis:allowedChildObjectTypeIds` when given.
    pub system: Properties,
    /// Everything else, defaults applied.
    pub custom: Properties,
}

/// A validated update request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdatePlan {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub secondary_type_ids: Option<Vec<String>>,
    pub policy_text: Option<Option<String>>,
    pub set: Vec<PropertyData>,
    pub remove: Vec<String>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the plan to a copy of a stored object.
    pub fn apply(self, object: &mut StoredObject) {
        let meta = &mut object.meta;
        if let Some(name) = self.name {
            meta.name = name;
        }
        if let Some(description) = self.description {
            meta.description = description;
        }
        if let Some(secondary) = self.secondary_type_ids {
            meta.secondary_type_ids = secondary;
        }
        for id in &self.remove {
            meta.properties.remove(id);
        }
        for property in self.set {
            meta.properties.insert(property);
        }
        if let Some(text) = self.policy_text {
            if let cmis_store::ObjectKind::Policy(policy) = &mut object.kind {
                policy.policy_text = text;
            }
        }
    }
}

fn check_secondary_types(registry: &TypeRegistry, ids: &[String]) -> ServiceResult<()> {
    for id in ids {
        let def = registry.require(id)?;
        if def.base != BaseTypeId::Secondary {
            return Err(ServiceError::InvalidArgument(format!("{id} is not a secondary type")));
        }
    }
    Ok(())
}

fn check_values(property: &PropertyData, def: &PropertyDefinition) -> ServiceResult<()> {
    if def.cardinality == Cardinality::Single && property.values.len() > 1 {
        return Err(ServiceError::InvalidArgument(format!(
            "property {} is single-valued but has {} values",
            property.id,
            property.values.len()
        )));
    }
    property.check_type(def.property_type)?;
    Ok(())
}

fn single_string(property: &PropertyData) -> Option<String> {
    property.first_str().map(str::to_string)
}

/// Validate the properties of an object about to be created.
///
/// `expected` is the base type the create operation produces.
pub fn validate_create(
    registry: &TypeRegistry,
    properties: &Properties,
    expected: BaseTypeId,
) -> ServiceResult<CreateProperties> {
    let type_id = properties
        .type_id()
        .ok_or_else(|| ServiceError::InvalidArgument("cmis:objectTypeId is required".into()))?;
    let type_def = registry.require(type_id)?;
    if type_def.base != expected {
        return Err(ServiceError::InvalidArgument(format!(
            "type {type_id} is a {} type, expected {expected}",
            type_def.base
        )));
    }
    let name = properties
        .name()
        .map(str::to_string)
        .ok_or_else(|| ServiceError::InvalidArgument("cmis:name is required".into()))?;

    let secondary_type_ids = properties.secondary_type_ids().unwrap_or_default();
    check_secondary_types(registry, &secondary_type_ids)?;

    let mut all_types = vec![type_def.id.clone()];
    all_types.extend(secondary_type_ids.iter().cloned());

    let mut system = Properties::new();
    let mut custom = Properties::new();
    let mut description = None;
    for property in properties.iter() {
        let def = registry
            .property_definition(&all_types, &property.id)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("unknown property {}", property.id)))?;
        if def.updatability == Updatability::ReadOnly {
            return Err(ServiceError::Constraint(format!("property {} is read-only", property.id)));
        }
        check_values(property, &def)?;

        match property.id.as_str() {
            pid::NAME | pid::OBJECT_TYPE_ID | pid::SECONDARY_OBJECT_TYPE_IDS => {}
            pid::DESCRIPTION => description = single_string(property),
            pid::POLICY_TEXT | pid::SOURCE_ID | pid::TARGET_ID | pid::ALLOWED_CHILD_OBJECT_TYPE_IDS => {
                system.insert(property.clone());
            }
            _ => {
                custom.insert(property.clone());
            }
        }
    }

    for def in registry.property_definitions(&all_types) {
        let given = properties.get(&def.id).is_some_and(|p| !p.is_empty());
        if given || MAPPED.contains(&def.id.as_str()) {
            continue;
        }
        if !def.default_value.is_empty() {
            custom.insert(PropertyData::multi(def.id.clone(), def.default_value.clone()));
        } else if def.required {
            return Err(ServiceError::Constraint(format!("property {} is required", def.id)));
        }
    }
    for id in [pid::SOURCE_ID, pid::TARGET_ID] {
        let required = type_def.property(id).is_some_and(|d| d.required);
        if required && system.first_str(id).is_none() {
            return Err(ServiceError::Constraint(format!("property {id} is required")));
        }
    }

    Ok(CreateProperties {
        name,
        type_def,
        secondary_type_ids,
        description,
        system,
        custom,
    })
}

/// Validate an update of `object`'s properties.
///
/// `is_pwc` tells whether the object is a private working copy, the only
/// state in which `WhenCheckedOut` properties may change.
pub fn validate_update(
    registry: &TypeRegistry,
    object: &StoredObject,
    is_pwc: bool,
    changes: &Properties,
) -> ServiceResult<UpdatePlan> {
    let current_secondaries = object.meta.secondary_type_ids.clone();
    let new_secondaries = match changes.get(pid::SECONDARY_OBJECT_TYPE_IDS) {
        Some(property) => {
            let ids = property.strings();
            check_secondary_types(registry, &ids)?;
            Some(ids)
        }
        None => None,
    };

    let mut lookup = vec![object.type_id().to_string()];
    lookup.extend(new_secondaries.iter().flatten().cloned());
    lookup.extend(current_secondaries.iter().cloned());

    let mut plan = UpdatePlan::default();
    for property in changes.iter() {
        if property.id == pid::OBJECT_TYPE_ID && property.first_str() == Some(object.type_id()) {
            continue;
        }
        let def = registry
            .property_definition(&lookup, &property.id)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("unknown property {}", property.id)))?;
        match def.updatability {
            Updatability::ReadOnly => {
                return Err(ServiceError::Constraint(format!("property {} is read-only", property.id)))
            }
            Updatability::OnCreate => {
                return Err(ServiceError::Constraint(format!(
                    "property {} can only be set on create",
                    property.id
                )))
            }
            Updatability::WhenCheckedOut if !is_pwc => {
                return Err(ServiceError::Constraint(format!(
                    "property {} can only be updated on a private working copy",
                    property.id
                )))
            }
            Updatability::WhenCheckedOut | Updatability::ReadWrite => {}
        }
        if property.is_empty() && def.required {
            return Err(ServiceError::Constraint(format!(
                "required property {} cannot be removed",
                property.id
            )));
        }
        check_values(property, &def)?;

        match property.id.as_str() {
            pid::NAME => {
                let name = single_string(property).unwrap_or_default();
                if name.trim().is_empty() {
                    return Err(ServiceError::Constraint("cmis:name must not be empty".into()));
                }
                plan.name = Some(name);
            }
            pid::DESCRIPTION => plan.description = Some(single_string(property)),
            pid::POLICY_TEXT => plan.policy_text = Some(single_string(property)),
            pid::SECONDARY_OBJECT_TYPE_IDS => {}
            _ if property.is_empty() => plan.remove.push(property.id.clone()),
            _ => plan.set.push(property.clone()),
        }
    }

    if let Some(new_ids) = new_secondaries {
        let mut kept = vec![object.type_id().to_string()];
        kept.extend(new_ids.iter().cloned());
        let dropped: Vec<String> = current_secondaries
            .iter()
            .filter(|id| !new_ids.contains(id))
            .cloned()
            .collect();
        for def in registry.property_definitions(&dropped) {
            let still_defined = registry.property_definition(&kept, &def.id).is_some();
            if !still_defined && object.meta.properties.contains(&def.id) {
                plan.remove.push(def.id);
            }
        }
        plan.set.retain(|p| registry.property_definition(&kept, &p.id).is_some());
        plan.secondary_type_ids = Some(new_ids);
    }
    Ok(plan)
}
