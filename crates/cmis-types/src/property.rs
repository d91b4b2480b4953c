use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::schema::PropertyType;

/// Well-known CMIS property identifiers.
pub mod property_ids {
    pub const NAME: &str = "cmis:name";
    pub const DESCRIPTION: &str = "cmis:description";
    pub const OBJECT_ID: &str = "cmis:objectId";
    pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
    pub const BASE_TYPE_ID: &str = "cmis:baseTypeId";
    pub const SECONDARY_OBJECT_TYPE_IDS: &str = "cmis:secondaryObjectTypeIds";
    pub const CREATED_BY: &str = "cmis:createdBy";
    pub const CREATION_DATE: &str = "cmis:creationDate";
    pub const LAST_MODIFIED_BY: &str = "cmis:lastModifiedBy";
    pub const LAST_MODIFICATION_DATE: &str = "cmis:lastModificationDate";
    pub const CHANGE_TOKEN: &str = "cmis:changeToken";
    pub const PARENT_ID: &str = "cmis:parentId";
    pub const PATH: &str = "cmis:path";
    pub const ALLOWED_CHILD_OBJECT_TYPE_IDS: &str = "cmis:allowedChildObjectTypeIds";
    pub const SOURCE_ID: &str = "cmis:sourceId";
    pub const TARGET_ID: &str = "cmis:targetId";
    pub const POLICY_TEXT: &str = "cmis:policyText";
    pub const IS_IMMUTABLE: &str = "cmis:isImmutable";
    pub const IS_LATEST_VERSION: &str = "cmis:isLatestVersion";
    pub const IS_MAJOR_VERSION: &str = "cmis:isMajorVersion";
    pub const IS_LATEST_MAJOR_VERSION: &str = "cmis:isLatestMajorVersion";
    pub const IS_PRIVATE_WORKING_COPY: &str = "cmis:isPrivateWorkingCopy";
    pub const VERSION_LABEL: &str = "cmis:versionLabel";
    pub const VERSION_SERIES_ID: &str = "cmis:versionSeriesId";
    pub const IS_VERSION_SERIES_CHECKED_OUT: &str = "cmis:isVersionSeriesCheckedOut";
    pub const VERSION_SERIES_CHECKED_OUT_BY: &str = "cmis:versionSeriesCheckedOutBy";
    pub const VERSION_SERIES_CHECKED_OUT_ID: &str = "cmis:versionSeriesCheckedOutId";
    pub const CHECKIN_COMMENT: &str = "cmis:checkinComment";
    pub const CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";
    pub const CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
    pub const CONTENT_STREAM_FILE_NAME: &str = "cmis:contentStreamFileName";
}

/// A single typed property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    String(String),
    Id(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Uri(String),
    Html(String),
}

impl PropertyValue {
    /// The property type this value belongs to.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::Id(_) => PropertyType::Id,
            Self::Integer(_) => PropertyType::Integer,
            Self::Decimal(_) => PropertyType::Decimal,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::DateTime(_) => PropertyType::DateTime,
            Self::Uri(_) => PropertyType::Uri,
            Self::Html(_) => PropertyType::Html,
        }
    }

    /// The textual payload of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Id(s) | Self::Uri(s) | Self::Html(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// A property: its id plus zero or more values.
///
/// An empty value list means "no value"; on update it requests deletion of
/// the property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    pub id: String,
    pub values: Vec<PropertyValue>,
}

impl PropertyData {
    /// A property with exactly one value.
    pub fn single(id: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            id: id.into(),
            values: vec![value],
        }
    }

    /// A property with a list of values.
    pub fn multi(id: impl Into<String>, values: Vec<PropertyValue>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    /// A property without value (a deletion request on update).
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: Vec::new(),
        }
    }

    pub fn string(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(id, PropertyValue::String(value.into()))
    }

    pub fn id_value(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(id, PropertyValue::Id(value.into()))
    }

    pub fn first(&self) -> Option<&PropertyValue> {
        self.values.first()
    }

    pub fn first_str(&self) -> Option<&str> {
        self.first().and_then(PropertyValue::as_str)
    }

    /// All string-like values, skipping anything else.
    pub fn strings(&self) -> Vec<String> {
        self.values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check every value against the expected property type.
    pub fn check_type(&self, expected: PropertyType) -> Result<(), TypeError> {
        for value in &self.values {
            let actual = value.property_type();
            // ids and strings are interchangeable on input
            let compatible = actual == expected
                || matches!(
                    (actual, expected),
                    (PropertyType::String, PropertyType::Id) | (PropertyType::Id, PropertyType::String)
                );
            if !compatible {
                return Err(TypeError::PropertyTypeMismatch {
                    id: self.id.clone(),
                    expected: expected.as_str(),
                    actual: actual.as_str(),
                });
            }
        }
        Ok(())
    }
}

/// An ordered bag of properties keyed by property id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties(BTreeMap<String, PropertyData>);

impl Properties {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, property: PropertyData) -> Self {
        self.insert(property);
        self
    }

    /// Insert or replace a property, returning the previous one.
    pub fn insert(&mut self, property: PropertyData) -> Option<PropertyData> {
        self.0.insert(property.id.clone(), property)
    }

    pub fn get(&self, id: &str) -> Option<&PropertyData> {
        self.0.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PropertyData> {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// First string value of a property, if present.
    pub fn first_str(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(PropertyData::first_str)
    }

    /// `cmis:name`, if present.
    pub fn name(&self) -> Option<&str> {
        self.first_str(property_ids::NAME)
    }

    /// `cmis:objectTypeId`, if present.
    pub fn type_id(&self) -> Option<&str> {
        self.first_str(property_ids::OBJECT_TYPE_ID)
    }

    /// `cmis:secondaryObjectTypeIds`; `None` when the property is absent.
    pub fn secondary_type_ids(&self) -> Option<Vec<String>> {
        self.get(property_ids::SECONDARY_OBJECT_TYPE_IDS)
            .map(PropertyData::strings)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyData> {
        self.0.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`: properties in `other` win.
    pub fn merge(&mut self, other: &Properties) {
        for property in other.iter() {
            self.insert(property.clone());
        }
    }
}

impl FromIterator<PropertyData> for Properties {
    fn from_iter<I: IntoIterator<Item = PropertyData>>(iter: I) -> Self {
        let mut props = Properties::new();
        for p in iter {
            props.insert(p);
        }
        props
    }
}
