//! The stored object model.
//!
//! Every repository object is a [`StoredObject`]: common metadata plus an
//! [`ObjectKind`] carrying what is specific to folders, documents, version
//! series, versions, items, policies, and relationships. Capability questions
//! ("is it fileable?", "does it hold content?") are answered by accessors on
//! the kind rather than by inspecting the variant at every call site.
//!
//! Objects not yet in the store are [`ObjectDraft`]s. A draft has no id and
//! no change token; both are assigned by `persist`.

use std::fmt;

use chrono::{DateTime, Utc};
use cmis_types::{
    property_ids, Ace, AclId, BaseTypeId, ChangeToken, ContentStream, ObjectId, Properties,
    PropertyData, PropertyValue, VersioningState,
};
use serde::{Deserialize, Serialize};

/// A `major.minor` version label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionLabel {
    pub major: u32,
    pub minor: u32,
}

impl VersionLabel {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Label of the first version of a series.
    pub fn initial(major: bool) -> Self {
        if major {
            Self::new(1, 0)
        } else {
            Self::new(0, 1)
        }
    }

    /// Label following `previous`, or the initial label when there is none.
    pub fn next(previous: Option<VersionLabel>, major: bool) -> Self {
        match previous {
            None => Self::initial(major),
            Some(prev) if major => Self::new(prev.major + 1, 0),
            Some(prev) => Self::new(prev.major, prev.minor + 1),
        }
    }

    pub fn is_major(&self) -> bool {
        self.minor == 0
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Label shown for a private working copy.
pub const PWC_LABEL: &str = "pwc";

/// A checked-in version as listed by its series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionRef {
    pub id: ObjectId,
    pub label: VersionLabel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FolderData {
    /// `None` only for the root folder.
    pub parent_id: Option<ObjectId>,
    /// Object type ids allowed as children; empty allows any.
    pub allowed_child_type_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentData {
    pub parent_ids: Vec<ObjectId>,
    pub content: Option<ContentStream>,
}

/// The fileable head of a versioned document.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionSeries {
    pub parent_ids: Vec<ObjectId>,
    /// Checked-in versions, oldest first.
    pub versions: Vec<VersionRef>,
    pub pwc_id: Option<ObjectId>,
    pub checked_out_by: Option<String>,
}

impl VersionSeries {
    pub fn is_checked_out(&self) -> bool {
        self.pwc_id.is_some()
    }

    /// The newest checked-in version, optionally restricted to majors.
    pub fn latest(&self, major_only: bool) -> Option<VersionRef> {
        self.versions
            .iter()
            .rev()
            .find(|v| !major_only || v.label.is_major())
            .copied()
    }

    /// Every version id including the PWC.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.versions.iter().map(|v| v.id).collect();
        ids.extend(self.pwc_id);
        ids
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.pwc_id == Some(id) || self.versions.iter().any(|v| v.id == id)
    }
}

/// One version of a versioned document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentVersion {
    pub series_id: ObjectId,
    pub content: Option<ContentStream>,
    /// `None` while the version is a private working copy.
    pub label: Option<VersionLabel>,
    pub checkin_comment: Option<String>,
}

impl DocumentVersion {
    pub fn is_pwc(&self) -> bool {
        self.label.is_none()
    }

    pub fn is_major(&self) -> bool {
        self.label.is_some_and(|l| l.is_major())
    }

    pub fn label_text(&self) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => PWC_LABEL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemData {
    pub parent_ids: Vec<ObjectId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyData {
    pub policy_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationshipData {
    pub source_id: ObjectId,
    pub target_id: ObjectId,
}

/// What an object is, with the data only that kind carries.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Folder(FolderData),
    Document(DocumentData),
    VersionSeries(VersionSeries),
    Version(DocumentVersion),
    Item(ItemData),
    Policy(PolicyData),
    Relationship(RelationshipData),
}

impl ObjectKind {
    pub fn base_type(&self) -> BaseTypeId {
        match self {
            Self::Folder(_) => BaseTypeId::Folder,
            Self::Document(_) | Self::VersionSeries(_) | Self::Version(_) => BaseTypeId::Document,
            Self::Item(_) => BaseTypeId::Item,
            Self::Policy(_) => BaseTypeId::Policy,
            Self::Relationship(_) => BaseTypeId::Relationship,
        }
    }

    /// Returns `true` if the object itself holds parent references.
    ///
    /// Versions are filed through their series and report `false`.
    pub fn is_fileable(&self) -> bool {
        matches!(
            self,
            Self::Folder(_) | Self::Document(_) | Self::VersionSeries(_) | Self::Item(_)
        )
    }

    /// Parent folder ids held directly by this object.
    pub fn parent_ids(&self) -> &[ObjectId] {
        match self {
            Self::Folder(f) => f.parent_id.as_slice(),
            Self::Document(d) => &d.parent_ids,
            Self::VersionSeries(s) => &s.parent_ids,
            Self::Item(i) => &i.parent_ids,
            Self::Version(_) | Self::Policy(_) | Self::Relationship(_) => &[],
        }
    }

    /// Mutable parent list for multi-filable kinds. Folders are excluded.
    pub fn parent_ids_mut(&mut self) -> Option<&mut Vec<ObjectId>> {
        match self {
            Self::Document(d) => Some(&mut d.parent_ids),
            Self::VersionSeries(s) => Some(&mut s.parent_ids),
            Self::Item(i) => Some(&mut i.parent_ids),
            _ => None,
        }
    }

    /// Returns `true` for kinds able to hold a content stream.
    pub fn accepts_content(&self) -> bool {
        matches!(self, Self::Document(_) | Self::Version(_))
    }

    pub fn content(&self) -> Option<&ContentStream> {
        match self {
            Self::Document(d) => d.content.as_ref(),
            Self::Version(v) => v.content.as_ref(),
            _ => None,
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut Option<ContentStream>> {
        match self {
            Self::Document(d) => Some(&mut d.content),
            Self::Version(v) => Some(&mut v.content),
            _ => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderData> {
        match self {
            Self::Folder(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&VersionSeries> {
        match self {
            Self::VersionSeries(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_series_mut(&mut self) -> Option<&mut VersionSeries> {
        match self {
            Self::VersionSeries(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_version(&self) -> Option<&DocumentVersion> {
        match self {
            Self::Version(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_version_mut(&mut self) -> Option<&mut DocumentVersion> {
        match self {
            Self::Version(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipData> {
        match self {
            Self::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

/// Metadata shared by every kind of object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMeta {
    pub name: String,
    pub type_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
    pub description: Option<String>,
    /// Custom (non-system) properties.
    pub properties: Properties,
    pub secondary_type_ids: Vec<String>,
    pub acl_id: AclId,
    pub policy_ids: Vec<ObjectId>,
}

impl ObjectMeta {
    /// Fresh metadata created and last modified by `user` at `now`.
    pub fn new(name: impl Into<String>, type_id: impl Into<String>, user: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            created_by: user.to_string(),
            created_at: now,
            modified_by: user.to_string(),
            modified_at: now,
            description: None,
            properties: Properties::new(),
            secondary_type_ids: Vec::new(),
            acl_id: AclId::DEFAULT,
            policy_ids: Vec::new(),
        }
    }

    /// Record a modification.
    pub fn touch(&mut self, user: &str, now: DateTime<Utc>) {
        self.modified_by = user.to_string();
        self.modified_at = now;
    }
}

/// Caller-supplied attributes of an object about to be created.
#[derive(Clone, Debug, PartialEq)]
pub struct NewObject {
    pub name: String,
    pub type_id: String,
    /// The creating principal.
    pub user: String,
    pub properties: Properties,
    pub secondary_type_ids: Vec<String>,
    pub description: Option<String>,
    pub policies: Vec<ObjectId>,
    pub add_aces: Vec<Ace>,
    pub remove_aces: Vec<Ace>,
}

impl NewObject {
    pub fn new(name: impl Into<String>, type_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            user: user.into(),
            properties: Properties::new(),
            secondary_type_ids: Vec::new(),
            description: None,
            policies: Vec::new(),
            add_aces: Vec::new(),
            remove_aces: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_aces(mut self, add: Vec<Ace>, remove: Vec<Ace>) -> Self {
        self.add_aces = add;
        self.remove_aces = remove;
        self
    }

    pub fn with_policies(mut self, policies: Vec<ObjectId>) -> Self {
        self.policies = policies;
        self
    }

    /// Metadata for the new object, stamped at `now` with the given ACL.
    pub fn into_meta(self, acl_id: AclId, now: DateTime<Utc>) -> ObjectMeta {
        let mut meta = ObjectMeta::new(self.name, self.type_id, &self.user, now);
        meta.properties = self.properties;
        meta.secondary_type_ids = self.secondary_type_ids;
        meta.description = self.description;
        meta.policy_ids = self.policies;
        meta.acl_id = acl_id;
        meta
    }
}

/// The first version created together with a new version series.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialVersion {
    pub content: Option<ContentStream>,
    pub state: VersioningState,
}

/// An object built but not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDraft {
    pub meta: ObjectMeta,
    pub kind: ObjectKind,
    /// Present only for version series drafts.
    pub initial_version: Option<InitialVersion>,
}

impl ObjectDraft {
    pub fn new(meta: ObjectMeta, kind: ObjectKind) -> Self {
        Self {
            meta,
            kind,
            initial_version: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }
}

/// A persisted repository object.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredObject {
    pub id: ObjectId,
    pub change_token: ChangeToken,
    pub meta: ObjectMeta,
    pub kind: ObjectKind,
}

impl StoredObject {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn type_id(&self) -> &str {
        &self.meta.type_id
    }

    pub fn base_type(&self) -> BaseTypeId {
        self.kind.base_type()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ObjectKind::Folder(_))
    }

    pub fn parent_ids(&self) -> &[ObjectId] {
        self.kind.parent_ids()
    }

    pub fn has_parent(&self, folder: ObjectId) -> bool {
        self.parent_ids().contains(&folder)
    }

    /// The object's system properties merged over its custom properties.
    ///
    /// Only what the object knows about itself is included; filing paths and
    /// series state are resolved by the caller.
    pub fn properties(&self) -> Properties {
        let meta = &self.meta;
        let mut props = meta.properties.clone();

        props.insert(PropertyData::string(property_ids::NAME, meta.name.clone()));
        props.insert(PropertyData::id_value(property_ids::OBJECT_ID, self.id.to_string()));
        props.insert(PropertyData::id_value(property_ids::OBJECT_TYPE_ID, meta.type_id.clone()));
        props.insert(PropertyData::id_value(property_ids::BASE_TYPE_ID, self.base_type().as_str()));
        props.insert(PropertyData::string(property_ids::CREATED_BY, meta.created_by.clone()));
        props.insert(PropertyData::single(
            property_ids::CREATION_DATE,
            PropertyValue::DateTime(meta.created_at),
        ));
        props.insert(PropertyData::string(property_ids::LAST_MODIFIED_BY, meta.modified_by.clone()));
        props.insert(PropertyData::single(
            property_ids::LAST_MODIFICATION_DATE,
            PropertyValue::DateTime(meta.modified_at),
        ));
        props.insert(PropertyData::string(property_ids::CHANGE_TOKEN, self.change_token.to_string()));
        props.insert(PropertyData::multi(
            property_ids::SECONDARY_OBJECT_TYPE_IDS,
            meta.secondary_type_ids.iter().cloned().map(PropertyValue::Id).collect(),
        ));
        if let Some(description) = &meta.description {
            props.insert(PropertyData::string(property_ids::DESCRIPTION, description.clone()));
        }

        match &self.kind {
            ObjectKind::Folder(folder) => {
                let parent = folder.parent_id.map(|p| PropertyValue::Id(p.to_string()));
                props.insert(PropertyData::multi(property_ids::PARENT_ID, parent.into_iter().collect()));
                props.insert(PropertyData::multi(
                    property_ids::ALLOWED_CHILD_OBJECT_TYPE_IDS,
                    folder.allowed_child_type_ids.iter().cloned().map(PropertyValue::Id).collect(),
                ));
            }
            ObjectKind::Version(version) => {
                props.insert(PropertyData::id_value(
                    property_ids::VERSION_SERIES_ID,
                    version.series_id.to_string(),
                ));
                props.insert(PropertyData::string(property_ids::VERSION_LABEL, version.label_text()));
                props.insert(PropertyData::single(
                    property_ids::IS_MAJOR_VERSION,
                    PropertyValue::Boolean(version.is_major()),
                ));
                props.insert(PropertyData::single(
                    property_ids::IS_PRIVATE_WORKING_COPY,
                    PropertyValue::Boolean(version.is_pwc()),
                ));
                if let Some(comment) = &version.checkin_comment {
                    props.insert(PropertyData::string(property_ids::CHECKIN_COMMENT, comment.clone()));
                }
            }
            ObjectKind::Policy(policy) => {
                if let Some(text) = &policy.policy_text {
                    props.insert(PropertyData::string(property_ids::POLICY_TEXT, text.clone()));
                }
            }
            ObjectKind::Relationship(rel) => {
                props.insert(PropertyData::id_value(property_ids::SOURCE_ID, rel.source_id.to_string()));
                props.insert(PropertyData::id_value(property_ids::TARGET_ID, rel.target_id.to_string()));
            }
            ObjectKind::Document(_) | ObjectKind::VersionSeries(_) | ObjectKind::Item(_) => {}
        }

        if let Some(content) = self.kind.content() {
            props.insert(PropertyData::single(
                property_ids::CONTENT_STREAM_LENGTH,
                PropertyValue::Integer(i64::try_from(content.len()).unwrap_or(i64::MAX)),
            ));
            if let Some(mime) = &content.mime_type {
                props.insert(PropertyData::string(property_ids::CONTENT_STREAM_MIME_TYPE, mime.clone()));
            }
            if let Some(file_name) = &content.file_name {
                props.insert(PropertyData::string(
                    property_ids::CONTENT_STREAM_FILE_NAME,
                    file_name.clone(),
                ));
            }
        }

        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta::new(name, "cmis:document", "alice", Utc::now())
    }

    #[test]
    fn version_label_sequence() {
        let first = VersionLabel::next(None, true);
        assert_eq!(first.to_string(), "1.0");
        let minor = VersionLabel::next(Some(first), false);
        assert_eq!(minor.to_string(), "1.1");
        let major = VersionLabel::next(Some(minor), true);
        assert_eq!(major.to_string(), "2.0");
        assert_eq!(VersionLabel::next(None, false).to_string(), "0.1");
    }

    #[test]
    fn series_latest_respects_major_filter() {
        let series = VersionSeries {
            parent_ids: vec![],
            versions: vec![
                VersionRef { id: ObjectId::new(1), label: VersionLabel::new(1, 0) },
                VersionRef { id: ObjectId::new(2), label: VersionLabel::new(1, 1) },
            ],
            pwc_id: Some(ObjectId::new(3)),
            checked_out_by: Some("alice".into()),
        };
        assert_eq!(series.latest(false).map(|v| v.id), Some(ObjectId::new(2)));
        assert_eq!(series.latest(true).map(|v| v.id), Some(ObjectId::new(1)));
        assert_eq!(series.all_ids().len(), 3);
        assert!(series.contains(ObjectId::new(3)));
    }

    #[test]
    fn fileable_capability_by_kind() {
        let folder = ObjectKind::Folder(FolderData {
            parent_id: Some(ObjectId::new(100)),
            allowed_child_type_ids: vec![],
        });
        assert!(folder.is_fileable());
        assert_eq!(folder.parent_ids(), &[ObjectId::new(100)]);

        let version = ObjectKind::Version(DocumentVersion {
            series_id: ObjectId::new(5),
            content: None,
            label: None,
            checkin_comment: None,
        });
        assert!(!version.is_fileable());
        assert!(version.parent_ids().is_empty());
        assert_eq!(version.base_type(), BaseTypeId::Document);
    }

    #[test]
    fn pwc_label_text() {
        let pwc = DocumentVersion {
            series_id: ObjectId::new(5),
            content: None,
            label: None,
            checkin_comment: None,
        };
        assert!(pwc.is_pwc());
        assert!(!pwc.is_major());
        assert_eq!(pwc.label_text(), PWC_LABEL);
    }

    #[test]
    fn properties_include_system_and_content_fields() {
        let obj = StoredObject {
            id: ObjectId::new(101),
            change_token: ChangeToken::first(),
            meta: meta("report.txt"),
            kind: ObjectKind::Document(DocumentData {
                parent_ids: vec![ObjectId::new(100)],
                content: Some(ContentStream::new("report.txt", "text/plain", b"hello".to_vec())),
            }),
        };
        let props = obj.properties();
        assert_eq!(props.name(), Some("report.txt"));
        assert_eq!(props.first_str(property_ids::OBJECT_ID), Some("101"));
        assert_eq!(props.first_str(property_ids::BASE_TYPE_ID), Some("cmis:document"));
        assert_eq!(props.first_str(property_ids::CHANGE_TOKEN), Some("1"));
        assert_eq!(
            props.get(property_ids::CONTENT_STREAM_LENGTH).and_then(|p| p.first()).and_then(PropertyValue::as_i64),
            Some(5)
        );
    }
}
