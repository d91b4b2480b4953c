use cmis_store::{ObjectKind, StoredObject, VersionSeries};
use cmis_types::{ContentStreamAllowed, Permission};
use serde::{Deserialize, Serialize};

/// What a caller may do with one object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowableActions {
    pub can_get_properties: bool,
    pub can_update_properties: bool,
    pub can_delete_object: bool,
    pub can_move_object: bool,
    pub can_get_object_relationships: bool,
    pub can_get_object_parents: bool,
    pub can_get_folder_parent: bool,
    pub can_get_children: bool,
    pub can_get_descendants: bool,
    pub can_get_folder_tree: bool,
    pub can_delete_tree: bool,
    pub can_create_document: bool,
    pub can_create_folder: bool,
    pub can_create_item: bool,
    pub can_create_relationship: bool,
    pub can_get_content_stream: bool,
    pub can_set_content_stream: bool,
    pub can_append_content_stream: bool,
    pub can_delete_content_stream: bool,
    pub can_get_renditions: bool,
    pub can_check_out: bool,
    pub can_cancel_check_out: bool,
    pub can_check_in: bool,
    pub can_get_all_versions: bool,
    pub can_add_object_to_folder: bool,
    pub can_remove_object_from_folder: bool,
    pub can_apply_policy: bool,
    pub can_remove_policy: bool,
    pub can_get_applied_policies: bool,
    pub can_get_acl: bool,
    pub can_apply_acl: bool,
}

/// Everything the computation looks at besides the object itself.
#[derive(Clone, Copy, Debug)]
pub struct ActionInput<'a> {
    pub object: &'a StoredObject,
    /// The series of a version.
    pub series: Option<&'a VersionSeries>,
    pub principal: &'a str,
    pub is_admin: bool,
    /// The strongest permission the principal holds, if any.
    pub permission: Option<Permission>,
    pub is_root: bool,
    pub multi_filing: bool,
    pub unfiling: bool,
    pub content_allowed: ContentStreamAllowed,
}

impl AllowableActions {
    pub fn compute(input: ActionInput<'_>) -> Self {
        let held = |p: Permission| input.is_admin || input.permission.is_some_and(|h| h.implies(p));
        let read = held(Permission::Read);
        let write = held(Permission::Write);
        let all = held(Permission::All);

        let object = input.object;
        let is_folder = object.is_folder();
        let version = object.kind.as_version();
        let is_pwc = version.is_some_and(|v| v.is_pwc());
        let checked_out = input.series.is_some_and(VersionSeries::is_checked_out);
        let checkout_owner = input
            .series
            .and_then(|s| s.checked_out_by.as_deref())
            .is_some_and(|owner| owner == input.principal || input.is_admin);
        let filed_count = match (&object.kind, input.series) {
            (ObjectKind::Version(_), Some(series)) => series.parent_ids.len(),
            (kind, _) => kind.parent_ids().len(),
        };
        let multi_filable = matches!(
            object.kind,
            ObjectKind::Document(_) | ObjectKind::Version(_) | ObjectKind::Item(_)
        );
        // versions other than the working copy are frozen while checked out
        let mutable = match version {
            Some(v) => v.is_pwc() || !checked_out,
            None => true,
        };
        let has_content = object.kind.content().is_some();
        let content_ok = object.kind.accepts_content() && input.content_allowed != ContentStreamAllowed::NotAllowed;

        Self {
            can_get_properties: read,
            can_update_properties: write && mutable,
            can_delete_object: write && !input.is_root,
            can_move_object: write && !input.is_root && (is_folder || multi_filable) && !is_pwc,
            can_get_object_relationships: read,
            can_get_object_parents: read && !is_folder && filed_count > 0,
            can_get_folder_parent: read && is_folder && !input.is_root,
            can_get_children: read && is_folder,
            can_get_descendants: read && is_folder,
            can_get_folder_tree: read && is_folder,
            can_delete_tree: write && is_folder && !input.is_root,
            can_create_document: write && is_folder,
            can_create_folder: write && is_folder,
            can_create_item: write && is_folder,
            can_create_relationship: write && !matches!(object.kind, ObjectKind::Relationship(_)),
            can_get_content_stream: read && has_content,
            can_set_content_stream: write && mutable && content_ok,
            can_append_content_stream: write && mutable && content_ok,
            can_delete_content_stream: write
                && mutable
                && has_content
                && input.content_allowed != ContentStreamAllowed::Required,
            can_get_renditions: read,
            can_check_out: write && version.is_some() && !checked_out,
            can_cancel_check_out: write && is_pwc && checkout_owner,
            can_check_in: write && is_pwc && checkout_owner,
            can_get_all_versions: read && version.is_some(),
            can_add_object_to_folder: write && input.multi_filing && multi_filable && !is_pwc,
            can_remove_object_from_folder: write
                && multi_filable
                && !is_pwc
                && (filed_count > 1 || (filed_count == 1 && input.unfiling)),
            can_apply_policy: write,
            can_remove_policy: write,
            can_get_applied_policies: read,
            can_get_acl: read,
            can_apply_acl: all,
        }
    }
}
