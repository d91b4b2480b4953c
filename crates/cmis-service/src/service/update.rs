use cmis_store::{AclStore, FilingStore, ObjectStore, RepositoryStore, StoredObject};
use cmis_types::{
    property_ids as pid, Ace, AclPropagation, ChangeToken, ContentStream, ContentStreamAllowed, ObjectId,
    Permission, Properties, PropertyData, PropertyValue, UnfileObject,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ObjectService;
use crate::context::{expand_acl_macros, CallContext};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::validate_update;

/// An object changed by a bulk update and its new change token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateResult {
    pub id: ObjectId,
    pub change_token: ChangeToken,
}

impl<S: RepositoryStore> ObjectService<S> {
    /// Fail for a checked-in version of a checked-out series.
    fn check_mutable(&self, object: &StoredObject) -> ServiceResult<()> {
        let Some(version) = object.kind.as_version() else {
            return Ok(());
        };
        if version.is_pwc() {
            return Ok(());
        }
        let series = self.store.get_object(version.series_id)?;
        if series.kind.as_series().is_some_and(|s| s.is_checked_out()) {
            return Err(ServiceError::Versioning(format!(
                "object {} belongs to a checked-out document",
                object.id
            )));
        }
        Ok(())
    }

    /// Load a document or version the caller may change the content of.
    fn content_target(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<StoredObject> {
        let object = self.visible(self.load_checked(id, ctx, Permission::Write)?)?;
        self.check_mutable(&object)?;
        if !object.kind.accepts_content() || self.content_allowance(&object) == ContentStreamAllowed::NotAllowed {
            return Err(ServiceError::Constraint(format!("object {id} does not allow content")));
        }
        Ok(object)
    }

    // ----------------------------------------------------------------
    // Properties
    // ----------------------------------------------------------------

    /// Update properties, returning the object id and its new change token.
    ///
    /// A given `change_token` must match the current one.
    pub fn update_properties(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        change_token: Option<ChangeToken>,
        properties: &Properties,
    ) -> ServiceResult<(ObjectId, ChangeToken)> {
        let principal = self.principal(ctx);
        let object = self.load_checked(id, ctx, Permission::Write)?;
        self.check_mutable(&object)?;
        let is_pwc = object.kind.as_version().is_some_and(|v| v.is_pwc());
        let plan = validate_update(&self.types, &object, is_pwc, properties)?;

        let updated = self.store.update_object(id, change_token, principal, move |obj| {
            plan.apply(obj);
            Ok(())
        })?;
        debug!(%id, token = %updated.change_token, "updated properties");
        Ok((updated.id, updated.change_token))
    }

    /// Apply one property change to many objects.
    ///
    /// Failures are logged and skipped; the result lists the objects that
    /// were updated.
    pub fn bulk_update_properties(
        &self,
        ctx: &CallContext,
        objects: &[(ObjectId, Option<ChangeToken>)],
        properties: &Properties,
        add_secondary_type_ids: &[String],
        remove_secondary_type_ids: &[String],
    ) -> Vec<BulkUpdateResult> {
        let mut updated = Vec::new();
        for &(id, token) in objects {
            let result = self.bulk_properties(id, properties, add_secondary_type_ids, remove_secondary_type_ids)
                .and_then(|props| self.update_properties(ctx, id, token, &props));
            match result {
                Ok((id, change_token)) => updated.push(BulkUpdateResult { id, change_token }),
                Err(e) => warn!(%id, error = %e, "bulk update: object skipped"),
            }
        }
        info!(requested = objects.len(), updated = updated.len(), "bulk update finished");
        updated
    }

    fn bulk_properties(
        &self,
        id: ObjectId,
        properties: &Properties,
        add: &[String],
        remove: &[String],
    ) -> ServiceResult<Properties> {
        let mut props = properties.clone();
        if add.is_empty() && remove.is_empty() {
            return Ok(props);
        }
        let mut secondary = self.store.get_object(id)?.meta.secondary_type_ids;
        secondary.retain(|t| !remove.contains(t));
        for type_id in add {
            if !secondary.contains(type_id) {
                secondary.push(type_id.clone());
            }
        }
        props.insert(PropertyData::multi(
            pid::SECONDARY_OBJECT_TYPE_IDS,
            secondary.into_iter().map(PropertyValue::Id).collect(),
        ));
        Ok(props)
    }

    // ----------------------------------------------------------------
    // Deletion
    // ----------------------------------------------------------------

    /// Delete an object. For a version, `all_versions` deletes the whole
    /// series.
    pub fn delete_object(&self, ctx: &CallContext, id: ObjectId, all_versions: bool) -> ServiceResult<()> {
        self.load_checked(id, ctx, Permission::Write)?;
        self.store.delete_object(id, all_versions)?;
        info!(%id, all_versions, "deleted object");
        Ok(())
    }

    /// Delete a folder and its contents. Returns the ids that could not be
    /// deleted.
    pub fn delete_tree(
        &self,
        ctx: &CallContext,
        folder_id: ObjectId,
        all_versions: bool,
        unfile: UnfileObject,
        continue_on_failure: bool,
    ) -> ServiceResult<Vec<ObjectId>> {
        let failed = self.store.delete_tree(
            folder_id,
            all_versions,
            unfile,
            continue_on_failure,
            self.principal(ctx),
        )?;
        if !failed.is_empty() {
            warn!(folder = %folder_id, failed = failed.len(), "delete tree incomplete");
        }
        Ok(failed)
    }

    // ----------------------------------------------------------------
    // Content
    // ----------------------------------------------------------------

    /// Set the content of a document.
    ///
    /// Without `overwrite`, existing content is an error.
    pub fn set_content_stream(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        change_token: Option<ChangeToken>,
        content: ContentStream,
        overwrite: bool,
    ) -> ServiceResult<(ObjectId, ChangeToken)> {
        let object = self.content_target(ctx, id)?;
        if !overwrite && object.kind.content().is_some() {
            return Err(ServiceError::ContentAlreadyExists(format!("object {id} already has content")));
        }
        let content = content.with_defaults(object.name());
        let saved = self
            .store
            .set_content(object.id, Some(content), change_token, self.principal(ctx))?;
        debug!(id = %saved.id, token = %saved.change_token, "content set");
        Ok((saved.id, saved.change_token))
    }

    /// Append a chunk to the content of a document, creating it if absent.
    pub fn append_content_stream(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        change_token: Option<ChangeToken>,
        chunk: ContentStream,
        is_last_chunk: bool,
    ) -> ServiceResult<(ObjectId, ChangeToken)> {
        let object = self.content_target(ctx, id)?;
        let chunk = chunk.with_defaults(object.name());
        let saved = self
            .store
            .append_content(object.id, &chunk, is_last_chunk, change_token, self.principal(ctx))?;
        Ok((saved.id, saved.change_token))
    }

    pub fn delete_content_stream(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        change_token: Option<ChangeToken>,
    ) -> ServiceResult<(ObjectId, ChangeToken)> {
        let object = self.content_target(ctx, id)?;
        if self.content_allowance(&object) == ContentStreamAllowed::Required {
            return Err(ServiceError::Constraint(format!("type {} requires content", object.type_id())));
        }
        let saved = self
            .store
            .set_content(object.id, None, change_token, self.principal(ctx))?;
        debug!(id = %saved.id, "content deleted");
        Ok((saved.id, saved.change_token))
    }

    // ----------------------------------------------------------------
    // Filing
    // ----------------------------------------------------------------

    /// Move an object from `source_id` into `target_id`.
    pub fn move_object(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        target_id: ObjectId,
        source_id: ObjectId,
    ) -> ServiceResult<ObjectId> {
        let object = self.load_checked(id, ctx, Permission::Write)?;
        let target = self.load_checked(target_id, ctx, Permission::Write)?;
        self.load_checked(source_id, ctx, Permission::Write)?;
        self.check_child_type(&target, object.type_id())?;

        let moved = self.store.move_object(id, source_id, target_id, self.principal(ctx))?;
        info!(%id, source = %source_id, target = %target_id, "moved object");
        Ok(moved.id)
    }

    /// Rename an object. Renaming to the current name changes nothing.
    pub fn rename(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        new_name: &str,
        change_token: Option<ChangeToken>,
    ) -> ServiceResult<(ObjectId, ChangeToken)> {
        let object = self.load_checked(id, ctx, Permission::Write)?;
        if object.name() == new_name {
            return Ok((object.id, object.change_token));
        }
        let props = Properties::new().with(PropertyData::string(pid::NAME, new_name));
        self.update_properties(ctx, id, change_token, &props)
    }

    /// File an object into one more folder.
    pub fn add_object_to_folder(&self, ctx: &CallContext, id: ObjectId, folder_id: ObjectId) -> ServiceResult<()> {
        let object = self.load_checked(id, ctx, Permission::Write)?;
        let folder = self.writable_folder(folder_id, ctx)?;
        self.check_child_type(&folder, object.type_id())?;
        self.store.add_parent(id, folder_id, self.principal(ctx))?;
        Ok(())
    }

    /// Remove an object from one of its folders.
    pub fn remove_object_from_folder(&self, ctx: &CallContext, id: ObjectId, folder_id: ObjectId) -> ServiceResult<()> {
        self.load_checked(id, ctx, Permission::Write)?;
        self.writable_folder(folder_id, ctx)?;
        self.store.remove_parent(id, folder_id, self.principal(ctx))?;
        Ok(())
    }

    // ----------------------------------------------------------------
    // Access control
    // ----------------------------------------------------------------

    /// Add and remove ACL entries. Requires `cmis:all`; `cmis:user` expands
    /// to the caller. Returns the resulting ACL.
    pub fn apply_acl(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        add: &[Ace],
        remove: &[Ace],
        propagation: AclPropagation,
    ) -> ServiceResult<Vec<Ace>> {
        let principal = self.principal(ctx);
        self.load_checked(id, ctx, Permission::All)?;
        let add = expand_acl_macros(add, principal);
        let remove = expand_acl_macros(remove, principal);
        let acl = self.store.apply_acl(id, &add, &remove, propagation, principal)?;
        Ok(acl.to_vec())
    }

    /// Replace the ACL of an object with exactly `aces`.
    pub fn set_acl(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        aces: &[Ace],
        propagation: AclPropagation,
    ) -> ServiceResult<Vec<Ace>> {
        let principal = self.principal(ctx);
        self.load_checked(id, ctx, Permission::All)?;
        let aces = expand_acl_macros(aces, principal);
        Ok(self.store.set_acl(id, &aces, propagation, principal)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{ctx, document, folder, props, service, versioned, USER};
    use crate::service::CreateExtras;
    use cmis_store::VersioningStore;

    fn admin() -> CallContext {
        CallContext::user("Admin")
    }

    // ----------------------------------------------------------------
    // Change tokens
    // ----------------------------------------------------------------

    #[test]
    fn token_advances_and_stale_token_conflicts() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        let first = svc.get_object(&ctx(), doc).unwrap().change_token();
        assert_eq!(first.to_string(), "1");

        let change = Properties::new().with(PropertyData::string("my:title", "one"));
        let (_, second) = svc.update_properties(&ctx(), doc, Some(first), &change).unwrap();
        assert_eq!(second.to_string(), "2");

        let stale = Properties::new().with(PropertyData::string("my:title", "two"));
        let err = svc.update_properties(&ctx(), doc, Some(first), &stale).unwrap_err();
        assert!(matches!(err, ServiceError::UpdateConflict(_)));

        let data = svc.get_object(&ctx(), doc).unwrap();
        assert_eq!(data.properties.first_str("my:title"), Some("one"));
        assert_eq!(data.change_token(), second);
    }

    #[test]
    fn update_without_token_skips_the_check() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        let change = Properties::new().with(PropertyData::string("my:title", "x"));
        svc.update_properties(&ctx(), doc, None, &change).unwrap();
        let (_, token) = svc.update_properties(&ctx(), doc, None, &change).unwrap();
        assert_eq!(token.value(), 3);
    }

    #[test]
    fn update_stamps_modifier() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        let change = Properties::new().with(PropertyData::string("my:title", "x"));
        svc.update_properties(&CallContext::user("bob"), doc, None, &change).unwrap();
        let data = svc.get_object(&ctx(), doc).unwrap();
        assert_eq!(data.properties.first_str(pid::LAST_MODIFIED_BY), Some("bob"));
        assert_eq!(data.properties.first_str(pid::CREATED_BY), Some(USER));
    }

    #[test]
    fn update_validation_errors() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        let read_only = Properties::new().with(PropertyData::string(pid::CREATED_BY, "x"));
        assert!(matches!(svc.update_properties(&ctx(), doc, None, &read_only), Err(ServiceError::Constraint(_))));
        let unknown = Properties::new().with(PropertyData::string("x:nope", "x"));
        assert!(matches!(svc.update_properties(&ctx(), doc, None, &unknown), Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn rename_checks_siblings() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = folder(&svc, root, "A");
        folder(&svc, root, "B");
        assert!(matches!(svc.rename(&ctx(), a, "B", None), Err(ServiceError::NameConstraintViolation(_))));
        let (_, token) = svc.rename(&ctx(), a, "C", None).unwrap();
        assert_eq!(token.value(), 2);
        assert_eq!(svc.get_object_by_path(&ctx(), "/C").unwrap().id(), a);

        let (_, same) = svc.rename(&ctx(), a, "C", None).unwrap();
        assert_eq!(same, token);
    }

    #[test]
    fn root_cannot_be_renamed_moved_or_deleted() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = folder(&svc, root, "A");
        assert!(matches!(svc.rename(&admin(), root, "Other", None), Err(ServiceError::Constraint(_))));
        assert!(matches!(svc.delete_object(&admin(), root, true), Err(ServiceError::NotSupported(_))));
        assert!(matches!(svc.move_object(&admin(), root, a, root), Err(ServiceError::NotSupported(_))));
    }

    #[test]
    fn renaming_a_version_renames_the_series() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        svc.rename(&ctx(), v1, "renamed", None).unwrap();
        assert_eq!(svc.get_object_by_path(&ctx(), "/renamed").unwrap().id(), v1);
        let series = svc.store().series_of(v1).unwrap();
        assert_eq!(series.name(), "renamed");
    }

    // ----------------------------------------------------------------
    // Bulk update
    // ----------------------------------------------------------------

    #[test]
    fn bulk_update_skips_failures() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = document(&svc, root, "a");
        let b = document(&svc, root, "b");
        let stale = ChangeToken::first().next().next();
        let change = Properties::new().with(PropertyData::string("my:title", "bulk"));

        let result = svc.bulk_update_properties(
            &ctx(),
            &[(a, None), (b, Some(stale)), (ObjectId::new(9999), None)],
            &change,
            &[],
            &[],
        );
        assert_eq!(result, vec![BulkUpdateResult { id: a, change_token: ChangeToken::first().next() }]);
        assert_eq!(svc.get_object(&ctx(), b).unwrap().properties.first_str("my:title"), None);
    }

    #[test]
    fn bulk_update_changes_secondary_types() {
        let svc = service();
        svc.add_type(crate::types::TypeDefinition::new("my:aspect", cmis_types::BaseTypeId::Secondary))
            .unwrap();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        let result = svc.bulk_update_properties(&ctx(), &[(doc, None)], &Properties::new(), &["my:aspect".into()], &[]);
        assert_eq!(result.len(), 1);
        assert_eq!(svc.get_object(&ctx(), doc).unwrap().object.meta.secondary_type_ids, vec!["my:aspect".to_string()]);

        svc.bulk_update_properties(&ctx(), &[(doc, None)], &Properties::new(), &[], &["my:aspect".into()]);
        assert!(svc.get_object(&ctx(), doc).unwrap().object.meta.secondary_type_ids.is_empty());
    }

    // ----------------------------------------------------------------
    // Deletion
    // ----------------------------------------------------------------

    #[test]
    fn non_empty_folder_cannot_be_deleted() {
        let svc = service();
        let a = folder(&svc, svc.root_folder_id(), "A");
        let doc = document(&svc, a, "doc");
        assert!(matches!(svc.delete_object(&ctx(), a, true), Err(ServiceError::Constraint(_))));
        svc.delete_object(&ctx(), doc, true).unwrap();
        svc.delete_object(&ctx(), a, true).unwrap();
        assert!(matches!(svc.get_object(&ctx(), a), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn delete_tree_removes_everything() {
        let svc = service();
        let a = folder(&svc, svc.root_folder_id(), "A");
        let b = folder(&svc, a, "B");
        document(&svc, b, "doc");
        versioned(&svc, a, "ver");
        let failed = svc.delete_tree(&ctx(), a, true, UnfileObject::Delete, true).unwrap();
        assert!(failed.is_empty());
        assert_eq!(svc.store().object_count(), 1);
    }

    #[test]
    fn delete_tree_reports_protected_children() {
        let svc = service();
        let a = folder(&svc, svc.root_folder_id(), "A");
        let guarded = document(&svc, a, "a-guarded");
        document(&svc, a, "b-open");
        svc.set_acl(&admin(), guarded, &[Ace::new("bob", Permission::All)], AclPropagation::ObjectOnly)
            .unwrap();

        let failed = svc.delete_tree(&ctx(), a, true, UnfileObject::Delete, false).unwrap();
        assert_eq!(failed, vec![guarded]);
        assert!(svc.store().exists(a));

        let failed = svc.delete_tree(&ctx(), a, true, UnfileObject::Delete, true).unwrap();
        assert_eq!(failed, vec![guarded, a]);
    }

    #[test]
    fn delete_tree_rejects_unfile_and_root() {
        let svc = service();
        let a = folder(&svc, svc.root_folder_id(), "A");
        assert!(matches!(
            svc.delete_tree(&ctx(), a, true, UnfileObject::Unfile, true),
            Err(ServiceError::NotSupported(_))
        ));
        assert!(matches!(
            svc.delete_tree(&ctx(), svc.root_folder_id(), true, UnfileObject::Delete, true),
            Err(ServiceError::NotSupported(_))
        ));
    }

    #[test]
    fn delete_requires_write() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        svc.set_acl(&admin(), doc, &[Ace::new(USER, Permission::Read)], AclPropagation::ObjectOnly)
            .unwrap();
        assert!(matches!(svc.delete_object(&ctx(), doc, true), Err(ServiceError::PermissionDenied(_))));
    }

    // ----------------------------------------------------------------
    // Content
    // ----------------------------------------------------------------

    #[test]
    fn set_content_respects_overwrite() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        let new = ContentStream::new("new.txt", "text/plain", b"new".to_vec());
        assert!(matches!(
            svc.set_content_stream(&ctx(), doc, None, new.clone(), false),
            Err(ServiceError::ContentAlreadyExists(_))
        ));
        let (_, token) = svc.set_content_stream(&ctx(), doc, None, new, true).unwrap();
        assert_eq!(token.value(), 2);
        assert_eq!(svc.get_content_stream(&ctx(), doc, None, 0, None).unwrap().data, b"new");
    }

    #[test]
    fn append_and_delete_content() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        svc.delete_content_stream(&ctx(), doc, None).unwrap();
        assert!(svc.get_content_stream(&ctx(), doc, None, 0, None).is_err());

        svc.append_content_stream(&ctx(), doc, None, ContentStream::from_bytes(b"ab".to_vec()), false)
            .unwrap();
        svc.append_content_stream(&ctx(), doc, None, ContentStream::from_bytes(b"cd".to_vec()), true)
            .unwrap();
        let content = svc.get_content_stream(&ctx(), doc, None, 0, None).unwrap();
        assert_eq!(content.data, b"abcd");
        assert_eq!(content.file_name.as_deref(), Some("doc"));
    }

    #[test]
    fn content_on_folder_is_constraint() {
        let svc = service();
        let a = folder(&svc, svc.root_folder_id(), "A");
        assert!(matches!(
            svc.set_content_stream(&ctx(), a, None, ContentStream::from_bytes(b"x".to_vec()), true),
            Err(ServiceError::Constraint(_))
        ));
    }

    #[test]
    fn frozen_versions_reject_changes() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        svc.checkout(&ctx(), v1).unwrap();
        let change = Properties::new().with(PropertyData::string(pid::DESCRIPTION, "x"));
        assert!(matches!(svc.update_properties(&ctx(), v1, None, &change), Err(ServiceError::Versioning(_))));
        assert!(matches!(
            svc.set_content_stream(&ctx(), v1, None, ContentStream::from_bytes(b"x".to_vec()), true),
            Err(ServiceError::Versioning(_))
        ));
    }

    // ----------------------------------------------------------------
    // Filing
    // ----------------------------------------------------------------

    #[test]
    fn folder_cannot_move_into_its_child() {
        let svc = service();
        let root = svc.root_folder_id();
        let p = folder(&svc, root, "P");
        let c = folder(&svc, p, "C");
        assert!(matches!(svc.move_object(&ctx(), p, c, root), Err(ServiceError::NotSupported(_))));
        assert!(matches!(svc.move_object(&ctx(), p, p, root), Err(ServiceError::NotSupported(_))));
        assert_eq!(svc.get_folder_parent(&ctx(), p).unwrap().id(), root);
    }

    #[test]
    fn move_checks_target_names() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = folder(&svc, root, "A");
        let b = folder(&svc, root, "B");
        let doc = document(&svc, a, "doc");
        document(&svc, b, "doc");
        assert!(matches!(svc.move_object(&ctx(), doc, b, a), Err(ServiceError::NameConstraintViolation(_))));

        let c = folder(&svc, root, "C");
        svc.move_object(&ctx(), doc, c, a).unwrap();
        assert_eq!(svc.get_object_by_path(&ctx(), "/C/doc").unwrap().id(), doc);
        assert!(svc.get_object_by_path(&ctx(), "/A/doc").is_err());
    }

    #[test]
    fn move_into_a_document_is_not_supported() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = folder(&svc, root, "A");
        let doc = document(&svc, root, "doc");
        assert!(matches!(svc.move_object(&ctx(), a, doc, root), Err(ServiceError::NotSupported(_))));
    }

    #[test]
    fn multi_filing() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = folder(&svc, root, "A");
        let doc = document(&svc, root, "doc");
        svc.add_object_to_folder(&ctx(), doc, a).unwrap();
        assert_eq!(svc.get_object_parents(&ctx(), doc).unwrap().len(), 2);

        let b = folder(&svc, root, "B");
        assert!(matches!(svc.add_object_to_folder(&ctx(), a, b), Err(ServiceError::NotSupported(_))));

        svc.remove_object_from_folder(&ctx(), doc, root).unwrap();
        assert!(matches!(
            svc.remove_object_from_folder(&ctx(), doc, a),
            Err(ServiceError::NotSupported(_))
        ));
    }

    // ----------------------------------------------------------------
    // Access control
    // ----------------------------------------------------------------

    #[test]
    fn apply_acl_needs_all() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "doc");
        svc.set_acl(&admin(), doc, &[Ace::new(USER, Permission::Write)], AclPropagation::ObjectOnly)
            .unwrap();
        let err = svc
            .apply_acl(&ctx(), doc, &[Ace::new("bob", Permission::Read)], &[], AclPropagation::ObjectOnly)
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }

    #[test]
    fn acl_macro_and_propagation() {
        let svc = service();
        let root = svc.root_folder_id();
        let top = folder(&svc, root, "top");
        let inner = document(&svc, top, "inner");
        let acl = svc
            .apply_acl(
                &ctx(),
                top,
                &[Ace::new(cmis_types::principals::USER_MACRO, Permission::All)],
                &[Ace::default_ace()],
                AclPropagation::Propagate,
            )
            .unwrap();
        assert_eq!(acl, vec![Ace::new(USER, Permission::All)]);
        assert_eq!(svc.get_acl(&ctx(), inner).unwrap(), vec![Ace::new(USER, Permission::All)]);
        assert!(svc.get_object(&CallContext::user("bob"), inner).is_err());
    }

    #[test]
    fn created_objects_inherit_acl() {
        let svc = service();
        let top = folder(&svc, svc.root_folder_id(), "top");
        svc.set_acl(&ctx(), top, &[Ace::new(USER, Permission::All)], AclPropagation::ObjectOnly)
            .unwrap();
        let child = svc
            .create_folder(&ctx(), &props("child", "cmis:folder"), top, CreateExtras::default())
            .unwrap();
        assert_eq!(svc.get_acl(&ctx(), child).unwrap(), vec![Ace::new(USER, Permission::All)]);
    }
}
