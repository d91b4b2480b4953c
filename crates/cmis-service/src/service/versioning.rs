use cmis_store::{AclStore, ObjectStore, RepositoryStore, VersioningStore};
use cmis_types::{ContentStream, ContentStreamAllowed, ObjectId, Permission, Properties};
use tracing::info;

use super::{ObjectData, ObjectService};
use crate::context::CallContext;
use crate::error::{ServiceError, ServiceResult};
use crate::validation::validate_update;

impl<S: RepositoryStore> ObjectService<S> {
    /// Check out the latest version of a document, returning the id of the
    /// private working copy.
    pub fn checkout(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let object = self.load_checked(id, ctx, Permission::Write)?;
        let versionable = self.types.get(object.type_id()).is_some_and(|t| t.versionable);
        if !versionable {
            return Err(ServiceError::Constraint(format!("type {} is not versionable", object.type_id())));
        }
        let pwc = self.store.checkout(id, principal)?;
        info!(%id, %pwc, %principal, "checked out");
        Ok(pwc)
    }

    /// Turn a private working copy into the next major or minor version.
    ///
    /// `properties` are validated as an update of the working copy. Only the
    /// user who checked the document out, or the admin, may check it in.
    pub fn checkin(
        &self,
        ctx: &CallContext,
        pwc_id: ObjectId,
        major: bool,
        properties: Option<&Properties>,
        content: Option<ContentStream>,
        comment: Option<String>,
    ) -> ServiceResult<ObjectId> {
        let principal = self.principal(ctx);
        let pwc = self.load_checked(pwc_id, ctx, Permission::Write)?;
        if !pwc.kind.as_version().is_some_and(|v| v.is_pwc()) {
            return Err(ServiceError::Versioning(format!("object {pwc_id} is not a private working copy")));
        }
        self.check_checkout_owner(pwc_id, principal)?;

        if content.is_some() && self.content_allowance(&pwc) == ContentStreamAllowed::NotAllowed {
            return Err(ServiceError::Constraint(format!("type {} does not allow content", pwc.type_id())));
        }
        if let Some(properties) = properties {
            let plan = validate_update(&self.types, &pwc, true, properties)?;
            if !plan.is_empty() {
                self.store.update_object(pwc_id, None, principal, move |obj| {
                    plan.apply(obj);
                    Ok(())
                })?;
            }
        }
        let name = self.store.get_object(pwc_id)?.meta.name;
        let content = content.map(|c| c.with_defaults(&name));
        let version = self
            .store
            .checkin(pwc_id, major, None, content, comment, principal)?;
        info!(%version, major, %principal, "checked in");
        Ok(version)
    }

    /// Discard a private working copy.
    pub fn cancel_checkout(&self, ctx: &CallContext, pwc_id: ObjectId) -> ServiceResult<()> {
        let principal = self.principal(ctx);
        self.load_checked(pwc_id, ctx, Permission::Write)?;
        self.store.cancel_checkout(pwc_id, principal)?;
        info!(pwc = %pwc_id, %principal, "checkout cancelled");
        Ok(())
    }

    /// Every version of the document, newest first, the working copy
    /// leading.
    pub fn get_all_versions(&self, ctx: &CallContext, id: ObjectId) -> ServiceResult<Vec<ObjectData>> {
        self.load_checked(id, ctx, Permission::Read)?;
        self.store
            .all_versions(id)?
            .into_iter()
            .map(|v| self.object_data(v))
            .collect()
    }

    pub fn get_object_of_latest_version(&self, ctx: &CallContext, id: ObjectId, major: bool) -> ServiceResult<ObjectData> {
        self.load_checked(id, ctx, Permission::Read)?;
        let latest = self.store.latest_version(id, major)?;
        self.store.check_access(latest.id, self.principal(ctx), Permission::Read)?;
        self.object_data(latest)
    }

    fn check_checkout_owner(&self, pwc_id: ObjectId, principal: &str) -> ServiceResult<()> {
        let series = self.store.series_of(pwc_id)?;
        let owner = series.kind.as_series().and_then(|s| s.checked_out_by.clone());
        match owner {
            Some(owner) if owner == principal || self.store.is_admin(principal) => Ok(()),
            Some(owner) => Err(ServiceError::Versioning(format!("document is checked out by {owner}"))),
            None => Err(ServiceError::Versioning(format!("object {pwc_id} is not checked out"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{ctx, document, props, service, versioned, USER, VERSIONED};
    use crate::service::CreateExtras;
    use cmis_types::{property_ids as pid, PropertyData, VersioningState};

    fn labels(versions: &[ObjectData]) -> Vec<String> {
        versions
            .iter()
            .map(|v| v.properties.first_str(pid::VERSION_LABEL).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn major_create_checkout_twice_then_cancel() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        let pwc = svc.checkout(&ctx(), v1).unwrap();
        assert!(matches!(svc.checkout(&ctx(), v1), Err(ServiceError::Versioning(_))));

        let data = svc.get_object(&ctx(), v1).unwrap();
        assert_eq!(data.bool_property(pid::IS_VERSION_SERIES_CHECKED_OUT), Some(true));
        assert_eq!(data.properties.first_str(pid::VERSION_SERIES_CHECKED_OUT_ID), Some(pwc.to_string().as_str()));

        svc.cancel_checkout(&ctx(), pwc).unwrap();
        let versions = svc.get_all_versions(&ctx(), v1).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id(), v1);
        assert!(svc.get_checked_out_docs(&ctx(), None).unwrap().is_empty());
    }

    #[test]
    fn checkin_creates_next_version() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");

        let pwc = svc.checkout(&ctx(), v1).unwrap();
        let minor = svc
            .checkin(&ctx(), pwc, false, None, None, Some("small fix".into()))
            .unwrap();
        let pwc = svc.checkout(&ctx(), minor).unwrap();
        svc.checkin(&ctx(), pwc, true, None, None, None).unwrap();

        let versions = svc.get_all_versions(&ctx(), v1).unwrap();
        assert_eq!(labels(&versions), vec!["2.0", "1.1", "1.0"]);
        assert_eq!(versions[0].bool_property(pid::IS_LATEST_VERSION), Some(true));
        assert_eq!(versions[1].bool_property(pid::IS_LATEST_VERSION), Some(false));
        assert_eq!(versions[1].properties.first_str(pid::CHECKIN_COMMENT), Some("small fix"));

        let latest_major = svc.get_object_of_latest_version(&ctx(), v1, true).unwrap();
        assert_eq!(latest_major.id(), versions[0].id());
    }

    #[test]
    fn checkin_applies_properties_and_content() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        let pwc = svc.checkout(&ctx(), v1).unwrap();
        let changes = Properties::new().with(PropertyData::string("my:owner", "carol"));
        let v2 = svc
            .checkin(
                &ctx(),
                pwc,
                true,
                Some(&changes),
                Some(ContentStream::from_bytes(b"v2".to_vec())),
                None,
            )
            .unwrap();

        let data = svc.get_object(&ctx(), v2).unwrap();
        assert_eq!(data.properties.first_str("my:owner"), Some("carol"));
        let content = svc.get_content_stream(&ctx(), v2, None, 0, None).unwrap();
        assert_eq!(content.data, b"v2");
        assert_eq!(content.file_name.as_deref(), Some("doc"));
        assert_eq!(svc.get_content_stream(&ctx(), v1, None, 0, None).unwrap().data, b"v1");
    }

    #[test]
    fn when_checked_out_property_only_on_pwc() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        let changes = Properties::new().with(PropertyData::string("my:owner", "carol"));
        assert!(matches!(svc.update_properties(&ctx(), v1, None, &changes), Err(ServiceError::Constraint(_))));
        let pwc = svc.checkout(&ctx(), v1).unwrap();
        svc.update_properties(&ctx(), pwc, None, &changes).unwrap();
    }

    #[test]
    fn only_the_owner_or_admin_checks_in() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        let pwc = svc.checkout(&ctx(), v1).unwrap();
        let bob = CallContext::user("bob");
        assert!(matches!(svc.checkin(&bob, pwc, true, None, None, None), Err(ServiceError::Versioning(_))));
        assert!(matches!(svc.cancel_checkout(&bob, pwc), Err(ServiceError::Versioning(_))));
        svc.checkin(&CallContext::user("Admin"), pwc, true, None, None, None).unwrap();
    }

    #[test]
    fn checkin_of_a_released_version_fails() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        assert!(matches!(svc.checkin(&ctx(), v1, true, None, None, None), Err(ServiceError::Versioning(_))));
    }

    #[test]
    fn unversionable_documents_cannot_be_checked_out() {
        let svc = service();
        let doc = document(&svc, svc.root_folder_id(), "plain");
        assert!(matches!(svc.checkout(&ctx(), doc), Err(ServiceError::Constraint(_))));
    }

    #[test]
    fn checked_out_docs_per_folder() {
        let svc = service();
        let root = svc.root_folder_id();
        let a = crate::service::tests::folder(&svc, root, "A");
        let in_a = versioned(&svc, a, "in-a");
        let at_root = versioned(&svc, root, "at-root");
        svc.checkout(&ctx(), in_a).unwrap();
        svc.checkout(&ctx(), at_root).unwrap();

        assert_eq!(svc.get_checked_out_docs(&ctx(), None).unwrap().len(), 2);
        let only_a = svc.get_checked_out_docs(&ctx(), Some(a)).unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].name(), "in-a");
        assert_eq!(
            only_a[0].properties.first_str(pid::VERSION_SERIES_CHECKED_OUT_BY),
            Some(USER)
        );
    }

    #[test]
    fn deleting_one_version_keeps_the_rest() {
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "doc");
        let pwc = svc.checkout(&ctx(), v1).unwrap();
        let v2 = svc.checkin(&ctx(), pwc, true, None, None, None).unwrap();

        svc.delete_object(&ctx(), v2, false).unwrap();
        let versions = svc.get_all_versions(&ctx(), v1).unwrap();
        assert_eq!(labels(&versions), vec!["1.0"]);

        svc.delete_object(&ctx(), v1, true).unwrap();
        assert!(svc.get_object(&ctx(), v1).is_err());
        assert_eq!(svc.store().object_count(), 1);
    }

    #[test]
    fn checked_out_creation_then_first_checkin() {
        let svc = service();
        let pwc = svc
            .create_document(
                &ctx(),
                &props("draft", VERSIONED),
                Some(svc.root_folder_id()),
                None,
                VersioningState::CheckedOut,
                CreateExtras::default(),
            )
            .unwrap();
        let v = svc.checkin(&ctx(), pwc, false, None, None, None).unwrap();
        let data = svc.get_object(&ctx(), v).unwrap();
        assert_eq!(data.properties.first_str(pid::VERSION_LABEL), Some("0.1"));
    }

    #[test]
    fn traced_checkout_cycle() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let svc = service();
        let v1 = versioned(&svc, svc.root_folder_id(), "traced");
        let pwc = svc.checkout(&ctx(), v1).unwrap();
        svc.cancel_checkout(&ctx(), pwc).unwrap();
        assert_eq!(svc.get_all_versions(&ctx(), v1).unwrap().len(), 1);
    }
}
