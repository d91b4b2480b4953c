use chrono::Utc;
use cmis_types::{ChangeToken, ContentStream, ObjectId, Properties};
use tracing::debug;

use super::InMemoryObjectStore;
use crate::error::{StoreError, StoreResult};
use crate::object::{DocumentVersion, ObjectKind, StoredObject, VersionLabel, VersionRef};
use crate::traits::VersioningStore;

impl InMemoryObjectStore {
    /// Load a private working copy and its series, checking that `user` may
    /// finish the checkout.
    fn load_pwc(&self, pwc_id: ObjectId, user: &str) -> StoreResult<(StoredObject, StoredObject)> {
        let pwc = self.load(pwc_id)?;
        let Some(version) = pwc.kind.as_version() else {
            return Err(StoreError::Versioning(format!("object {pwc_id} is not a document version")));
        };
        if !version.is_pwc() {
            return Err(StoreError::Versioning(format!(
                "object {pwc_id} is not a private working copy"
            )));
        }
        let series = self.load(version.series_id)?;
        let checked_out_by = series
            .kind
            .as_series()
            .and_then(|s| s.checked_out_by.as_deref())
            .unwrap_or_default();
        if checked_out_by != user && user != self.options.admin_principal {
            return Err(StoreError::Versioning(format!(
                "document is checked out by {checked_out_by}"
            )));
        }
        Ok((pwc, series))
    }
}

impl VersioningStore for InMemoryObjectStore {
    fn series_of(&self, id: ObjectId) -> StoreResult<StoredObject> {
        let object = self.load(id)?;
        match &object.kind {
            ObjectKind::VersionSeries(_) => Ok(object),
            ObjectKind::Version(v) => self.load(v.series_id),
            _ => Err(StoreError::Constraint(format!("object {id} is not versionable"))),
        }
    }

    fn checkout(&self, id: ObjectId, user: &str) -> StoreResult<ObjectId> {
        let _guard = self.lock.lock();
        let mut series = self.series_of(id)?;
        let series_id = series.id;
        let Some(data) = series.kind.as_series_mut() else {
            return Err(StoreError::Constraint(format!("object {id} is not versionable")));
        };
        if data.is_checked_out() {
            return Err(StoreError::Versioning(format!(
                "document {series_id} is already checked out"
            )));
        }
        let latest = data
            .latest(false)
            .ok_or_else(|| StoreError::Versioning(format!("series {series_id} has no version")))?;
        let source = self.load(latest.id)?;

        let pwc_id = self.ids.next_object_id();
        let now = Utc::now();
        let mut meta = source.meta.clone();
        meta.created_by = user.to_string();
        meta.created_at = now;
        meta.touch(user, now);
        let pwc = StoredObject {
            id: pwc_id,
            change_token: ChangeToken::first(),
            meta,
            kind: ObjectKind::Version(DocumentVersion {
                series_id,
                content: source.kind.content().cloned(),
                label: None,
                checkin_comment: None,
            }),
        };
        self.objects.insert(pwc_id, pwc);

        data.pwc_id = Some(pwc_id);
        data.checked_out_by = Some(user.to_string());
        self.save(series, user);
        debug!(series = %series_id, pwc = %pwc_id, %user, "checked out");
        Ok(pwc_id)
    }

    fn checkin(
        &self,
        pwc_id: ObjectId,
        major: bool,
        properties: Option<Properties>,
        content: Option<ContentStream>,
        comment: Option<String>,
        user: &str,
    ) -> StoreResult<ObjectId> {
        let _guard = self.lock.lock();
        let (mut pwc, mut series) = self.load_pwc(pwc_id, user)?;
        let Some(data) = series.kind.as_series_mut() else {
            return Err(StoreError::Versioning("working copy without series".into()));
        };
        let label = VersionLabel::next(data.latest(false).map(|v| v.label), major);

        if let Some(properties) = &properties {
            pwc.meta.properties.merge(properties);
        }
        if let Some(version) = pwc.kind.as_version_mut() {
            version.label = Some(label);
            version.checkin_comment = comment;
            if content.is_some() {
                version.content = content;
            }
        }
        data.versions.push(VersionRef { id: pwc_id, label });
        data.pwc_id = None;
        data.checked_out_by = None;

        self.save(pwc, user);
        self.save(series, user);
        debug!(version = %pwc_id, %label, "checked in");
        Ok(pwc_id)
    }

    fn cancel_checkout(&self, pwc_id: ObjectId, user: &str) -> StoreResult<()> {
        let _guard = self.lock.lock();
        let (_pwc, mut series) = self.load_pwc(pwc_id, user)?;
        let Some(data) = series.kind.as_series_mut() else {
            return Err(StoreError::Versioning("working copy without series".into()));
        };
        data.pwc_id = None;
        data.checked_out_by = None;
        let orphaned = data.versions.is_empty();

        self.remove(pwc_id);
        if orphaned {
            debug!(series = %series.id, "checkout cancelled on a working-copy-only series, removing it");
            self.remove(series.id);
        } else {
            self.save(series, user);
        }
        debug!(pwc = %pwc_id, "checkout cancelled");
        Ok(())
    }

    fn all_versions(&self, id: ObjectId) -> StoreResult<Vec<StoredObject>> {
        let series = self.series_of(id)?;
        let Some(data) = series.kind.as_series() else {
            return Ok(Vec::new());
        };
        let mut ids: Vec<ObjectId> = data.pwc_id.into_iter().collect();
        ids.extend(data.versions.iter().rev().map(|v| v.id));
        ids.into_iter().map(|id| self.load(id)).collect()
    }

    fn latest_version(&self, id: ObjectId, major_only: bool) -> StoreResult<StoredObject> {
        let series = self.series_of(id)?;
        let data = series
            .kind
            .as_series()
            .ok_or_else(|| StoreError::Constraint(format!("object {id} is not versionable")))?;
        match (data.latest(major_only), data.pwc_id) {
            (Some(latest), _) => self.load(latest.id),
            (None, Some(pwc)) if !major_only => self.load(pwc),
            _ => Err(StoreError::NotFound(format!("latest version of {id}"))),
        }
    }

    fn checked_out_documents(&self, folder_id: Option<ObjectId>, user: Option<&str>) -> Vec<StoredObject> {
        let pwc_ids: Vec<ObjectId> = self
            .objects
            .iter()
            .filter_map(|entry| {
                let series = entry.value();
                let data = series.kind.as_series()?;
                if folder_id.is_some_and(|f| !data.parent_ids.contains(&f)) {
                    return None;
                }
                data.pwc_id
            })
            .collect();

        let mut result: Vec<StoredObject> = pwc_ids
            .into_iter()
            .filter_map(|id| self.load(id).ok())
            .filter(|pwc| self.readable_by(pwc, user))
            .collect();
        result.sort_by(|a, b| a.name().cmp(b.name()).then(a.id.cmp(&b.id)));
        result
    }
}
