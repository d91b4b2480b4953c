use cmis_types::{ObjectId, Permission, UnfileObject};
use tracing::{debug, info, warn};

use super::InMemoryObjectStore;
use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject, VersionSeries};
use crate::traits::{ChildrenPage, FilingStore, ObjectStore, Paging};

impl InMemoryObjectStore {
    /// The version a series is listed as.
    fn listed_version(&self, series: &VersionSeries, use_pwc: bool) -> Option<StoredObject> {
        let pick = match (use_pwc, series.pwc_id, series.latest(false)) {
            (true, Some(pwc), _) => pwc,
            (_, _, Some(latest)) => latest.id,
            (_, Some(pwc), None) => pwc,
            (_, None, None) => return None,
        };
        self.load(pick).ok()
    }

    fn page(mut objects: Vec<StoredObject>, paging: Paging) -> ChildrenPage {
        objects.sort_by(|a, b| a.name().cmp(b.name()).then(a.id.cmp(&b.id)));
        let total = objects.len();
        let page: Vec<StoredObject> = objects
            .into_iter()
            .skip(paging.skip)
            .take(paging.max_items.unwrap_or(usize::MAX))
            .collect();
        let has_more = paging.skip.saturating_add(page.len()) < total;
        ChildrenPage {
            objects: page,
            total,
            has_more,
        }
    }

    fn find_by_path(&self, folder_id: ObjectId, segments: &[&str], user: Option<&str>) -> Option<StoredObject> {
        let (head, rest) = segments.split_first()?;
        let page = self.children(folder_id, Paging::all(), user, false).ok()?;
        for child in page.objects.into_iter().filter(|c| c.name() == *head) {
            if rest.is_empty() {
                return Some(child);
            }
            if child.is_folder() {
                if let Some(found) = self.find_by_path(child.id, rest, user) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Delete one non-folder child of a tree walk.
    fn delete_tree_leaf(
        &self,
        child: &StoredObject,
        folder_id: ObjectId,
        all_versions: bool,
        unfile: UnfileObject,
        user: &str,
    ) -> StoreResult<()> {
        if !self.can(child, user, Permission::Write)? {
            return Err(StoreError::PermissionDenied {
                principal: user.to_string(),
                permission: Permission::Write,
                id: child.id,
            });
        }
        if unfile == UnfileObject::DeleteSingleFiled && child.parent_ids().len() > 1 {
            debug!(id = %child.id, "multi-filed, unfiling instead of deleting");
            return self.unlink(child.id, folder_id, user).map(|_| ());
        }
        match &child.kind {
            ObjectKind::VersionSeries(series) if !all_versions => match series.latest(false) {
                Some(latest) => self.delete_object(latest.id, false),
                None => self.delete_object(child.id, true),
            },
            _ => self.delete_object(child.id, true),
        }
    }

    /// Returns `false` if anything below or at `folder_id` failed.
    fn delete_tree_walk(
        &self,
        folder_id: ObjectId,
        all_versions: bool,
        unfile: UnfileObject,
        continue_on_failure: bool,
        user: &str,
        failed: &mut Vec<ObjectId>,
    ) -> bool {
        let mut clean = true;
        for child in self.raw_children(folder_id) {
            let ok = if child.is_folder() {
                self.delete_tree_walk(child.id, all_versions, unfile, continue_on_failure, user, failed)
            } else {
                match self.delete_tree_leaf(&child, folder_id, all_versions, unfile, user) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(id = %child.id, error = %e, "delete tree: child not deleted");
                        failed.push(child.id);
                        false
                    }
                }
            };
            if !ok {
                clean = false;
                if !continue_on_failure {
                    return false;
                }
            }
        }

        let folder = match self.load(folder_id) {
            Ok(folder) => folder,
            Err(_) => return clean,
        };
        let result = match self.can(&folder, user, Permission::Write) {
            Ok(true) => self.delete_object(folder_id, true),
            Ok(false) => Err(StoreError::PermissionDenied {
                principal: user.to_string(),
                permission: Permission::Write,
                id: folder_id,
            }),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => clean,
            Err(e) => {
                warn!(id = %folder_id, error = %e, "delete tree: folder not deleted");
                failed.push(folder_id);
                false
            }
        }
    }

    /// Remove one parent link while the coarse lock is not held.
    fn unlink(&self, id: ObjectId, folder_id: ObjectId, user: &str) -> StoreResult<StoredObject> {
        let _guard = self.lock.lock();
        let mut filed = self.load(id)?;
        let Some(parents) = filed.kind.parent_ids_mut() else {
            return Err(StoreError::NotSupported(format!(
                "object {id} cannot be removed from a folder"
            )));
        };
        parents.retain(|p| *p != folder_id);
        Ok(self.save(filed, user))
    }
}

impl FilingStore for InMemoryObjectStore {
    fn children(
        &self,
        folder_id: ObjectId,
        paging: Paging,
        user: Option<&str>,
        use_pwc: bool,
    ) -> StoreResult<ChildrenPage> {
        self.require_folder(folder_id)?;
        let mut visible = Vec::new();
        for child in self.raw_children(folder_id) {
            let shown = match &child.kind {
                ObjectKind::VersionSeries(series) => match self.listed_version(series, use_pwc) {
                    Some(version) => version,
                    None => continue,
                },
                _ => child,
            };
            if self.readable_by(&shown, user) {
                visible.push(shown);
            }
        }
        Ok(Self::page(visible, paging))
    }

    fn folder_children(
        &self,
        folder_id: ObjectId,
        paging: Paging,
        user: Option<&str>,
    ) -> StoreResult<ChildrenPage> {
        self.require_folder(folder_id)?;
        let visible = self
            .raw_children(folder_id)
            .into_iter()
            .filter(|child| child.is_folder())
            .filter(|child| self.readable_by(child, user))
            .collect();
        Ok(Self::page(visible, paging))
    }

    fn object_by_path(&self, path: &str, user: Option<&str>) -> StoreResult<StoredObject> {
        if !path.starts_with('/') {
            return Err(StoreError::InvalidArgument(format!("path must be absolute: {path}")));
        }
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let found = if segments.is_empty() {
            Some(self.load(self.root_folder_id())?)
        } else {
            self.find_by_path(self.root_folder_id(), &segments, user)
        };
        found
            .filter(|obj| self.readable_by(obj, user))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn object_path(&self, id: ObjectId) -> StoreResult<String> {
        let mut current = self.filed_as(self.load(id)?)?;
        let mut names = Vec::new();
        // each step moves one level up; more steps than objects means a cycle
        for _ in 0..=self.object_count() {
            let Some(&parent) = current.parent_ids().first() else {
                if current.id != self.root_folder_id() {
                    return Err(StoreError::InvalidArgument(format!("object {id} is unfiled")));
                }
                names.reverse();
                return Ok(format!("/{}", names.join("/")));
            };
            names.push(current.meta.name.clone());
            current = self.load(parent)?;
        }
        Err(StoreError::Constraint(format!("folder cycle above object {id}")))
    }

    fn parent_ids(&self, id: ObjectId) -> StoreResult<Vec<ObjectId>> {
        let filed = self.filed_as(self.load(id)?)?;
        Ok(filed.parent_ids().to_vec())
    }

    fn is_descendant(&self, ancestor: ObjectId, candidate: ObjectId) -> bool {
        let mut current = candidate;
        for _ in 0..=self.object_count() {
            let Ok(object) = self.load(current) else {
                return false;
            };
            match object.parent_ids().first() {
                Some(&parent) if parent == ancestor => return true,
                Some(&parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn move_object(
        &self,
        id: ObjectId,
        source_id: ObjectId,
        target_id: ObjectId,
        user: &str,
    ) -> StoreResult<StoredObject> {
        debug!(%id, source = %source_id, target = %target_id, "moving object");
        let _guard = self.lock.lock();
        let object = self.load(id)?;
        let mut filed = self.filed_as(object.clone())?;

        if filed.id == self.root_folder_id() {
            return Err(StoreError::NotSupported("the root folder cannot be moved".into()));
        }
        if !filed.kind.is_fileable() {
            return Err(StoreError::InvalidArgument(format!("object {id} is not fileable")));
        }
        let target = self.load(target_id)?;
        if !target.is_folder() {
            return Err(StoreError::NotSupported(format!("target {target_id} is not a folder")));
        }
        if !filed.has_parent(source_id) {
            return Err(StoreError::NotSupported(format!(
                "folder {source_id} is not a parent of object {id}"
            )));
        }
        if filed.is_folder() && (target_id == filed.id || self.is_descendant(filed.id, target_id)) {
            return Err(StoreError::NotSupported(format!(
                "cannot move folder {} into itself or a descendant",
                filed.id
            )));
        }
        if source_id == target_id {
            return Ok(object);
        }
        if self.has_named_child(target_id, filed.name(), Some(filed.id)) {
            return Err(StoreError::NameConstraintViolation {
                name: filed.meta.name.clone(),
                folder: target_id,
            });
        }

        match &mut filed.kind {
            ObjectKind::Folder(folder) => folder.parent_id = Some(target_id),
            kind => {
                if let Some(parents) = kind.parent_ids_mut() {
                    parents.retain(|p| *p != source_id);
                    if !parents.contains(&target_id) {
                        parents.push(target_id);
                    }
                }
            }
        }
        let saved = self.save(filed, user);
        if saved.id == id {
            Ok(saved)
        } else {
            self.load(id)
        }
    }

    fn add_parent(&self, id: ObjectId, folder_id: ObjectId, user: &str) -> StoreResult<StoredObject> {
        if !self.options.multi_filing {
            return Err(StoreError::NotSupported("multi-filing is not supported".into()));
        }
        let _guard = self.lock.lock();
        let mut filed = self.filed_as(self.load(id)?)?;
        self.require_folder(folder_id)?;
        if filed.has_parent(folder_id) {
            return Ok(filed);
        }
        if self.has_named_child(folder_id, filed.name(), Some(filed.id)) {
            return Err(StoreError::NameConstraintViolation {
                name: filed.meta.name.clone(),
                folder: folder_id,
            });
        }
        let Some(parents) = filed.kind.parent_ids_mut() else {
            return Err(StoreError::NotSupported(format!("object {id} cannot be multi-filed")));
        };
        parents.push(folder_id);
        debug!(%id, folder = %folder_id, "added parent");
        Ok(self.save(filed, user))
    }

    fn remove_parent(&self, id: ObjectId, folder_id: ObjectId, user: &str) -> StoreResult<StoredObject> {
        let _guard = self.lock.lock();
        let mut filed = self.filed_as(self.load(id)?)?;
        let unfiling = self.options.unfiling;
        let Some(parents) = filed.kind.parent_ids_mut() else {
            return Err(StoreError::NotSupported(format!(
                "object {id} cannot be removed from a folder"
            )));
        };
        if !parents.contains(&folder_id) {
            return Err(StoreError::InvalidArgument(format!(
                "folder {folder_id} is not a parent of object {id}"
            )));
        }
        if parents.len() == 1 && !unfiling {
            return Err(StoreError::NotSupported("unfiling is not supported".into()));
        }
        parents.retain(|p| *p != folder_id);
        debug!(%id, folder = %folder_id, "removed parent");
        Ok(self.save(filed, user))
    }

    fn delete_tree(
        &self,
        folder_id: ObjectId,
        all_versions: bool,
        unfile: UnfileObject,
        continue_on_failure: bool,
        user: &str,
    ) -> StoreResult<Vec<ObjectId>> {
        if folder_id == self.root_folder_id() {
            return Err(StoreError::NotSupported("the root folder cannot be deleted".into()));
        }
        if unfile == UnfileObject::Unfile {
            return Err(StoreError::NotSupported("unfiling during delete tree".into()));
        }
        self.require_folder(folder_id)?;

        let mut failed = Vec::new();
        self.delete_tree_walk(folder_id, all_versions, unfile, continue_on_failure, user, &mut failed);
        info!(folder = %folder_id, failed = failed.len(), "delete tree finished");
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::tests::{document, folder, store, versioned, USER};
    use crate::object::NewObject;
    use crate::options::StoreOptions;
    use crate::traits::AclStore;
    use cmis_types::{Ace, AclPropagation, VersioningState};

    // ----------------------------------------------------------------
    // Children
    // ----------------------------------------------------------------

    #[test]
    fn children_are_sorted_and_paged() {
        let store = store();
        let root = store.root_folder_id();
        for name in ["c", "a", "e", "b", "d"] {
            document(&store, root, name);
        }
        let page = store.children(root, Paging::new(1, Some(2)), None, false).unwrap();
        let names: Vec<&str> = page.objects.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(page.total, 5);
        assert!(page.has_more);

        let tail = store.children(root, Paging::new(4, Some(10)), None, false).unwrap();
        assert_eq!(tail.objects.len(), 1);
        assert!(!tail.has_more);
    }

    #[test]
    fn children_substitute_latest_version_or_pwc() {
        let store = store();
        let root = store.root_folder_id();
        let v1 = versioned(&store, root, "doc", VersioningState::Major);
        let listed = store.children(root, Paging::all(), None, false).unwrap();
        assert_eq!(listed.objects[0].id, v1);

        use crate::traits::VersioningStore;
        let pwc = store.checkout(v1, USER).unwrap();
        let with_pwc = store.children(root, Paging::all(), None, true).unwrap();
        assert_eq!(with_pwc.objects[0].id, pwc);
        let without = store.children(root, Paging::all(), None, false).unwrap();
        assert_eq!(without.objects[0].id, v1);
    }

    #[test]
    fn children_filtered_by_read_access() {
        let store = store();
        let root = store.root_folder_id();
        let secret = document(&store, root, "secret");
        document(&store, root, "public");
        store
            .set_acl(secret, &[Ace::new("bob", cmis_types::Permission::All)], AclPropagation::ObjectOnly, "Admin")
            .unwrap();

        let for_carol = store.children(root, Paging::all(), Some("carol"), false).unwrap();
        assert_eq!(for_carol.total, 1);
        assert_eq!(for_carol.objects[0].name(), "public");
        let for_bob = store.children(root, Paging::all(), Some("bob"), false).unwrap();
        assert_eq!(for_bob.total, 2);
    }

    #[test]
    fn folder_children_skip_documents() {
        let store = store();
        let root = store.root_folder_id();
        folder(&store, root, "F");
        document(&store, root, "doc");
        let page = store.folder_children(root, Paging::all(), None).unwrap();
        assert_eq!(page.total, 1);
        assert!(page.objects[0].is_folder());
    }

    #[test]
    fn descendants_respect_depth() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let b = folder(&store, a, "B");
        document(&store, b, "deep");

        let one = store.descendants(root, 1, None, false).unwrap();
        assert_eq!(one.len(), 1);
        assert!(one[0].children.is_empty());

        let all = store.descendants(root, -1, None, false).unwrap();
        assert_eq!(all[0].children[0].children[0].object.name(), "deep");

        let folders = store.descendants(root, -1, None, true).unwrap();
        assert!(folders[0].children[0].children.is_empty());

        assert!(store.descendants(root, 0, None, false).is_err());
    }

    // ----------------------------------------------------------------
    // Paths
    // ----------------------------------------------------------------

    #[test]
    fn path_resolution() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let doc = document(&store, a, "doc.txt");

        assert_eq!(store.object_by_path("/", None).unwrap().id, root);
        assert_eq!(store.object_by_path("/A", None).unwrap().id, a);
        assert_eq!(store.object_by_path("/A/doc.txt", None).unwrap().id, doc);
        assert_eq!(store.object_by_path("/A/", None).unwrap().id, a);
        assert!(matches!(store.object_by_path("/B", None), Err(StoreError::NotFound(_))));
        assert!(matches!(store.object_by_path("A", None), Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn path_resolves_versioned_document_to_latest() {
        let store = store();
        let v1 = versioned(&store, store.root_folder_id(), "v.txt", VersioningState::Major);
        assert_eq!(store.object_by_path("/v.txt", None).unwrap().id, v1);
    }

    #[test]
    fn object_path_walks_to_root() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let b = folder(&store, a, "B");
        let doc = document(&store, b, "doc");
        assert_eq!(store.object_path(root).unwrap(), "/");
        assert_eq!(store.object_path(b).unwrap(), "/A/B");
        assert_eq!(store.object_path(doc).unwrap(), "/A/B/doc");
    }

    // ----------------------------------------------------------------
    // Move and rename
    // ----------------------------------------------------------------

    #[test]
    fn move_document_between_folders() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let b = folder(&store, root, "B");
        let doc = document(&store, a, "doc");

        let moved = store.move_object(doc, a, b, USER).unwrap();
        assert_eq!(moved.parent_ids(), &[b]);
        assert_eq!(store.children(a, Paging::all(), None, false).unwrap().total, 0);
    }

    #[test]
    fn move_into_own_descendant_fails() {
        let store = store();
        let root = store.root_folder_id();
        let p = folder(&store, root, "P");
        let c = folder(&store, p, "C");
        let err = store.move_object(p, root, c, USER).unwrap_err();
        assert!(matches!(err, StoreError::NotSupported(_)));
        let err = store.move_object(p, root, p, USER).unwrap_err();
        assert!(matches!(err, StoreError::NotSupported(_)));
        assert_eq!(store.get_object(p).unwrap().parent_ids(), &[root]);
    }

    #[test]
    fn move_checks_target_name_collision() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        document(&store, root, "doc");
        let inner = document(&store, a, "doc");
        let err = store.move_object(inner, a, root, USER).unwrap_err();
        assert!(matches!(err, StoreError::NameConstraintViolation { .. }));
    }

    #[test]
    fn move_requires_source_parent() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let b = folder(&store, root, "B");
        let doc = document(&store, a, "doc");
        assert!(matches!(store.move_object(doc, b, root, USER), Err(StoreError::NotSupported(_))));
    }

    #[test]
    fn root_cannot_be_moved_or_renamed() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        assert!(matches!(store.move_object(root, root, a, USER), Err(StoreError::NotSupported(_))));
        assert!(matches!(store.rename(root, "New", USER), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn rename_checks_siblings() {
        let store = store();
        let root = store.root_folder_id();
        folder(&store, root, "A");
        let b = folder(&store, root, "B");
        assert!(matches!(store.rename(b, "A", USER), Err(StoreError::NameConstraintViolation { .. })));
        let renamed = store.rename(b, "C", USER).unwrap();
        assert_eq!(renamed.name(), "C");
        assert!(store.rename(b, "C", USER).is_ok());
    }

    #[test]
    fn renaming_a_version_renames_the_series() {
        use crate::traits::VersioningStore;
        let store = store();
        let v1 = versioned(&store, store.root_folder_id(), "old", VersioningState::Major);
        let pwc = store.checkout(v1, USER).unwrap();
        store.rename(pwc, "new", USER).unwrap();
        for v in store.all_versions(v1).unwrap() {
            assert_eq!(v.name(), "new");
        }
        assert_eq!(store.series_of(v1).unwrap().name(), "new");
        assert_eq!(store.object_by_path("/new", None).unwrap().id, v1);
    }

    // ----------------------------------------------------------------
    // Multi-filing
    // ----------------------------------------------------------------

    #[test]
    fn add_and_remove_parent() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let doc = document(&store, root, "doc");

        let filed = store.add_parent(doc, a, USER).unwrap();
        assert_eq!(filed.parent_ids().len(), 2);
        assert_eq!(store.object_path(doc).unwrap(), "/doc");

        store.remove_parent(doc, root, USER).unwrap();
        assert_eq!(store.parent_ids(doc).unwrap(), vec![a]);
        assert!(matches!(store.remove_parent(doc, a, USER), Err(StoreError::NotSupported(_))));
    }

    #[test]
    fn folders_cannot_be_multi_filed() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let b = folder(&store, root, "B");
        assert!(matches!(store.add_parent(b, a, USER), Err(StoreError::NotSupported(_))));
    }

    #[test]
    fn add_parent_checks_name_collision() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        document(&store, a, "doc");
        let doc = document(&store, root, "doc");
        assert!(matches!(
            store.add_parent(doc, a, USER),
            Err(StoreError::NameConstraintViolation { .. })
        ));
    }

    #[test]
    fn multi_filing_can_be_disabled() {
        let store = InMemoryObjectStore::with_options(
            "r",
            StoreOptions {
                multi_filing: false,
                ..StoreOptions::default()
            },
        );
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        let doc = document(&store, root, "doc");
        assert!(matches!(store.add_parent(doc, a, USER), Err(StoreError::NotSupported(_))));
    }

    // ----------------------------------------------------------------
    // Delete tree
    // ----------------------------------------------------------------

    fn locked_tree(store: &InMemoryObjectStore) -> (ObjectId, ObjectId, ObjectId) {
        let root = store.root_folder_id();
        let top = folder(store, root, "top");
        let first = document(store, top, "a-locked");
        let second = document(store, top, "b-locked");
        document(store, top, "c-free");
        for id in [first, second] {
            store
                .set_acl(id, &[Ace::new("owner", cmis_types::Permission::All)], AclPropagation::ObjectOnly, "Admin")
                .unwrap();
        }
        (top, first, second)
    }

    #[test]
    fn delete_tree_removes_everything() {
        let store = store();
        let root = store.root_folder_id();
        let top = folder(&store, root, "top");
        let sub = folder(&store, top, "sub");
        document(&store, sub, "doc");
        versioned(&store, top, "v", VersioningState::Major);

        let failed = store.delete_tree(top, true, UnfileObject::Delete, true, USER).unwrap();
        assert!(failed.is_empty());
        assert_eq!(store.object_count(), 1);
    }

    #[test]
    fn delete_tree_stops_at_first_failure() {
        let store = store();
        let (top, first, _) = locked_tree(&store);
        let failed = store.delete_tree(top, true, UnfileObject::Delete, false, "carol").unwrap();
        assert_eq!(failed, vec![first]);
        assert!(store.exists(top));
        assert_eq!(store.children(top, Paging::all(), None, false).unwrap().total, 3);
    }

    #[test]
    fn delete_tree_continues_and_reports_all_failures() {
        let store = store();
        let (top, first, second) = locked_tree(&store);
        let failed = store.delete_tree(top, true, UnfileObject::Delete, true, "carol").unwrap();
        assert_eq!(failed, vec![first, second, top]);
        assert_eq!(store.children(top, Paging::all(), None, false).unwrap().total, 2);
    }

    #[test]
    fn delete_tree_rejects_root_and_unfile() {
        let store = store();
        let root = store.root_folder_id();
        let a = folder(&store, root, "A");
        assert!(matches!(
            store.delete_tree(root, true, UnfileObject::Delete, true, USER),
            Err(StoreError::NotSupported(_))
        ));
        assert!(matches!(
            store.delete_tree(a, true, UnfileObject::Unfile, true, USER),
            Err(StoreError::NotSupported(_))
        ));
    }

    #[test]
    fn delete_single_filed_unlinks_multi_filed_children() {
        let store = store();
        let root = store.root_folder_id();
        let top = folder(&store, root, "top");
        let doc = document(&store, top, "shared");
        store.add_parent(doc, root, USER).unwrap();

        let failed = store
            .delete_tree(top, true, UnfileObject::DeleteSingleFiled, true, USER)
            .unwrap();
        assert!(failed.is_empty());
        assert!(!store.exists(top));
        assert_eq!(store.parent_ids(doc).unwrap(), vec![root]);
    }

    #[test]
    fn unfiled_document_path_is_an_error() {
        let store = InMemoryObjectStore::with_options(
            "r",
            StoreOptions {
                unfiling: true,
                ..StoreOptions::default()
            },
        );
        let draft = store
            .create_document(NewObject::new("loose", "cmis:document", USER), vec![], None)
            .unwrap();
        let id = store.persist(draft).unwrap();
        assert!(store.object_path(id).is_err());
        assert!(store.parent_ids(id).unwrap().is_empty());
    }
}
