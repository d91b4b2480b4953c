use cmis_types::{Ace, AclId, AclPropagation, ObjectId, Permission};
use tracing::{debug, info};

use super::InMemoryObjectStore;
use crate::acl::InMemoryAcl;
use crate::error::{StoreError, StoreResult};
use crate::traits::{AclStore, ObjectStore};

impl InMemoryObjectStore {
    /// Add and remove entries on the ACL of an object (or, for a version,
    /// its series). The current ACL is read and replaced under the coarse
    /// lock.
    ///
    /// Holders on which `principal` lacks `cmis:all` are left alone and
    /// `None` is returned.
    fn change_acl(&self, id: ObjectId, add: &[Ace], remove: &[Ace], principal: &str) -> StoreResult<Option<AclId>> {
        let _guard = self.lock.lock();
        let mut holder = self.filed_as(self.load(id)?)?;
        if !self.can(&holder, principal, Permission::All)? {
            debug!(id = %holder.id, %principal, "skipping ACL change, no cmis:all");
            return Ok(None);
        }
        let acl_id = self
            .acls
            .compute_acl_id(Some(holder.meta.acl_id), add, remove, &self.ids);
        if holder.meta.acl_id != acl_id {
            holder.meta.acl_id = acl_id;
            self.save(holder, principal);
        }
        Ok(Some(acl_id))
    }

    /// Apply the same change to every descendant `principal` fully
    /// controls. Returns the number of objects changed.
    fn propagate_acl(&self, folder_id: ObjectId, add: &[Ace], remove: &[Ace], principal: &str) -> StoreResult<usize> {
        let mut changed = 0;
        for child in self.raw_children(folder_id) {
            if self.change_acl(child.id, add, remove, principal)?.is_none() {
                continue;
            }
            changed += 1;
            if child.is_folder() {
                changed += self.propagate_acl(child.id, add, remove, principal)?;
            }
        }
        Ok(changed)
    }
}

impl AclStore for InMemoryObjectStore {
    fn is_admin(&self, principal: &str) -> bool {
        principal == self.options.admin_principal
    }

    fn acl_of(&self, id: ObjectId) -> StoreResult<InMemoryAcl> {
        let object = self.load(id)?;
        Ok(self.acls.get_acl(self.effective_acl_id(&object)?))
    }

    fn has_access(&self, id: ObjectId, principal: &str, permission: Permission) -> StoreResult<bool> {
        let object = self.load(id)?;
        self.can(&object, principal, permission)
    }

    fn apply_acl(
        &self,
        id: ObjectId,
        add: &[Ace],
        remove: &[Ace],
        propagation: AclPropagation,
        principal: &str,
    ) -> StoreResult<InMemoryAcl> {
        let Some(acl_id) = self.change_acl(id, add, remove, principal)? else {
            return Err(StoreError::PermissionDenied {
                principal: principal.to_string(),
                permission: Permission::All,
                id,
            });
        };
        let holder = self.filed_as(self.load(id)?)?;

        if propagation != AclPropagation::ObjectOnly && holder.is_folder() {
            let changed = self.propagate_acl(holder.id, add, remove, principal)?;
            info!(folder = %holder.id, changed, "propagated ACL change");
        }
        Ok(self.acls.get_acl(acl_id))
    }
}
