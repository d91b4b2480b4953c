//! Deduplicating registry of access control lists.
//!
//! Objects never carry their ACEs directly. They hold an [`AclId`] that
//! resolves through this registry, so thousands of objects sharing the same
//! permissions share one entry. The default ACL (`cmis:all` for `anyone`) is
//! id 0 and is never stored.

use std::collections::BTreeSet;

use cmis_types::{Ace, AclId, Permission};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::ids::IdAllocator;

/// An ordered, duplicate-free set of ACEs with its registry id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InMemoryAcl {
    pub id: AclId,
    pub aces: BTreeSet<Ace>,
}

impl InMemoryAcl {
    /// The open ACL every object starts with.
    pub fn default_acl() -> Self {
        Self {
            id: AclId::DEFAULT,
            aces: BTreeSet::from([Ace::default_ace()]),
        }
    }

    /// Returns `true` if any entry grants `permission` to `principal`.
    pub fn has_permission(&self, principal: &str, permission: Permission) -> bool {
        self.aces.iter().any(|ace| ace.grants(principal, permission))
    }

    /// The entries as a list, in registry order.
    pub fn to_vec(&self) -> Vec<Ace> {
        self.aces.iter().cloned().collect()
    }

    fn is_default_set(aces: &BTreeSet<Ace>) -> bool {
        aces.len() == 1 && aces.contains(&Ace::default_ace())
    }
}

/// Thread-safe ACL registry.
///
/// Registration runs under the registry's own write lock, so two callers
/// adding the same ACE set concurrently receive the same id.
#[derive(Debug, Default)]
pub struct AclRegistry {
    acls: RwLock<Vec<InMemoryAcl>>,
}

impl AclRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ACE set, returning the id of a structurally equal ACL if
    /// one already exists.
    pub fn add_acl(&self, aces: BTreeSet<Ace>, ids: &IdAllocator) -> AclId {
        if aces.is_empty() || InMemoryAcl::is_default_set(&aces) {
            return AclId::DEFAULT;
        }

        let mut acls = self.acls.write();
        if let Some(existing) = acls.iter().find(|acl| acl.aces == aces) {
            return existing.id;
        }

        let id = ids.next_acl_id();
        debug!(acl_id = %id, entries = aces.len(), "registered ACL");
        acls.push(InMemoryAcl { id, aces });
        id
    }

    /// Resolve an ACL id.
    ///
    /// Id 0 and unknown ids both resolve to the default ACL. An unknown id
    /// therefore grants full access to everyone.
    pub fn get_acl(&self, id: AclId) -> InMemoryAcl {
        if id.is_default() {
            return InMemoryAcl::default_acl();
        }
        match self.acls.read().iter().find(|acl| acl.id == id) {
            Some(acl) => acl.clone(),
            None => {
                warn!(acl_id = %id, "unknown ACL id, falling back to default ACL");
                InMemoryAcl::default_acl()
            }
        }
    }

    /// Derive a new ACL id from `current` by adding and removing entries.
    ///
    /// `current = None` starts from an empty ACL. A default-ACL object stays
    /// on the default unless the removal set names the default entry, and an
    /// ACL that ends up empty or contains the default entry maps to 0.
    pub fn compute_acl_id(
        &self,
        current: Option<AclId>,
        add: &[Ace],
        remove: &[Ace],
        ids: &IdAllocator,
    ) -> AclId {
        let mut aces = match current {
            Some(id) => self.get_acl(id).aces,
            None => BTreeSet::new(),
        };

        if aces.is_empty() && add.is_empty() && remove.is_empty() {
            return AclId::DEFAULT;
        }

        if current.is_some_and(|id| id.is_default()) && !remove.contains(&Ace::default_ace()) {
            return AclId::DEFAULT;
        }

        for ace in add {
            if *ace == Ace::default_ace() {
                return AclId::DEFAULT;
            }
            aces.insert(ace.clone());
        }
        for ace in remove {
            aces.remove(ace);
        }

        self.add_acl(aces, ids)
    }

    /// Ids of every registered ACL granting `permission` to `principal`.
    ///
    /// The default ACL always qualifies and is listed first.
    pub fn acls_for_user(&self, principal: &str, permission: Permission) -> Vec<AclId> {
        let mut result = vec![AclId::DEFAULT];
        result.extend(
            self.acls
                .read()
                .iter()
                .filter(|acl| acl.has_permission(principal, permission))
                .map(|acl| acl.id),
        );
        result
    }

    /// Returns `true` if the ACL behind `id` grants `permission`.
    pub fn has_permission(&self, id: AclId, principal: &str, permission: Permission) -> bool {
        self.get_acl(id).has_permission(principal, permission)
    }

    /// Number of stored (non-default) ACLs.
    pub fn len(&self) -> usize {
        self.acls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.acls.read().is_empty()
    }

    /// Drop every stored ACL.
    pub fn clear(&self) {
        self.acls.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ace(p: &str, perm: Permission) -> Ace {
        Ace::new(p, perm)
    }

    // ----------------------------------------------------------------
    // Registration
    // ----------------------------------------------------------------

    #[test]
    fn equal_sets_share_an_id() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let a = reg.add_acl(BTreeSet::from([ace("alice", Permission::Read)]), &ids);
        let b = reg.add_acl(BTreeSet::from([ace("alice", Permission::Read)]), &ids);
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn default_set_is_never_stored() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let id = reg.add_acl(BTreeSet::from([Ace::default_ace()]), &ids);
        assert_eq!(id, AclId::DEFAULT);
        assert!(reg.is_empty());
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let reg = AclRegistry::new();
        let acl = reg.get_acl(AclId::new(999));
        assert_eq!(acl, InMemoryAcl::default_acl());
        assert!(reg.has_permission(AclId::new(999), "mallory", Permission::All));
    }

    // ----------------------------------------------------------------
    // compute_acl_id
    // ----------------------------------------------------------------

    #[test]
    fn empty_change_on_empty_acl_is_default() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        assert_eq!(reg.compute_acl_id(None, &[], &[], &ids), AclId::DEFAULT);
    }

    #[test]
    fn default_stays_default_unless_default_ace_removed() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let add = [ace("alice", Permission::Write)];

        let kept = reg.compute_acl_id(Some(AclId::DEFAULT), &add, &[], &ids);
        assert_eq!(kept, AclId::DEFAULT);

        let replaced = reg.compute_acl_id(Some(AclId::DEFAULT), &add, &[Ace::default_ace()], &ids);
        assert_ne!(replaced, AclId::DEFAULT);
        assert_eq!(reg.get_acl(replaced).to_vec(), vec![ace("alice", Permission::Write)]);
    }

    #[test]
    fn adding_default_ace_forces_default() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let base = reg.add_acl(BTreeSet::from([ace("bob", Permission::Read)]), &ids);
        let id = reg.compute_acl_id(Some(base), &[Ace::default_ace()], &[], &ids);
        assert_eq!(id, AclId::DEFAULT);
    }

    #[test]
    fn removing_everything_yields_default() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let base = reg.add_acl(BTreeSet::from([ace("bob", Permission::Read)]), &ids);
        let id = reg.compute_acl_id(Some(base), &[], &[ace("bob", Permission::Read)], &ids);
        assert_eq!(id, AclId::DEFAULT);
    }

    #[test]
    fn start_from_empty_with_additions() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let id = reg.compute_acl_id(None, &[ace("carol", Permission::All)], &[], &ids);
        assert!(reg.has_permission(id, "carol", Permission::Write));
        assert!(!reg.has_permission(id, "dave", Permission::Read));
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    #[test]
    fn acls_for_user_scans_registry() {
        let reg = AclRegistry::new();
        let ids = IdAllocator::new();
        let readable = reg.add_acl(BTreeSet::from([ace("alice", Permission::Read)]), &ids);
        let other = reg.add_acl(BTreeSet::from([ace("bob", Permission::All)]), &ids);

        let found = reg.acls_for_user("alice", Permission::Read);
        assert!(found.contains(&AclId::DEFAULT));
        assert!(found.contains(&readable));
        assert!(!found.contains(&other));
        assert!(!reg.acls_for_user("alice", Permission::Write).contains(&readable));
    }

    proptest! {
        #[test]
        fn registration_is_idempotent(names in proptest::collection::btree_set("[a-z]{1,6}", 1..5)) {
            let reg = AclRegistry::new();
            let ids = IdAllocator::new();
            let aces: BTreeSet<Ace> = names.iter().map(|n| ace(n, Permission::Read)).collect();
            let first = reg.add_acl(aces.clone(), &ids);
            let second = reg.add_acl(aces, &ids);
            prop_assert_eq!(first, second);
            prop_assert_eq!(reg.len(), 1);
        }
    }
}
