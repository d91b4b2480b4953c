use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use cmis_types::{AclId, ObjectId};

/// First object id handed out by a fresh allocator.
pub const FIRST_OBJECT_ID: u64 = 100;

/// Issues object and ACL identifiers for one store instance.
///
/// Both sequences are strictly increasing and never reuse a value, even
/// after the object or ACL it named is gone. ACL ids start at 1 because 0
/// is reserved for the default ACL.
#[derive(Debug)]
pub struct IdAllocator {
    next_object: AtomicU64,
    next_acl: AtomicU32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_object: AtomicU64::new(FIRST_OBJECT_ID),
            next_acl: AtomicU32::new(1),
        }
    }

    pub fn next_object_id(&self) -> ObjectId {
        ObjectId::new(self.next_object.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_acl_id(&self) -> AclId {
        AclId::new(self.next_acl.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
