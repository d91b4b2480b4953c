use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a stored repository object.
///
/// Object ids are issued by the store's allocator on first persist and are
/// never reused, so a stale id can only ever resolve to the object it was
/// issued for or to nothing. On the wire (and in serde) an id is a decimal
/// string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(u64);

impl ObjectId {
    /// Create an `ObjectId` from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric value of this id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidObjectId(s.to_string()))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}

/// Reference into the ACL registry.
///
/// `AclId::DEFAULT` (0) denotes the open ACL granting `cmis:all` to everyone.
/// It is never stored in the registry; every object starts out with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AclId(u32);

impl AclId {
    /// The default, open ACL.
    pub const DEFAULT: AclId = AclId(0);

    /// Create an `AclId` from its numeric value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The numeric value of this id.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the default ACL.
    pub fn is_default(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acl:{}", self.0)
    }
}
