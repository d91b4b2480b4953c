use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Special principal ids.
pub mod principals {
    /// Matches every principal.
    pub const ANYONE: &str = "anyone";
    /// The principal of unauthenticated callers.
    pub const ANONYMOUS: &str = "anonymous";
    /// Macro replaced by the calling user before an ACL is applied.
    pub const USER_MACRO: &str = "cmis:user";
}

/// Basic CMIS permissions, ordered so that a greater permission implies the
/// lesser ones: `Read < Write < All`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    Read,
    Write,
    All,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "cmis:read",
            Self::Write => "cmis:write",
            Self::All => "cmis:all",
        }
    }

    /// Returns `true` if holding `self` grants `requested`.
    pub fn implies(&self, requested: Permission) -> bool {
        *self >= requested
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cmis:read" => Ok(Self::Read),
            "cmis:write" => Ok(Self::Write),
            "cmis:all" => Ok(Self::All),
            other => Err(TypeError::UnknownEnumValue {
                kind: "permission",
                value: other.to_string(),
            }),
        }
    }
}

/// Access control entry: a permission granted to a principal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ace {
    pub principal: String,
    pub permission: Permission,
}

impl Ace {
    pub fn new(principal: impl Into<String>, permission: Permission) -> Self {
        Self {
            principal: principal.into(),
            permission,
        }
    }

    /// The entry making up the default ACL: `cmis:all` for `anyone`.
    pub fn default_ace() -> Self {
        Self::new(principals::ANYONE, Permission::All)
    }

    /// Returns `true` if this entry grants `permission` to `principal`.
    pub fn grants(&self, principal: &str, permission: Permission) -> bool {
        (self.principal == principal || self.principal == principals::ANYONE)
            && self.permission.implies(permission)
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.principal, self.permission)
    }
}

/// How an ACL change spreads through a folder tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclPropagation {
    /// Only the target object is changed.
    ObjectOnly,
    /// The change is applied to the target and all descendants.
    Propagate,
    /// The repository decides; this repository treats it as `Propagate`.
    #[default]
    RepositoryDetermined,
}
