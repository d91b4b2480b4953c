use serde::{Deserialize, Serialize};

/// Repository-wide switches the store enforces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Principal that bypasses every ACL check.
    pub admin_principal: String,
    /// Whether documents and items may live in more than one folder.
    pub multi_filing: bool,
    /// Whether documents and items may exist without any parent folder.
    pub unfiling: bool,
    /// Maximum object name length in characters.
    pub max_name_length: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            admin_principal: "Admin".into(),
            multi_filing: true,
            unfiling: false,
            max_name_length: 255,
        }
    }
}
