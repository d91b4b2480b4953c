use std::path::Path;

use cmis_store::StoreOptions;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Configuration for one repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Identifier reported for the repository.
    pub repository_id: String,
    /// Principal that bypasses every ACL check.
    pub admin_principal: String,
    /// Principal used for calls that carry no user.
    pub anonymous_user: String,
    /// Whether documents and items may be filed in several folders.
    pub multi_filing: bool,
    /// Whether documents and items may exist outside any folder.
    pub unfiling: bool,
    /// Maximum object name length in characters.
    pub max_name_length: usize,
    /// Page size for child listings when the caller gives none.
    /// `None` lists everything.
    pub default_max_items: Option<usize>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            repository_id: "InMemory".into(),
            admin_principal: "Admin".into(),
            anonymous_user: "unknown".into(),
            multi_filing: true,
            unfiling: false,
            max_name_length: 255,
            default_max_items: None,
        }
    }
}

impl RepositoryConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> ServiceResult<Self> {
        let config: Self = toml::from_str(input).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    /// Reject configurations the store cannot run with: an empty repository
    /// id or admin principal, or a zero name length.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.repository_id.trim().is_empty() {
            return Err(ServiceError::Config("repository_id must not be empty".into()));
        }
        if self.admin_principal.trim().is_empty() {
            return Err(ServiceError::Config("admin_principal must not be empty".into()));
        }
        if self.max_name_length == 0 {
            return Err(ServiceError::Config("max_name_length must be positive".into()));
        }
        Ok(())
    }

    /// The switches the object store enforces.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            admin_principal: self.admin_principal.clone(),
            multi_filing: self.multi_filing,
            unfiling: self.unfiling,
            max_name_length: self.max_name_length,
        }
    }
}
