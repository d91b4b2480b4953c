use cmis_types::{principals, Ace};

/// Per-call information supplied by the binding layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
    /// The authenticated user, if any.
    pub user: Option<String>,
}

impl CallContext {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            user: Some(name.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// The principal to check permissions for; `anonymous_user` when the
    /// call carries no user.
    pub fn principal<'a>(&'a self, anonymous_user: &'a str) -> &'a str {
        self.user.as_deref().unwrap_or(anonymous_user)
    }
}

/// Replace the `cmis:user` macro with the calling principal.
pub fn expand_acl_macros(aces: &[Ace], principal: &str) -> Vec<Ace> {
    aces.iter()
        .map(|ace| {
            if ace.principal == principals::USER_MACRO {
                Ace::new(principal, ace.permission)
            } else {
                ace.clone()
            }
        })
        .collect()
}
