//! Caller identity as forwarded by the authenticating proxy.
//!
//! The proxy sets `X-User-Roles` to a comma-separated role list. A missing
//! header means an ordinary user with no extra roles.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const ROLES_HEADER: &str = "x-user-roles";

const ADMIN_ROLES: &[&str] = &["ROLE_ADMIN", "ROLE_SUPER_ADMIN"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub roles: Vec<String>,
}

impl Caller {
    pub fn from_header(value: &str) -> Self {
        Self {
            roles: value
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|role| ADMIN_ROLES.contains(&role.as_str()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(ROLES_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(Caller::from_header)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_detection() {
        assert!(Caller::from_header("ROLE_USER, ROLE_ADMIN").is_admin());
        assert!(Caller::from_header("ROLE_SUPER_ADMIN").is_admin());
        assert!(!Caller::from_header("ROLE_USER,ROLE_TEAMLEAD").is_admin());
        assert!(!Caller::from_header("role_admin").is_admin());
        assert!(!Caller::default().is_admin());
    }

    #[test]
    fn test_header_parsing_skips_blanks() {
        let caller = Caller::from_header(" ROLE_USER ,, ");
        assert_eq!(caller.roles, vec!["ROLE_USER".to_string()]);
    }
}
