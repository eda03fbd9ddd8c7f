use thiserror::Error;

use storegate_core::UserId;

use crate::{Role, SessionClaims};

/// A resolved caller for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_self(&self, target: &UserId) -> bool {
        &self.user_id == target
    }
}

impl From<&SessionClaims> for Principal {
    fn from(claims: &SessionClaims) -> Self {
        Self::new(claims.sub.clone(), claims.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Requires one of: {required}. Your role: {actual}")]
    MissingRole { required: String, actual: String },

    #[error("{0}")]
    Denied(String),
}

impl AuthzError {
    pub fn denied(msg: impl Into<String>) -> Self {
        Self::Denied(msg.into())
    }
}

/// Check a caller's role against a route's allow-list.
///
/// - An empty allow-list admits any authenticated caller.
/// - No IO, no panics.
pub fn authorize_roles(actual: Option<&Role>, required: &[Role]) -> Result<(), AuthzError> {
    if required.is_empty() {
        return Ok(());
    }

    match actual {
        Some(role) if required.contains(role) => Ok(()),
        _ => Err(AuthzError::MissingRole {
            required: required
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            actual: actual.map(Role::as_str).unwrap_or("none").to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_admits_everyone_authenticated() {
        for role in Role::ALL {
            assert_eq!(authorize_roles(Some(&role), &[]), Ok(()));
        }
    }

    #[test]
    fn mismatch_names_required_and_actual_roles() {
        let err = authorize_roles(Some(&Role::User), &[Role::Admin]).unwrap_err();
        assert_eq!(err.to_string(), "Requires one of: admin. Your role: user");

        let err = authorize_roles(None, &[Role::Admin, Role::Moderator]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requires one of: admin, moderator. Your role: none"
        );
    }

    #[test]
    fn listed_role_passes() {
        assert!(authorize_roles(Some(&Role::Moderator), &[Role::Admin, Role::Moderator]).is_ok());
    }
}
