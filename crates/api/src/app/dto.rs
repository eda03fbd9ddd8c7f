use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use storegate_auth::{AuthError, Role};
use storegate_core::UserId;
use storegate_infra::{Document, ProfileChanges};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

/// `PUT /users/:id`. Identity-owned fields are captured only to be rejected.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,

    pub uid: Option<Value>,
    pub email: Option<Value>,
    pub created_at: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Option<String>,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Unwrap a JSON body, turning extractor rejections into a validation error.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AuthError::validation(vec![rejection.body_text()]).into()),
    }
}

/// Product bodies are opaque, but must be JSON objects.
pub fn object_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Document, ApiError> {
    match body(payload)? {
        Value::Object(map) => Ok(map),
        _ => Err(AuthError::validation(vec!["body must be a JSON object".to_string()]).into()),
    }
}

pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|e| AuthError::validation(vec![e.to_string()]).into())
}

pub fn parse_role(raw: Option<&str>) -> Result<Role, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AuthError::validation(vec!["role is required".to_string()]))?;
    raw.parse::<Role>()
        .map_err(|e| AuthError::validation(vec![e.to_string()]).into())
}

impl UpdateUserRequest {
    /// Validate and convert into repository changes.
    pub fn into_changes(self) -> Result<ProfileChanges, ApiError> {
        let mut errors = Vec::new();
        for (field, present) in [
            ("uid", self.uid.is_some()),
            ("email", self.email.is_some()),
            ("created_at", self.created_at.is_some()),
        ] {
            if present {
                errors.push(format!("{field} cannot be updated"));
            }
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.push("name cannot be blank".to_string());
        }

        let role = match self.role.as_deref() {
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(AuthError::validation(errors).into());
        }

        let changes = ProfileChanges {
            name: self.name.map(|n| n.trim().to_string()),
            role,
            location: self.location,
            experience: self.experience,
            ..Default::default()
        };
        if changes.is_empty() {
            return Err(AuthError::validation(vec!["no updatable fields provided".to_string()]).into());
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_owned_fields_are_rejected() {
        let req = UpdateUserRequest {
            email: Some(Value::from("new@x.io")),
            name: Some("New".to_string()),
            ..Default::default()
        };
        let err = req.into_changes().unwrap_err();
        assert_eq!(err.0, AuthError::validation(vec!["email cannot be updated".to_string()]));
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(UpdateUserRequest::default().into_changes().is_err());
    }

    #[test]
    fn role_is_parsed_case_insensitively() {
        let req = UpdateUserRequest {
            role: Some("Moderator".to_string()),
            ..Default::default()
        };
        assert_eq!(req.into_changes().unwrap().role, Some(Role::Moderator));
    }

    #[test]
    fn parse_role_requires_a_value() {
        assert!(parse_role(None).is_err());
        assert!(parse_role(Some("  ")).is_err());
        assert_eq!(parse_role(Some("ADMIN")).unwrap(), Role::Admin);
    }
}
