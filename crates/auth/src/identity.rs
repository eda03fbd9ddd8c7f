use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storegate_core::UserId;

/// Account record owned by the external identity provider.
///
/// The gateway only reads it; passwords never leave the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Display name, falling back to the local part of the email.
    pub fn name_or_email_prefix(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(display_name: Option<&str>) -> Identity {
        Identity {
            uid: UserId::parse("u-1").unwrap(),
            email: "carla@example.com".to_string(),
            display_name: display_name.map(str::to_string),
            email_verified: false,
            created_at: Utc::now(),
            last_sign_in_at: None,
        }
    }

    #[test]
    fn name_falls_back_to_email_prefix() {
        assert_eq!(identity(Some("Carla")).name_or_email_prefix(), "Carla");
        assert_eq!(identity(Some("  ")).name_or_email_prefix(), "carla");
        assert_eq!(identity(None).name_or_email_prefix(), "carla");
    }
}
