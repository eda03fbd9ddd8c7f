//! Primary results paired with advisory (non-fatal) side-effect failures.
//!
//! Display-name updates, last-login refreshes and profile cross-checks are
//! allowed to fail without failing the request. Instead of swallowing those
//! failures, operations return them next to the primary value so callers can
//! log them and tests can assert on them.

use core::fmt;

use storegate_core::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The identity provider rejected the display-name update.
    DisplayNameNotSet { uid: UserId, reason: String },

    /// The profile's last-login timestamp could not be refreshed.
    LastLoginNotRefreshed { uid: UserId, reason: String },

    /// A token referenced an identifier with no user profile.
    ProfileMissing { uid: UserId },

    /// The profile existence check itself failed.
    ProfileCheckFailed { uid: UserId, reason: String },

    /// A won admin-bootstrap claim could not be handed back after the
    /// profile write failed.
    BootstrapClaimNotReleased { uid: UserId, reason: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::DisplayNameNotSet { uid, reason } => {
                write!(f, "display name not set for {uid}: {reason}")
            }
            Advisory::LastLoginNotRefreshed { uid, reason } => {
                write!(f, "last login not refreshed for {uid}: {reason}")
            }
            Advisory::ProfileMissing { uid } => write!(f, "no user profile for {uid}"),
            Advisory::ProfileCheckFailed { uid, reason } => {
                write!(f, "profile check failed for {uid}: {reason}")
            }
            Advisory::BootstrapClaimNotReleased { uid, reason } => {
                write!(f, "admin bootstrap claim of {uid} not released: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            advisories: Vec::new(),
        }
    }

    pub fn with_advisories(value: T, advisories: Vec<Advisory>) -> Self {
        Self { value, advisories }
    }

    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            advisories: self.advisories,
        }
    }

    /// Emit every advisory as a warning and return the primary value.
    pub fn log_advisories(self) -> T {
        for advisory in &self.advisories {
            tracing::warn!(advisory = %advisory, "advisory side effect failed");
        }
        self.value
    }
}
