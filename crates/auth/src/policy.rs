//! Ownership and self-protection rules for the users resource.
//!
//! These sit on top of route-level role checks: a route may admit any
//! authenticated caller, and the handler then narrows by ownership.

use storegate_core::UserId;

use crate::{AuthzError, Principal, Role};

/// Non-admins may only read their own profile.
pub fn ensure_can_view(actor: &Principal, target: &UserId) -> Result<(), AuthzError> {
    if actor.is_admin() || actor.is_self(target) {
        Ok(())
    } else {
        Err(AuthzError::denied("You can only view your own profile"))
    }
}

/// Non-admins may only update their own profile, and never its role.
pub fn ensure_can_update(
    actor: &Principal,
    target: &UserId,
    changes_role: bool,
) -> Result<(), AuthzError> {
    if !actor.is_admin() && !actor.is_self(target) {
        return Err(AuthzError::denied("You can only update your own profile"));
    }
    if changes_role {
        ensure_can_change_roles(actor)?;
    }
    Ok(())
}

pub fn ensure_can_change_roles(actor: &Principal) -> Result<(), AuthzError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::denied("Only administrators can change roles"))
    }
}

/// Only admins can create admin accounts.
pub fn ensure_can_create_with_role(actor: &Principal, role: Role) -> Result<(), AuthzError> {
    if role.is_admin() && !actor.is_admin() {
        return Err(AuthzError::denied(
            "Only administrators can create admin accounts",
        ));
    }
    Ok(())
}

/// Nobody deletes their own account; deleting others requires admin.
pub fn ensure_can_delete(actor: &Principal, target: &UserId) -> Result<(), AuthzError> {
    if actor.is_self(target) {
        return Err(AuthzError::denied("You cannot delete your own account"));
    }
    if !actor.is_admin() {
        return Err(AuthzError::denied("Only administrators can delete accounts"));
    }
    Ok(())
}
