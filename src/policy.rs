//! Ownership guard.
//!
//! Every mutating operation names an `Action`; `authorize` decides whether the
//! principal may perform it on a resource owned by a given user. Resolving the owner
//! (and failing with `NotFound` when the resource is missing) is the caller's job and
//! always happens first, so a missing resource is never reported as `Forbidden`.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
};

/// Action
///
/// The guarded mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpdateArticle,
    PublishArticle,
    DeleteArticle,
    UpdateProfile,
    DeleteAccount,
}

impl Action {
    /// Whether an admin may perform the action on someone else's resource.
    /// Moderation is limited to removing articles.
    pub fn admin_bypass(self) -> bool {
        matches!(self, Action::DeleteArticle)
    }

    fn denial(self) -> &'static str {
        match self {
            Action::UpdateArticle | Action::PublishArticle => {
                "Unauthorized: You are not the author of this article."
            }
            Action::DeleteArticle => "You don't have permission to modify this resource",
            Action::UpdateProfile => "You can only update your own profile",
            Action::DeleteAccount => "You can only delete your own account",
        }
    }
}

/// is_permitted
///
/// Owner always; admin only where the action allows it.
pub fn is_permitted(principal: &AuthUser, owner_id: Uuid, action: Action) -> bool {
    principal.id == owner_id || (action.admin_bypass() && principal.is_admin())
}

/// authorize
///
/// `Forbidden` unless `is_permitted`.
pub fn authorize(principal: &AuthUser, owner_id: Uuid, action: Action) -> AppResult<()> {
    if is_permitted(principal, owner_id, action) {
        Ok(())
    } else {
        tracing::debug!(principal = %principal.id, owner = %owner_id, ?action, "ownership check denied");
        Err(AppError::Forbidden(action.denial().to_string()))
    }
}

/// require_admin
///
/// Gate for the admin read endpoints.
pub fn require_admin(principal: &AuthUser) -> AppResult<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Access denied. You need one of these roles: ADMIN".to_string(),
        ))
    }
}
