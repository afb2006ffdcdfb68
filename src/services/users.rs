use uuid::Uuid;

use crate::{
    auth::{AuthUser, hash_password, verify_password},
    error::{AppError, AppResult},
    models::{UpdateUserRequest, User, UserChanges, UserProfile, UserSummary},
    policy::{self, Action},
    repository::Repository,
};

use super::normalize_email;

async fn active_user(repo: &dyn Repository, id: Uuid) -> AppResult<User> {
    repo.find_active_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn list_users(repo: &dyn Repository) -> AppResult<Vec<UserSummary>> {
    repo.list_active_users().await
}

pub async fn get_user(repo: &dyn Repository, id: Uuid) -> AppResult<UserProfile> {
    let user = active_user(repo, id).await?;
    Ok(UserProfile::from(&user))
}

/// me
///
/// The principal's own profile, re-read so timestamps are current.
pub async fn me(repo: &dyn Repository, principal: &AuthUser) -> AppResult<UserProfile> {
    get_user(repo, principal.id).await
}

/// update_profile
///
/// Owner-only partial update. Name and email are replaced when present; a new password
/// needs the current one alongside it.
///
/// # Errors
/// * `NotFound` if the target account does not exist (checked before ownership).
/// * `Forbidden` if the principal is not the account owner.
/// * `EmailInUse` if another active account holds the new email.
/// * `CurrentPasswordRequired` / `CurrentPasswordIncorrect` for password changes.
pub async fn update_profile(
    repo: &dyn Repository,
    principal: &AuthUser,
    id: Uuid,
    input: UpdateUserRequest,
) -> AppResult<UserProfile> {
    let target = active_user(repo, id).await?;
    policy::authorize(principal, target.id, Action::UpdateProfile)?;

    let mut changes = UserChanges {
        name: input.name.map(|name| name.trim().to_string()),
        ..UserChanges::default()
    };

    if let Some(email) = input.email.as_deref().map(normalize_email) {
        if email != target.email {
            if repo.email_in_use(&email, Some(target.id)).await? {
                return Err(AppError::EmailInUse);
            }
            changes.email = Some(email);
        }
    }

    if let Some(new_password) = input.password {
        let current = input
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or(AppError::CurrentPasswordRequired)?;
        if !verify_password(&current, &target.password_hash)? {
            return Err(AppError::CurrentPasswordIncorrect);
        }
        changes.password_hash = Some(hash_password(&new_password)?);
    }

    if changes.is_empty() {
        return Ok(UserProfile::from(&target));
    }

    let updated = repo
        .update_user(target.id, changes)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::EmailInUse,
            other => other,
        })?
        .ok_or_else(|| AppError::not_found("User"))?;

    tracing::info!(user_id = %updated.id, "profile updated");
    Ok(UserProfile::from(&updated))
}

/// delete_account
///
/// Owner-only. Soft-deletes the account and all of its articles together.
pub async fn delete_account(repo: &dyn Repository, principal: &AuthUser, id: Uuid) -> AppResult<()> {
    let target = active_user(repo, id).await?;
    policy::authorize(principal, target.id, Action::DeleteAccount)?;

    if !repo.soft_delete_user(target.id).await? {
        return Err(AppError::not_found("User"));
    }

    tracing::info!(user_id = %target.id, "account deleted");
    Ok(())
}
