use crate::{
    auth::{AuthError, TokenService, hash_password, verify_password},
    error::{AppError, AppResult},
    models::{AuthPayload, LoginRequest, NewUser, RegisterRequest, Role, UserProfile},
    repository::Repository,
};

use super::normalize_email;

/// register
///
/// Creates a `USER` account and signs a token for it straight away.
///
/// # Errors
/// `EmailAlreadyRegistered` when an active account already holds the email, including
/// a concurrent registration that wins the race at the unique index.
pub async fn register(
    repo: &dyn Repository,
    tokens: &TokenService,
    input: RegisterRequest,
) -> AppResult<AuthPayload> {
    let email = normalize_email(&input.email);
    if repo.email_in_use(&email, None).await? {
        return Err(AppError::EmailAlreadyRegistered);
    }

    let user = repo
        .create_user(NewUser {
            name: input.name.trim().to_string(),
            email,
            password_hash: hash_password(&input.password)?,
            role: Role::User,
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::EmailAlreadyRegistered,
            other => other,
        })?;

    let token = tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(AuthPayload {
        user: UserProfile::from(&user),
        token,
    })
}

/// login
///
/// Unknown email and wrong password fail identically with `InvalidCredentials`.
pub async fn login(
    repo: &dyn Repository,
    tokens: &TokenService,
    input: LoginRequest,
) -> AppResult<AuthPayload> {
    let email = normalize_email(&input.email);
    let Some(user) = repo.find_active_user_by_email(&email).await? else {
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(&input.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = tokens.issue(&user)?;
    tracing::debug!(user_id = %user.id, "login succeeded");

    Ok(AuthPayload {
        user: UserProfile::from(&user),
        token,
    })
}
