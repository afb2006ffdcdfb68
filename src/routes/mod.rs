/// Router Module Index
///
/// Routes are split by the access level they require. `create_router` puts the
/// authentication layer on `authenticated` and `admin`; `public` stays open.

/// Anonymous, read-only access plus the auth gateway.
/// Handlers only ever return published, non-deleted articles.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Ownership is checked per request by the services.
pub mod authenticated;

/// Admin-only read access. The role check runs inside the service, after the request
/// has passed the authentication layer.
pub mod admin;
