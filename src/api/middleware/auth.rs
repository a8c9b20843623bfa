//! Session authentication middleware.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extractors::Session;
use crate::api::AppState;
use crate::domain::{Account, AccountKind, Role};
use crate::errors::AppError;

/// `:kind` segment of a protected route.
#[derive(Debug, Deserialize)]
pub struct KindParam {
    pub kind: AccountKind,
}

/// Authenticated account and its role, resolved from the session.
#[derive(Clone, Debug)]
pub struct Principal {
    pub account_id: Uuid,
    pub account: Account,
    pub role: Role,
}

/// Resolve the session's account before a protected handler runs.
///
/// - no identifier in the session: 401
/// - identifier is not a UUID: clear the session, 401
/// - account missing, unusable, or the lookup failed: clear the session, 401
/// - role missing or the lookup failed: 401, session kept
/// - otherwise the [`Principal`] is inserted into request extensions
pub async fn load_principal(
    State(state): State<AppState>,
    Path(KindParam { kind }): Path<KindParam>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let keys = kind.session_keys();

    if !session.exists(keys.account_id).await? {
        return Err(AppError::Unauthorized);
    }

    let raw_id = session.get_string(keys.account_id).await?.unwrap_or_default();
    let account_id = match Uuid::parse_str(&raw_id) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!(kind = %kind, "Malformed account id in session");
            session.clear().await?;
            return Err(AppError::MalformedSession);
        }
    };

    let accounts = state.services.accounts();

    let account = match accounts.find_account(kind, account_id).await {
        Ok(Some(account)) if account.can_authenticate() => account,
        Ok(_) => {
            tracing::info!(
                kind = %kind,
                account_id = %account_id,
                "Session account no longer usable"
            );
            session.clear().await?;
            return Err(AppError::Unauthorized);
        }
        Err(e) => {
            tracing::error!(
                kind = %kind,
                account_id = %account_id,
                error = %e,
                "Session account lookup failed"
            );
            session.clear().await?;
            return Err(AppError::Unauthorized);
        }
    };

    let role = match accounts.find_role(account.role_id).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            tracing::error!(role_id = account.role_id, "Role missing for session account");
            return Err(AppError::Unauthorized);
        }
        Err(e) => {
            tracing::error!(role_id = account.role_id, error = %e, "Role lookup failed");
            return Err(AppError::Unauthorized);
        }
    };

    request.extensions_mut().insert(Principal {
        account_id,
        account,
        role,
    });

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
