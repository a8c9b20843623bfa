//! Account lifecycle handlers, shared by users and mentors.

use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{Session, ValidatedJson};
use crate::api::middleware::{load_principal, Principal};
use crate::api::AppState;
use crate::config::{
    MAX_BIO_LENGTH, MAX_EMAIL_LENGTH, MAX_EXPERIENCE_YEARS, MAX_NAME_LENGTH, MAX_PASSWORD_LENGTH,
    MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, PROVIDER_LOCAL,
};
use crate::domain::{AccountKind, AccountResponse, MentorProfile, Registration, Role};
use crate::errors::{AppError, AppResult};
use crate::types::{Accepted, ApiResponse, Created};

pub(crate) static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid"));

/// Sign-up request for either account kind
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(
        length(min = 1, max = MAX_USERNAME_LENGTH, message = "Username must be 1-50 characters"),
        regex(
            path = *USERNAME_PATTERN,
            message = "Username may only contain letters, digits, '_', '.' and '-'"
        )
    )]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "First name is required"))]
    #[schema(example = "Alice")]
    pub first_name: String,
    #[validate(length(max = MAX_NAME_LENGTH, message = "Last name is too long"))]
    #[serde(default)]
    #[schema(example = "Liddell")]
    pub last_name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = MAX_EMAIL_LENGTH, message = "Email is too long")
    )]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        max = MAX_PASSWORD_LENGTH,
        message = "Password must be 8-128 characters"
    ))]
    #[schema(example = "secret123", min_length = 8)]
    pub password: String,
    /// Mentors only: whole years of experience
    #[validate(range(max = MAX_EXPERIENCE_YEARS, message = "Experience years is out of range"))]
    #[schema(example = 3)]
    pub experience_years: Option<u32>,
    /// Mentors only: additional months, 0-11
    #[validate(range(max = 11, message = "Experience months must be between 0 and 11"))]
    #[schema(example = 6)]
    pub experience_months: Option<u32>,
    /// Mentors only
    #[validate(length(max = MAX_BIO_LENGTH, message = "Bio is too long"))]
    pub bio: Option<String>,
}

impl SignupRequest {
    fn into_registration(self, kind: AccountKind) -> AppResult<Registration> {
        let mentor_profile = match kind {
            AccountKind::Mentor => match (self.experience_years, self.experience_months) {
                (Some(years), Some(months)) => Some(MentorProfile::from_experience(
                    years,
                    months,
                    self.bio.unwrap_or_default(),
                )),
                _ => {
                    return Err(AppError::validation(
                        "experience_years and experience_months are required for mentors",
                    ))
                }
            },
            AccountKind::User => None,
        };

        Ok(Registration {
            kind,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            provider: PROVIDER_LOCAL.to_string(),
            email: self.email,
            password: self.password,
            mentor_profile,
        })
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// Activation link re-send request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// The signed-in account and its role
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub account: AccountResponse,
    pub role: Role,
}

/// Create account routes for every kind
pub fn account_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/:kind/me", get(me))
        .route("/api/:kind/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, load_principal));

    Router::new()
        .route("/api/:kind/signup", post(signup))
        .route("/api/:kind/activate/:token", put(activate))
        .route("/api/:kind/login", post(login))
        .route("/api/:kind/activation/resend", post(resend_activation))
        .merge(protected)
}

/// Register an account and mail its activation link
#[utoipa::path(
    post,
    path = "/api/{kind}/signup",
    tag = "Accounts",
    params(("kind" = AccountKind, Path, description = "user or mentor")),
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, activation email sent", body = AccountResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username or email already taken"),
        (status = 502, description = "Account created but the email could not be sent")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<Created<AccountResponse>> {
    let accounts = state.services.accounts();

    let invited = accounts.register(payload.into_registration(kind)?).await?;
    accounts.send_invitation(&invited).await?;

    Ok(Created(
        AccountResponse::from(invited.account),
        "Check your email to activate your account",
    ))
}

/// Consume an activation token
#[utoipa::path(
    put,
    path = "/api/{kind}/activate/{token}",
    tag = "Accounts",
    params(
        ("kind" = AccountKind, Path, description = "user or mentor"),
        ("token" = String, Path, description = "Token from the activation email")
    ),
    responses(
        (status = 200, description = "Account activated", body = AccountResponse),
        (status = 400, description = "Unknown, expired or already used token")
    )
)]
pub async fn activate(
    State(state): State<AppState>,
    Path((kind, token)): Path<(AccountKind, String)>,
) -> AppResult<Json<ApiResponse<AccountResponse>>> {
    let account = state.services.accounts().activate(kind, token).await?;

    Ok(Json(ApiResponse::with_message(
        AccountResponse::from(account),
        "Account activated",
    )))
}

/// Sign in and start a session
#[utoipa::path(
    post,
    path = "/api/{kind}/login",
    tag = "Accounts",
    params(("kind" = AccountKind, Path, description = "user or mentor")),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = AccountResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Incorrect credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AccountResponse>>> {
    let account = state
        .services
        .accounts()
        .authenticate(kind, payload.email, payload.password)
        .await?;

    session.rotate().await?;

    let keys = kind.session_keys();
    session
        .put(vec![
            (keys.account_id.to_string(), account.id.to_string()),
            (keys.username.to_string(), account.username.clone()),
            (keys.email.to_string(), account.email.clone()),
        ])
        .await?;

    tracing::info!(kind = %kind, account_id = %account.id, "Signed in");
    Ok(Json(ApiResponse::success(AccountResponse::from(account))))
}

/// Send a fresh activation link to a pending account
///
/// The response does not reveal whether the address is registered.
#[utoipa::path(
    post,
    path = "/api/{kind}/activation/resend",
    tag = "Accounts",
    params(("kind" = AccountKind, Path, description = "user or mentor")),
    request_body = ResendRequest,
    responses(
        (status = 202, description = "Request accepted"),
        (status = 400, description = "Validation error")
    )
)]
pub async fn resend_activation(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    ValidatedJson(payload): ValidatedJson<ResendRequest>,
) -> Accepted {
    let accounts = state.services.accounts();

    match accounts.reinvite(kind, payload.email).await {
        Ok(Some(invited)) => {
            if let Err(e) = accounts.send_invitation(&invited).await {
                tracing::warn!(kind = %kind, error = %e, "Re-sent invitation not delivered");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!(kind = %kind, error = %e, "Re-invitation failed"),
    }

    Accepted("If the account is awaiting activation, a new link has been sent")
}

/// Get the signed-in account
#[utoipa::path(
    get,
    path = "/api/{kind}/me",
    tag = "Accounts",
    params(("kind" = AccountKind, Path, description = "user or mentor")),
    responses(
        (status = 200, description = "Current account and role", body = MeResponse),
        (status = 401, description = "Not signed in")
    ),
    security(("session_cookie" = []))
)]
pub async fn me(principal: Principal) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::success(MeResponse {
        account: AccountResponse::from(principal.account),
        role: principal.role,
    }))
}

/// End the session
#[utoipa::path(
    post,
    path = "/api/{kind}/logout",
    tag = "Accounts",
    params(("kind" = AccountKind, Path, description = "user or mentor")),
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "Not signed in")
    ),
    security(("session_cookie" = []))
)]
pub async fn logout(principal: Principal, session: Session) -> AppResult<Json<ApiResponse<()>>> {
    session.clear().await?;

    tracing::info!(account_id = %principal.account_id, "Signed out");
    Ok(Json(ApiResponse::message("Signed out")))
}
