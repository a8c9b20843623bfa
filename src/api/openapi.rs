//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::account_handler;
use crate::config::SESSION_COOKIE_NAME;
use crate::domain::{AccountKind, AccountResponse, MentorProfile, Role};

/// OpenAPI documentation for the Inquiro API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inquiro API",
        version = "0.1.0",
        description = "Account lifecycle and session authentication for users and mentors",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        account_handler::signup,
        account_handler::activate,
        account_handler::login,
        account_handler::resend_activation,
        account_handler::me,
        account_handler::logout,
    ),
    components(
        schemas(
            AccountKind,
            AccountResponse,
            MentorProfile,
            Role,
            account_handler::SignupRequest,
            account_handler::LoginRequest,
            account_handler::ResendRequest,
            account_handler::MeResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Accounts", description = "Sign-up, activation and sessions for users and mentors")
    )
)]
pub struct ApiDoc;

/// Session cookie security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
            );
        }
    }
}
