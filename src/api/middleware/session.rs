//! Session cookie layer.
//!
//! Resolves the session id from the cookie (or mints one), exposes a
//! [`Session`] handle to the rest of the stack, and reconciles the cookie
//! once the handler has run. Only ids the store already holds are
//! resumed; anything else gets a server-minted id.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::api::extractors::{CookieAction, Session};
use crate::api::AppState;
use crate::config::{SessionConfig, SESSION_ID_BYTES};

/// Attach a session handle to every request.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let config = &state.session_config;

    let presented = jar
        .get(&config.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| is_session_id(id));

    let known = match presented {
        Some(id) => match state.sessions.contains(&id).await {
            Ok(true) => Some(id),
            Ok(false) => {
                tracing::debug!("Unknown session id presented, starting a new session");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, starting a new session");
                None
            }
        },
        None => None,
    };

    let session = match known {
        Some(id) => Session::resume(id, state.sessions.clone()),
        None => Session::fresh(Session::new_id(), state.sessions.clone()),
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    match session.cookie_action() {
        CookieAction::Keep => response,
        CookieAction::Issue => {
            (jar.add(session_cookie(config, &session.id())), response).into_response()
        }
        CookieAction::Remove => {
            let removal = Cookie::build((config.cookie_name.clone(), "")).path("/");
            (jar.remove(removal), response).into_response()
        }
    }
}

fn session_cookie(config: &SessionConfig, id: &str) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .build()
}

/// Ids are minted as lowercase hex; anything else is ignored.
fn is_session_id(value: &str) -> bool {
    value.len() == SESSION_ID_BYTES * 2
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_session_id() {
        assert!(is_session_id(&Session::new_id()));
        assert!(!is_session_id("short"));
        assert!(!is_session_id(&"Z".repeat(SESSION_ID_BYTES * 2)));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig::default();
        let cookie = session_cookie(&config, "abc");

        assert_eq!(cookie.name(), config.cookie_name);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
