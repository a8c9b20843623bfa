//! Account lifecycle tests against in-memory storage.

mod common;

use chrono::Duration;

use common::Harness;
use inquiro_api::domain::{AccountKind, MentorProfile, Registration};
use inquiro_api::errors::AppError;
use inquiro_api::services::AccountService;

fn registration(kind: AccountKind, username: &str, email: &str, password: &str) -> Registration {
    Registration {
        kind,
        username: username.to_string(),
        first_name: "Alice".to_string(),
        last_name: "Liddell".to_string(),
        provider: "local".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        mentor_profile: match kind {
            AccountKind::Mentor => Some(MentorProfile::from_experience(3, 6, String::new())),
            AccountKind::User => None,
        },
    }
}

fn alice() -> Registration {
    registration(AccountKind::User, "alice", "alice@example.com", "secret123")
}

#[tokio::test]
async fn test_register_activate_login() {
    let h = Harness::new();

    let invited = h.service.register(alice()).await.unwrap();
    h.service.send_invitation(&invited).await.unwrap();

    let stored = h.users.stored("alice@example.com").unwrap();
    assert!(!stored.is_verified);
    assert!(stored.is_active);
    assert_ne!(stored.password_hash, "secret123");
    assert_eq!(stored.role_id, 1);

    // Only the digest is kept
    let invitations = h.users.invitations_for(stored.id);
    assert_eq!(invitations.len(), 1);
    assert_ne!(invitations[0].token_digest, invited.token.raw);

    let token = h.mailer.last_token().unwrap();
    assert_eq!(token, invited.token.raw);

    // Login is refused until activation
    let err = h
        .service
        .authenticate(AccountKind::User, "alice@example.com".into(), "secret123".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IncorrectCredentials));

    let activated = h
        .service
        .activate(AccountKind::User, token.clone())
        .await
        .unwrap();
    assert!(activated.is_verified);
    assert!(h.users.invitations_for(stored.id).is_empty());

    let err = h
        .service
        .activate(AccountKind::User, token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ActivationFailed));

    let account = h
        .service
        .authenticate(AccountKind::User, "alice@example.com".into(), "secret123".into())
        .await
        .unwrap();
    assert_eq!(account.id, stored.id);

    let err = h
        .service
        .authenticate(AccountKind::User, "alice@example.com".into(), "wrong-pass".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IncorrectCredentials));
}

#[tokio::test]
async fn test_expired_invitation_cannot_activate() {
    let h = Harness::with_invitation_ttl(Duration::minutes(-1));

    let invited = h.service.register(alice()).await.unwrap();

    let err = h
        .service
        .activate(AccountKind::User, invited.token.raw.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ActivationFailed));
    assert!(!h.users.stored("alice@example.com").unwrap().is_verified);
}

#[tokio::test]
async fn test_unknown_token_fails_activation() {
    let h = Harness::new();
    h.service.register(alice()).await.unwrap();

    let err = h
        .service
        .activate(AccountKind::User, "not-a-real-token".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ActivationFailed));
}

#[tokio::test]
async fn test_token_is_scoped_to_its_kind() {
    let h = Harness::new();
    let invited = h.service.register(alice()).await.unwrap();

    let err = h
        .service
        .activate(AccountKind::Mentor, invited.token.raw.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ActivationFailed));
}

#[tokio::test]
async fn test_duplicate_username_and_email() {
    let h = Harness::new();
    h.service.register(alice()).await.unwrap();

    let err = h
        .service
        .register(registration(
            AccountKind::User,
            "alice",
            "other@example.com",
            "secret123",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateUsername));

    let err = h
        .service
        .register(registration(
            AccountKind::User,
            "alicia",
            "alice@example.com",
            "secret123",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateEmail));

    assert_eq!(h.users.count(), 1);
}

#[tokio::test]
async fn test_same_email_allowed_across_kinds() {
    let h = Harness::new();
    h.service.register(alice()).await.unwrap();

    h.service
        .register(registration(
            AccountKind::Mentor,
            "alice",
            "alice@example.com",
            "secret123",
        ))
        .await
        .unwrap();

    assert_eq!(h.users.count(), 1);
    assert_eq!(h.mentors.count(), 1);
}

#[tokio::test]
async fn test_signup_retry_reissues_invitation() {
    let h = Harness::new();

    let first = h.service.register(alice()).await.unwrap();
    let second = h.service.register(alice()).await.unwrap();

    assert_eq!(first.account.id, second.account.id);
    assert_ne!(first.token.raw, second.token.raw);
    assert_eq!(h.users.count(), 1);

    let err = h
        .service
        .activate(AccountKind::User, first.token.raw.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ActivationFailed));

    h.service
        .activate(AccountKind::User, second.token.raw.clone())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_retry_with_other_password_is_duplicate() {
    let h = Harness::new();
    h.service.register(alice()).await.unwrap();

    let err = h
        .service
        .register(registration(
            AccountKind::User,
            "alice",
            "alice@example.com",
            "different-pass",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateUsername));
}

#[tokio::test]
async fn test_reinvite_only_pending_accounts() {
    let h = Harness::new();
    let invited = h.service.register(alice()).await.unwrap();

    let again = h
        .service
        .reinvite(AccountKind::User, "alice@example.com".into())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.account.id, invited.account.id);

    let none = h
        .service
        .reinvite(AccountKind::User, "nobody@example.com".into())
        .await
        .unwrap();
    assert!(none.is_none());

    h.service
        .activate(AccountKind::User, again.token.raw.clone())
        .await
        .unwrap();

    let none = h
        .service
        .reinvite(AccountKind::User, "alice@example.com".into())
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_unknown_email_login_matches_wrong_password() {
    let h = Harness::new();

    let err = h
        .service
        .authenticate(AccountKind::User, "ghost@example.com".into(), "whatever1".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IncorrectCredentials));
}

#[tokio::test]
async fn test_deactivated_account_cannot_login() {
    let h = Harness::new();
    let invited = h.service.register(alice()).await.unwrap();
    h.service
        .activate(AccountKind::User, invited.token.raw.clone())
        .await
        .unwrap();

    h.users.deactivate(invited.account.id);

    let err = h
        .service
        .authenticate(AccountKind::User, "alice@example.com".into(), "secret123".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IncorrectCredentials));
}

#[tokio::test]
async fn test_mentor_gets_mentor_role_and_profile() {
    let h = Harness::new();

    let invited = h
        .service
        .register(registration(
            AccountKind::Mentor,
            "bob",
            "bob@example.com",
            "secret123",
        ))
        .await
        .unwrap();

    assert_eq!(invited.account.role_id, 2);
    let profile = invited.account.mentor_profile.unwrap();
    assert!((profile.experience_years - 3.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_mentor_without_profile_is_rejected() {
    let h = Harness::new();
    let mut candidate = registration(AccountKind::Mentor, "bob", "bob@example.com", "secret123");
    candidate.mentor_profile = None;

    let err = h.service.register(candidate).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.mentors.count(), 0);
}

#[tokio::test]
async fn test_failed_mail_is_reported() {
    let h = Harness::new();
    h.mailer.fail(true);

    let invited = h.service.register(alice()).await.unwrap();
    let err = h.service.send_invitation(&invited).await.unwrap_err();

    assert!(matches!(err, AppError::InvitationNotSent(_)));
    assert!(h.mailer.sent().is_empty());
}
