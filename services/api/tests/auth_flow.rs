mod common;

use common::{test_app, ADMIN_EMAIL};
use life_lessons_core::ports::{CredentialStore, TokenService};
use life_lessons_core::{
    AuthError, ProfileChanges, ProfileUpdate, RotatedCredentials, SignUp, TokenError,
};

#[tokio::test]
async fn only_the_latest_token_is_accepted() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let first = app.sign_up("ann", "ann@x.com", "pw-1").await;

    let second = auth.sign_in_with_password("ann@x.com", "pw-1").await.unwrap();
    assert_ne!(first.token, second.token);

    assert!(matches!(
        auth.authenticate(&first.token).await,
        Err(AuthError::StaleToken)
    ));
    let account = auth.authenticate(&second.token).await.unwrap();
    assert_eq!(account.account_id, first.account_id);
}

#[tokio::test]
async fn token_sign_in_makes_the_presented_token_stale() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let session = app.sign_up("ann", "ann@x.com", "pw").await;

    let renewed = auth.sign_in_with_token(&session.token).await.unwrap();

    assert!(matches!(
        auth.sign_in_with_token(&session.token).await,
        Err(AuthError::StaleToken)
    ));
    assert!(auth.authenticate(&renewed.token).await.is_ok());
}

#[tokio::test]
async fn duplicate_sign_up_already_exists() {
    let app = test_app();
    app.sign_up("ann", "ann@x.com", "pw").await;

    let again = app
        .state
        .authenticator
        .sign_up(SignUp {
            username: "other".to_string(),
            email: "ann@x.com".to_string(),
            password: "pw2".to_string(),
            photo: None,
        })
        .await;
    assert!(matches!(again, Err(AuthError::AlreadyExists(_))));
}

#[tokio::test]
async fn wrong_password_leaves_the_latest_token_unchanged() {
    let app = test_app();
    let session = app.sign_up("ann", "ann@x.com", "right").await;

    let attempt = app
        .state
        .authenticator
        .sign_in_with_password("ann@x.com", "wrong")
        .await;
    assert!(matches!(attempt, Err(AuthError::CredentialMismatch)));

    let stored = app.store.find_account_by_id(session.account_id).await.unwrap();
    assert_eq!(stored.last_issued_token.as_deref(), Some(session.token.as_str()));
    assert!(app.state.authenticator.authenticate(&session.token).await.is_ok());
}

#[tokio::test]
async fn unknown_email_is_account_not_found() {
    let app = test_app();
    let attempt = app
        .state
        .authenticator
        .sign_in_with_password("nobody@x.com", "pw")
        .await;
    assert!(matches!(attempt, Err(AuthError::AccountNotFound)));
}

#[tokio::test]
async fn configured_admin_email_is_granted_admin() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let admin = app.sign_up("root", ADMIN_EMAIL, "pw").await;
    let user = app.sign_up("ann", "ann@x.com", "pw").await;

    assert!(auth.authenticate_admin(&admin.token).await.unwrap().is_admin);
    assert!(matches!(
        auth.authenticate_admin(&user.token).await,
        Err(AuthError::NotAdmin)
    ));
}

#[tokio::test]
async fn admin_claim_without_stored_flag_is_not_admin() {
    let app = test_app();
    let session = app.sign_up("ann", "ann@x.com", "pw").await;
    let account = app.store.find_account_by_id(session.account_id).await.unwrap();
    assert!(!account.is_admin);

    // A fresh, correctly signed token that claims admin.
    let token = app
        .tokens
        .issue(account.id, &account.email, &account.password_hash, true)
        .unwrap();
    app.store.set_last_token(account.id, &token).await.unwrap();

    let auth = &app.state.authenticator;
    assert!(auth.authenticate(&token).await.is_ok());
    assert!(matches!(
        auth.authenticate_admin(&token).await,
        Err(AuthError::NotAdmin)
    ));
}

#[tokio::test]
async fn password_change_rotates_the_token() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let session = app.sign_up("ann", "ann@x.com", "old-pw").await;

    let new_token = auth
        .update_profile(
            session.account_id,
            ProfileUpdate {
                username: "annie".to_string(),
                photo: Some("https://img/annie.png".to_string()),
                new_password: Some("new-pw".to_string()),
            },
        )
        .await
        .unwrap()
        .expect("a password change returns a new token");

    assert!(matches!(
        auth.authenticate(&session.token).await,
        Err(AuthError::StaleToken)
    ));
    assert!(auth.authenticate(&new_token).await.is_ok());
    assert!(matches!(
        auth.sign_in_with_password("ann@x.com", "old-pw").await,
        Err(AuthError::CredentialMismatch)
    ));
    assert!(auth.sign_in_with_password("ann@x.com", "new-pw").await.is_ok());

    let stored = app.store.find_account_by_id(session.account_id).await.unwrap();
    assert_eq!(stored.username, "annie");
}

#[tokio::test]
async fn profile_edit_without_password_keeps_the_token() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let session = app.sign_up("ann", "ann@x.com", "pw").await;

    let new_token = auth
        .update_profile(
            session.account_id,
            ProfileUpdate {
                username: "annie".to_string(),
                photo: None,
                new_password: None,
            },
        )
        .await
        .unwrap();

    assert!(new_token.is_none());
    assert!(auth.authenticate(&session.token).await.is_ok());
}

#[tokio::test]
async fn latest_token_is_refused_once_the_stored_hash_moves() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let session = app.sign_up("ann", "ann@x.com", "pw").await;

    // The hash changes underneath a token that is still the latest one.
    app.store
        .update_profile(
            session.account_id,
            ProfileChanges {
                username: "ann".to_string(),
                photo: None,
                rotated: Some(RotatedCredentials {
                    password_hash: "$argon2id$someone-else".to_string(),
                    token: session.token.clone(),
                }),
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        auth.authenticate(&session.token).await,
        Err(AuthError::CredentialMismatch)
    ));
    assert!(matches!(
        auth.sign_in_with_token(&session.token).await,
        Err(AuthError::CredentialMismatch)
    ));
}

#[tokio::test]
async fn deleted_account_token_is_refused() {
    let app = test_app();
    let auth = &app.state.authenticator;
    let session = app.sign_up("ann", "ann@x.com", "pw").await;

    auth.delete_account(session.account_id).await.unwrap();

    assert!(matches!(
        auth.authenticate(&session.token).await,
        Err(AuthError::AccountNotFound)
    ));
    assert!(matches!(
        auth.delete_account(session.account_id).await,
        Err(AuthError::AccountNotFound)
    ));
}

#[tokio::test]
async fn token_from_another_secret_is_an_invalid_signature() {
    use api_lib::adapters::JwtTokenService;
    use api_lib::config::SigningSecret;

    let app = test_app();
    let session = app.sign_up("ann", "ann@x.com", "pw").await;
    let account = app.store.find_account_by_id(session.account_id).await.unwrap();

    let forger = JwtTokenService::new(
        &SigningSecret::new("not-the-secret"),
        chrono::Duration::hours(1),
    );
    let forged = forger
        .issue(account.id, &account.email, &account.password_hash, true)
        .unwrap();

    assert!(matches!(
        app.state.authenticator.authenticate(&forged).await,
        Err(AuthError::Token(TokenError::InvalidSignature))
    ));
}
