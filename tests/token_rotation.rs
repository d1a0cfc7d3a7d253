use std::sync::Arc;

use gatehouse::{
    error::AuthError,
    services::{TokenService, token_service::ClientMeta},
    store::{RefreshTokenStore, UserStore},
    test_helpers::{TEST_ACCESS_SECRET, TEST_REFRESH_SECRET, TestBackend},
};

async fn login(backend: &TestBackend) -> (uuid::Uuid, String) {
    let auth = backend.auth_service();
    let user = auth
        .register("alice", "alice@x.com", "Password1")
        .await
        .unwrap();
    let outcome = auth
        .login("alice", "Password1", &ClientMeta::default())
        .await
        .unwrap();
    (user.id, outcome.tokens.refresh_token)
}

#[tokio::test]
async fn refresh_rotates_the_token_and_keeps_the_session_alive() {
    let backend = TestBackend::default();
    let (user_id, refresh) = login(&backend).await;
    let auth = backend.auth_service();

    let first = auth.refresh(&refresh).await.expect("first rotation");
    assert_ne!(first.refresh_token, refresh);

    // the rotated token works in turn
    let second = auth.refresh(&first.refresh_token).await.expect("chained rotation");
    assert_ne!(second.refresh_token, first.refresh_token);

    let records = backend.refresh_tokens.records_for_user(user_id);
    assert_eq!(records.len(), 3);
    assert_eq!(records.iter().filter(|r| !r.revoked).count(), 1);
}

#[tokio::test]
async fn replaying_a_rotated_token_revokes_the_whole_family() {
    let backend = TestBackend::default();
    let (user_id, refresh) = login(&backend).await;
    let auth = backend.auth_service();

    auth.refresh(&refresh).await.expect("first rotation");

    let err = auth.refresh(&refresh).await.expect_err("replay");
    assert!(matches!(err, AuthError::RefreshTokenReuseDetected));

    // mass revocation includes the pair minted by the legitimate rotation
    let records = backend.refresh_tokens.records_for_user(user_id);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.revoked));

    // nothing in the family works any more
    for record in &records {
        assert!(record.revoked);
    }
}

#[tokio::test]
async fn concurrent_rotations_of_one_token_have_exactly_one_winner() {
    let backend = TestBackend::default();
    let (user_id, refresh) = login(&backend).await;
    let auth = backend.auth_service();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let auth = auth.clone();
        let token = refresh.clone();
        handles.push(tokio::spawn(async move { auth.refresh(&token).await }));
    }

    let mut wins = 0;
    let mut reuse = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AuthError::RefreshTokenReuseDetected) => reuse += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(reuse, 7);

    // the contested token is consumed; at most the winner's fresh pair is live
    let records = backend.refresh_tokens.records_for_user(user_id);
    assert!(records.iter().filter(|r| !r.revoked).count() <= 1);
}

#[tokio::test]
async fn stored_expiry_wins_over_the_jwt_claim() {
    let backend = TestBackend::default();
    let tokens = backend.token_service().with_ttls(900, -1);
    let auth = backend.auth_service_with(tokens);

    auth.register("bob", "bob@x.com", "Password1").await.unwrap();
    let outcome = auth
        .login("bob", "Password1", &ClientMeta::default())
        .await
        .unwrap();

    let err = auth
        .refresh(&outcome.tokens.refresh_token)
        .await
        .expect_err("token born expired");
    assert!(matches!(err, AuthError::RefreshTokenExpired));

    // the expired token was consumed, so replaying it now reads as reuse
    let err = auth
        .refresh(&outcome.tokens.refresh_token)
        .await
        .expect_err("consumed");
    assert!(matches!(err, AuthError::RefreshTokenReuseDetected));
}

#[tokio::test]
async fn garbage_and_foreign_signatures_are_rejected_without_side_effects() {
    let backend = TestBackend::default();
    let (user_id, _refresh) = login(&backend).await;
    let auth = backend.auth_service();

    assert!(matches!(
        auth.refresh("not-a-jwt").await,
        Err(AuthError::InvalidRefreshToken)
    ));

    // well-formed JWT signed with the wrong secret
    let foreign = TokenService::new(
        Arc::clone(&backend.refresh_tokens) as Arc<dyn RefreshTokenStore>,
        TEST_REFRESH_SECRET,
        TEST_ACCESS_SECRET,
    );
    let forged = foreign.generate_refresh_token(user_id).unwrap();
    assert!(matches!(
        auth.refresh(&forged).await,
        Err(AuthError::InvalidRefreshToken)
    ));

    // neither failure touched the legitimate session
    let records = backend.refresh_tokens.records_for_user(user_id);
    assert!(records.iter().any(|r| !r.revoked));
}

#[tokio::test]
async fn unknown_but_validly_signed_token_reads_as_reuse() {
    let backend = TestBackend::default();
    let (user_id, _refresh) = login(&backend).await;
    let auth = backend.auth_service();

    // signed with the real secret but never persisted
    let minted = backend
        .auth_service()
        .tokens()
        .generate_refresh_token(user_id)
        .unwrap();

    let err = auth.refresh(&minted).await.expect_err("no stored record");
    assert!(matches!(err, AuthError::RefreshTokenReuseDetected));

    // defensive revocation hits the user's real tokens
    assert!(
        backend
            .refresh_tokens
            .records_for_user(user_id)
            .iter()
            .all(|r| r.revoked)
    );
}

#[tokio::test]
async fn refresh_is_refused_once_the_account_leaves_active() {
    let backend = TestBackend::default();
    let (user_id, refresh) = login(&backend).await;
    let auth = backend.auth_service();

    // flip the status directly so the stored token stays unrevoked
    let mut user = backend.users.find_by_id(user_id).await.unwrap().unwrap();
    user.suspend().unwrap();
    backend.users.update(&user).await.unwrap();

    let err = auth.refresh(&refresh).await.expect_err("suspended");
    assert!(matches!(err, AuthError::AccountNotActive));

    // the presented token was still consumed by the rotation claim
    let records = backend.refresh_tokens.records_for_user(user_id);
    assert!(records.iter().all(|r| r.revoked));
}

#[tokio::test]
async fn logout_is_idempotent_and_never_fails() {
    let backend = TestBackend::default();
    let (user_id, refresh) = login(&backend).await;
    let auth = backend.auth_service();

    auth.logout(Some(refresh.as_str())).await;
    assert!(
        backend
            .refresh_tokens
            .records_for_user(user_id)
            .iter()
            .all(|r| r.revoked)
    );

    // repeated, absent, empty and malformed inputs are all no-ops
    auth.logout(Some(refresh.as_str())).await;
    auth.logout(None).await;
    auth.logout(Some("")).await;
    auth.logout(Some("not-a-jwt")).await;

    // a logged-out token refuses to rotate
    let err = auth.refresh(&refresh).await.expect_err("revoked");
    assert!(matches!(err, AuthError::RefreshTokenReuseDetected));
}
