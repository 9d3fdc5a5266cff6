//! Simulated login and the session guard.

use leadscout::session::{self, SessionError};
use leadscout::store::{DocumentKey, DocumentStore, Workspace};
use leadscout::types::EmailDraft;

use crate::fixtures;

async fn memory_store() -> DocumentStore {
    match DocumentStore::open_in_memory().await {
        Ok(store) => store,
        Err(err) => panic!("in-memory store should open: {err}"),
    }
}

#[tokio::test]
async fn login_uses_local_part_as_name() {
    let store = memory_store().await;
    let user = match session::login(&store, " ana.ruiz@studio.example ").await {
        Ok(user) => user,
        Err(err) => panic!("login should succeed: {err}"),
    };
    assert_eq!(user.name, "ana.ruiz");
    assert_eq!(user.email, "ana.ruiz@studio.example");
    assert!(!user.id.is_empty());

    let current = session::current_user(&store).await.expect("current user");
    assert_eq!(current, Some(user));
}

#[tokio::test]
async fn login_rejects_address_without_at() {
    let store = memory_store().await;
    for bad in ["", "   ", "ana.studio.example"] {
        match session::login(&store, bad).await {
            Err(SessionError::InvalidEmail(_)) => {}
            other => panic!("expected InvalidEmail for {bad:?}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn register_requires_a_name() {
    let store = memory_store().await;
    match session::register(&store, "  ", "ana@studio.example").await {
        Err(SessionError::MissingName) => {}
        other => panic!("expected MissingName, got {other:?}"),
    }
    let user = session::register(&store, "Ana Ruiz", "ana@studio.example")
        .await
        .expect("register");
    assert_eq!(user.name, "Ana Ruiz");
}

#[tokio::test]
async fn guard_rejects_without_session() {
    let store = memory_store().await;
    match session::require_user(&store).await {
        Err(SessionError::NotLoggedIn) => {}
        other => panic!("expected NotLoggedIn, got {other:?}"),
    }
}

#[tokio::test]
async fn logout_clears_session_and_user_data() {
    let store = memory_store().await;
    session::login(&store, "ana@studio.example")
        .await
        .expect("login");

    let mut ws = Workspace::load(store.clone()).await.expect("load");
    ws.set_profile(fixtures::profile()).await.expect("profile");
    ws.add_email(
        fixtures::lead("a", "Acme", 90),
        &EmailDraft {
            subject: "Hi".to_owned(),
            body: "Body".to_owned(),
        },
    )
    .await
    .expect("email");
    ws.add_service("Chatbots", "Support bots")
        .await
        .expect("service");

    session::logout(&mut ws).await.expect("logout");

    assert!(session::current_user(&store).await.expect("read").is_none());
    for key in DocumentKey::USER_DATA {
        assert!(
            !store.contains(key).await.expect("contains"),
            "{} should be cleared",
            key.as_str()
        );
    }
    let reloaded = Workspace::load(store).await.expect("reload");
    assert!(reloaded.leads().is_empty());
    assert!(reloaded.emails().is_empty());
    assert!(reloaded.services().is_empty());
}
