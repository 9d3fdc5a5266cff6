//! Workspace collections: upsert, removal, email saving, calls, services.

use leadscout::store::{DocumentKey, DocumentStore, Workspace};
use leadscout::types::{CallOutcome, EmailDraft, GmailToken};

use crate::fixtures;

async fn workspace() -> Workspace {
    let store = match DocumentStore::open_in_memory().await {
        Ok(store) => store,
        Err(err) => panic!("in-memory store should open: {err}"),
    };
    match Workspace::load(store).await {
        Ok(workspace) => workspace,
        Err(err) => panic!("workspace should load: {err}"),
    }
}

fn draft() -> EmailDraft {
    EmailDraft {
        subject: "An AI idea for Acme".to_owned(),
        body: "Dear Laura:\n\nHello.".to_owned(),
    }
}

#[tokio::test]
async fn upsert_preserves_original_date_added() {
    let mut ws = workspace().await;
    let inserted = ws
        .upsert_leads(vec![fixtures::lead("a", "Acme", 82)])
        .await
        .expect("first upsert");
    assert_eq!(inserted, 1);
    let first_added = ws.lead("a").map(|l| l.date_added).expect("lead stored");

    let mut updated = fixtures::lead("a", "Acme Logistics", 95);
    updated.date_added = fixtures::at(2030, 1, 1, 0);
    let inserted = ws.upsert_leads(vec![updated]).await.expect("second upsert");
    assert_eq!(inserted, 0);

    let stored = ws.lead("a").expect("lead still stored");
    assert_eq!(stored.date_added, first_added);
    assert_eq!(stored.company_name, "Acme Logistics");
    assert_eq!(stored.acceptance_probability, 95);
    assert_eq!(ws.leads().len(), 1);
}

#[tokio::test]
async fn upsert_keeps_insertion_order() {
    let mut ws = workspace().await;
    ws.upsert_leads(vec![
        fixtures::lead("a", "Acme", 80),
        fixtures::lead("b", "Beta", 90),
    ])
    .await
    .expect("upsert");
    ws.upsert_leads(vec![
        fixtures::lead("c", "Gamma", 85),
        fixtures::lead("a", "Acme", 81),
    ])
    .await
    .expect("upsert");

    let ids: Vec<&str> = ws.leads().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn remove_leads_removes_exactly_the_named_ids() {
    let mut ws = workspace().await;
    ws.upsert_leads(vec![
        fixtures::lead("a", "Acme", 80),
        fixtures::lead("b", "Beta", 90),
        fixtures::lead("c", "Gamma", 85),
    ])
    .await
    .expect("upsert");

    let removed = ws
        .remove_leads(&["b".to_owned(), "missing".to_owned()])
        .await
        .expect("remove");
    assert_eq!(removed, 1);
    let ids: Vec<&str> = ws.leads().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["a", "c"]);
}

#[tokio::test]
async fn add_email_saves_recipient_as_lead() {
    let mut ws = workspace().await;
    let email = ws
        .add_email(fixtures::lead("a", "Acme", 88), &draft())
        .await
        .expect("add email");

    assert!(ws.lead("a").is_some());
    assert_eq!(ws.emails().len(), 1);
    assert_eq!(email.draft().expect("body decodes"), draft());
    assert_eq!(ws.emails_for("a").len(), 1);
    assert!(ws.emails_for("other").is_empty());
}

#[tokio::test]
async fn newest_email_comes_first() {
    let mut ws = workspace().await;
    let first = ws
        .add_email(fixtures::lead("a", "Acme", 88), &draft())
        .await
        .expect("first email");
    let second = ws
        .add_email(fixtures::lead("b", "Beta", 91), &draft())
        .await
        .expect("second email");

    let ids: Vec<&str> = ws.emails().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, [second.id.as_str(), first.id.as_str()]);
}

#[tokio::test]
async fn remove_emails_removes_exactly_the_named_ids() {
    let mut ws = workspace().await;
    let keep = ws
        .add_email(fixtures::lead("a", "Acme", 88), &draft())
        .await
        .expect("email");
    let drop = ws
        .add_email(fixtures::lead("a", "Acme", 88), &draft())
        .await
        .expect("email");

    let removed = ws.remove_emails(&[drop.id.clone()]).await.expect("remove");
    assert_eq!(removed, 1);
    assert!(ws.email(&keep.id).is_some());
    assert!(ws.email(&drop.id).is_none());
}

#[tokio::test]
async fn remove_calls_removes_exactly_the_named_ids() {
    let mut ws = workspace().await;
    let keep = ws
        .add_call("a", CallOutcome::Contacted, "spoke to reception")
        .await
        .expect("call");
    let drop = ws
        .add_call("a", CallOutcome::Voicemail, "")
        .await
        .expect("call");

    let removed = ws.remove_calls(&[drop.id.clone()]).await.expect("remove");
    assert_eq!(removed, 1);
    let ids: Vec<&str> = ws.calls().iter().map(|call| call.id.as_str()).collect();
    assert_eq!(ids, vec![keep.id.as_str()]);

    let again = ws.remove_calls(&[drop.id.clone()]).await.expect("remove");
    assert_eq!(again, 0);

    let reloaded = Workspace::load(ws.store().clone()).await.expect("reload");
    assert_eq!(reloaded.calls().len(), 1);
}

#[tokio::test]
async fn calls_are_listed_per_lead_newest_first() {
    let mut ws = workspace().await;
    let first = ws
        .add_call("a", CallOutcome::Voicemail, "left a message")
        .await
        .expect("call");
    ws.add_call("b", CallOutcome::Interested, "")
        .await
        .expect("call");
    let third = ws
        .add_call("a", CallOutcome::FollowUp, "call back Friday")
        .await
        .expect("call");

    let for_a: Vec<&str> = ws.calls_for("a").iter().map(|c| c.id.as_str()).collect();
    assert_eq!(for_a, [third.id.as_str(), first.id.as_str()]);
    assert_eq!(ws.calls().len(), 3);
}

#[tokio::test]
async fn services_can_be_added_and_removed() {
    let mut ws = workspace().await;
    let service = ws
        .add_service("  Chatbots ", " Customer support bots ")
        .await
        .expect("add service");
    assert_eq!(service.name, "Chatbots");
    assert_eq!(service.description, "Customer support bots");

    assert!(ws.remove_service(&service.id).await.expect("remove"));
    assert!(!ws.remove_service(&service.id).await.expect("remove again"));
    assert!(ws.services().is_empty());
}

#[tokio::test]
async fn profile_with_bad_email_is_rejected() {
    let mut ws = workspace().await;
    let mut profile = fixtures::profile();
    profile.email = "not-an-email".to_owned();
    assert!(ws.set_profile(profile).await.is_err());
    assert_eq!(ws.profile(), &leadscout::types::UserProfile::default());
}

#[tokio::test]
async fn collections_reload_from_the_store() {
    let mut ws = workspace().await;
    ws.set_profile(fixtures::profile()).await.expect("profile");
    ws.upsert_leads(vec![fixtures::lead("a", "Acme", 80)])
        .await
        .expect("leads");
    ws.add_service("Chatbots", "Support bots")
        .await
        .expect("service");

    let reloaded = Workspace::load(ws.store().clone()).await.expect("reload");
    assert_eq!(reloaded.profile(), &fixtures::profile());
    assert_eq!(reloaded.leads().len(), 1);
    assert_eq!(reloaded.services().len(), 1);
}

#[tokio::test]
async fn clear_user_data_keeps_client_id() {
    let mut ws = workspace().await;
    ws.set_google_client_id(" client-123 ")
        .await
        .expect("client id");
    ws.set_profile(fixtures::profile()).await.expect("profile");
    ws.add_email(fixtures::lead("a", "Acme", 88), &draft())
        .await
        .expect("email");
    ws.add_call("a", CallOutcome::Contacted, "")
        .await
        .expect("call");
    ws.set_gmail_token(Some(&GmailToken {
        access_token: "ya29.token".to_owned(),
        refresh_token: None,
        expires_at: None,
    }))
    .await
    .expect("token");

    ws.clear_user_data().await.expect("clear");

    assert!(ws.leads().is_empty());
    assert!(ws.emails().is_empty());
    assert!(ws.calls().is_empty());
    assert_eq!(ws.google_client_id(), "client-123");
    assert!(ws.gmail_token().await.expect("token read").is_none());
    assert!(!ws
        .store()
        .contains(DocumentKey::Profile)
        .await
        .expect("contains"));
}
