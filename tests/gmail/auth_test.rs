//! `GmailAuth` against a workspace: status, sign-in, refresh, sign-out.

use chrono::{Duration, Utc};

use leadscout::config::GmailConfig;
use leadscout::gmail::draft::DraftDetails;
use leadscout::gmail::{GmailAuth, GmailError};
use leadscout::store::{DocumentStore, Workspace};
use leadscout::types::GmailToken;

use crate::mock_server::serve_once;

async fn workspace_with_client_id(client_id: &str) -> Workspace {
    let store = match DocumentStore::open_in_memory().await {
        Ok(store) => store,
        Err(err) => panic!("in-memory store should open: {err}"),
    };
    let mut ws = Workspace::load(store).await.expect("workspace");
    if !client_id.is_empty() {
        ws.set_google_client_id(client_id).await.expect("client id");
    }
    ws
}

fn auth(config: GmailConfig) -> GmailAuth {
    GmailAuth::new(config, None, reqwest::Client::new())
}

fn offline_config() -> GmailConfig {
    GmailConfig {
        token_url: "http://127.0.0.1:9/token".to_owned(),
        revoke_url: "http://127.0.0.1:9/revoke".to_owned(),
        api_base: "http://127.0.0.1:9".to_owned(),
        ..GmailConfig::default()
    }
}

#[tokio::test]
async fn status_reports_missing_client_id() {
    let ws = workspace_with_client_id("").await;
    let status = auth(offline_config()).status(&ws).await.expect("status");
    assert!(!status.ready);
    assert!(!status.signed_in);
    assert!(status.error.is_some());
}

#[tokio::test]
async fn sign_in_requires_client_id() {
    let ws = workspace_with_client_id("").await;
    let result = auth(offline_config()).sign_in(&ws, |_| {}).await;
    assert!(matches!(result, Err(GmailError::NotConfigured)));
}

#[tokio::test]
async fn draft_without_token_asks_to_sign_in() {
    let ws = workspace_with_client_id("client-123").await;
    let details = DraftDetails {
        to: "laura@example.com".to_owned(),
        subject: "Hi".to_owned(),
        body: "Body".to_owned(),
    };
    let result = auth(offline_config()).create_draft(&ws, &details).await;
    assert!(matches!(result, Err(GmailError::NotSignedIn)));
}

#[tokio::test]
async fn fresh_token_is_used_without_refresh() {
    let ws = workspace_with_client_id("client-123").await;
    let token = GmailToken {
        access_token: "ya29.fresh".to_owned(),
        refresh_token: Some("1//r".to_owned()),
        expires_at: Utc::now().checked_add_signed(Duration::hours(1)),
    };
    ws.set_gmail_token(Some(&token)).await.expect("store token");

    let access = auth(offline_config()).access_token(&ws).await;
    assert_eq!(access.ok().as_deref(), Some("ya29.fresh"));
}

#[tokio::test]
async fn expiring_token_is_refreshed_and_persisted() {
    let served = serve_once("200 OK", r#"{"access_token":"ya29.renewed","expires_in":3600}"#).await;
    let ws = workspace_with_client_id("client-123").await;
    ws.set_gmail_token(Some(&GmailToken {
        access_token: "ya29.stale".to_owned(),
        refresh_token: Some("1//r".to_owned()),
        expires_at: Utc::now().checked_add_signed(Duration::seconds(10)),
    }))
    .await
    .expect("store token");

    let config = GmailConfig {
        token_url: format!("{}/token", served.base_url),
        ..offline_config()
    };
    let access = match auth(config).access_token(&ws).await {
        Ok(access) => access,
        Err(err) => panic!("refresh should succeed: {err}"),
    };
    assert_eq!(access, "ya29.renewed");

    let stored = ws.gmail_token().await.expect("read").expect("token kept");
    assert_eq!(stored.access_token, "ya29.renewed");
    assert_eq!(stored.refresh_token.as_deref(), Some("1//r"));
}

#[tokio::test]
async fn expired_token_without_refresh_token_needs_sign_in() {
    let ws = workspace_with_client_id("client-123").await;
    ws.set_gmail_token(Some(&GmailToken {
        access_token: "ya29.old".to_owned(),
        refresh_token: None,
        expires_at: Utc::now().checked_sub_signed(Duration::minutes(5)),
    }))
    .await
    .expect("store token");

    let result = auth(offline_config()).access_token(&ws).await;
    assert!(matches!(result, Err(GmailError::AuthExpired)));
}

#[tokio::test]
async fn sign_in_completes_through_the_loopback_redirect() {
    let served = serve_once(
        "200 OK",
        r#"{"access_token":"ya29.granted","refresh_token":"1//granted","expires_in":3599}"#,
    )
    .await;
    let ws = workspace_with_client_id("client-123").await;
    let config = GmailConfig {
        token_url: format!("{}/token", served.base_url),
        ..offline_config()
    };

    let token = auth(config)
        .sign_in(&ws, |consent_url| {
            let url = url::Url::parse(consent_url).expect("consent url");
            let query: std::collections::HashMap<String, String> =
                url.query_pairs().into_owned().collect();
            let redirect = format!(
                "{}/?state={}&code=granted-code",
                query["redirect_uri"], query["state"]
            );
            tokio::spawn(async move {
                let _ = reqwest::get(redirect).await;
            });
        })
        .await;
    let token = match token {
        Ok(token) => token,
        Err(err) => panic!("sign-in should complete: {err}"),
    };
    assert_eq!(token.access_token, "ya29.granted");

    let raw = served.request.await.expect("token request captured");
    assert!(raw.contains("code=granted-code"));
    assert!(raw.contains("code_verifier="));
    assert!(ws.gmail_token().await.expect("read").is_some());

    let status = auth(offline_config()).status(&ws).await.expect("status");
    assert!(status.ready && status.signed_in);
}

#[tokio::test]
async fn sign_out_removes_token_even_if_revocation_fails() {
    let ws = workspace_with_client_id("client-123").await;
    ws.set_gmail_token(Some(&GmailToken {
        access_token: "ya29.any".to_owned(),
        refresh_token: None,
        expires_at: None,
    }))
    .await
    .expect("store token");

    let gmail = auth(offline_config());
    assert!(gmail.sign_out(&ws).await.expect("sign out"));
    assert!(ws.gmail_token().await.expect("read").is_none());
    assert!(!gmail.sign_out(&ws).await.expect("second sign out"));
}
