//! MIME construction and `users.drafts.create`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;

use leadscout::gmail::draft::{build_mime_message, create_draft, encode_raw, DraftDetails};
use leadscout::gmail::GmailError;

use crate::mock_server::serve_once;

fn details() -> DraftDetails {
    DraftDetails {
        to: "laura@example.com".to_owned(),
        subject: "Una idea de IA para Acmé".to_owned(),
        body: "Dear Laura:\n\nHello.\nBest regards,".to_owned(),
    }
}

#[test]
fn mime_message_has_encoded_subject_and_html_body() {
    let message = build_mime_message(&details());
    let lines: Vec<&str> = message.split("\r\n").collect();

    let encoded_subject = STANDARD.encode("Una idea de IA para Acmé".as_bytes());
    assert_eq!(
        lines,
        [
            "To: laura@example.com",
            "Content-type: text/html;charset=utf-8",
            "MIME-Version: 1.0",
            format!("Subject: =?utf-8?B?{encoded_subject}?=").as_str(),
            "",
            "Dear Laura:<br><br>Hello.<br>Best regards,",
        ]
    );
}

#[test]
fn raw_round_trips_through_url_safe_base64() {
    let message = build_mime_message(&details());
    let raw = encode_raw(&message);
    let decoded = match URL_SAFE.decode(raw.as_bytes()) {
        Ok(bytes) => bytes,
        Err(err) => panic!("raw should decode: {err}"),
    };
    assert_eq!(String::from_utf8_lossy(&decoded), message);
}

#[tokio::test]
async fn blank_recipient_is_rejected_without_a_request() {
    let mut details = details();
    details.to = "  ".to_owned();
    let result = create_draft(&reqwest::Client::new(), "http://127.0.0.1:9", "t", &details).await;
    assert!(matches!(result, Err(GmailError::MissingRecipient)));
}

#[tokio::test]
async fn draft_is_posted_with_bearer_token() {
    let served = serve_once("200 OK", r#"{"id":"r-123","message":{"id":"m-1"}}"#).await;
    let id = match create_draft(
        &reqwest::Client::new(),
        &served.base_url,
        "ya29.access",
        &details(),
    )
    .await
    {
        Ok(id) => id,
        Err(err) => panic!("draft should be created: {err}"),
    };
    assert_eq!(id, "r-123");

    let raw = served.request.await.expect("request captured");
    assert!(raw.starts_with("POST /gmail/v1/users/me/drafts"));
    assert!(raw.to_lowercase().contains("authorization: bearer ya29.access"));
    assert!(raw.contains(&encode_raw(&build_mime_message(&details()))));
}

#[tokio::test]
async fn unauthorized_maps_to_permission_denied() {
    for status in ["401 Unauthorized", "403 Forbidden"] {
        let served = serve_once(status, r#"{"error":{"message":"Invalid Credentials"}}"#).await;
        let result = create_draft(&reqwest::Client::new(), &served.base_url, "t", &details()).await;
        assert!(
            matches!(result, Err(GmailError::PermissionDenied)),
            "{status} should map to PermissionDenied"
        );
    }
}

#[tokio::test]
async fn other_failures_carry_the_api_message() {
    let served = serve_once(
        "400 Bad Request",
        r#"{"error":{"code":400,"message":"Invalid To header"}}"#,
    )
    .await;
    match create_draft(&reqwest::Client::new(), &served.base_url, "t", &details()).await {
        Err(GmailError::DraftFailed { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid To header");
        }
        other => panic!("expected DraftFailed, got {other:?}"),
    }
}
