//! Lead search against a scripted provider.

use leadscout::extractors::ExtractError;
use leadscout::prospecting::{search_leads, SearchCriteria, SourcingError};
use leadscout::types::{UserProfile, ValidationError};

use crate::fixtures;
use crate::scripted_provider::ScriptedProvider;

fn criteria() -> SearchCriteria {
    SearchCriteria {
        country: "Spain".to_owned(),
        min_probability: 80,
        max_results: 10,
    }
}

#[tokio::test]
async fn leads_are_validated_and_sorted() {
    let provider = ScriptedProvider::replying(fixtures::search_reply());
    let leads = match search_leads(&provider, &criteria(), &fixtures::profile(), "Chatbots").await {
        Ok(leads) => leads,
        Err(err) => panic!("search should succeed: {err}"),
    };

    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].company_name, "Clinica Dental Sonrisa");
    assert_eq!(leads[0].acceptance_probability, 93);
    assert!(!leads[0].id.is_empty(), "blank id should be replaced");
    assert_eq!(leads[1].id, "l-1");
    assert_eq!(leads[1].contact.email, "marta@tlevante.example");
}

#[tokio::test]
async fn request_carries_system_prompt_and_criteria() {
    let provider = ScriptedProvider::replying("[]");
    let leads = search_leads(&provider, &criteria(), &fixtures::profile(), "Chatbots")
        .await
        .expect("search");
    assert!(leads.is_empty());

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.system.is_some());
    assert!(!request.json_object);
    let prompt = &request.prompt;
    assert!(prompt.contains("'Spain'"));
    assert!(prompt.contains("up to 10 companies"));
    assert!(prompt.contains("\"Chatbots\""));
}

#[tokio::test]
async fn invalid_criteria_never_reach_the_provider() {
    let provider = ScriptedProvider::replying("[]");
    let result = search_leads(&provider, &criteria(), &UserProfile::default(), "x").await;
    assert!(matches!(result, Err(SourcingError::ProfileIncomplete)));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn prose_reply_is_an_extract_error() {
    let provider = ScriptedProvider::replying("I'm sorry, I cannot browse the web.");
    match search_leads(&provider, &criteria(), &fixtures::profile(), "x").await {
        Err(SourcingError::Extract(ExtractError::NoArray { preview })) => {
            assert!(preview.starts_with("I'm sorry"));
        }
        other => panic!("expected NoArray, got {other:?}"),
    }
}

#[tokio::test]
async fn wrong_shape_is_a_schema_error() {
    let provider = ScriptedProvider::replying(r#"[{"name": "Acme"}]"#);
    match search_leads(&provider, &criteria(), &fixtures::profile(), "x").await {
        Err(SourcingError::Extract(ExtractError::Schema(_))) => {}
        other => panic!("expected Schema, got {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_probability_rejects_the_search() {
    let reply = fixtures::search_reply().replace("\"acceptanceProbability\":84", "\"acceptanceProbability\":140");
    let provider = ScriptedProvider::replying(reply);
    match search_leads(&provider, &criteria(), &fixtures::profile(), "x").await {
        Err(SourcingError::InvalidLead {
            index: 0,
            source: ValidationError::ProbabilityOutOfRange(140),
        }) => {}
        other => panic!("expected InvalidLead, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_failure_is_surfaced() {
    let provider = ScriptedProvider::new(vec![None]);
    let result = search_leads(&provider, &criteria(), &fixtures::profile(), "x").await;
    assert!(matches!(result, Err(SourcingError::Provider(_))));
}
