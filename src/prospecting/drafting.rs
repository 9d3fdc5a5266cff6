//! Outreach email drafting: one completion request per lead returning a
//! `{ "subject", "body" }` object.

use tracing::{info, warn};

use crate::extractors::{extract_json_object, parse_payload, ExtractError};
use crate::providers::{CompletionProvider, CompletionRequest, ProviderError};
use crate::types::{EmailDraft, Lead, UserProfile, ValidationError};

const SYSTEM_PROMPT: &str = "You are an expert B2B copywriter selling AI solutions. \
Your only job is to return a JSON object with the keys 'subject' and 'body'. \
Never write anything outside the JSON object.";

/// Errors from email drafting.
#[derive(Debug, thiserror::Error)]
pub enum DraftingError {
    /// The completion request failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The reply held no usable JSON object.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The draft had an empty subject or body.
    #[error("the drafted email is incomplete: {0}")]
    Invalid(#[from] ValidationError),

    /// The sender profile has no name to sign the email with.
    #[error("complete your profile first: `leadscout profile set --name <name> ...`")]
    ProfileIncomplete,
}

/// Build the user prompt for a cold email to `lead`.
pub fn build_draft_prompt(lead: &Lead, profile: &UserProfile, service: &str) -> String {
    let contact = &lead.contact;
    let company = &lead.company_name;
    let need = &lead.need_analysis;
    let solution = &lead.proposed_solution;
    format!(
        r#"My service is: {service}
I am writing a cold email to {contact_name} ({contact_role}) at {company}.

Based on my research I identified a specific need for their company:
Identified need: "{need}"

My proposed custom AI solution for them is:
Proposed solution: "{solution}"

Your task is to write a highly personalised, persuasive B2B email draft.

STRICT RULES FOR THE EMAIL:
1. Subject: short, intriguing and personalised. It should reference their business or the proposed solution (e.g. "An AI idea for [business area] at {company}").
2. Body:
   - Greeting: "Dear {contact_name}:".
   - Introduction (paragraph 1): show that you understand their business. Briefly mention their company and why you are reaching out.
   - Connection and solution (paragraph 2): present the need you identified ("{need}") clearly and concisely. Right after, introduce your custom solution ("{solution}") as the direct answer to that need. Explain 1 or 2 key benefits.
   - Call to action (paragraph 3): propose a 15-minute exploratory call to discuss how your AI solution could benefit them.
   - Closing and signature: end with "Best regards," followed by the sender's details, each on its own line:
     {sender_name}
     {sender_email}
     {sender_website}

MANDATORY OUTPUT FORMAT:
Your answer MUST be ONLY a valid JSON object. No text, explanations or formatting markers. It must start with '{{' and end with '}}'.

The JSON shape must be:
{{
  "subject": "string",
  "body": "string"
}}"#,
        contact_name = contact.name,
        contact_role = contact.role,
        sender_name = profile.name,
        sender_email = profile.email,
        sender_website = profile.website,
    )
}

/// Draft one outreach email for `lead`.
///
/// # Errors
///
/// Returns [`DraftingError`] when the profile has no name, the request
/// fails, the reply has no JSON object of the right shape, or the subject or
/// body is blank.
pub async fn draft_email(
    provider: &dyn CompletionProvider,
    lead: &Lead,
    profile: &UserProfile,
    service: &str,
) -> Result<EmailDraft, DraftingError> {
    if !profile.is_complete() {
        return Err(DraftingError::ProfileIncomplete);
    }

    let request = CompletionRequest {
        system: Some(SYSTEM_PROMPT.to_owned()),
        prompt: build_draft_prompt(lead, profile, service),
        json_object: true,
        ..CompletionRequest::default()
    };

    info!(lead = %lead.id, company = %lead.company_name, "drafting email");
    let response = provider.complete(request).await?;
    let span = extract_json_object(&response.text)?;
    let draft: EmailDraft = parse_payload(span)?;
    draft.validate()?;
    Ok(draft)
}

/// Result of drafting emails for several leads.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Leads that got a draft, in input order.
    pub drafted: Vec<(Lead, EmailDraft)>,
    /// Leads whose draft failed, with the reason.
    pub failed: Vec<(Lead, DraftingError)>,
}

impl BulkOutcome {
    /// Total number of leads processed.
    pub fn total(&self) -> usize {
        self.drafted.len().saturating_add(self.failed.len())
    }
}

/// Draft emails for `leads` one after another.
///
/// A failure is recorded and the batch continues with the next lead.
pub async fn draft_bulk(
    provider: &dyn CompletionProvider,
    leads: Vec<Lead>,
    profile: &UserProfile,
    service: &str,
) -> BulkOutcome {
    let total = leads.len();
    let mut outcome = BulkOutcome::default();

    for (idx, lead) in leads.into_iter().enumerate() {
        info!(
            current = idx.saturating_add(1),
            total,
            company = %lead.company_name,
            "bulk drafting"
        );
        match draft_email(provider, &lead, profile, service).await {
            Ok(draft) => outcome.drafted.push((lead, draft)),
            Err(e) => {
                warn!(lead = %lead.id, error = %e, "draft failed");
                outcome.failed.push((lead, e));
            }
        }
    }

    info!(
        drafted = outcome.drafted.len(),
        failed = outcome.failed.len(),
        "bulk drafting complete"
    );
    outcome
}
