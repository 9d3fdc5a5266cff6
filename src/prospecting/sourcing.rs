//! Lead search: one completion request returning a JSON array of leads.

use tracing::{debug, info};

use crate::extractors::{extract_json_array, parse_payload, ExtractError};
use crate::providers::{CompletionProvider, CompletionRequest, ProviderError};
use crate::types::{Lead, UserProfile, ValidationError, MAX_PROBABILITY};

/// Default lower bound on acceptance probability offered by the search form.
pub const DEFAULT_MIN_PROBABILITY: u8 = 80;

const SYSTEM_PROMPT: &str = "You are an expert consultant in AI solutions for B2B companies. \
Your job is to identify business needs and propose specific AI applications. \
You must answer ONLY with a valid JSON array.";

/// Errors from lead search.
#[derive(Debug, thiserror::Error)]
pub enum SourcingError {
    /// No country was given.
    #[error("a country is required to search for leads")]
    MissingCountry,

    /// Minimum probability outside 1–100.
    #[error("minimum probability must be between 1 and 100, got {0}")]
    MinProbabilityOutOfRange(u8),

    /// The sender profile has no name to sign emails with.
    #[error("complete your profile first: `leadscout profile set --name <name> ...`")]
    ProfileIncomplete,

    /// The completion request failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The reply held no usable JSON array.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A lead in the reply failed validation.
    #[error("lead #{index} in the model response is invalid: {source}")]
    InvalidLead {
        /// Zero-based position in the returned array.
        index: usize,
        /// What was wrong with it.
        source: ValidationError,
    },
}

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Country to search in.
    pub country: String,
    /// Lowest acceptable acceptance probability (1–100).
    pub min_probability: u8,
    /// Upper bound on leads requested from the model.
    pub max_results: u32,
}

impl SearchCriteria {
    /// Check the criteria and the sender profile before spending a request.
    ///
    /// # Errors
    ///
    /// Returns [`SourcingError::MissingCountry`],
    /// [`SourcingError::MinProbabilityOutOfRange`] or
    /// [`SourcingError::ProfileIncomplete`].
    pub fn validate(&self, profile: &UserProfile) -> Result<(), SourcingError> {
        if self.country.trim().is_empty() {
            return Err(SourcingError::MissingCountry);
        }
        if !(1..=MAX_PROBABILITY).contains(&self.min_probability) {
            return Err(SourcingError::MinProbabilityOutOfRange(self.min_probability));
        }
        if !profile.is_complete() {
            return Err(SourcingError::ProfileIncomplete);
        }
        Ok(())
    }
}

/// Build the user prompt for a lead search.
pub fn build_search_prompt(criteria: &SearchCriteria, service: &str) -> String {
    let country = criteria.country.trim();
    let min = criteria.min_probability;
    let max_results = criteria.max_results;
    format!(
        r#"My service is: "{service}".
Find up to {max_results} companies in '{country}' that are excellent prospects for my service.
KEY CRITERION: results must be small or medium-sized businesses. Do not include large corporations or large retailers.

For each company you MUST:
1. Find a relevant contact: a manager, director or person in charge. Get their name, role and an email that is personal or tied to their position. The email must NOT be generic (e.g. 'info@', 'contact@', 'sales@', 'support@', 'management@'). If no valid non-generic email can be found, discard the company and find another one.
2. Identify a concrete need: analyse the company's business model and identify a specific problem, inefficiency or improvement opportunity. Be very concrete. This is 'needAnalysis'.
3. Propose an AI solution: design a custom AI application that addresses the need. Describe it and its key benefits. This is 'proposedSolution'.
4. Write a solution prompt: a detailed technical prompt for an LLM that could produce a prototype or detailed specification of the proposed solution. This is 'solutionPrompt'.
5. Estimate acceptance probability: a score between {min} and 100 for how likely the company is to be interested in the proposal ('acceptanceProbability'). It must be realistic and justified by the need and the solution.

STRICT RULES:
- Focus EXCLUSIVELY on small and medium-sized businesses. Avoid large corporations, retail chains and well-known multinationals.
- Every field is MANDATORY, especially the non-generic contact email.
- The answer MUST be ONLY a valid JSON array, starting with '[' and ending with ']'. No explanatory text and no code fences.
- Sort the final result by 'acceptanceProbability' from highest to lowest.

Each JSON object must have this shape:
{{
  "id": "string (a unique UUID v4 for each prospect)",
  "companyName": "string",
  "website": "string",
  "contact": {{ "name": "string", "role": "string", "email": "string", "phone": "string", "emailVerified": boolean }},
  "location": "string (city/country, e.g. '{country}')",
  "sector": "string (the company's industry)",
  "fullAddress": "string",
  "needAnalysis": "string (the specific need you identified)",
  "proposedSolution": "string (description of the AI application you propose)",
  "solutionPrompt": "string (the technical prompt to build the solution)",
  "acceptanceProbability": integer (between {min} and 100),
  "rating": {{ "score": number, "reviews": integer }}
}}"#
    )
}

/// Ask the model for leads matching `criteria`.
///
/// Every record is validated (blank ids get a UUID); the result is sorted by
/// acceptance probability, highest first.
///
/// # Errors
///
/// Returns [`SourcingError`] on invalid input, a failed request, a reply with
/// no JSON array, or any record that does not validate.
pub async fn search_leads(
    provider: &dyn CompletionProvider,
    criteria: &SearchCriteria,
    profile: &UserProfile,
    service: &str,
) -> Result<Vec<Lead>, SourcingError> {
    criteria.validate(profile)?;

    let request = CompletionRequest {
        system: Some(SYSTEM_PROMPT.to_owned()),
        prompt: build_search_prompt(criteria, service),
        ..CompletionRequest::default()
    };

    info!(
        country = %criteria.country,
        min_probability = criteria.min_probability,
        model = provider.model_id(),
        "searching for leads"
    );
    let response = provider.complete(request).await?;
    debug!(chars = response.text.len(), "search reply received");

    let span = extract_json_array(&response.text)?;
    let raw: Vec<Lead> = parse_payload(span)?;

    let mut leads = raw
        .into_iter()
        .enumerate()
        .map(|(index, lead)| {
            lead.validated()
                .map_err(|source| SourcingError::InvalidLead { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    leads.sort_by(|a, b| b.acceptance_probability.cmp(&a.acceptance_probability));

    info!(found = leads.len(), "lead search complete");
    Ok(leads)
}
