//! Domain records persisted in the document store.
//!
//! Every record serializes with camelCase field names so the stored JSON
//! matches the shape the completion prompts ask the model to produce.
//! Timestamps are [`DateTime<Utc>`] and serialize as ISO-8601 strings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Probability above which a lead is shown as a high-probability prospect.
pub const HIGH_PROBABILITY_THRESHOLD: u8 = 89;

/// Upper bound of the acceptance probability scale.
pub const MAX_PROBABILITY: u8 = 100;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Input or payload that does not satisfy a record's constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field was empty or whitespace.
    #[error("{field} must not be empty")]
    Blank {
        /// Name of the offending field.
        field: &'static str,
    },
    /// An email address did not look like `local@domain.tld`.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),
    /// A probability fell outside 0–100.
    #[error("acceptance probability {0} is outside 0-100")]
    ProbabilityOutOfRange(u8),
    /// A call outcome label was not recognised.
    #[error("unknown call outcome {0:?}; expected one of contacted, interested, not-interested, voicemail, follow-up, other")]
    UnknownOutcome(String),
}

/// Returns `true` when `email` has the `local@domain.tld` shape with no spaces.
pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

// ---------------------------------------------------------------------------
// Profile and session
// ---------------------------------------------------------------------------

/// The sender identity used to sign outreach emails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Full name used in the email signature.
    pub name: String,
    /// Sender email address.
    pub email: String,
    /// Sender website.
    pub website: String,
}

impl UserProfile {
    /// Check the profile before it is saved.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] when the email is empty or malformed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_valid_email(self.email.trim()) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    /// Whether the profile carries enough data to sign a generated email.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// The locally "logged in" user. No credentials are ever checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Random identifier assigned at login.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

/// Contact person at a lead's company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Contact's full name.
    pub name: String,
    /// Job title.
    pub role: String,
    /// Direct (non-generic) email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Whether the model reported the address as verified.
    pub email_verified: bool,
}

/// Public review rating of the company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score.
    pub score: f64,
    /// Number of reviews behind the score.
    pub reviews: u32,
}

/// A prospective client produced by lead sourcing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Unique identifier within the lead store.
    #[serde(default)]
    pub id: String,
    /// Company name.
    pub company_name: String,
    /// Company website.
    pub website: String,
    /// Person to contact.
    pub contact: Contact,
    /// City / country.
    pub location: String,
    /// Industry.
    pub sector: String,
    /// Postal address.
    pub full_address: String,
    /// The concrete business need identified for this company.
    pub need_analysis: String,
    /// The AI solution proposed for that need.
    pub proposed_solution: String,
    /// Technical prompt for prototyping the solution.
    pub solution_prompt: String,
    /// Estimated likelihood (0–100) that the company accepts the proposal.
    pub acceptance_probability: u8,
    /// Public rating.
    #[serde(default)]
    pub rating: Rating,
    /// When the lead entered the store. Older records default to the epoch.
    #[serde(default = "unix_epoch")]
    pub date_added: DateTime<Utc>,
}

/// Display bucket for a lead's acceptance probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityTier {
    /// Above [`HIGH_PROBABILITY_THRESHOLD`].
    High,
    /// Everything else.
    Medium,
}

impl fmt::Display for ProbabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("High probability"),
            Self::Medium => f.write_str("Medium probability"),
        }
    }
}

impl Lead {
    /// Validate a record parsed from model output.
    ///
    /// Blank ids are replaced with a fresh UUID so every stored lead is addressable.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the company name is blank or the
    /// probability exceeds [`MAX_PROBABILITY`].
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        require_text("companyName", &self.company_name)?;
        if self.acceptance_probability > MAX_PROBABILITY {
            return Err(ValidationError::ProbabilityOutOfRange(
                self.acceptance_probability,
            ));
        }
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        Ok(self)
    }

    /// Probability display tier.
    pub fn tier(&self) -> ProbabilityTier {
        if self.acceptance_probability > HIGH_PROBABILITY_THRESHOLD {
            ProbabilityTier::High
        } else {
            ProbabilityTier::Medium
        }
    }
}

// ---------------------------------------------------------------------------
// Emails
// ---------------------------------------------------------------------------

/// Subject and body of an outreach email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl EmailDraft {
    /// Reject drafts with a blank subject or body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Blank`] naming the empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("subject", &self.subject)?;
        require_text("body", &self.body)
    }
}

/// An outreach email saved by the user, with a snapshot of its recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedEmail {
    /// Unique identifier.
    pub id: String,
    /// Lead snapshot at the time the email was saved.
    pub recipient: Lead,
    /// Serialized [`EmailDraft`].
    pub body: String,
    /// When the email was saved.
    pub created_at: DateTime<Utc>,
}

impl GeneratedEmail {
    /// Decode the serialized subject/body pair.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the stored body is not a valid draft.
    pub fn draft(&self) -> Result<EmailDraft, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// Result of a phone contact with a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallOutcome {
    /// Reached the contact.
    Contacted,
    /// Contact showed interest.
    Interested,
    /// Contact declined.
    NotInterested,
    /// Left a voicemail.
    Voicemail,
    /// A follow-up is scheduled.
    FollowUp,
    /// Anything else.
    Other,
}

impl CallOutcome {
    /// Every outcome, in display order.
    pub const ALL: [Self; 6] = [
        Self::Contacted,
        Self::Interested,
        Self::NotInterested,
        Self::Voicemail,
        Self::FollowUp,
        Self::Other,
    ];

    /// The kebab-case label used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacted => "contacted",
            Self::Interested => "interested",
            Self::NotInterested => "not-interested",
            Self::Voicemail => "voicemail",
            Self::FollowUp => "follow-up",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CallOutcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|outcome| outcome.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownOutcome(s.to_owned()))
    }
}

/// One logged phone call. The log is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedCall {
    /// Unique identifier.
    pub id: String,
    /// Lead the call was made to.
    pub lead_id: String,
    /// What happened.
    pub outcome: CallOutcome,
    /// Free-text notes.
    pub notes: String,
    /// When the call was logged.
    pub date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Services and OAuth state
// ---------------------------------------------------------------------------

/// An entry in the user's service catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique identifier.
    pub id: String,
    /// Service name.
    pub name: String,
    /// What the service offers.
    pub description: String,
}

/// Persisted Gmail OAuth token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailToken {
    /// Bearer token for the Gmail API.
    pub access_token: String,
    /// Token used to obtain a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry instant, when the token endpoint reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for GmailToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GmailToken")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
