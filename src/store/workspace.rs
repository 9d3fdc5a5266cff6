//! In-memory application state persisted through the [`DocumentStore`].

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{DocumentKey, DocumentStore, StoreError};
use crate::types::{
    CallOutcome, EmailDraft, GeneratedEmail, GmailToken, Lead, LoggedCall, Service, UserProfile,
};

/// Everything the user works with, loaded once and written back per mutation.
#[derive(Debug)]
pub struct Workspace {
    store: DocumentStore,
    profile: UserProfile,
    leads: Vec<Lead>,
    emails: Vec<GeneratedEmail>,
    calls: Vec<LoggedCall>,
    services: Vec<Service>,
    google_client_id: String,
}

impl Workspace {
    /// Load every collection from `store`, defaulting missing documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn load(store: DocumentStore) -> Result<Self, StoreError> {
        let profile = store.get(DocumentKey::Profile).await?.unwrap_or_default();
        let leads: Vec<Lead> = store.get(DocumentKey::Leads).await?.unwrap_or_default();
        let emails: Vec<GeneratedEmail> =
            store.get(DocumentKey::Emails).await?.unwrap_or_default();
        let calls: Vec<LoggedCall> = store.get(DocumentKey::Calls).await?.unwrap_or_default();
        let services: Vec<Service> = store.get(DocumentKey::Services).await?.unwrap_or_default();
        let google_client_id = store
            .get(DocumentKey::GoogleClientId)
            .await?
            .unwrap_or_default();

        debug!(
            leads = leads.len(),
            emails = emails.len(),
            calls = calls.len(),
            services = services.len(),
            "workspace loaded"
        );

        Ok(Self {
            store,
            profile,
            leads,
            emails,
            calls,
            services,
            google_client_id,
        })
    }

    /// The backing store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    // -- profile ------------------------------------------------------------

    /// The sender profile.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Replace the sender profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when the email is malformed.
    pub async fn set_profile(&mut self, profile: UserProfile) -> Result<(), StoreError> {
        profile.validate()?;
        self.store.put(DocumentKey::Profile, &profile).await?;
        self.profile = profile;
        Ok(())
    }

    /// The configured Google OAuth client id (empty when unset).
    pub fn google_client_id(&self) -> &str {
        &self.google_client_id
    }

    /// Store the Google OAuth client id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn set_google_client_id(&mut self, id: &str) -> Result<(), StoreError> {
        let id = id.trim().to_owned();
        self.store.put(DocumentKey::GoogleClientId, &id).await?;
        self.google_client_id = id;
        Ok(())
    }

    // -- leads --------------------------------------------------------------

    /// All stored leads in insertion order.
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Look up a lead by id.
    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    /// Insert or replace leads by id.
    ///
    /// A replaced lead keeps its original `date_added`; new leads are stamped
    /// with the current time. Returns the number of newly inserted leads.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn upsert_leads(&mut self, incoming: Vec<Lead>) -> Result<usize, StoreError> {
        let inserted = merge_leads(&mut self.leads, incoming);
        self.store.put(DocumentKey::Leads, &self.leads).await?;
        info!(inserted, total = self.leads.len(), "leads saved");
        Ok(inserted)
    }

    /// Remove leads by id. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn remove_leads(&mut self, ids: &[String]) -> Result<usize, StoreError> {
        let removed = retain_excluding(&mut self.leads, ids, |lead| &lead.id);
        if removed > 0 {
            self.store.put(DocumentKey::Leads, &self.leads).await?;
        }
        Ok(removed)
    }

    // -- emails -------------------------------------------------------------

    /// Saved emails, newest first.
    pub fn emails(&self) -> &[GeneratedEmail] {
        &self.emails
    }

    /// Look up a saved email by id.
    pub fn email(&self, id: &str) -> Option<&GeneratedEmail> {
        self.emails.iter().find(|email| email.id == id)
    }

    /// Saved emails addressed to `lead_id`, newest first.
    pub fn emails_for(&self, lead_id: &str) -> Vec<&GeneratedEmail> {
        self.emails
            .iter()
            .filter(|email| email.recipient.id == lead_id)
            .collect()
    }

    /// Save a drafted email and make sure its recipient is in the lead store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on encoding or persistence failure.
    pub async fn add_email(
        &mut self,
        recipient: Lead,
        draft: &EmailDraft,
    ) -> Result<GeneratedEmail, StoreError> {
        let body = serde_json::to_string(draft).map_err(|source| StoreError::Encode {
            key: DocumentKey::Emails.as_str(),
            source,
        })?;
        let email = GeneratedEmail {
            id: Uuid::new_v4().to_string(),
            recipient: recipient.clone(),
            body,
            created_at: Utc::now(),
        };

        self.emails.insert(0, email.clone());
        self.store.put(DocumentKey::Emails, &self.emails).await?;
        self.upsert_leads(vec![recipient]).await?;
        Ok(email)
    }

    /// Remove saved emails by id. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn remove_emails(&mut self, ids: &[String]) -> Result<usize, StoreError> {
        let removed = retain_excluding(&mut self.emails, ids, |email| &email.id);
        if removed > 0 {
            self.store.put(DocumentKey::Emails, &self.emails).await?;
        }
        Ok(removed)
    }

    // -- calls --------------------------------------------------------------

    /// Every logged call, newest first.
    pub fn calls(&self) -> &[LoggedCall] {
        &self.calls
    }

    /// Calls logged against `lead_id`, newest first.
    pub fn calls_for(&self, lead_id: &str) -> Vec<&LoggedCall> {
        let mut calls: Vec<&LoggedCall> = self
            .calls
            .iter()
            .filter(|call| call.lead_id == lead_id)
            .collect();
        calls.sort_by(|a, b| b.date.cmp(&a.date));
        calls
    }

    /// Append a call to the log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn add_call(
        &mut self,
        lead_id: &str,
        outcome: CallOutcome,
        notes: &str,
    ) -> Result<LoggedCall, StoreError> {
        let call = LoggedCall {
            id: Uuid::new_v4().to_string(),
            lead_id: lead_id.to_owned(),
            outcome,
            notes: notes.to_owned(),
            date: Utc::now(),
        };
        self.calls.insert(0, call.clone());
        self.store.put(DocumentKey::Calls, &self.calls).await?;
        Ok(call)
    }

    /// Remove logged calls by id. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn remove_calls(&mut self, ids: &[String]) -> Result<usize, StoreError> {
        let removed = retain_excluding(&mut self.calls, ids, |call| &call.id);
        if removed > 0 {
            self.store.put(DocumentKey::Calls, &self.calls).await?;
        }
        Ok(removed)
    }

    // -- services -----------------------------------------------------------

    /// The service catalog, newest first.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Add a service to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn add_service(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<Service, StoreError> {
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_owned(),
            description: description.trim().to_owned(),
        };
        self.services.insert(0, service.clone());
        self.store.put(DocumentKey::Services, &self.services).await?;
        Ok(service)
    }

    /// Remove a service. Returns `true` when it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn remove_service(&mut self, id: &str) -> Result<bool, StoreError> {
        let removed = retain_excluding(&mut self.services, &[id.to_owned()], |s| &s.id);
        if removed > 0 {
            self.store.put(DocumentKey::Services, &self.services).await?;
        }
        Ok(removed > 0)
    }

    // -- gmail token --------------------------------------------------------

    /// The persisted Gmail token, if signed in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn gmail_token(&self) -> Result<Option<GmailToken>, StoreError> {
        self.store.get(DocumentKey::GmailToken).await
    }

    /// Persist or clear the Gmail token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on persistence failure.
    pub async fn set_gmail_token(&self, token: Option<&GmailToken>) -> Result<(), StoreError> {
        match token {
            Some(token) => self.store.put(DocumentKey::GmailToken, token).await,
            None => self.store.remove(&[DocumentKey::GmailToken]).await,
        }
    }

    // -- session teardown ---------------------------------------------------

    /// Drop every per-user collection from memory and from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn clear_user_data(&mut self) -> Result<(), StoreError> {
        self.store.remove(&DocumentKey::USER_DATA).await?;
        self.profile = UserProfile::default();
        self.leads.clear();
        self.emails.clear();
        self.calls.clear();
        self.services.clear();
        info!("user data cleared");
        Ok(())
    }
}

/// Merge `incoming` into `existing` by id, preserving insertion order and the
/// original `date_added` of replaced leads. Returns the number inserted.
fn merge_leads(existing: &mut Vec<Lead>, incoming: Vec<Lead>) -> usize {
    let now = Utc::now();
    let mut positions: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(idx, lead)| (lead.id.clone(), idx))
        .collect();
    let mut inserted = 0_usize;

    for mut lead in incoming {
        let position = positions.get(&lead.id).copied();
        match position {
            Some(idx) => {
                if let Some(slot) = existing.get_mut(idx) {
                    lead.date_added = slot.date_added;
                    *slot = lead;
                }
            }
            None => {
                lead.date_added = now;
                positions.insert(lead.id.clone(), existing.len());
                existing.push(lead);
                inserted = inserted.saturating_add(1);
            }
        }
    }
    inserted
}

/// Drop every item whose id is in `ids`. Returns how many were dropped.
fn retain_excluding<T>(items: &mut Vec<T>, ids: &[String], id_of: impl Fn(&T) -> &String) -> usize {
    let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let before = items.len();
    items.retain(|item| !targets.contains(id_of(item).as_str()));
    before.saturating_sub(items.len())
}
