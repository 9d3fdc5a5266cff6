//! Read-side views over the workspace: lead filtering and sorting, the
//! proposals join, and plain-text renderers used by the CLI.

pub mod export;

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::types::{GeneratedEmail, Lead, LoggedCall, Service, UserProfile};

// ---------------------------------------------------------------------------
// Filtering and sorting
// ---------------------------------------------------------------------------

/// Lead list filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    /// Case-insensitive substring of the sector.
    pub sector: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    /// Inclusive lower probability bound.
    pub min_probability: Option<u8>,
    /// Inclusive upper probability bound.
    pub max_probability: Option<u8>,
    /// Added on or after the start of this day (UTC).
    pub from: Option<NaiveDate>,
    /// Added on or before 23:59:59 of this day (UTC).
    pub to: Option<NaiveDate>,
}

impl LeadFilter {
    /// Whether `lead` passes every set criterion.
    pub fn matches(&self, lead: &Lead) -> bool {
        if !contains_ignore_case(&lead.sector, self.sector.as_deref()) {
            return false;
        }
        if !contains_ignore_case(&lead.location, self.location.as_deref()) {
            return false;
        }
        if self
            .min_probability
            .is_some_and(|min| lead.acceptance_probability < min)
        {
            return false;
        }
        if self
            .max_probability
            .is_some_and(|max| lead.acceptance_probability > max)
        {
            return false;
        }
        if let Some(from) = self.from {
            if lead.date_added < day_bound(from, NaiveTime::MIN) {
                return false;
            }
        }
        if let Some(to) = self.to {
            let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
            if lead.date_added > day_bound(to, end) {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        Some(needle) if !needle.is_empty() => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        _ => true,
    }
}

fn day_bound(day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    day.and_time(time).and_utc()
}

/// Lead list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LeadSort {
    /// Highest acceptance probability first.
    #[default]
    Probability,
    /// Company name, A to Z, ignoring case.
    Name,
    /// Most recently added first.
    Date,
}

/// Filter then sort `leads`.
pub fn filter_leads<'a>(leads: &'a [Lead], filter: &LeadFilter, sort: LeadSort) -> Vec<&'a Lead> {
    let mut shown: Vec<&Lead> = leads.iter().filter(|lead| filter.matches(lead)).collect();
    match sort {
        LeadSort::Probability => {
            shown.sort_by(|a, b| b.acceptance_probability.cmp(&a.acceptance_probability));
        }
        LeadSort::Name => {
            shown.sort_by_cached_key(|lead| lead.company_name.to_lowercase());
        }
        LeadSort::Date => shown.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
    }
    shown
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// A stored lead paired with the latest email written to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal<'a> {
    /// The lead as currently stored.
    pub lead: &'a Lead,
    /// Most recent email addressed to it.
    pub email: &'a GeneratedEmail,
}

/// Latest email per lead, joined to the stored lead, newest email first.
///
/// Emails whose lead has been removed are left out.
pub fn proposals<'a>(leads: &'a [Lead], emails: &'a [GeneratedEmail]) -> Vec<Proposal<'a>> {
    let mut latest: HashMap<&str, &GeneratedEmail> = HashMap::new();
    for email in emails {
        let entry = latest.entry(email.recipient.id.as_str()).or_insert(email);
        if email.created_at > entry.created_at {
            *entry = email;
        }
    }

    let mut joined: Vec<Proposal<'a>> = leads
        .iter()
        .filter_map(|lead| {
            latest
                .get(lead.id.as_str())
                .map(|email| Proposal { lead, email })
        })
        .collect();
    joined.sort_by(|a, b| b.email.created_at.cmp(&a.email.created_at));
    joined
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

fn short_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// One line per lead: id, probability, company, sector, location.
pub fn render_lead_list(leads: &[&Lead]) -> String {
    if leads.is_empty() {
        return "No leads.\n".to_owned();
    }
    let mut out = String::new();
    for lead in leads {
        let _ = writeln!(
            out,
            "{id}  {prob:>3}%  {company}  [{sector}]  {location}  (added {date})",
            id = lead.id,
            prob = lead.acceptance_probability,
            company = lead.company_name,
            sector = lead.sector,
            location = lead.location,
            date = short_date(lead.date_added),
        );
    }
    let _ = writeln!(out, "{} lead(s)", leads.len());
    out
}

/// Full lead card with its emails and call history (calls newest first).
pub fn render_lead_detail(lead: &Lead, emails: &[&GeneratedEmail], calls: &[&LoggedCall]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", lead.company_name, lead.id);
    let _ = writeln!(
        out,
        "{}: {}%",
        lead.tier(),
        lead.acceptance_probability
    );
    let _ = writeln!(out, "Website:  {}", lead.website);
    let _ = writeln!(out, "Sector:   {}", lead.sector);
    let _ = writeln!(out, "Location: {}", lead.location);
    let _ = writeln!(out, "Address:  {}", lead.full_address);
    let _ = writeln!(
        out,
        "Rating:   {:.1} ({} reviews)",
        lead.rating.score, lead.rating.reviews
    );
    let _ = writeln!(out, "Added:    {}", short_date(lead.date_added));
    let _ = writeln!(out);
    let contact = &lead.contact;
    let verified = if contact.email_verified { " (verified)" } else { "" };
    let _ = writeln!(out, "Contact:  {}, {}", contact.name, contact.role);
    let _ = writeln!(out, "Email:    {}{verified}", contact.email);
    let _ = writeln!(out, "Phone:    {}", contact.phone);
    let _ = writeln!(out);
    let _ = writeln!(out, "Need:\n  {}", lead.need_analysis);
    let _ = writeln!(out, "Proposed solution:\n  {}", lead.proposed_solution);
    let _ = writeln!(out);

    let _ = writeln!(out, "Emails ({}):", emails.len());
    for email in emails {
        let subject = email
            .draft()
            .map(|d| d.subject)
            .unwrap_or_else(|_| "<unreadable>".to_owned());
        let _ = writeln!(out, "  {}  {}  {subject}", email.id, short_date(email.created_at));
    }
    let _ = writeln!(out, "Calls ({}):", calls.len());
    for call in calls {
        let _ = writeln!(
            out,
            "  {}  {:<14}  {}",
            call.date.format("%Y-%m-%d %H:%M"),
            call.outcome,
            call.notes
        );
    }
    out
}

/// One line per saved email: id, date, company, contact address, subject.
pub fn render_email_list(emails: &[GeneratedEmail]) -> String {
    if emails.is_empty() {
        return "No saved emails.\n".to_owned();
    }
    let mut out = String::new();
    for email in emails {
        let subject = email
            .draft()
            .map(|d| d.subject)
            .unwrap_or_else(|_| "<unreadable>".to_owned());
        let _ = writeln!(
            out,
            "{}  {}  {}  <{}>  {subject}",
            email.id,
            short_date(email.created_at),
            email.recipient.company_name,
            email.recipient.contact.email,
        );
    }
    out
}

/// Subject and body of a draft, as shown before saving.
pub fn render_draft(to: &str, subject: &str, body: &str) -> String {
    format!("To: {to}\nSubject: {subject}\n\n{body}\n")
}

/// One block per proposal.
pub fn render_proposals(proposals: &[Proposal<'_>]) -> String {
    if proposals.is_empty() {
        return "No proposals yet. Save a drafted email to create one.\n".to_owned();
    }
    let mut out = String::new();
    for proposal in proposals {
        let lead = proposal.lead;
        let _ = writeln!(
            out,
            "{}  {} <{}>  emailed {}",
            lead.company_name,
            lead.contact.name,
            lead.contact.email,
            short_date(proposal.email.created_at),
        );
        let _ = writeln!(out, "  lead {}  email {}", lead.id, proposal.email.id);
        let _ = writeln!(out, "  {}", lead.proposed_solution);
    }
    out
}

/// One line per call.
pub fn render_calls(calls: &[&LoggedCall]) -> String {
    if calls.is_empty() {
        return "No calls logged.\n".to_owned();
    }
    let mut out = String::new();
    for call in calls {
        let _ = writeln!(
            out,
            "{}  {}  lead {}  {:<14}  {}",
            call.id,
            call.date.format("%Y-%m-%d %H:%M"),
            call.lead_id,
            call.outcome,
            call.notes
        );
    }
    out
}

/// One line per service.
pub fn render_services(services: &[Service]) -> String {
    if services.is_empty() {
        return "No services.\n".to_owned();
    }
    let mut out = String::new();
    for service in services {
        let _ = writeln!(out, "{}  {}: {}", service.id, service.name, service.description);
    }
    out
}

/// The sender profile.
pub fn render_profile(profile: &UserProfile) -> String {
    let or_unset = |value: &str| {
        if value.trim().is_empty() {
            "(not set)".to_owned()
        } else {
            value.to_owned()
        }
    };
    format!(
        "Name:    {}\nEmail:   {}\nWebsite: {}\n",
        or_unset(&profile.name),
        or_unset(&profile.email),
        or_unset(&profile.website)
    )
}
