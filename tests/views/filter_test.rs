//! Lead filtering, sorting, and the proposals join.

use chrono::NaiveDate;

use leadscout::types::{EmailDraft, GeneratedEmail, Lead};
use leadscout::views::{filter_leads, proposals, LeadFilter, LeadSort};

use crate::fixtures;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(day) => day,
        None => panic!("invalid date"),
    }
}

fn sample_leads() -> Vec<Lead> {
    let mut a = fixtures::lead("a", "beta Foods", 82);
    a.sector = "Food & Beverage".to_owned();
    a.location = "Lisbon, Portugal".to_owned();
    a.date_added = fixtures::at(2026, 3, 1, 0);

    let mut b = fixtures::lead("b", "Acme Freight", 95);
    b.date_added = fixtures::at(2026, 3, 2, 23);

    let mut c = fixtures::lead("c", "Cobalt Clinics", 88);
    c.sector = "Healthcare".to_owned();
    c.date_added = fixtures::at(2026, 3, 5, 12);

    vec![a, b, c]
}

fn ids(leads: &[&Lead]) -> Vec<String> {
    leads.iter().map(|l| l.id.clone()).collect()
}

#[test]
fn empty_filter_sorts_by_probability() {
    let leads = sample_leads();
    let shown = filter_leads(&leads, &LeadFilter::default(), LeadSort::Probability);
    assert_eq!(ids(&shown), ["b", "c", "a"]);
}

#[test]
fn name_sort_ignores_case() {
    let leads = sample_leads();
    let shown = filter_leads(&leads, &LeadFilter::default(), LeadSort::Name);
    assert_eq!(ids(&shown), ["b", "a", "c"]);
}

#[test]
fn date_sort_is_newest_first() {
    let leads = sample_leads();
    let shown = filter_leads(&leads, &LeadFilter::default(), LeadSort::Date);
    assert_eq!(ids(&shown), ["c", "b", "a"]);
}

#[test]
fn sector_and_location_match_substrings_case_insensitively() {
    let leads = sample_leads();
    let filter = LeadFilter {
        sector: Some("food".to_owned()),
        location: Some("PORTUGAL".to_owned()),
        ..LeadFilter::default()
    };
    assert_eq!(ids(&filter_leads(&leads, &filter, LeadSort::Probability)), ["a"]);
}

#[test]
fn probability_bounds_are_inclusive() {
    let leads = sample_leads();
    let filter = LeadFilter {
        min_probability: Some(82),
        max_probability: Some(88),
        ..LeadFilter::default()
    };
    assert_eq!(ids(&filter_leads(&leads, &filter, LeadSort::Probability)), ["c", "a"]);
}

#[test]
fn date_range_covers_whole_days() {
    let leads = sample_leads();
    let filter = LeadFilter {
        from: Some(day(2026, 3, 2)),
        to: Some(day(2026, 3, 2)),
        ..LeadFilter::default()
    };
    assert_eq!(ids(&filter_leads(&leads, &filter, LeadSort::Probability)), ["b"]);
}

fn email(id: &str, recipient: Lead, hour: u32) -> GeneratedEmail {
    let draft = EmailDraft {
        subject: format!("Subject {id}"),
        body: "Body".to_owned(),
    };
    GeneratedEmail {
        id: id.to_owned(),
        recipient,
        body: serde_json::to_string(&draft).expect("draft json"),
        created_at: fixtures::at(2026, 4, 1, hour),
    }
}

#[test]
fn proposals_keep_latest_email_per_stored_lead() {
    let leads = sample_leads();
    let emails = vec![
        email("e3", leads[2].clone(), 9),
        email("e2", leads[0].clone(), 15),
        email("e1", leads[0].clone(), 8),
        email("orphan", fixtures::lead("gone", "Removed Co", 80), 20),
    ];

    let joined = proposals(&leads, &emails);
    let pairs: Vec<(&str, &str)> = joined
        .iter()
        .map(|p| (p.lead.id.as_str(), p.email.id.as_str()))
        .collect();
    assert_eq!(pairs, [("a", "e2"), ("c", "e3")]);
}
