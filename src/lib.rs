//! leadscout: a single-user prospecting and outreach assistant.
//!
//! Finds candidate business leads through an OpenAI-compatible completion
//! endpoint, drafts personalised cold emails for them, optionally pushes the
//! drafts into Gmail, and keeps leads, emails, call logs and services in a
//! local SQLite document store.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;

pub mod store;
pub mod types;

pub mod session;

pub mod extractors;
pub mod providers;

pub mod gmail;
pub mod prospecting;

pub mod views;
