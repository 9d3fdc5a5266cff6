//! Lead sourcing and outreach drafting on top of a [`CompletionProvider`].
//!
//! Both halves are one-shot prompts: build the prompt, call the provider
//! once, extract the JSON payload from the reply and validate it. No retry.
//!
//! [`CompletionProvider`]: crate::providers::CompletionProvider

pub mod drafting;
pub mod sourcing;

pub use drafting::{draft_bulk, draft_email, BulkOutcome, DraftingError};
pub use sourcing::{search_leads, SearchCriteria, SourcingError};
