//! leadscout CLI entry point.
//!
//! One subcommand per invocation. Every command except the session commands
//! runs the session guard, loads the workspace and dispatches to a
//! `handle_*` function. Errors surface as a single line on stderr with a
//! non-zero exit status.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use leadscout::config::{self, Config, RuntimePaths};
use leadscout::credentials::{self, Credentials};
use leadscout::gmail::draft::DraftDetails;
use leadscout::gmail::GmailAuth;
use leadscout::logging::{self, LoggingGuard};
use leadscout::prospecting::{self, SearchCriteria};
use leadscout::providers::openai::OpenAiCompatProvider;
use leadscout::session;
use leadscout::store::{DocumentStore, Workspace};
use leadscout::types::{CallOutcome, EmailDraft, GeneratedEmail, Lead, UserProfile};
use leadscout::views::{self, export, LeadFilter, LeadSort};

/// Prospecting and outreach assistant.
#[derive(Parser)]
#[command(name = "leadscout", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a session for an email address.
    Login {
        /// Login email.
        #[arg(long)]
        email: String,
    },
    /// Start a session with an explicit display name.
    Register {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Login email.
        #[arg(long)]
        email: String,
    },
    /// End the session and clear all user data.
    Logout,
    /// Show the current session.
    Whoami,
    /// Show or edit the sender profile.
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Ask the model for new leads in a country.
    Search {
        /// Country to search in.
        #[arg(long)]
        country: String,
        /// Lowest acceptable acceptance probability (1-100).
        #[arg(long, default_value_t = prospecting::sourcing::DEFAULT_MIN_PROBABILITY)]
        min_probability: u8,
        /// Service catalog entry to pitch instead of the configured default.
        #[arg(long)]
        service: Option<String>,
        /// Save every result to the lead store.
        #[arg(long)]
        save: bool,
        /// Save only these result ids.
        #[arg(long, num_args = 1..)]
        select: Vec<String>,
        /// Draft and save an email for these result ids (saves the lead too).
        #[arg(long, num_args = 1..)]
        draft: Vec<String>,
    },
    /// Browse and manage saved leads.
    Leads {
        #[command(subcommand)]
        action: LeadsCommand,
    },
    /// Draft outreach emails for saved leads (several ids draft in bulk).
    Draft {
        /// Lead ids.
        #[arg(required = true)]
        ids: Vec<String>,
        /// Save the draft to the email store (always on for bulk).
        #[arg(long)]
        save: bool,
        /// Also create a Gmail draft.
        #[arg(long)]
        gmail: bool,
        /// Use this subject instead of the generated one.
        #[arg(long)]
        subject: Option<String>,
        /// Read the body from this file instead of generating it.
        #[arg(long)]
        body_file: Option<PathBuf>,
        /// Service catalog entry to pitch instead of the configured default.
        #[arg(long)]
        service: Option<String>,
    },
    /// Saved emails.
    Emails {
        #[command(subcommand)]
        action: EmailsCommand,
    },
    /// Leads paired with their latest saved email.
    Proposals,
    /// Phone call log.
    Calls {
        #[command(subcommand)]
        action: CallsCommand,
    },
    /// Service catalog.
    Services {
        #[command(subcommand)]
        action: ServicesCommand,
    },
    /// Gmail authorization.
    Gmail {
        #[command(subcommand)]
        action: GmailCommand,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Print the sender profile.
    Show,
    /// Update the sender profile. Omitted fields keep their value.
    Set {
        /// Signature name.
        #[arg(long)]
        name: Option<String>,
        /// Sender email.
        #[arg(long)]
        email: Option<String>,
        /// Sender website.
        #[arg(long)]
        website: Option<String>,
    },
}

#[derive(Subcommand)]
enum LeadsCommand {
    /// List saved leads.
    List {
        /// Sector contains this text.
        #[arg(long)]
        sector: Option<String>,
        /// Location contains this text.
        #[arg(long)]
        location: Option<String>,
        /// Minimum probability.
        #[arg(long)]
        min_probability: Option<u8>,
        /// Maximum probability.
        #[arg(long)]
        max_probability: Option<u8>,
        /// Added on or after (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Added on or before (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Ordering.
        #[arg(long, value_enum, default_value_t = LeadSort::Probability)]
        sort: LeadSort,
    },
    /// Show one lead with its emails and calls.
    Show {
        /// Lead id.
        id: String,
    },
    /// Print the lead's technical solution prompt.
    Prompt {
        /// Lead id.
        id: String,
    },
    /// Remove leads.
    Remove {
        /// Lead ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum EmailsCommand {
    /// List saved emails.
    List,
    /// Remove saved emails.
    Remove {
        /// Email ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Export saved emails to CSV.
    Export {
        /// Output file (defaults to `export_emails_<date>.csv`).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Export only these email ids.
        #[arg(long, num_args = 1..)]
        select: Vec<String>,
    },
    /// Create a Gmail draft from a saved email.
    Push {
        /// Email id.
        id: String,
    },
}

#[derive(Subcommand)]
enum CallsCommand {
    /// Log a call.
    Add {
        /// Lead id.
        lead: String,
        /// contacted, interested, not-interested, voicemail, follow-up, other.
        #[arg(long)]
        outcome: CallOutcome,
        /// Free-text notes.
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List calls, newest first.
    List {
        /// Only calls for this lead.
        #[arg(long)]
        lead: Option<String>,
    },
    /// Remove logged calls.
    Remove {
        /// Call ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ServicesCommand {
    /// Add a service.
    Add {
        /// Service name.
        #[arg(long)]
        name: String,
        /// What the service offers.
        #[arg(long)]
        description: String,
    },
    /// List services.
    List,
    /// Remove a service.
    Remove {
        /// Service id.
        id: String,
    },
}

#[derive(Subcommand)]
enum GmailCommand {
    /// Store the Google OAuth client id.
    ClientId {
        /// OAuth client id of a desktop app.
        id: String,
    },
    /// Authorize draft creation in the browser.
    SignIn,
    /// Revoke and forget the stored token.
    SignOut,
    /// Show readiness and sign-in state.
    Status,
}

/// Everything a command needs, resolved once per invocation.
struct App {
    config: Config,
    credentials: Credentials,
    _logging: Option<LoggingGuard>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let root = config::config_dir()?;
    let config = Config::load(&root)?;
    let paths = config::runtime_paths(&root, &config);

    let logging_guard = if config.logging.file {
        Some(logging::init_with_file(&paths.logs_dir, &config.logging.level)?)
    } else {
        logging::init_cli(&config.logging.level);
        None
    };
    for rejected in config.rejected_overrides() {
        warn!(
            var = rejected.var,
            value = %rejected.value,
            "ignoring invalid env override"
        );
    }

    let credentials = credentials::load_credentials(&paths.env_file)?;
    let store = open_store(&paths).await?;
    let app = App {
        config,
        credentials,
        _logging: logging_guard,
    };

    match command {
        Command::Login { email } => {
            let user = session::login(&store, &email).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
            Ok(())
        }
        Command::Register { name, email } => {
            let user = session::register(&store, &name, &email).await?;
            println!("Registered and logged in as {} <{}>", user.name, user.email);
            Ok(())
        }
        Command::Logout => {
            let mut workspace = Workspace::load(store).await?;
            session::logout(&mut workspace).await?;
            println!("Logged out. Local user data cleared.");
            Ok(())
        }
        Command::Whoami => {
            match session::current_user(&store).await? {
                Some(user) => println!("{} <{}>", user.name, user.email),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        command => {
            session::require_user(&store).await?;
            let mut workspace = Workspace::load(store).await?;
            dispatch(&app, &mut workspace, command).await
        }
    }
}

async fn open_store(paths: &RuntimePaths) -> anyhow::Result<DocumentStore> {
    DocumentStore::open(&paths.store_db)
        .await
        .with_context(|| format!("failed to open store at {}", paths.store_db.display()))
}

async fn dispatch(app: &App, workspace: &mut Workspace, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Profile { action } => handle_profile(workspace, action).await,
        Command::Search {
            country,
            min_probability,
            service,
            save,
            select,
            draft,
        } => {
            let criteria = SearchCriteria {
                country,
                min_probability,
                max_results: app.config.completion.max_results,
            };
            let keep = SearchKeep {
                save,
                select,
                draft,
            };
            handle_search(app, workspace, criteria, service.as_deref(), keep).await
        }
        Command::Leads { action } => handle_leads(workspace, action).await,
        Command::Draft {
            ids,
            save,
            gmail,
            subject,
            body_file,
            service,
        } => {
            let edits = DraftEdits {
                subject,
                body_file,
            };
            let service = service_description(app, workspace, service.as_deref())?;
            match ids.as_slice() {
                [id] => handle_draft(app, workspace, id, &service, edits, save, gmail).await,
                _ => {
                    if edits.subject.is_some() || edits.body_file.is_some() {
                        bail!("--subject and --body-file apply to a single lead");
                    }
                    handle_draft_bulk(app, workspace, &ids, &service, gmail).await
                }
            }
        }
        Command::Emails { action } => handle_emails(app, workspace, action).await,
        Command::Proposals => {
            let joined = views::proposals(workspace.leads(), workspace.emails());
            print!("{}", views::render_proposals(&joined));
            Ok(())
        }
        Command::Calls { action } => handle_calls(workspace, action).await,
        Command::Services { action } => handle_services(workspace, action).await,
        Command::Gmail { action } => handle_gmail(app, workspace, action).await,
        Command::Login { .. } | Command::Register { .. } | Command::Logout | Command::Whoami => {
            Ok(())
        }
    }
}

// ── Shared helpers ──────────────────────────────────────────────

fn http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.completion.timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

fn completion_provider(app: &App) -> anyhow::Result<OpenAiCompatProvider> {
    let key_name = &app.config.completion.api_key_env;
    let api_key = app.credentials.require(key_name)?;
    Ok(OpenAiCompatProvider::from_config(&app.config.completion, api_key)?)
}

fn gmail_auth(app: &App) -> anyhow::Result<GmailAuth> {
    Ok(GmailAuth::new(
        app.config.gmail.clone(),
        app.credentials.google_client_secret(),
        http_client(&app.config)?,
    ))
}

/// The pitch used in prompts: a catalog entry when `service_id` is given,
/// the configured description otherwise.
fn service_description(
    app: &App,
    workspace: &Workspace,
    service_id: Option<&str>,
) -> anyhow::Result<String> {
    let Some(id) = service_id else {
        return Ok(app.config.completion.service_description.clone());
    };
    workspace
        .services()
        .iter()
        .find(|service| service.id == id)
        .map(|service| format!("{}: {}", service.name, service.description))
        .with_context(|| format!("no service with id {id}"))
}

fn find_lead(workspace: &Workspace, id: &str) -> anyhow::Result<Lead> {
    workspace
        .lead(id)
        .cloned()
        .with_context(|| format!("no saved lead with id {id}"))
}

fn find_email<'w>(workspace: &'w Workspace, id: &str) -> anyhow::Result<&'w GeneratedEmail> {
    workspace
        .email(id)
        .with_context(|| format!("no saved email with id {id}"))
}

// ── Profile ─────────────────────────────────────────────────────

async fn handle_profile(workspace: &mut Workspace, action: ProfileCommand) -> anyhow::Result<()> {
    match action {
        ProfileCommand::Show => {
            print!("{}", views::render_profile(workspace.profile()));
        }
        ProfileCommand::Set {
            name,
            email,
            website,
        } => {
            let current = workspace.profile().clone();
            let profile = UserProfile {
                name: name.map_or(current.name, |v| v.trim().to_owned()),
                email: email.map_or(current.email, |v| v.trim().to_owned()),
                website: website.map_or(current.website, |v| v.trim().to_owned()),
            };
            workspace.set_profile(profile).await?;
            println!("Profile saved.");
            print!("{}", views::render_profile(workspace.profile()));
        }
    }
    Ok(())
}

// ── Search ──────────────────────────────────────────────────────

/// What to do with search results besides printing them.
struct SearchKeep {
    save: bool,
    select: Vec<String>,
    draft: Vec<String>,
}

/// Results whose id is in `ids`, warning when some were not found.
fn pick_results(found: &[Lead], ids: &[String]) -> Vec<Lead> {
    let picked: Vec<Lead> = found
        .iter()
        .filter(|lead| ids.contains(&lead.id))
        .cloned()
        .collect();
    if picked.len() < ids.len() {
        warn!(
            requested = ids.len(),
            matched = picked.len(),
            "some selected ids were not in the results"
        );
    }
    picked
}

async fn handle_search(
    app: &App,
    workspace: &mut Workspace,
    criteria: SearchCriteria,
    service_id: Option<&str>,
    keep: SearchKeep,
) -> anyhow::Result<()> {
    criteria.validate(workspace.profile())?;
    let service = service_description(app, workspace, service_id)?;
    let provider = completion_provider(app)?;

    println!("Searching for leads in {}...", criteria.country);
    let found =
        prospecting::search_leads(&provider, &criteria, workspace.profile(), &service).await?;
    let shown: Vec<&Lead> = found.iter().collect();
    print!("{}", views::render_lead_list(&shown));

    let to_draft = pick_results(&found, &keep.draft);
    let to_save = if !keep.select.is_empty() {
        pick_results(&found, &keep.select)
    } else if keep.save {
        found
    } else {
        Vec::new()
    };

    if to_save.is_empty() && keep.draft.is_empty() {
        println!("Results not saved. Re-run with --save or --select <ID>... to keep them.");
        return Ok(());
    }
    if !to_save.is_empty() {
        let total = to_save.len();
        let inserted = workspace.upsert_leads(to_save).await?;
        println!("Saved {total} lead(s), {inserted} new.");
    }
    if !to_draft.is_empty() {
        draft_and_save(app, workspace, to_draft, &service, false).await?;
    }
    Ok(())
}

// ── Leads ───────────────────────────────────────────────────────

async fn handle_leads(workspace: &mut Workspace, action: LeadsCommand) -> anyhow::Result<()> {
    match action {
        LeadsCommand::List {
            sector,
            location,
            min_probability,
            max_probability,
            from,
            to,
            sort,
        } => {
            let filter = LeadFilter {
                sector,
                location,
                min_probability,
                max_probability,
                from,
                to,
            };
            let shown = views::filter_leads(workspace.leads(), &filter, sort);
            print!("{}", views::render_lead_list(&shown));
        }
        LeadsCommand::Show { id } => {
            let lead = find_lead(workspace, &id)?;
            let emails = workspace.emails_for(&id);
            let calls = workspace.calls_for(&id);
            print!("{}", views::render_lead_detail(&lead, &emails, &calls));
        }
        LeadsCommand::Prompt { id } => {
            let lead = find_lead(workspace, &id)?;
            println!("{}", lead.solution_prompt);
        }
        LeadsCommand::Remove { ids } => {
            let removed = workspace.remove_leads(&ids).await?;
            info!(removed, requested = ids.len(), "leads removed");
            println!("Removed {removed} lead(s).");
        }
    }
    Ok(())
}

// ── Drafting ────────────────────────────────────────────────────

/// User replacements for a generated draft.
struct DraftEdits {
    subject: Option<String>,
    body_file: Option<PathBuf>,
}

fn read_body(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn handle_draft(
    app: &App,
    workspace: &mut Workspace,
    lead_id: &str,
    service: &str,
    edits: DraftEdits,
    save: bool,
    gmail: bool,
) -> anyhow::Result<()> {
    let lead = find_lead(workspace, lead_id)?;

    let draft = match (edits.subject, edits.body_file) {
        (Some(subject), Some(path)) => EmailDraft {
            subject,
            body: read_body(&path)?,
        },
        (subject, body_file) => {
            let provider = completion_provider(app)?;
            let generated =
                prospecting::draft_email(&provider, &lead, workspace.profile(), service).await?;
            EmailDraft {
                subject: subject.unwrap_or(generated.subject),
                body: match body_file {
                    Some(path) => read_body(&path)?,
                    None => generated.body,
                },
            }
        }
    };
    draft.validate()?;

    print!(
        "{}",
        views::render_draft(&lead.contact.email, &draft.subject, &draft.body)
    );

    if save {
        let email = workspace.add_email(lead.clone(), &draft).await?;
        println!("Saved email {}.", email.id);
    }
    if gmail {
        let auth = gmail_auth(app)?;
        let details = DraftDetails {
            to: lead.contact.email.clone(),
            subject: draft.subject,
            body: draft.body,
        };
        let draft_id = auth.create_draft(workspace, &details).await?;
        println!("Gmail draft created ({draft_id}).");
    }
    Ok(())
}

async fn handle_draft_bulk(
    app: &App,
    workspace: &mut Workspace,
    ids: &[String],
    service: &str,
    gmail: bool,
) -> anyhow::Result<()> {
    if !workspace.profile().is_complete() {
        return Err(prospecting::DraftingError::ProfileIncomplete.into());
    }
    let leads = ids
        .iter()
        .map(|id| find_lead(workspace, id))
        .collect::<anyhow::Result<Vec<Lead>>>()?;
    draft_and_save(app, workspace, leads, service, gmail).await
}

/// Draft every lead concurrently and save each success. Saving an email
/// also saves its lead when the lead is not in the store yet.
async fn draft_and_save(
    app: &App,
    workspace: &mut Workspace,
    leads: Vec<Lead>,
    service: &str,
    gmail: bool,
) -> anyhow::Result<()> {
    let provider = completion_provider(app)?;
    println!("Drafting {} email(s)...", leads.len());
    let outcome = prospecting::draft_bulk(&provider, leads, workspace.profile(), service).await;
    let total = outcome.total();

    let auth = if gmail { Some(gmail_auth(app)?) } else { None };
    let mut pushed = 0_usize;
    for (lead, draft) in &outcome.drafted {
        workspace.add_email(lead.clone(), draft).await?;
        if let Some(auth) = &auth {
            let details = DraftDetails {
                to: lead.contact.email.clone(),
                subject: draft.subject.clone(),
                body: draft.body.clone(),
            };
            match auth.create_draft(workspace, &details).await {
                Ok(_) => pushed = pushed.saturating_add(1),
                Err(e) => {
                    warn!(lead = %lead.id, error = %e, "gmail draft failed");
                    eprintln!("Gmail draft for {} failed: {e}", lead.company_name);
                }
            }
        }
    }

    for (lead, e) in &outcome.failed {
        eprintln!("{} ({}): {e}", lead.company_name, lead.id);
    }
    println!(
        "{} of {total} email(s) drafted and saved. {} failed.",
        outcome.drafted.len(),
        outcome.failed.len()
    );
    if gmail {
        println!("{pushed} Gmail draft(s) created.");
    }
    Ok(())
}

// ── Emails ──────────────────────────────────────────────────────

async fn handle_emails(
    app: &App,
    workspace: &mut Workspace,
    action: EmailsCommand,
) -> anyhow::Result<()> {
    match action {
        EmailsCommand::List => {
            print!("{}", views::render_email_list(workspace.emails()));
        }
        EmailsCommand::Remove { ids } => {
            let removed = workspace.remove_emails(&ids).await?;
            println!("Removed {removed} email(s).");
        }
        EmailsCommand::Export { out, select } => {
            let chosen: Vec<&GeneratedEmail> = workspace
                .emails()
                .iter()
                .filter(|email| select.is_empty() || select.contains(&email.id))
                .collect();
            if chosen.is_empty() {
                println!("Nothing to export.");
                return Ok(());
            }
            let csv = export::emails_to_csv(&chosen)?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(export::default_file_name(Utc::now().date_naive()))
            });
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} email(s) to {}.", chosen.len(), path.display());
        }
        EmailsCommand::Push { id } => {
            let email = find_email(workspace, &id)?;
            let draft = email
                .draft()
                .with_context(|| format!("email {id} has an unreadable body"))?;
            let details = DraftDetails {
                to: email.recipient.contact.email.clone(),
                subject: draft.subject,
                body: draft.body,
            };
            let draft_id = gmail_auth(app)?.create_draft(workspace, &details).await?;
            println!("Gmail draft created ({draft_id}).");
        }
    }
    Ok(())
}

// ── Calls and services ──────────────────────────────────────────

async fn handle_calls(workspace: &mut Workspace, action: CallsCommand) -> anyhow::Result<()> {
    match action {
        CallsCommand::Add {
            lead,
            outcome,
            notes,
        } => {
            if workspace.lead(&lead).is_none() {
                warn!(lead = %lead, "logging a call for a lead that is not saved");
            }
            let call = workspace.add_call(&lead, outcome, notes.trim()).await?;
            println!("Logged call {} ({}).", call.id, call.outcome);
        }
        CallsCommand::List { lead } => {
            let calls = match lead {
                Some(id) => workspace.calls_for(&id),
                None => workspace.calls().iter().collect(),
            };
            print!("{}", views::render_calls(&calls));
        }
        CallsCommand::Remove { ids } => {
            let removed = workspace.remove_calls(&ids).await?;
            println!("Removed {removed} call(s).");
        }
    }
    Ok(())
}

async fn handle_services(workspace: &mut Workspace, action: ServicesCommand) -> anyhow::Result<()> {
    match action {
        ServicesCommand::Add { name, description } => {
            if name.trim().is_empty() || description.trim().is_empty() {
                bail!("a service needs both a name and a description");
            }
            let service = workspace.add_service(&name, &description).await?;
            println!("Added service {}.", service.id);
        }
        ServicesCommand::List => {
            print!("{}", views::render_services(workspace.services()));
        }
        ServicesCommand::Remove { id } => {
            if workspace.remove_service(&id).await? {
                println!("Removed service {id}.");
            } else {
                bail!("no service with id {id}");
            }
        }
    }
    Ok(())
}

// ── Gmail ───────────────────────────────────────────────────────

async fn handle_gmail(
    app: &App,
    workspace: &mut Workspace,
    action: GmailCommand,
) -> anyhow::Result<()> {
    match action {
        GmailCommand::ClientId { id } => {
            if id.trim().is_empty() {
                bail!("client id must not be empty");
            }
            workspace.set_google_client_id(&id).await?;
            println!("Google client id saved.");
        }
        GmailCommand::SignIn => {
            let auth = gmail_auth(app)?;
            auth.sign_in(workspace, |url| {
                println!("Open this URL in your browser to authorize Gmail drafts:\n\n  {url}\n");
                println!("Waiting for the redirect...");
            })
            .await?;
            println!("Signed in to Gmail.");
        }
        GmailCommand::SignOut => {
            if gmail_auth(app)?.sign_out(workspace).await? {
                println!("Signed out of Gmail.");
            } else {
                println!("Not signed in to Gmail.");
            }
        }
        GmailCommand::Status => {
            let status = gmail_auth(app)?.status(workspace).await?;
            println!("Ready:     {}", if status.ready { "yes" } else { "no" });
            println!("Signed in: {}", if status.signed_in { "yes" } else { "no" });
            if let Some(error) = status.error {
                println!("{error}");
            }
        }
    }
    Ok(())
}
