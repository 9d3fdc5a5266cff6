//! CSV export of saved emails.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::types::GeneratedEmail;

/// Column headers, in order.
pub const CSV_HEADERS: [&str; 6] = [
    "Date",
    "Company",
    "Contact Name",
    "Contact Email",
    "Subject",
    "Body",
];

/// Byte-order mark prepended so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: char = '\u{feff}';

/// Errors from CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The CSV writer failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    /// The writer buffer could not be recovered.
    #[error("failed to finish CSV output: {0}")]
    Finish(String),
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Finish(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Finish(e.to_string()))
}

/// Quote a cell when it contains a comma, a quote, `\n` or `\r`, doubling
/// any internal quotes.
///
/// # Errors
///
/// Returns [`ExportError`] if the CSV writer fails.
pub fn escape_csv_cell(cell: &str) -> Result<String, ExportError> {
    if cell.is_empty() {
        return Ok(String::new());
    }
    let mut writer = writer();
    writer.write_record([cell])?;
    let mut line = finish(writer)?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Render `emails` as CSV with a UTF-8 BOM and `\n` line endings.
///
/// Emails whose stored body is not a valid subject/body pair are skipped.
///
/// # Errors
///
/// Returns [`ExportError`] if the CSV writer fails.
pub fn emails_to_csv(emails: &[&GeneratedEmail]) -> Result<String, ExportError> {
    let mut writer = writer();
    writer.write_record(CSV_HEADERS)?;

    for email in emails {
        let draft = match email.draft() {
            Ok(draft) => draft,
            Err(e) => {
                warn!(email = %email.id, error = %e, "skipping email with unreadable body");
                continue;
            }
        };
        let date = export_timestamp(email.created_at);
        writer.write_record([
            date.as_str(),
            email.recipient.company_name.as_str(),
            email.recipient.contact.name.as_str(),
            email.recipient.contact.email.as_str(),
            draft.subject.as_str(),
            draft.body.as_str(),
        ])?;
    }

    let mut body = finish(writer)?;
    if body.ends_with('\n') {
        body.pop();
    }
    Ok(format!("{UTF8_BOM}{body}"))
}

fn export_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `export_emails_<YYYY-MM-DD>.csv` for `day`.
pub fn default_file_name(day: NaiveDate) -> String {
    format!("export_emails_{}.csv", day.format("%Y-%m-%d"))
}
