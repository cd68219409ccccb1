//! The interactive review loop.
//!
//! Records are presented one at a time in ranked order. After each one the
//! operator types a decision line:
//!
//! | input               | effect                                      |
//! |---------------------|---------------------------------------------|
//! | `d`                 | delete remotely, then next record           |
//! | `s`, blank, other   | next record, no remote effect               |
//! | `q`                 | stop now and report the counts              |
//!
//! Every presented record counts as processed, the quit one included. The
//! loop never looks ahead and never reorders, whatever gets deleted.

use std::fmt;
use std::io::{BufRead, Write};

use humansize::{format_size, BINARY};
use tracing::{debug, info};

use crate::error::{Result, TriageError};
use crate::i18n;
use crate::model::message::{MessageRecord, DEFAULT_WEB_URL};
use crate::remote::MailStore;

/// What the operator chose for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Delete,
    Skip,
    Quit,
}

impl Decision {
    /// Interpret one input line. Anything unrecognized means skip.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "d" => Self::Delete,
            "q" => Self::Quit,
            _ => Self::Skip,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Prefix of the per-message web link.
    pub web_url: String,
    /// Print the server snippet along with the body.
    pub show_snippet: bool,
    /// Report deletions without calling the store.
    pub dry_run: bool,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            web_url: DEFAULT_WEB_URL.to_string(),
            show_snippet: false,
            dry_run: false,
        }
    }
}

/// Counts at the end of a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Records presented to the operator.
    pub processed: usize,
    /// Records deleted (or, in a dry run, that would have been).
    pub deleted: usize,
    /// Whether the operator quit before the end of the list.
    pub quit: bool,
    pub dry_run: bool,
}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {} {}, {} {}",
            i18n::review_done(),
            self.processed,
            i18n::review_processed(),
            self.deleted,
            i18n::review_deleted_count()
        )?;
        if self.dry_run {
            write!(f, " {}", i18n::review_dry_run())?;
        }
        Ok(())
    }
}

/// Walk `records` in order, asking the operator about each one.
///
/// Returns when the list is exhausted or the operator quits. A failed
/// delete, a failed read or the end of `input` aborts the review.
pub fn review<S, R, W>(
    records: &[MessageRecord],
    store: &S,
    input: &mut R,
    output: &mut W,
    options: &ReviewOptions,
) -> Result<ReviewSummary>
where
    S: MailStore + ?Sized,
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let mut summary = ReviewSummary {
        dry_run: options.dry_run,
        ..ReviewSummary::default()
    };

    for record in records {
        summary.processed += 1;
        present(record, output, options)?;

        match read_decision(input, output)? {
            Decision::Delete => {
                delete(record, store, output, options)?;
                summary.deleted += 1;
            }
            Decision::Skip => {
                debug!(id = record.remote_id(), "Skipped message");
            }
            Decision::Quit => {
                summary.quit = true;
                info!(
                    processed = summary.processed,
                    deleted = summary.deleted,
                    "Review stopped by operator"
                );
                break;
            }
        }
    }

    Ok(summary)
}

/// Print one record: link, size, date, optional snippet, body.
fn present<W: Write + ?Sized>(
    record: &MessageRecord,
    output: &mut W,
    options: &ReviewOptions,
) -> Result<()> {
    writeln!(
        output,
        "\n{}: {}",
        i18n::review_message_url(),
        record.web_url(&options.web_url)
    )
    .map_err(TriageError::Output)?;
    writeln!(
        output,
        "{}: {} ({}), {}: {}",
        i18n::review_size(),
        record.size(),
        format_size(record.size(), BINARY),
        i18n::review_date(),
        record.date()
    )
    .map_err(TriageError::Output)?;
    if options.show_snippet && !record.snippet().is_empty() {
        writeln!(output, "{}: {}", i18n::review_snippet(), record.snippet())
            .map_err(TriageError::Output)?;
    }
    writeln!(output, "{}", record.body()).map_err(TriageError::Output)
}

/// Print the prompt and read one decision line.
fn read_decision<R, W>(input: &mut R, output: &mut W) -> Result<Decision>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    write!(output, "{}", i18n::review_prompt()).map_err(TriageError::Output)?;
    output.flush().map_err(TriageError::Output)?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(TriageError::Input)?;
    if read == 0 {
        return Err(TriageError::InputClosed);
    }
    Ok(Decision::parse(&line))
}

fn delete<S, W>(
    record: &MessageRecord,
    store: &S,
    output: &mut W,
    options: &ReviewOptions,
) -> Result<()>
where
    S: MailStore + ?Sized,
    W: Write + ?Sized,
{
    let id = record.remote_id();
    if options.dry_run {
        info!(id = id, "Dry run, not deleting message");
        return writeln!(output, "{} {id}.", i18n::review_would_delete())
            .map_err(TriageError::Output);
    }

    store.delete(id)?;
    info!(id = id, size = record.size(), "Deleted message {id}.");
    writeln!(output, "{} {id}.", i18n::review_deleted()).map_err(TriageError::Output)
}
