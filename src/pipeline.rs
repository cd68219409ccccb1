//! The full triage run: fetch, rank, review.

use std::io::{BufRead, Write};

use humansize::{format_size, BINARY};
use tracing::info;

use crate::error::{Result, TriageError};
use crate::fetch::{self, FetchOptions, FetchProgress};
use crate::i18n;
use crate::model::MessageRecord;
use crate::rank;
use crate::remote::MailStore;
use crate::review::{self, ReviewOptions, ReviewSummary};

/// Settings for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub fetch: FetchOptions,
    pub review: ReviewOptions,
}

/// The candidate set after fetching and ranking.
#[derive(Debug, Clone, Default)]
pub struct Ranked {
    /// Records, largest first.
    pub records: Vec<MessageRecord>,
    /// Sum of their size estimates.
    pub total_size: u64,
    /// Ids dropped because their detail could not be fetched.
    pub skipped: Vec<String>,
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Records fetched (and ranked).
    pub fetched: usize,
    pub total_size: u64,
    pub skipped: Vec<String>,
    pub summary: ReviewSummary,
}

/// Fetch everything matching `query` and rank it by size.
pub fn fetch_ranked<S>(
    store: &S,
    query: &str,
    options: &FetchOptions,
    progress: Option<&dyn FetchProgress>,
) -> Result<Ranked>
where
    S: MailStore + ?Sized,
{
    info!(query = query, "Fetching candidate messages");
    let fetched = fetch::fetch_all(store, query, options, progress)?;
    info!(
        messages = fetched.records.len(),
        total = %format_size(fetched.total_size, BINARY),
        "Fetch complete"
    );
    Ok(Ranked {
        records: rank::rank_by_size(fetched.records),
        total_size: fetched.total_size,
        skipped: fetched.skipped,
    })
}

/// Fetch everything matching `query`, rank it by size and review it.
///
/// The summary line is written to `output` before returning, on quit and on
/// exhaustion alike. Any fatal error stops the run where it happened.
pub fn run<S, R, W>(
    store: &S,
    query: &str,
    options: &RunOptions,
    input: &mut R,
    output: &mut W,
    progress: Option<&dyn FetchProgress>,
) -> Result<RunReport>
where
    S: MailStore + ?Sized,
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let ranked = fetch_ranked(store, query, &options.fetch, progress)?;

    if ranked.records.is_empty() {
        writeln!(output, "{}", i18n::msg_no_messages()).map_err(TriageError::Output)?;
    }

    let summary = review::review(&ranked.records, store, input, output, &options.review)?;
    writeln!(output, "\n{summary}").map_err(TriageError::Output)?;

    Ok(RunReport {
        fetched: ranked.records.len(),
        total_size: ranked.total_size,
        skipped: ranked.skipped,
        summary,
    })
}
