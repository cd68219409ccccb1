//! Paginated retrieval of every message matching a query.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decode;
use crate::error::Result;
use crate::model::MessageRecord;
use crate::remote::{Header, MailStore, MessageDetail};

/// What to do when one message's detail cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailErrorPolicy {
    /// Fail the whole fetch.
    #[default]
    Abort,
    /// Log the failure, leave the message out and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub on_detail_error: DetailErrorPolicy,
}

/// Everything the fetcher collected.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Records in arrival order.
    pub records: Vec<MessageRecord>,
    /// Sum of `size` over `records`.
    pub total_size: u64,
    /// Number of list pages requested.
    pub pages: usize,
    /// Ids left out under [`DetailErrorPolicy::Skip`].
    pub skipped: Vec<String>,
}

/// Receives fetch progress.
pub trait FetchProgress {
    /// Called after each record with the number collected so far.
    fn fetched(&self, count: usize);

    /// Called once when the listing is exhausted.
    fn finished(&self, _outcome: &FetchOutcome) {}
}

impl<F: Fn(usize)> FetchProgress for F {
    fn fetched(&self, count: usize) {
        self(count)
    }
}

/// Page through `query` until the store reports no continuation token,
/// fetching the detail of every listed message.
///
/// A failed page is always fatal. A failed detail is fatal unless
/// `options.on_detail_error` is [`DetailErrorPolicy::Skip`].
pub fn fetch_all<S: MailStore + ?Sized>(
    store: &S,
    query: &str,
    options: &FetchOptions,
    progress: Option<&dyn FetchProgress>,
) -> Result<FetchOutcome> {
    let mut outcome = FetchOutcome::default();
    let mut page_token: Option<String> = None;

    loop {
        let page = store.list_page(query, page_token.as_deref())?;
        outcome.pages += 1;
        info!(count = page.ids.len(), page = outcome.pages, "Processing {} messages...", page.ids.len());

        for id in &page.ids {
            if id.is_empty() {
                warn!(page = outcome.pages, "Ignoring listed message with an empty id");
                continue;
            }
            let detail = match store.get_detail(id) {
                Ok(detail) => detail,
                Err(e) if options.on_detail_error == DetailErrorPolicy::Skip => {
                    warn!(id = %id, error = %e, "Unable to retrieve message, skipping");
                    outcome.skipped.push(id.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let record = record_from_detail(id, detail);
            outcome.total_size += record.size();
            outcome.records.push(record);
            if let Some(p) = progress {
                p.fetched(outcome.records.len());
            }
        }

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    info!(
        total = outcome.total_size,
        messages = outcome.records.len(),
        pages = outcome.pages,
        "total: {}",
        outcome.total_size
    );
    if let Some(p) = progress {
        p.finished(&outcome);
    }
    Ok(outcome)
}

/// Build the record for `listed_id` from its fetched detail.
///
/// The detail's own id is preferred; the listed id covers responses that
/// leave it out, so the record id is never empty.
pub fn record_from_detail(listed_id: &str, detail: MessageDetail) -> MessageRecord {
    let id = if detail.id.is_empty() {
        listed_id.to_string()
    } else {
        detail.id.clone()
    };
    let date = first_header(&detail.headers, "Date").unwrap_or_default();
    let body = first_part_body(&id, &detail);

    MessageRecord::new(id, detail.size_estimate)
        .with_date(date)
        .with_snippet(detail.snippet)
        .with_body(body)
}

/// Value of the first header named exactly `name`.
fn first_header(headers: &[Header], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.clone())
}

/// Decoded text of the first content part, or an empty string.
fn first_part_body(id: &str, detail: &MessageDetail) -> String {
    let Some(part) = detail.parts.first() else {
        debug!(id = id, "Message has no content parts");
        return String::new();
    };
    let Some(data) = part.data.as_deref() else {
        debug!(id = id, mime_type = %part.mime_type, "First part carries no inline data");
        return String::new();
    };

    let charset = part
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Type"))
        .and_then(|h| decode::charset_from_content_type(&h.value))
        .unwrap_or_else(|| "utf-8".to_string());

    match decode::decode_body(data, &charset) {
        Ok(text) => text,
        Err(e) => {
            warn!(id = id, error = %e, "Unable to decode message body, leaving it empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::ContentPart;

    fn detail(id: &str) -> MessageDetail {
        MessageDetail {
            id: id.to_string(),
            size_estimate: 100,
            ..MessageDetail::default()
        }
    }

    fn text_part(content_type: Option<&str>, data: &str) -> ContentPart {
        ContentPart {
            mime_type: "text/plain".into(),
            headers: content_type
                .map(|ct| vec![Header::new("Content-Type", ct)])
                .unwrap_or_default(),
            data: Some(data.into()),
        }
    }

    #[test]
    fn test_first_date_header_wins() {
        let mut d = detail("m1");
        d.headers = vec![
            Header::new("date", "lowercase is not the wire name"),
            Header::new("Date", "Tue, 12 Mar 2019 10:00:00 +0000"),
            Header::new("Date", "Wed, 13 Mar 2019 10:00:00 +0000"),
        ];
        let rec = record_from_detail("m1", d);
        assert_eq!(rec.date(), "Tue, 12 Mar 2019 10:00:00 +0000");
    }

    #[test]
    fn test_missing_date_is_empty() {
        let mut d = detail("m1");
        d.headers = vec![Header::new("Subject", "hi")];
        assert_eq!(record_from_detail("m1", d).date(), "");
    }

    #[test]
    fn test_body_from_first_part_only() {
        let mut d = detail("m1");
        d.parts = vec![text_part(None, "Zmlyc3Q"), text_part(None, "c2Vjb25k")];
        assert_eq!(record_from_detail("m1", d).body(), "first");
    }

    #[test]
    fn test_body_uses_part_charset() {
        let mut d = detail("m1");
        d.parts = vec![text_part(Some("text/plain; charset=iso-8859-1"), "Q2Fm6Q")];
        assert_eq!(record_from_detail("m1", d).body(), "Café");
    }

    #[test]
    fn test_no_parts_or_no_data_gives_empty_body() {
        let rec = record_from_detail("m1", detail("m1"));
        assert_eq!(rec.body(), "");

        let mut d = detail("m2");
        d.parts = vec![ContentPart {
            mime_type: "multipart/alternative".into(),
            ..ContentPart::default()
        }];
        assert_eq!(record_from_detail("m2", d).body(), "");
    }

    #[test]
    fn test_malformed_body_is_empty() {
        let mut d = detail("m1");
        d.snippet = "still here".into();
        d.parts = vec![text_part(None, "%%% not base64 %%%")];
        let rec = record_from_detail("m1", d);
        assert_eq!(rec.body(), "");
        assert_eq!(rec.snippet(), "still here");
    }

    #[test]
    fn test_listed_id_fills_missing_detail_id() {
        let rec = record_from_detail("listed", detail(""));
        assert_eq!(rec.remote_id(), "listed");
    }
}
