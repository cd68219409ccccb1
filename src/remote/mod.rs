//! The remote mail store seam.
//!
//! Everything the pipeline needs from the mail service goes through
//! [`MailStore`]: list one page of ids, fetch one message in full, delete one
//! message. [`gmail::GmailClient`] talks to the Gmail REST API; tests plug in
//! an in-memory implementation.

pub mod gmail;
pub mod retry;

use crate::error::Result;

/// One header as delivered by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A structured, possibly encoded, body segment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentPart {
    /// MIME type of the part, e.g. `text/plain`.
    pub mime_type: String,
    /// Part-level headers (`Content-Type`, `Content-Transfer-Encoding`…).
    pub headers: Vec<Header>,
    /// Base64 payload. `None` for containers and attachments stored elsewhere.
    pub data: Option<String>,
}

/// Full detail of one message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageDetail {
    pub id: String,
    pub size_estimate: u64,
    pub headers: Vec<Header>,
    pub snippet: String,
    pub parts: Vec<ContentPart>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Message ids in server order.
    pub ids: Vec<String>,
    /// Cursor for the next page; `None` once the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// The three operations the triage pipeline performs against a mailbox.
///
/// Calls are blocking and strictly sequential.
pub trait MailStore {
    /// List the page of message ids matching `query` at `page_token`
    /// (`None` for the first page).
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<Page>;

    /// Fetch headers, size, snippet and content parts of one message.
    fn get_detail(&self, id: &str) -> Result<MessageDetail>;

    /// Remove one message from the mailbox.
    fn delete(&self, id: &str) -> Result<()>;
}

impl<S: MailStore + ?Sized> MailStore for &S {
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<Page> {
        (**self).list_page(query, page_token)
    }

    fn get_detail(&self, id: &str) -> Result<MessageDetail> {
        (**self).get_detail(id)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }
}
