//! The in-memory record of one remote message.

/// Base of the Gmail web UI link used when none is configured.
pub const DEFAULT_WEB_URL: &str = "https://mail.google.com/mail/u/0/#all/";

/// One message pulled from the remote store, ready for ranking and review.
///
/// Records are built once by the fetcher and never change afterwards, so
/// fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Server-side size estimate in bytes. Not exact.
    size: u64,

    /// Opaque handle used for later operations (delete) on the same message.
    remote_id: String,

    /// Raw value of the first `Date` header, empty when there is none.
    date: String,

    /// Short preview text supplied by the remote store.
    snippet: String,

    /// Decoded text of the first content part, empty when not decodable.
    body: String,
}

impl MessageRecord {
    /// Create a record with an empty date, snippet and body.
    #[must_use]
    pub fn new(remote_id: impl Into<String>, size: u64) -> Self {
        Self {
            size,
            remote_id: remote_id.into(),
            date: String::new(),
            snippet: String::new(),
            body: String::new(),
        }
    }

    /// Sets the date header value.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Sets the preview snippet.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Sets the decoded body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Link to the message in the web UI, `base` followed by the remote id.
    pub fn web_url(&self, base: &str) -> String {
        format!("{base}{}", self.remote_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_empty_text_fields() {
        let rec = MessageRecord::new("18c2f", 512);
        assert_eq!(rec.remote_id(), "18c2f");
        assert_eq!(rec.size(), 512);
        assert!(rec.date().is_empty());
        assert!(rec.snippet().is_empty());
        assert!(rec.body().is_empty());
    }

    #[test]
    fn test_web_url() {
        let rec = MessageRecord::new("18c2f", 1);
        assert_eq!(
            rec.web_url(DEFAULT_WEB_URL),
            "https://mail.google.com/mail/u/0/#all/18c2f"
        );
    }
}
