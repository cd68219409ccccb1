//! Gmail REST API implementation of [`MailStore`].

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentPart, Header, MailStore, MessageDetail, Page};
use crate::error::{Result, TriageError};

/// Base of the Gmail `users` resource.
pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users";

/// What "delete" means against Gmail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Permanent removal (`DELETE /messages/{id}`).
    #[default]
    Delete,
    /// Move to the trash (`POST /messages/{id}/trash`).
    Trash,
}

/// Blocking Gmail client bound to one user and one access token.
#[derive(Clone)]
pub struct GmailClient {
    http: Client,
    base_url: String,
    user_id: String,
    access_token: String,
    delete_mode: DeleteMode,
}

impl std::fmt::Debug for GmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailClient")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("delete_mode", &self.delete_mode)
            .finish()
    }
}

impl GmailClient {
    /// Build a client for `user_id` (usually `me`).
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mailtriage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TriageError::transport("client setup", e))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            access_token: access_token.into(),
            delete_mode: DeleteMode::Delete,
        })
    }

    #[must_use]
    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    pub fn delete_mode(&self) -> DeleteMode {
        self.delete_mode
    }

    /// Every label defined in the mailbox, system and user alike.
    pub fn list_labels(&self) -> Result<Vec<Label>> {
        let request = self
            .http
            .get(format!("{}/{}/labels", self.base_url, self.user_id));
        debug!("Listing labels");
        let list: ListLabelsResponse = self.send_json("labels", request)?;
        Ok(list.labels)
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.user_id)
    }

    fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| TriageError::transport(op, e))?;
        check_status(op, response)
    }

    fn send_json<T: DeserializeOwned>(&self, op: &'static str, request: RequestBuilder) -> Result<T> {
        self.send(op, request)?
            .json::<T>()
            .map_err(|e| TriageError::transport(op, e))
    }
}

impl MailStore for GmailClient {
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<Page> {
        let mut request = self.http.get(self.messages_url()).query(&[("q", query)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        debug!(query = query, page_token = ?page_token, "Listing messages");
        let list: ListMessagesResponse = self.send_json("list", request)?;
        Ok(list.into())
    }

    fn get_detail(&self, id: &str) -> Result<MessageDetail> {
        let request = self
            .http
            .get(format!("{}/{id}", self.messages_url()))
            .query(&[("format", "full")]);
        debug!(id = id, "Fetching message");
        let message: GmailMessage = self.send_json("get", request)?;
        Ok(message.into())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let request = match self.delete_mode {
            DeleteMode::Delete => self.http.delete(format!("{}/{id}", self.messages_url())),
            DeleteMode::Trash => self.http.post(format!("{}/{id}/trash", self.messages_url())),
        };
        debug!(id = id, mode = ?self.delete_mode, "Deleting message");
        self.send("delete", request)?;
        Ok(())
    }
}

/// Turn a non-2xx response into [`TriageError::Api`].
fn check_status(op: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(TriageError::Api {
        op,
        status: status.as_u16(),
        message: error_message(&body)
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}

/// The `error.message` field of a Google API error body, if it has one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|env| env.error.message)
        .filter(|m| !m.is_empty())
}

/// A mailbox label as Gmail reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `system` or `user`.
    #[serde(default, rename = "type")]
    pub kind: String,
}

// ── Wire format ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GmailMessage {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    size_estimate: u64,
    #[serde(default)]
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<WireHeader>,
    #[serde(default)]
    body: Option<MessagePartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireHeader {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagePartBody {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl From<ListMessagesResponse> for Page {
    fn from(list: ListMessagesResponse) -> Self {
        Self {
            ids: list.messages.into_iter().map(|m| m.id).collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

impl From<WireHeader> for Header {
    fn from(h: WireHeader) -> Self {
        Header::new(h.name, h.value)
    }
}

impl From<MessagePart> for ContentPart {
    fn from(part: MessagePart) -> Self {
        Self {
            mime_type: part.mime_type,
            headers: part.headers.into_iter().map(Header::from).collect(),
            data: part.body.and_then(|b| b.data).filter(|d| !d.is_empty()),
        }
    }
}

impl From<GmailMessage> for MessageDetail {
    fn from(msg: GmailMessage) -> Self {
        let payload = msg.payload.unwrap_or_default();
        Self {
            id: msg.id,
            size_estimate: msg.size_estimate,
            headers: payload.headers.into_iter().map(Header::from).collect(),
            snippet: msg.snippet,
            parts: payload.parts.into_iter().map(ContentPart::from).collect(),
        }
    }
}
