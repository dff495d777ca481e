//! Client for the MailHog v2 HTTP API, used to pull the verification token
//! out of the captured registration email.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{HarnessError, Result};

#[derive(Debug, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub items: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "To", default)]
    pub to: Vec<MailPath>,
    #[serde(rename = "Content")]
    pub content: Content,
}

#[derive(Debug, Deserialize)]
pub struct MailPath {
    #[serde(rename = "Mailbox", default)]
    pub mailbox: String,
    #[serde(rename = "Domain", default)]
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(rename = "Headers", default)]
    pub headers: HashMap<String, Vec<String>>,
    #[serde(rename = "Body", default)]
    pub body: String,
}

impl Message {
    pub fn addressed_to(&self, email: &str) -> bool {
        let structured = self.to.iter().any(|path| {
            format!("{}@{}", path.mailbox, path.domain).eq_ignore_ascii_case(email)
        });
        if structured {
            return true;
        }
        self.content
            .headers
            .get("To")
            .map(|values| {
                values
                    .iter()
                    .any(|value| value.to_ascii_lowercase().contains(&email.to_ascii_lowercase()))
            })
            .unwrap_or(false)
    }
}

/// Strips quoted-printable artifacts so `token=` survives as literal text:
/// soft line breaks (`=\r\n` / `=\n`) are removed and `=3D` becomes `=`.
pub fn normalize_body(body: &str) -> String {
    body.replace("=\r\n", "").replace("=\n", "").replace("=3D", "=")
}

/// Finds `token=` in the text and returns everything up to the next
/// delimiter. Works on both plain-text and HTML bodies.
pub fn extract_token(text: &str) -> Option<String> {
    let idx = text.find("token=")?;
    let rest = &text[idx + "token=".len()..];
    let mut end = rest.len();
    for (i, ch) in rest.char_indices() {
        if ch.is_whitespace() || matches!(ch, '&' | '"' | '\'' | '<' | '>' | '\\') {
            end = i;
            break;
        }
    }
    let token = &rest[..end];
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub struct MailhogClient {
    http: reqwest::Client,
    base_url: String,
}

impl MailhogClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/api/v2/messages", self.base_url.trim_end_matches('/'))
    }

    pub async fn messages(&self) -> Result<MessageList> {
        let response = self.http.get(self.messages_url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::MailFormat(format!(
                "message listing returned {status}"
            )));
        }
        Ok(response.json().await?)
    }

    /// One pass over the inbox: newest message addressed to `email` that
    /// carries a `token=` in its body.
    pub async fn find_verification_token(&self, email: &str) -> Result<Option<String>> {
        let list = self.messages().await?;
        debug!(total = list.total, count = list.count, "polled mailhog");
        for message in list.items.iter().filter(|m| m.addressed_to(email)) {
            let body = normalize_body(&message.content.body);
            if let Some(token) = extract_token(&body) {
                debug!(message_id = %message.id, "verification token found");
                return Ok(Some(token));
            }
        }
        Ok(None)
    }

    pub async fn wait_for_verification_token(
        &self,
        email: &str,
        attempts: usize,
        delay: Duration,
    ) -> Result<String> {
        for attempt in 0..attempts {
            match self.find_verification_token(email).await {
                Ok(Some(token)) => return Ok(token),
                Ok(None) => {}
                Err(err) => warn!(attempt = attempt + 1, %err, "mailhog poll error"),
            }
            if attempt + 1 < attempts {
                sleep(delay).await;
            }
        }
        Err(HarnessError::VerificationEmailNotFound {
            email: email.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message(to_header: &str, mailbox: &str, domain: &str, body: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "ID": "msg-1",
            "To": [{"Mailbox": mailbox, "Domain": domain, "Params": ""}],
            "Content": {
                "Headers": {"To": [to_header], "Subject": ["Verify your email"]},
                "Body": body,
                "Size": body.len(),
            }
        }))
        .expect("message fixture should deserialize")
    }

    #[test]
    fn parses_v2_listing_envelope() {
        let list: MessageList = serde_json::from_value(serde_json::json!({
            "total": 1,
            "count": 1,
            "start": 0,
            "items": [{
                "ID": "abc",
                "To": [{"Mailbox": "tester", "Domain": "example.com"}],
                "Content": {"Headers": {}, "Body": "hello"}
            }]
        }))
        .expect("listing should deserialize");
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].id, "abc");
    }

    #[test]
    fn matches_structured_recipient_case_insensitively() {
        let message = sample_message("Tester <tester@example.com>", "Tester", "Example.COM", "");
        assert!(message.addressed_to("tester@example.com"));
        assert!(!message.addressed_to("other@example.com"));
    }

    #[test]
    fn falls_back_to_to_header() {
        let message = sample_message("tester@example.com", "", "", "");
        assert!(message.addressed_to("tester@example.com"));
    }

    #[test]
    fn extracts_token_from_plain_text() {
        let body = "Click http://localhost:3001/verify?token=abc123 to verify";
        assert_eq!(extract_token(body).as_deref(), Some("abc123"));
    }

    #[test]
    fn extracts_token_from_html_attribute() {
        let body = r#"<a href="http://api:3001/verify?token=tok-42&x=1">verify</a>"#;
        assert_eq!(extract_token(body).as_deref(), Some("tok-42"));
    }

    #[test]
    fn no_token_yields_none() {
        assert!(extract_token("welcome aboard").is_none());
        assert!(extract_token("token=").is_none());
    }

    #[test]
    fn normalizes_quoted_printable_body() {
        let body = "verify here: http://api:3001/verify?token=3Dabc=\r\ndef";
        let normalized = normalize_body(body);
        assert_eq!(extract_token(&normalized).as_deref(), Some("abcdef"));
    }
}
