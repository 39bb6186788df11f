//! HTTP client for the Telegram Bot API.
//!
//! Methods are called as `{base_url}/bot{token}/{method}`. The token never
//! appears in logs or error messages.

use crate::error::{IngestError, IngestResult};
use crate::message::{ApiResponse, BotUser, Update};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Request timeout on top of the long-poll timeout.
const TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Client for the Bot API methods ingestion uses.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://api.telegram.org")
    /// * `token` - bot token issued by BotFather
    /// * `poll_timeout` - long-poll timeout the client will be used with
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        poll_timeout: Duration,
    ) -> IngestResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(IngestError::Configuration("bot token is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(poll_timeout + TIMEOUT_MARGIN)
            .build()
            .map_err(|e| IngestError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// `getMe`: cheap authenticated call used to verify the token.
    pub async fn get_me(&self) -> IngestResult<BotUser> {
        let me: BotUser = self.call("getMe", &[]).await?;
        info!(bot_id = me.id, username = ?me.username, "Bot identity verified");
        Ok(me)
    }

    /// `getUpdates`: one long poll.
    ///
    /// `offset` is the first update id to return; passing it confirms every
    /// earlier update so Telegram will not redeliver them.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> IngestResult<Vec<Update>> {
        let mut query = vec![
            ("timeout", timeout.as_secs().to_string()),
            (
                "allowed_updates",
                r#"["message","channel_post"]"#.to_string(),
            ),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let updates: Vec<Update> = self.call("getUpdates", &query).await?;
        debug!(count = updates.len(), ?offset, "Updates received");
        Ok(updates)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> IngestResult<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            // without_url: the URL carries the token
            .map_err(|e| IngestError::Transport(format!("{method} failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IngestError::Transport(format!("{method} body: {}", e.without_url())))?;

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(IngestError::Http {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => return Err(IngestError::Parse(format!("{method}: {e}"))),
        };

        if !parsed.ok {
            return Err(IngestError::Api {
                code: parsed.error_code,
                description: parsed.description.unwrap_or_default(),
            });
        }

        parsed
            .result
            .ok_or_else(|| IngestError::Parse(format!("{method}: ok response without result")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        let result = TelegramClient::new(DEFAULT_API_URL, "  ", Duration::from_secs(1));
        assert!(matches!(result, Err(IngestError::Configuration(_))));
    }

    #[test]
    fn test_debug_hides_token() {
        let client =
            TelegramClient::new("http://localhost/", "123:secret", Duration::from_secs(1)).unwrap();
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("http://localhost"));
    }
}
