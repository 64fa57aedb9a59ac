//! WhatsApp Cloud API sender.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use super::traits::MessageSender;
use crate::error::{ConfigError, CoreError, Result};
use crate::storage::WhatsAppConfig;

pub struct WhatsAppClient {
    client: Client,
    messages_url: String,
    token: String,
}

impl WhatsAppClient {
    pub fn new(api_base: &str, phone_number_id: &str, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            messages_url: format!(
                "{}/{}/messages",
                api_base.trim_end_matches('/'),
                phone_number_id
            ),
            token: token.into(),
        }
    }

    /// # Errors
    /// Returns an error if the phone number id or token is missing.
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self> {
        let phone_number_id = config
            .phone_number_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey("whatsapp.phone_number_id".into()))?;
        let token = config
            .token()
            .ok_or_else(|| ConfigError::MissingKey("whatsapp.access_token".into()))?;
        Ok(Self::new(&config.api_base, phone_number_id, token))
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        let resp = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(CoreError::integration(
                self.name(),
                format!("send failed with {status}: {detail}"),
            ));
        }

        info!(to, "chat reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn sends_text_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/555/messages")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(json!({
                "messaging_product": "whatsapp",
                "to": "15551234567",
                "type": "text",
                "text": { "body": "hello" },
            })))
            .with_body(r#"{"messages":[{"id":"wamid.1"}]}"#)
            .create_async()
            .await;

        let client = WhatsAppClient::new(&server.url(), "555", "tok");
        client.send_text("15551234567", "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_send_is_an_integration_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/555/messages")
            .with_status(400)
            .with_body(r#"{"error":{"message":"bad recipient"}}"#)
            .create_async()
            .await;

        let client = WhatsAppClient::new(&server.url(), "555", "tok");
        let err = client.send_text("x", "hello").await.unwrap_err();
        assert!(err.to_string().contains("bad recipient"));
    }

    #[test]
    fn config_requires_phone_number_id() {
        let config = WhatsAppConfig {
            access_token: Some("tok".into()),
            ..WhatsAppConfig::default()
        };
        assert!(matches!(
            WhatsAppClient::from_config(&config),
            Err(CoreError::Config(ConfigError::MissingKey(_)))
        ));
    }
}
