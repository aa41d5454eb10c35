// src/notify/discord.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Notifier;

pub struct DiscordNotifier {
    webhook_url: String,
    mention_user_id: Option<String>,
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, mention_user_id: Option<String>) -> Self {
        Self {
            webhook_url,
            mention_user_id,
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn content_for(&self, text: &str) -> String {
        match &self.mention_user_id {
            Some(id) => format!("<@{id}> {text}"),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let body = serde_json::json!({ "content": self.content_for(text) });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("discord webhook post")?
            .error_for_status()
            .context("discord webhook non-2xx")?;
        Ok(())
    }
}
