use anyhow::Context;
use async_trait::async_trait;

use crate::NotificationSink;

/// Slack delivery. Prefers the bot token (`chat.postMessage`, which supports
/// threading); falls back to an incoming webhook when only that is
/// configured.
pub struct SlackSink {
    client: reqwest::Client,
    bot_token: Option<String>,
    webhook_url: Option<String>,
}

#[derive(Default)]
pub struct SlackOptions {
    pub bot_token: Option<String>,
    pub webhook_url: Option<String>,
}

impl SlackSink {
    pub fn new(options: SlackOptions) -> anyhow::Result<Self> {
        if options.bot_token.is_none() && options.webhook_url.is_none() {
            anyhow::bail!("neither SLACK_BOT_TOKEN nor SLACK_WEBHOOK_URL is configured");
        }

        Ok(Self {
            client: reqwest::Client::new(),
            bot_token: options.bot_token,
            webhook_url: options.webhook_url,
        })
    }

    async fn post_via_api(
        &self,
        token: &str,
        channel: &str,
        thread_ts: Option<&str>,
        content: &str,
    ) -> anyhow::Result<()> {
        let mut payload = serde_json::json!({
            "channel": channel,
            "text": content,
        });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = serde_json::Value::from(ts);
        }

        let res = self
            .client
            .post("https://slack.com/api/chat.postMessage")
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .context("slack chat.postMessage call failed")?;

        let body: serde_json::Value = res
            .json()
            .await
            .context("failed to get json from slack response")?;
        if body["ok"] != serde_json::Value::Bool(true) {
            anyhow::bail!("slack chat.postMessage rejected: {}", body["error"]);
        }

        Ok(())
    }

    async fn post_via_webhook(&self, url: &str, content: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": content }))
            .send()
            .await
            .context("slack webhook call failed")?;

        if !res.status().is_success() {
            anyhow::bail!("slack webhook rejected with {}", res.status());
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSink for SlackSink {
    async fn post(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        content: &str,
    ) -> anyhow::Result<()> {
        if let Some(token) = &self.bot_token {
            return self.post_via_api(token, channel, thread_ts, content).await;
        }

        if let Some(url) = &self.webhook_url {
            // Incoming webhooks ignore channel and cannot thread.
            if thread_ts.is_some() {
                tracing::debug!("webhook delivery drops thread_ts");
            }
            return self.post_via_webhook(url, content).await;
        }

        anyhow::bail!("no slack delivery method configured")
    }
}
