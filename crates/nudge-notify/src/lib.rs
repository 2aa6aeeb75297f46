use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use slack::{SlackOptions, SlackSink};

pub mod slack;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Posts rendered content to a channel, optionally inside an existing
    /// thread. At-least-once delivery; callers treat failure as non-fatal.
    async fn post(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        content: &str,
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct ChatNotifier {
    sink: Arc<dyn NotificationSink>,
}

impl ChatNotifier {
    pub fn slack(options: SlackOptions) -> anyhow::Result<Self> {
        let slack = Arc::new(SlackSink::new(options)?);

        Ok(Self { sink: slack })
    }

    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

impl Deref for ChatNotifier {
    type Target = Arc<dyn NotificationSink>;

    fn deref(&self) -> &Self::Target {
        &self.sink
    }
}
