use chrono::Utc;
use nudge_git_provider::{models::ReviewStatus, GitProvider};
use nudge_notify::ChatNotifier;
use nudge_store::{Reminder, ReminderStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::render;

/// Background loop that consumes due reminders: re-fetch the PR, nudge the
/// author's thread if it is still open, and mark the reminder sent either
/// way. At-most-once: a sent reminder is never retried.
pub struct ReminderScheduler {
    store: ReminderStore,
    provider: GitProvider,
    chat: ChatNotifier,
    period: std::time::Duration,
}

impl ReminderScheduler {
    pub fn new(
        store: ReminderStore,
        provider: GitProvider,
        chat: ChatNotifier,
        period: std::time::Duration,
    ) -> Self {
        Self {
            store,
            provider,
            chat,
            period,
        }
    }

    /// Runs until the token is cancelled. A failing pass is logged and the
    /// next tick tries again; the loop itself never terminates on error.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("reminder scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.process_due().await {
                        tracing::error!("reminder pass failed: {}", e);
                    }
                }
            }
        }
    }

    /// One pass over everything currently due and unsent. Reminders are
    /// independent; one failing does not block the rest of the batch.
    pub async fn process_due(&self) -> Result<(), StoreError> {
        let due = self.store.due_unsent(Utc::now()).await?;
        if !due.is_empty() {
            tracing::debug!("processing {} due reminders", due.len());
        }

        for reminder in due {
            if let Err(e) = self.process_one(&reminder).await {
                tracing::error!(
                    "failed to process reminder {} for {}/{}#{}: {}",
                    reminder.id,
                    reminder.owner,
                    reminder.repo,
                    reminder.pr_number,
                    e
                );
            }
        }

        Ok(())
    }

    async fn process_one(&self, reminder: &Reminder) -> anyhow::Result<()> {
        match self
            .provider
            .get_pull_request(&reminder.owner, &reminder.repo, reminder.pr_number)
            .await
        {
            Ok(Some(pr)) if pr.review_status == ReviewStatus::Open => {
                let content = render::render_nudge(&pr);
                if let Err(e) = self
                    .chat
                    .post(&reminder.channel, reminder.thread_ts.as_deref(), &content)
                    .await
                {
                    tracing::warn!("failed to post nudge for reminder {}: {}", reminder.id, e);
                }
            }
            Ok(Some(pr)) => {
                tracing::debug!(
                    "reminder {}: PR is {:?}, no nudge",
                    reminder.id,
                    pr.review_status
                );
            }
            Ok(None) => {
                tracing::debug!("reminder {}: PR no longer exists, no nudge", reminder.id);
            }
            // Treat the PR as no longer relevant rather than retrying.
            Err(e) => {
                tracing::warn!("reminder {}: fetch failed, no nudge: {}", reminder.id, e);
            }
        }

        self.store.mark_sent(reminder.id).await?;

        Ok(())
    }
}
