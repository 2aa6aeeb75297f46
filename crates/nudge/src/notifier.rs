use nudge_git_provider::{
    models::{PrLocator, PrSnapshot},
    GitProvider,
};
use nudge_notify::ChatNotifier;
use nudge_store::{NewReminder, ReminderStore};

use crate::{
    analyze::{AnalysisResult, Analyzer},
    links::extract_pr_links,
    render,
};

/// Turns PR links observed in one inbound message into a chat notification:
/// a single-PR message or a consolidated digest, plus a scheduled follow-up
/// per PR. Fire-and-forget; every external failure degrades to a log line.
pub struct PrNotifier {
    provider: GitProvider,
    chat: ChatNotifier,
    store: ReminderStore,
    analyzer: Analyzer,
    reminder_delay: chrono::Duration,
}

impl PrNotifier {
    pub fn new(
        provider: GitProvider,
        chat: ChatNotifier,
        store: ReminderStore,
        analyzer: Analyzer,
        reminder_delay: chrono::Duration,
    ) -> Self {
        Self {
            provider,
            chat,
            store,
            analyzer,
            reminder_delay,
        }
    }

    pub async fn handle_message(&self, message: &str, channel: &str, thread_ts: Option<&str>) {
        let links = extract_pr_links(message);
        if links.is_empty() {
            tracing::debug!("no pull request links in message");
            return;
        }

        self.handle_links(&links, channel, thread_ts).await;
    }

    /// Processes each link independently; a PR that fails to fetch is
    /// omitted from the output without aborting the rest. Output assembly
    /// keeps link appearance order.
    pub async fn handle_links(&self, links: &[PrLocator], channel: &str, thread_ts: Option<&str>) {
        let mut analyzed = Vec::new();
        for link in links {
            match self.process_link(link, channel, thread_ts).await {
                Ok(Some(item)) => analyzed.push(item),
                Ok(None) => tracing::warn!("{} not found, skipping", link),
                Err(e) => tracing::warn!("failed to process {}: {}", link, e),
            }
        }

        let content = match analyzed.as_slice() {
            [] => {
                tracing::debug!("nothing fetched, not posting");
                return;
            }
            [(pr, analysis)] => render::render_single(pr, analysis),
            _ => render::render_digest(&analyzed),
        };

        if let Err(e) = self.chat.post(channel, thread_ts, &content).await {
            tracing::error!("failed to post notification: {}", e);
        }
    }

    async fn process_link(
        &self,
        link: &PrLocator,
        channel: &str,
        thread_ts: Option<&str>,
    ) -> anyhow::Result<Option<(PrSnapshot, AnalysisResult)>> {
        let Some(pr) = self
            .provider
            .get_pull_request(&link.owner, &link.repo, link.number)
            .await?
        else {
            return Ok(None);
        };

        let reviewers = match self
            .provider
            .get_reviewer_candidates(&link.owner, &link.repo, &pr.author)
            .await
        {
            Ok(reviewers) => reviewers,
            Err(e) => {
                tracing::warn!("failed to fetch reviewer candidates for {}: {}", link, e);
                Vec::new()
            }
        };

        let analysis = self.analyzer.compose(&pr, reviewers).await;

        if let Err(e) = self
            .provider
            .request_review(&link.owner, &link.repo, link.number)
            .await
        {
            tracing::warn!("review trigger failed for {}: {}", link, e);
        }

        let reminder = NewReminder {
            owner: link.owner.clone(),
            repo: link.repo.clone(),
            pr_number: link.number,
            channel: channel.into(),
            thread_ts: thread_ts.map(Into::into),
            remind_at: chrono::Utc::now() + self.reminder_delay,
        };
        if let Err(e) = self.store.insert(reminder).await {
            tracing::error!("failed to schedule reminder for {}: {}", link, e);
        }

        Ok(Some((pr, analysis)))
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use nudge_git_provider::{
        traits::{PullRequestSource, ReviewTrigger, ReviewerSource},
        Provider,
    };
    use nudge_notify::NotificationSink;

    use crate::signals::test::snapshot;

    use super::*;

    struct StaticProvider {
        prs: HashMap<(String, String, u64), PrSnapshot>,
        fail_on: Option<u64>,
    }

    impl StaticProvider {
        fn with(numbers: &[u64]) -> Self {
            let mut prs = HashMap::new();
            for &n in numbers {
                let mut pr = snapshot();
                pr.pr_number = n;
                pr.title = format!("Change {}", n);
                pr.url = format!("https://github.com/acme/widgets/pull/{}", n);
                prs.insert(("acme".to_string(), "widgets".to_string(), n), pr);
            }
            Self { prs, fail_on: None }
        }
    }

    #[async_trait]
    impl PullRequestSource for StaticProvider {
        async fn get_pull_request(
            &self,
            owner: &str,
            repo: &str,
            number: u64,
        ) -> anyhow::Result<Option<PrSnapshot>> {
            if self.fail_on == Some(number) {
                anyhow::bail!("upstream unavailable")
            }
            Ok(self
                .prs
                .get(&(owner.to_string(), repo.to_string(), number))
                .cloned())
        }
    }

    #[async_trait]
    impl ReviewerSource for StaticProvider {
        async fn get_reviewer_candidates(
            &self,
            _owner: &str,
            _repo: &str,
            _exclude_author: &str,
        ) -> anyhow::Result<Vec<String>> {
            Ok(vec!["carol".into()])
        }
    }

    #[async_trait]
    impl ReviewTrigger for StaticProvider {
        async fn request_review(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Provider for StaticProvider {}

    #[derive(Default)]
    struct RecordingSink {
        posts: Mutex<Vec<(String, Option<String>, String)>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn post(
            &self,
            channel: &str,
            thread_ts: Option<&str>,
            content: &str,
        ) -> anyhow::Result<()> {
            self.posts.lock().unwrap().push((
                channel.into(),
                thread_ts.map(Into::into),
                content.into(),
            ));
            Ok(())
        }
    }

    async fn notifier(provider: StaticProvider) -> (PrNotifier, Arc<RecordingSink>, ReminderStore) {
        let sink = Arc::new(RecordingSink::default());
        let store = ReminderStore::open_in_memory().await.unwrap();
        let notifier = PrNotifier::new(
            GitProvider::new(Arc::new(provider)),
            ChatNotifier::new(sink.clone()),
            store.clone(),
            Analyzer::default(),
            chrono::Duration::days(2),
        );
        (notifier, sink, store)
    }

    #[tokio::test]
    async fn test_single_link_uses_single_format() {
        let (notifier, sink, _store) = notifier(StaticProvider::with(&[1])).await;

        notifier
            .handle_message(
                "check https://github.com/acme/widgets/pull/1",
                "#reviews",
                Some("123.456"),
            )
            .await;

        let posts = sink.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let (channel, thread_ts, content) = &posts[0];
        assert_eq!(channel, "#reviews");
        assert_eq!(thread_ts.as_deref(), Some("123.456"));
        assert!(!content.contains("PRs detected"));
        assert!(content.contains("Change 1"));
    }

    #[tokio::test]
    async fn test_two_links_render_digest_in_order() {
        let (notifier, sink, _store) = notifier(StaticProvider::with(&[1, 2])).await;

        notifier
            .handle_message(
                "https://github.com/acme/widgets/pull/1 https://github.com/acme/widgets/pull/2",
                "#reviews",
                None,
            )
            .await;

        let posts = sink.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let content = &posts[0].2;
        assert!(content.contains("2 PRs detected"));
        assert!(content.find("Change 1").unwrap() < content.find("Change 2").unwrap());
    }

    #[tokio::test]
    async fn test_failed_fetch_skips_that_pr_only() {
        let mut provider = StaticProvider::with(&[1, 2]);
        provider.fail_on = Some(1);
        let (notifier, sink, _store) = notifier(provider).await;

        notifier
            .handle_message(
                "https://github.com/acme/widgets/pull/1 https://github.com/acme/widgets/pull/2",
                "#reviews",
                None,
            )
            .await;

        let posts = sink.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let content = &posts[0].2;
        assert!(!content.contains("Change 1"));
        assert!(content.contains("Change 2"));
    }

    #[tokio::test]
    async fn test_no_fetched_prs_posts_nothing() {
        let (notifier, sink, _store) = notifier(StaticProvider::with(&[])).await;

        notifier
            .handle_message(
                "https://github.com/acme/widgets/pull/99 and plain text",
                "#reviews",
                None,
            )
            .await;

        assert!(sink.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reminders_scheduled_per_fetched_pr() {
        let (notifier, _sink, store) = notifier(StaticProvider::with(&[1, 2])).await;

        notifier
            .handle_message(
                "https://github.com/acme/widgets/pull/1 https://github.com/acme/widgets/pull/2",
                "#reviews",
                Some("123.456"),
            )
            .await;

        let due = store
            .due_unsent(chrono::Utc::now() + chrono::Duration::days(3))
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|r| r.channel == "#reviews"));
        assert!(due.iter().all(|r| r.thread_ts.as_deref() == Some("123.456")));
        assert!(due.iter().all(|r| !r.sent));
    }
}
