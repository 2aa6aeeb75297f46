use std::sync::Arc;

use async_trait::async_trait;
use nudge_git_provider::{models::PrSnapshot, GitProvider};
use serde::Serialize;

use crate::signals::{detect_signals, Signal, SignalConfig};

#[async_trait]
pub trait SummaryProducer: Send + Sync {
    async fn summarize(&self, pr: &PrSnapshot) -> anyhow::Result<String>;
}

/// Default producer: fails fast so the deterministic fallback always
/// triggers. Swap in a real generative backend at construction.
pub struct NullSummaryProducer;

#[async_trait]
impl SummaryProducer for NullSummaryProducer {
    async fn summarize(&self, _pr: &PrSnapshot) -> anyhow::Result<String> {
        anyhow::bail!("no summary producer configured")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub signals: Vec<Signal>,
    pub suggested_reviewers: Vec<String>,
    pub improvement_hints: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    #[error("pull request not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Stateless composer: signals + summary + reviewers + hints. Performs no
/// I/O of its own beyond invoking the injected summary producer.
#[derive(Clone)]
pub struct Analyzer {
    signals: SignalConfig,
    producer: Arc<dyn SummaryProducer>,
}

impl Analyzer {
    pub fn new(signals: SignalConfig, producer: Arc<dyn SummaryProducer>) -> Self {
        Self { signals, producer }
    }

    pub async fn compose(&self, pr: &PrSnapshot, reviewer_candidates: Vec<String>) -> AnalysisResult {
        let signals = detect_signals(pr, &self.signals, chrono::Utc::now());

        let summary = match self.producer.summarize(pr).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::debug!("summary producer unavailable, using fallback: {}", e);
                fallback_summary(pr)
            }
        };

        let suggested_reviewers = if reviewer_candidates.is_empty() {
            vec!["Alice".into(), "Bob".into()]
        } else {
            reviewer_candidates
        };

        let improvement_hints = signals
            .iter()
            .filter(|s| s.detected)
            .map(|s| s.action.clone())
            .collect();

        AnalysisResult {
            summary,
            signals,
            suggested_reviewers,
            improvement_hints,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(SignalConfig::default(), Arc::new(NullSummaryProducer))
    }
}

fn fallback_summary(pr: &PrSnapshot) -> String {
    format!(
        "PR by {} in {} with {} files changed (+{}, -{}).",
        pr.author, pr.repo_name, pr.files_changed, pr.lines_added, pr.lines_removed
    )
}

/// The synchronous fetch-then-analyze path. The only place where a failure
/// surfaces to the caller, since a user is waiting on the response.
pub struct AnalysisService {
    provider: GitProvider,
    analyzer: Analyzer,
}

impl AnalysisService {
    pub fn new(provider: GitProvider, analyzer: Analyzer) -> Self {
        Self { provider, analyzer }
    }

    pub async fn analyze(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<(PrSnapshot, AnalysisResult), AnalyzeError> {
        let pr = self
            .provider
            .get_pull_request(owner, repo, number)
            .await?
            .ok_or(AnalyzeError::NotFound)?;

        // Reviewer lookup stays best-effort even here.
        let reviewers = match self
            .provider
            .get_reviewer_candidates(owner, repo, &pr.author)
            .await
        {
            Ok(reviewers) => reviewers,
            Err(e) => {
                tracing::warn!("failed to fetch reviewer candidates: {}", e);
                Vec::new()
            }
        };

        let analysis = self.analyzer.compose(&pr, reviewers).await;

        Ok((pr, analysis))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signals::test::snapshot;

    struct FailingProducer;

    #[async_trait]
    impl SummaryProducer for FailingProducer {
        async fn summarize(&self, _pr: &PrSnapshot) -> anyhow::Result<String> {
            anyhow::bail!("model timed out")
        }
    }

    struct CannedProducer;

    #[async_trait]
    impl SummaryProducer for CannedProducer {
        async fn summarize(&self, pr: &PrSnapshot) -> anyhow::Result<String> {
            Ok(format!("A lovely change to {}.", pr.repo_name))
        }
    }

    #[tokio::test]
    async fn test_fallback_summary_when_producer_fails() {
        let analyzer = Analyzer::new(SignalConfig::default(), Arc::new(FailingProducer));
        let result = analyzer.compose(&snapshot(), vec![]).await;

        assert_eq!(
            result.summary,
            "PR by alice in org/repo with 3 files changed (+50, -10)."
        );
    }

    #[tokio::test]
    async fn test_producer_summary_preferred_when_available() {
        let analyzer = Analyzer::new(SignalConfig::default(), Arc::new(CannedProducer));
        let result = analyzer.compose(&snapshot(), vec![]).await;

        assert_eq!(result.summary, "A lovely change to org/repo.");
    }

    #[tokio::test]
    async fn test_reviewer_fallback_pair_when_no_candidates() {
        let analyzer = Analyzer::default();
        let result = analyzer.compose(&snapshot(), vec![]).await;

        assert_eq!(result.suggested_reviewers, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_reviewer_candidates_passed_through_verbatim() {
        let analyzer = Analyzer::default();
        let result = analyzer
            .compose(&snapshot(), vec!["carol".into(), "dan".into()])
            .await;

        assert_eq!(result.suggested_reviewers, vec!["carol", "dan"]);
    }

    #[tokio::test]
    async fn test_hints_match_detected_signals_in_order() {
        let analyzer = Analyzer::default();
        let mut pr = snapshot();
        pr.lines_added = 600;
        pr.lines_removed = 0;
        pr.changed_filenames = vec!["src/lib.rs".into()];

        let result = analyzer.compose(&pr, vec![]).await;

        assert_eq!(result.improvement_hints.len(), result.signals.len());
        assert_eq!(
            result.improvement_hints,
            result
                .signals
                .iter()
                .map(|s| s.action.clone())
                .collect::<Vec<_>>()
        );
        assert_eq!(result.signals[0].name, "Large PR");
    }
}
