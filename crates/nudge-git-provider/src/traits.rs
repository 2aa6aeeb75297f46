use async_trait::async_trait;

use crate::models::PrSnapshot;

#[async_trait]
pub trait PullRequestSource {
    /// Fetches a snapshot of the pull request, or `None` when the platform
    /// reports no such PR.
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> anyhow::Result<Option<PrSnapshot>>;
}

#[async_trait]
pub trait ReviewerSource {
    /// Ordered candidate reviewer handles for the repository, excluding the
    /// PR author and bot accounts. May be empty.
    async fn get_reviewer_candidates(
        &self,
        owner: &str,
        repo: &str,
        exclude_author: &str,
    ) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
pub trait ReviewTrigger {
    /// Asks the platform to put the PR in front of a reviewer. Best-effort;
    /// callers treat failure as non-fatal.
    async fn request_review(&self, owner: &str, repo: &str, number: u64) -> anyhow::Result<()>;
}
