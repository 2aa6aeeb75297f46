use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use which::which;

use crate::{
    models::{PrSnapshot, ReviewStatus},
    traits::{PullRequestSource, ReviewTrigger, ReviewerSource},
    Provider,
};

pub struct Github {
    client: reqwest::Client,
    uri: String,
}

pub struct GithubOptions {
    pub uri: String,
    pub token: Option<String>,
    pub use_gh: bool,
}

impl Default for GithubOptions {
    fn default() -> Self {
        Self {
            uri: "https://api.github.com".into(),
            token: None,
            use_gh: true,
        }
    }
}

impl Github {
    pub fn new(options: GithubOptions) -> anyhow::Result<Self> {
        let token = options
            .token
            .or_else(|| {
                if !options.use_gh {
                    return None;
                }
                which("gh")
                    .ok()
                    .filter(|p| {
                        if p.exists() {
                            tracing::debug!("gh is on path");
                            true
                        } else {
                            tracing::debug!("gh is not on path");
                            false
                        }
                    })
                    .and_then(|p| {
                        std::process::Command::new(p)
                            .arg("auth")
                            .arg("token")
                            .output()
                            .ok()
                            .filter(|o| o.status.success())
                            .and_then(|o| {
                                let token =
                                    std::str::from_utf8(&o.stdout).ok().map(|s| s.to_string());
                                if token.is_some() {
                                    tracing::trace!("found github token using gh");
                                }
                                token
                            })
                            .map(|s| s.trim().to_string())
                    })
            })
            .or_else(|| {
                tracing::debug!("falling back on GITHUB_API_TOKEN");
                std::env::var("GITHUB_API_TOKEN").ok()
            });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        } else {
            tracing::debug!("no github token found, requests will be unauthenticated");
        }

        let client = Client::builder()
            .user_agent(concat!("nudge/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            uri: options.uri,
        })
    }
}

#[derive(Deserialize)]
struct PullResponse {
    title: String,
    body: Option<String>,
    user: UserRef,
    created_at: chrono::DateTime<chrono::Utc>,
    changed_files: u64,
    additions: u64,
    deletions: u64,
    #[serde(default)]
    labels: Vec<LabelRef>,
    state: String,
    #[serde(default)]
    merged: bool,
    html_url: String,
}

#[derive(Deserialize)]
struct UserRef {
    login: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct LabelRef {
    name: String,
}

#[derive(Deserialize)]
struct FileRef {
    filename: String,
}

fn review_status(state: &str, merged: bool) -> ReviewStatus {
    match (state, merged) {
        (_, true) => ReviewStatus::Merged,
        ("open", _) => ReviewStatus::Open,
        ("closed", _) => ReviewStatus::Closed,
        _ => ReviewStatus::Unknown,
    }
}

#[async_trait]
impl PullRequestSource for Github {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> anyhow::Result<Option<PrSnapshot>> {
        let url = format!("{}/repos/{}/{}/pulls/{}", self.uri, owner, repo, number);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .context("github pull request call failed")?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            let error_body = res.text().await?;
            tracing::error!("github error: {}", error_body);
            anyhow::bail!("failed to query github pull request endpoint");
        }

        let pull: PullResponse = res
            .json()
            .await
            .context("failed to get json from response")?;

        // The files listing drives the tests/docs rules; an empty list is
        // acceptable when the call fails.
        let files_url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.uri, owner, repo, number
        );
        let changed_filenames = match self.client.get(&files_url).send().await {
            Ok(res) if res.status().is_success() => {
                let files: Vec<FileRef> = res
                    .json()
                    .await
                    .context("failed to get json from files response")?;
                files.into_iter().map(|f| f.filename).collect()
            }
            Ok(res) => {
                tracing::warn!("github files listing returned {}", res.status());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("github files listing failed: {}", e);
                Vec::new()
            }
        };

        Ok(Some(PrSnapshot {
            title: pull.title,
            description: pull.body,
            author: pull.user.login,
            created_at: pull.created_at,
            files_changed: pull.changed_files,
            lines_added: pull.additions,
            lines_removed: pull.deletions,
            labels: pull.labels.into_iter().map(|l| l.name).collect(),
            review_status: review_status(&pull.state, pull.merged),
            repo_name: format!("{}/{}", owner, repo),
            pr_number: number,
            url: pull.html_url,
            changed_filenames,
        }))
    }
}

#[async_trait]
impl ReviewerSource for Github {
    async fn get_reviewer_candidates(
        &self,
        owner: &str,
        repo: &str,
        exclude_author: &str,
    ) -> anyhow::Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/contributors?per_page=10",
            self.uri, owner, repo
        );
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .context("github contributors call failed")?;

        if !res.status().is_success() {
            anyhow::bail!("failed to query github contributors endpoint");
        }

        let contributors: Vec<UserRef> = res
            .json()
            .await
            .context("failed to get json from contributors response")?;

        let candidates = contributors
            .into_iter()
            .filter(|c| c.login != exclude_author)
            .filter(|c| c.kind == "User")
            .filter(|c| !c.login.ends_with("[bot]"))
            .map(|c| c.login)
            .take(3)
            .collect();

        Ok(candidates)
    }
}

#[async_trait]
impl ReviewTrigger for Github {
    async fn request_review(&self, owner: &str, repo: &str, number: u64) -> anyhow::Result<()> {
        let candidates = self
            .get_reviewer_candidates(owner, repo, "")
            .await
            .unwrap_or_default();
        let Some(reviewer) = candidates.first() else {
            tracing::debug!("no reviewer candidates for {}/{}, skipping", owner, repo);
            return Ok(());
        };

        let url = format!(
            "{}/repos/{}/{}/pulls/{}/requested_reviewers",
            self.uri, owner, repo, number
        );
        let res = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "reviewers": [reviewer] }))
            .send()
            .await
            .context("github review request call failed")?;

        if !res.status().is_success() {
            let error_body = res.text().await?;
            tracing::error!("github error: {}", error_body);
            anyhow::bail!("failed to request review for {}/{}#{}", owner, repo, number);
        }

        Ok(())
    }
}

impl Provider for Github {}
