use serde::Serialize;

/// Reference to a single pull request on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrLocator {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl std::fmt::Display for PrLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Open,
    Closed,
    Merged,
    Unknown,
}

/// Point-in-time read of a pull request's metadata. Immutable for the
/// duration of one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct PrSnapshot {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub labels: Vec<String>,
    pub review_status: ReviewStatus,
    /// "{owner}/{repo}"
    pub repo_name: String,
    pub pr_number: u64,
    pub url: String,
    pub changed_filenames: Vec<String>,
}
