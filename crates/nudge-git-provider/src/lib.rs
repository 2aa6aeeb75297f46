use std::{ops::Deref, sync::Arc};

use github::{Github, GithubOptions};
use traits::{PullRequestSource, ReviewTrigger, ReviewerSource};

pub mod github;
pub mod models;
pub mod traits;

pub trait Provider: PullRequestSource + ReviewerSource + ReviewTrigger + Send + Sync {}

#[derive(Clone)]
pub struct GitProvider {
    provider: Arc<dyn Provider>,
}

impl GitProvider {
    pub fn github(options: GithubOptions) -> anyhow::Result<Self> {
        let github = Arc::new(Github::new(options)?);

        Ok(Self { provider: github })
    }

    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

impl Deref for GitProvider {
    type Target = Arc<dyn Provider>;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}
