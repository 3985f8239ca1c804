//! HTTP collaborators for a JSONPlaceholder-compatible API.
//!
//! [`HttpSource`] serves both seams of a run: it fetches the post listing
//! ([`ListingSource`]) and each post's comments ([`ResourceFetcher`]).

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::SourceConfig;
use crate::error::{Error, FetchError, Result};
use crate::fetcher::{ListingSource, ResourceFetcher};
use crate::types::{ChildRecord, Comment, ParentId, Post};

/// JSON-over-HTTP source of posts and their comments
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
    config: SourceConfig,
}

impl HttpSource {
    /// Build a source from validated configuration.
    pub fn new(config: SourceConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        // A trailing slash keeps any base path when joining relative endpoints.
        let base = if config.base_url.ends_with('/') {
            config.base_url.clone()
        } else {
            format!("{}/", config.base_url)
        };
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// The configuration this source was built from
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Fetch the full post listing.
    pub async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let url = self.endpoint(&self.config.parents_path)?;
        self.get_json(url).await
    }

    /// Fetch the comments of one post.
    pub async fn fetch_comments(&self, post_id: ParentId) -> Result<Vec<Comment>> {
        let url = self.endpoint(&self.config.children_path_for(post_id))?;
        let comments: Vec<Comment> = self.get_json(url).await?;

        let foreign = comments
            .iter()
            .filter(|c| c.parent_id() != post_id)
            .count();
        if foreign > 0 {
            tracing::warn!(
                parent_id = post_id.0,
                foreign = foreign,
                "comments reference a different post than the one requested"
            );
        }
        Ok(comments)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl ListingSource for HttpSource {
    type Parent = Post;

    async fn fetch_parents(&self) -> Result<Vec<Post>> {
        self.fetch_posts().await.map_err(Error::listing)
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for HttpSource {
    type Child = Comment;

    async fn fetch(&self, parent_id: ParentId) -> std::result::Result<Vec<Comment>, FetchError> {
        self.fetch_comments(parent_id)
            .await
            .map_err(|e| FetchError::from_error(parent_id, &e))
    }
}
