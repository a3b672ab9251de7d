// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! GitHub REST implementation of [`CollabProvider`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CollabProvider, CollabResult, NewPullRequest, PullRequest, Review, ReviewEvent};
use crate::config::CollabConfig;
use crate::error::NetworkError;

/// Pull requests of one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    client: Client,
    api_url: String,
    owner: String,
    name: String,
    token: Option<String>,
}

impl GitHubProvider {
    /// Provider for `owner/name` against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when `api_url` is not an http(s) URL.
    pub fn new(
        api_url: &str,
        owner: &str,
        name: &str,
        token: Option<String>,
    ) -> CollabResult<Self> {
        let api_url = api_url.trim_end_matches('/');
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(NetworkError::InvalidUrl(api_url.to_string()));
        }
        let client = Client::builder()
            .user_agent(format!("gitduo/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Provider configured from the `[collab]` section.
    ///
    /// # Errors
    ///
    /// Returns the config error for a missing or malformed `repository`, or
    /// the URL error.
    pub fn from_config(config: &CollabConfig) -> anyhow::Result<Self> {
        let (owner, name) = config.owner_and_name()?;
        Ok(Self::new(
            &config.api_url,
            owner,
            name,
            Some(config.token.clone()),
        )?)
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{tail}", self.api_url, self.owner, self.name)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> CollabResult<T> {
        debug!(url, "github request");
        let response: Response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                url: format!("{url} (error: {body})"),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, url: &str, body: &B) -> CollabResult<T> {
        let request = self.request(Method::POST, url).json(body);
        self.send(url, request).await
    }
}

#[derive(Serialize)]
struct ReviewBody<'a> {
    event: ReviewEvent,
    #[serde(skip_serializing_if = "str::is_empty")]
    body: &'a str,
}

#[async_trait]
impl CollabProvider for GitHubProvider {
    async fn create_pr(&self, pr: &NewPullRequest) -> CollabResult<PullRequest> {
        let url = self.url("pulls");
        let created: PullRequest = self.post(&url, pr).await?;
        debug!(number = created.number, "opened pull request");
        Ok(created)
    }

    async fn list_prs(&self, state: &str) -> CollabResult<Vec<PullRequest>> {
        let url = format!("{}?state={state}&per_page=100", self.url("pulls"));
        let request = self.request(Method::GET, &url);
        self.send(&url, request).await
    }

    async fn get_pr(&self, number: u64) -> CollabResult<PullRequest> {
        let url = self.url(&format!("pulls/{number}"));
        let request = self.request(Method::GET, &url);
        self.send(&url, request).await
    }

    async fn review_pr(&self, number: u64, event: ReviewEvent, body: &str) -> CollabResult<Review> {
        let url = self.url(&format!("pulls/{number}/reviews"));
        self.post(&url, &ReviewBody { event, body }).await
    }
}
