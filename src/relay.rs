// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Upstream relay client.
//!
//! Performs the outbound HTTP calls against the profile service's
//! per-account resource and normalizes upstream failures into
//! [`RelayError`]. Exactly one outbound call per invocation; no retries.
//!
//! The profile document is modeled as nested optionals so a missing
//! unlock map is an ordinary `None` while a shape mismatch surfaces as
//! [`RelayError::MalformedBody`] instead of a fault.

use crate::catalog::ItemCatalog;
use crate::classifier::UnlockMap;
use crate::config::UpstreamConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Header carrying the shared secret on every upstream call.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Upstream relay error types.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("account not found upstream")]
    NotFound,

    #[error("upstream returned {status}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream profile document malformed: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("invalid upstream endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Profile document as exchanged with the upstream service. Every level is
/// optional on read; unknown sibling fields are ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<ProfileNode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server: Option<ServerNode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ServerNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unlocks: Option<UnlocksNode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UnlocksNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all: Option<UnlockMap>,
}

impl ProfileDocument {
    /// Document that unlocks every catalog item, replacing the server-side
    /// map.
    fn unlock_all(catalog: &ItemCatalog) -> Self {
        let all = catalog
            .items()
            .iter()
            .map(|item| (item.clone(), true))
            .collect();
        Self {
            profile: Some(ProfileNode {
                server: Some(ServerNode {
                    unlocks: Some(UnlocksNode { all: Some(all) }),
                }),
            }),
        }
    }

    fn into_unlocks(self) -> Option<UnlockMap> {
        self.profile?.server?.unlocks?.all
    }
}

/// Client for the upstream profile service.
pub struct RelayClient {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl RelayClient {
    /// Create a relay client for the configured upstream.
    pub fn new(config: &UpstreamConfig) -> Result<Self, RelayError> {
        let endpoint = Url::parse(&config.endpoint)?;
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Per-account resource URL. Joined as an absolute path, replacing any
    /// path the endpoint itself carries.
    fn account_url(&self, id: &str) -> Result<Url, RelayError> {
        Ok(self.endpoint.join(&format!("/accounts/{id}"))?)
    }

    /// Fetch the account's unlock map.
    ///
    /// Returns `None` when the profile document lacks the unlock map at
    /// any level of its nesting.
    pub async fn fetch_unlocks(&self, id: &str) -> Result<Option<UnlockMap>, RelayError> {
        let url = self.account_url(id)?;
        debug!(%url, "fetching profile");

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RelayError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus { status, body });
        }

        let body = response.text().await?;
        let document: ProfileDocument = serde_json::from_str(&body)?;
        Ok(document.into_unlocks())
    }

    /// Replace the account's unlock map with one unlocking every catalog
    /// item.
    pub async fn push_unlock_all(
        &self,
        id: &str,
        catalog: &ItemCatalog,
    ) -> Result<(), RelayError> {
        let url = self.account_url(id)?;
        debug!(%url, items = catalog.len(), "pushing unlock-all");

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&ProfileDocument::unlock_all(catalog))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RelayError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus { status, body });
        }

        Ok(())
    }
}
