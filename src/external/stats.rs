//! External match-stats provider: payload shape and HTTP client.

use crate::external::cache::Cache;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Failures talking to the match-stats provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("no match-stats provider is configured")]
    NotConfigured,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExternalStats {
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub score: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExternalPlayer {
    pub name: String,
    pub team_id: String,
    #[serde(default)]
    pub stats: ExternalStats,
    /// Character played, when the provider reports it.
    #[serde(default)]
    pub agent: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExternalRounds {
    #[serde(default)]
    pub won: u32,
    #[serde(default)]
    pub lost: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExternalTeam {
    pub team_id: String,
    #[serde(default)]
    pub rounds: ExternalRounds,
}

/// One played map as reported by the provider.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExternalMatch {
    #[serde(default)]
    pub players: Vec<ExternalPlayer>,
    #[serde(default)]
    pub teams: Vec<ExternalTeam>,
}

impl ExternalMatch {
    pub fn team(&self, team_id: &str) -> Option<&ExternalTeam> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    /// Distinct team ids, teams list first, then any only seen on players.
    pub fn team_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        let from_teams = self.teams.iter().map(|t| t.team_id.as_str());
        let from_players = self.players.iter().map(|p| p.team_id.as_str());
        for id in from_teams.chain(from_players) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Source of external match results.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_match(&self, external_match_id: &str) -> Result<ExternalMatch, ProviderError>;
}

/// Provider used when no stats API is configured; every fetch fails.
pub struct UnconfiguredStatsProvider;

#[async_trait]
impl StatsProvider for UnconfiguredStatsProvider {
    async fn fetch_match(&self, _external_match_id: &str) -> Result<ExternalMatch, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}

/// Fetches `GET {base_url}/matches/{id}` and memoizes results in the injected cache.
pub struct HttpStatsProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: Arc<dyn Cache<String, ExternalMatch>>,
}

impl HttpStatsProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        cache: Arc<dyn Cache<String, ExternalMatch>>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            cache,
        }
    }
}

#[async_trait]
impl StatsProvider for HttpStatsProvider {
    async fn fetch_match(&self, external_match_id: &str) -> Result<ExternalMatch, ProviderError> {
        let key = external_match_id.to_string();
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("Stats cache hit for external match {}", external_match_id);
            return Ok(hit);
        }

        let url = format!("{}/matches/{}", self.base_url, external_match_id);
        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, api_key);
        }
        let response = request.send().await?.error_for_status()?;
        let payload: ExternalMatch = response.json().await.map_err(|e| {
            if e.is_decode() {
                ProviderError::Malformed(e.to_string())
            } else {
                ProviderError::Http(e)
            }
        })?;
        if payload.team_ids().len() != 2 {
            return Err(ProviderError::Malformed(format!(
                "expected 2 teams, found {}",
                payload.team_ids().len()
            )));
        }

        self.cache.set(key, payload.clone());
        Ok(payload)
    }
}
