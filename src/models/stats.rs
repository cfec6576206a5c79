//! Per-map results and player statistics.

use crate::models::game::Side;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Round counts of a single map. Its map number is its position in the match's list.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MapResult {
    pub a: u32,
    pub b: u32,
}

impl MapResult {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    /// Side that strictly outscored the other on this map; ties count for nobody.
    pub fn winner(&self) -> Option<Side> {
        match self.a.cmp(&self.b) {
            std::cmp::Ordering::Greater => Some(Side::A),
            std::cmp::Ordering::Less => Some(Side::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Stable roster-slot identifier (`"{side}_{rosterIndex}"`), independent of player names.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerKey(String);

impl PlayerKey {
    pub fn new(side: Side, roster_index: usize) -> Self {
        Self(format!("{}_{}", side.key_prefix(), roster_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Side and roster index encoded in the key, if it is well formed.
    pub fn parse(&self) -> Option<(Side, usize)> {
        let (side, index) = self.0.split_once('_')?;
        let side = match side {
            "a" => Side::A,
            "b" => Side::B,
            _ => return None,
        };
        Some((side, index.parse().ok()?))
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statistics of one roster slot, either for a single map or summed over a series.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatRecord {
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    /// Raw combat points.
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub rounds_played: u32,
    /// Average combat score: `score / rounds_played`, 0 without rounds.
    #[serde(default)]
    pub acs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl PlayerStatRecord {
    pub fn new(kills: u32, deaths: u32, assists: u32, score: u32, rounds_played: u32) -> Self {
        let mut record = Self {
            kills,
            deaths,
            assists,
            score,
            rounds_played,
            acs: 0,
            agent_id: None,
        };
        record.recompute_acs();
        record
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn recompute_acs(&mut self) {
        self.acs = if self.rounds_played == 0 {
            0
        } else {
            (f64::from(self.score) / f64::from(self.rounds_played)).round() as u32
        };
    }

    /// Add the counters of `other`, capped at `u32::MAX`; agent is taken from `other` when it has one.
    pub fn absorb(&mut self, other: &PlayerStatRecord) {
        self.kills = self.kills.saturating_add(other.kills);
        self.deaths = self.deaths.saturating_add(other.deaths);
        self.assists = self.assists.saturating_add(other.assists);
        self.score = self.score.saturating_add(other.score);
        self.rounds_played = self.rounds_played.saturating_add(other.rounds_played);
        if other.agent_id.is_some() {
            self.agent_id.clone_from(&other.agent_id);
        }
        self.recompute_acs();
    }
}

/// Stats of every roster slot on one map.
pub type MapPlayerStats = BTreeMap<PlayerKey, PlayerStatRecord>;
