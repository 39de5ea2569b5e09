// src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Division a standings table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    Central,
    Pacific,
}

impl League {
    pub fn as_str(&self) -> &'static str {
        match self {
            League::Central => "Central",
            League::Pacific => "Pacific",
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One team's line in a league standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub rank: u32,
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// `0.0` when the page shows the leader placeholder.
    pub win_rate: f64,
    /// Games behind the leader, kept as text ("1.5", "-").
    pub game_diff: String,
    pub league: League,
}

impl TeamStanding {
    /// True when `games == wins + losses + draws`.
    pub fn is_consistent(&self) -> bool {
        u64::from(self.games)
            == u64::from(self.wins) + u64::from(self.losses) + u64::from(self.draws)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Batter,
    Pitcher,
}

/// A single statistic cell; numeric where the page allows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

/// Per-player statistics line. The set of statistics varies by category,
/// so they are kept as a name → value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub rank: u32,
    pub name: String,
    pub team: String,
    pub stats: BTreeMap<String, StatValue>,
    pub category: StatCategory,
}

impl PlayerStat {
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.stats.get(key)? {
            StatValue::Number(n) => Some(*n),
            StatValue::Text(_) => None,
        }
    }
}

/// What the binary emits with `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsReport {
    pub season: i32,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub teams: Vec<TeamStanding>,
}
