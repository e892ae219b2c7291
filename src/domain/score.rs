//! Live score state for a simulated event.
//!
//! The fields of [`ScoreSnapshot`] are private so the total can only change
//! together with a team score. Deserialization goes through the same check,
//! which keeps a corrupt cache entry from leaking an inconsistent total.

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::EventId;

/// Which side scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Team1,
    Team2,
}

/// Current team scores and total goals for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawScoreSnapshot")]
pub struct ScoreSnapshot {
    event_id: EventId,
    team1_score: u32,
    team2_score: u32,
    total: u32,
}

#[derive(Deserialize)]
struct RawScoreSnapshot {
    event_id: EventId,
    team1_score: u32,
    team2_score: u32,
    total: u32,
}

impl TryFrom<RawScoreSnapshot> for ScoreSnapshot {
    type Error = DomainError;

    fn try_from(raw: RawScoreSnapshot) -> Result<Self, Self::Error> {
        Self::try_new(raw.event_id, raw.team1_score, raw.team2_score, raw.total)
    }
}

impl ScoreSnapshot {
    /// Build a snapshot from team scores; the total is derived.
    #[must_use]
    pub fn new(event_id: EventId, team1_score: u32, team2_score: u32) -> Self {
        Self {
            event_id,
            team1_score,
            team2_score,
            total: team1_score + team2_score,
        }
    }

    /// 0–0 snapshot used when a session is (re)activated.
    #[must_use]
    pub fn kickoff(event_id: EventId) -> Self {
        Self::new(event_id, 0, 0)
    }

    /// Build a snapshot with an explicit total, rejecting inconsistent input.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InconsistentTotal`] when `total` differs from
    /// `team1_score + team2_score`.
    pub fn try_new(
        event_id: EventId,
        team1_score: u32,
        team2_score: u32,
        total: u32,
    ) -> Result<Self, DomainError> {
        if team1_score.checked_add(team2_score) != Some(total) {
            return Err(DomainError::InconsistentTotal {
                event_id,
                team1: team1_score,
                team2: team2_score,
                total,
            });
        }
        Ok(Self {
            event_id,
            team1_score,
            team2_score,
            total,
        })
    }

    /// Record one goal for `side`.
    pub fn record_goal(&mut self, side: Side) {
        match side {
            Side::Team1 => self.team1_score += 1,
            Side::Team2 => self.team2_score += 1,
        }
        self.total += 1;
    }

    #[must_use]
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    #[must_use]
    pub fn team1_score(&self) -> u32 {
        self.team1_score
    }

    #[must_use]
    pub fn team2_score(&self) -> u32 {
        self.team2_score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Team 1 minus team 2.
    #[must_use]
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.team1_score) - i64::from(self.team2_score)
    }

    /// Both teams have scored at least once.
    #[must_use]
    pub fn both_scored(&self) -> bool {
        self.team1_score > 0 && self.team2_score > 0
    }

    /// True when the team scores differ from `previous`.
    #[must_use]
    pub fn differs_from(&self, previous: &ScoreSnapshot) -> bool {
        self.team1_score != previous.team1_score || self.team2_score != previous.team2_score
    }
}
