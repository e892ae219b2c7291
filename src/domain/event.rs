//! Static event hierarchy: sport → country → competition → event → teams.
//!
//! Loaded once per session from the reference store and never mutated
//! afterwards.

use serde::{Deserialize, Serialize};

use super::id::EventId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sport {
    pub id: i32,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub sport: Sport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub id: i32,
    pub name: String,
    pub country: Country,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub rating: i32,
}

/// A simulated match with its full parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub code: String,
    pub name: String,
    pub active: bool,
    pub competition: Competition,
    pub teams: Vec<Team>,
}

impl Event {
    #[must_use]
    pub fn competition_name(&self) -> &str {
        &self.competition.name
    }

    #[must_use]
    pub fn country_name(&self) -> &str {
        &self.competition.country.name
    }

    #[must_use]
    pub fn sport_name(&self) -> &str {
        &self.competition.country.sport.name
    }
}
