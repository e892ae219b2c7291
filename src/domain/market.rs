//! Market taxonomy: collections, markets, prices and the families that
//! decide how a market is repriced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::PriceId;

/// Grouping of markets shown together (e.g. "Main", "Goals").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCollection {
    pub id: i32,
    pub name: String,
    pub code: String,
}

/// A family of related propositions, identified by its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub collection: MarketCollection,
}

/// One proposition within a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    pub code: String,
    pub name: String,
    pub market: Market,
}

/// Denormalized price → market → collection names and codes, used to enrich
/// broadcasts without touching the reference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRelation {
    pub price_id: PriceId,
    pub price_name: String,
    pub price_code: String,
    pub market_code: String,
    pub market_name: String,
    pub collection_code: String,
    pub collection_name: String,
}

impl From<&Price> for PriceRelation {
    fn from(price: &Price) -> Self {
        Self {
            price_id: price.id,
            price_name: price.name.clone(),
            price_code: price.code.clone(),
            market_code: price.market.code.clone(),
            market_name: price.market.name.clone(),
            collection_code: price.market.collection.code.clone(),
            collection_name: price.market.collection.name.clone(),
        }
    }
}

/// Supported market families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketFamily {
    /// `1X2`: home win, draw, away win.
    MatchResult,
    /// `OU5`, `OU15`, … `OU45`: over/under N.5 total goals.
    ///
    /// `line_code` is the digits of the code, so `OU25` has `line_code == 25`
    /// and settles over once three goals are scored.
    OverUnder { line_code: u32 },
    /// `BTTS`: both teams to score.
    BothTeamsToScore,
}

impl MarketFamily {
    /// Goals needed before the over side of an over/under line is won.
    #[must_use]
    pub fn goals_to_settle(&self) -> Option<u32> {
        match self {
            Self::OverUnder { line_code } => Some(line_code / 10 + 1),
            _ => None,
        }
    }
}

impl FromStr for MarketFamily {
    type Err = DomainError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "1X2" => Ok(Self::MatchResult),
            "BTTS" => Ok(Self::BothTeamsToScore),
            _ => {
                let line_code = code
                    .strip_prefix("OU")
                    .and_then(|digits| digits.parse::<u32>().ok())
                    .filter(|line| line % 10 == 5)
                    .ok_or_else(|| DomainError::UnsupportedMarket(code.to_string()))?;
                Ok(Self::OverUnder { line_code })
            }
        }
    }
}

impl fmt::Display for MarketFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchResult => write!(f, "1X2"),
            Self::OverUnder { line_code } => write!(f, "OU{line_code}"),
            Self::BothTeamsToScore => write!(f, "BTTS"),
        }
    }
}
