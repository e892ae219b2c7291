//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{
    competitions, countries, event_prices, events, market_collections, markets, prices, scores,
    sports, teams,
};

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = sports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SportRow {
    pub id: i32,
    pub name: String,
    pub code: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = countries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CountryRow {
    pub id: i32,
    pub name: String,
    pub code: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = competitions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CompetitionRow {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TeamRow {
    pub id: i32,
    pub name: String,
    pub rating: i32,
}

/// Database row for an event, without its parent chain.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = market_collections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketCollectionRow {
    pub id: i32,
    pub name: String,
    pub code: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub id: i32,
    pub code: String,
    pub name: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceRow {
    pub id: i32,
    pub code: String,
    pub name: String,
}

/// Database row for an event price. The coefficient is stored as a double.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = event_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventPriceRow {
    pub id: i32,
    pub event_id: i32,
    pub price_id: i32,
    pub coefficient: f64,
    pub active: bool,
}

/// Score row written with `REPLACE INTO`; `event_id` is unique.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = scores)]
pub struct NewScoreRow {
    pub event_id: i32,
    pub team1_score: i32,
    pub team2_score: i32,
    pub total: i32,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = scores)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScoreRow {
    pub event_id: i32,
    pub team1_score: i32,
    pub team2_score: i32,
    pub total: i32,
}
