//! SQLite reference store implementation.
//!
//! Serves the static hierarchy to the reference cache, applies activation
//! requests, and takes the final session state back at teardown. Diesel is
//! synchronous, so every call runs on the blocking pool.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::database::connection::DbPool;
use super::database::model::{
    CompetitionRow, CountryRow, EventPriceRow, EventRow, MarketCollectionRow, MarketRow,
    NewScoreRow, PriceRow, ScoreRow, SportRow, TeamRow,
};
use super::database::schema::{
    competitions, countries, event_prices, event_teams, events, market_collections, markets,
    prices, scores, sports, teams,
};
use super::seed::{self, SeedReport};
use crate::domain::{
    Competition, Country, Event, EventId, EventPriceId, EventPriceRecord, EventPriceState,
    Market, MarketCollection, Price, PriceId, ScoreSnapshot, Sport, Team,
};
use crate::error::{Error, Result};
use crate::port::{ActivationStore, EventSummary, ReferenceSource};

/// SQLite-backed reference store.
///
/// Implements both [`ReferenceSource`] and [`ActivationStore`].
#[derive(Clone)]
pub struct SqliteReferenceStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteReferenceStore {
    /// Create a new SQLite reference store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
            f(&mut conn)
        })
        .await?
    }

    /// Insert the demo catalog if the database has no events yet.
    pub async fn seed_demo(&self) -> Result<SeedReport> {
        self.with_conn(|conn| Ok(seed::seed_demo(conn)?)).await
    }

    /// Stored score of an event, if any.
    pub async fn score(&self, event_id: EventId) -> Result<Option<ScoreSnapshot>> {
        self.with_conn(move |conn| {
            let row: Option<ScoreRow> = scores::table
                .filter(scores::event_id.eq(event_id.get()))
                .select(ScoreRow::as_select())
                .first(conn)
                .optional()?;
            row.map(score_from_row).transpose()
        })
        .await
    }

    /// Stored state of every price of an event.
    pub async fn event_prices(&self, event_id: EventId) -> Result<Vec<EventPriceState>> {
        self.with_conn(move |conn| {
            let rows: Vec<EventPriceRow> = event_prices::table
                .filter(event_prices::event_id.eq(event_id.get()))
                .order(event_prices::id.asc())
                .select(EventPriceRow::as_select())
                .load(conn)?;
            rows.into_iter().map(state_from_row).collect()
        })
        .await
    }
}

fn coefficient_from_f64(id: i32, value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| Error::Database(format!("invalid coefficient {value} for event price {id}")))
}

fn coefficient_to_f64(state: &EventPriceState) -> Result<f64> {
    state.coefficient.to_f64().ok_or_else(|| {
        Error::Database(format!(
            "coefficient {} of event price {} does not fit a double",
            state.coefficient, state.id
        ))
    })
}

fn state_from_row(row: EventPriceRow) -> Result<EventPriceState> {
    Ok(EventPriceState::new(
        EventPriceId::new(row.id),
        EventId::new(row.event_id),
        PriceId::new(row.price_id),
        coefficient_from_f64(row.id, row.coefficient)?,
        row.active,
    ))
}

fn score_from_row(row: ScoreRow) -> Result<ScoreSnapshot> {
    let goals = |value: i32| {
        u32::try_from(value)
            .map_err(|_| Error::Database(format!("negative score for event {}", row.event_id)))
    };
    Ok(ScoreSnapshot::try_new(
        EventId::new(row.event_id),
        goals(row.team1_score)?,
        goals(row.team2_score)?,
        goals(row.total)?,
    )?)
}

fn score_to_row(score: &ScoreSnapshot) -> Result<NewScoreRow> {
    let goals = |value: u32| {
        i32::try_from(value).map_err(|_| {
            Error::Database(format!(
                "score {value} of event {} does not fit an integer column",
                score.event_id()
            ))
        })
    };
    Ok(NewScoreRow {
        event_id: score.event_id().get(),
        team1_score: goals(score.team1_score())?,
        team2_score: goals(score.team2_score())?,
        total: goals(score.total())?,
    })
}

fn load_events(conn: &mut SqliteConnection) -> Result<Vec<Event>> {
    let rows: Vec<(EventRow, CompetitionRow, CountryRow, SportRow)> = events::table
        .inner_join(competitions::table.inner_join(countries::table.inner_join(sports::table)))
        .filter(events::active.eq(true))
        .order(events::id.asc())
        .select((
            EventRow::as_select(),
            CompetitionRow::as_select(),
            CountryRow::as_select(),
            SportRow::as_select(),
        ))
        .load(conn)?;

    let ids: Vec<i32> = rows.iter().map(|(event, ..)| event.id).collect();
    let team_rows: Vec<(i32, TeamRow)> = event_teams::table
        .inner_join(teams::table)
        .filter(event_teams::event_id.eq_any(&ids))
        .order((event_teams::event_id.asc(), event_teams::position.asc()))
        .select((event_teams::event_id, TeamRow::as_select()))
        .load(conn)?;

    let mut teams_by_event: HashMap<i32, Vec<Team>> = HashMap::new();
    for (event_id, team) in team_rows {
        teams_by_event.entry(event_id).or_default().push(Team {
            id: team.id,
            name: team.name,
            rating: team.rating,
        });
    }

    Ok(rows
        .into_iter()
        .map(|(event, competition, country, sport)| Event {
            id: EventId::new(event.id),
            code: event.code,
            name: event.name,
            active: event.active,
            competition: Competition {
                id: competition.id,
                name: competition.name,
                country: Country {
                    id: country.id,
                    name: country.name,
                    code: country.code,
                    sport: Sport {
                        id: sport.id,
                        name: sport.name,
                        code: sport.code,
                    },
                },
            },
            teams: teams_by_event.remove(&event.id).unwrap_or_default(),
        })
        .collect())
}

fn load_event_prices(conn: &mut SqliteConnection) -> Result<Vec<EventPriceRecord>> {
    let rows: Vec<(EventPriceRow, PriceRow, MarketRow, MarketCollectionRow)> =
        event_prices::table
            .inner_join(events::table)
            .inner_join(prices::table.inner_join(markets::table.inner_join(market_collections::table)))
            .filter(events::active.eq(true))
            .filter(markets::active.eq(true))
            .filter(prices::active.eq(true))
            .order(event_prices::id.asc())
            .select((
                EventPriceRow::as_select(),
                PriceRow::as_select(),
                MarketRow::as_select(),
                MarketCollectionRow::as_select(),
            ))
            .load(conn)?;

    rows.into_iter()
        .map(|(state, price, market, collection)| {
            Ok(EventPriceRecord {
                state: state_from_row(state)?,
                price: Price {
                    id: PriceId::new(price.id),
                    code: price.code,
                    name: price.name,
                    market: Market {
                        id: market.id,
                        code: market.code,
                        name: market.name,
                        collection: MarketCollection {
                            id: collection.id,
                            name: collection.name,
                            code: collection.code,
                        },
                    },
                },
            })
        })
        .collect()
}

#[async_trait]
impl ReferenceSource for SqliteReferenceStore {
    async fn load_active_events(&self) -> Result<Vec<Event>> {
        self.with_conn(load_events).await
    }

    async fn load_active_event_prices(&self) -> Result<Vec<EventPriceRecord>> {
        self.with_conn(load_event_prices).await
    }

    async fn save_event_prices(&self, prices: &[EventPriceState]) -> Result<usize> {
        let updates = prices
            .iter()
            .map(|state| Ok((state.id.get(), coefficient_to_f64(state)?, state.active)))
            .collect::<Result<Vec<(i32, f64, bool)>>>()?;

        self.with_conn(move |conn| {
            conn.transaction::<_, Error, _>(|conn| {
                let mut written = 0;
                for (id, coefficient, active) in updates {
                    written += diesel::update(event_prices::table.find(id))
                        .set((
                            event_prices::coefficient.eq(coefficient),
                            event_prices::active.eq(active),
                        ))
                        .execute(conn)?;
                }
                Ok(written)
            })
        })
        .await
    }

    async fn save_scores(&self, scores: &[ScoreSnapshot]) -> Result<usize> {
        let rows = scores
            .iter()
            .map(score_to_row)
            .collect::<Result<Vec<NewScoreRow>>>()?;

        self.with_conn(move |conn| {
            conn.transaction::<_, Error, _>(|conn| {
                let mut written = 0;
                for row in &rows {
                    written += diesel::replace_into(scores::table)
                        .values(row)
                        .execute(conn)?;
                }
                Ok(written)
            })
        })
        .await
    }
}

#[async_trait]
impl ActivationStore for SqliteReferenceStore {
    async fn activate_event_prices(&self) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(diesel::update(event_prices::table)
                .set(event_prices::active.eq(true))
                .execute(conn)?)
        })
        .await
    }

    async fn activate_markets(&self, codes: &[String]) -> Result<usize> {
        let codes = codes.to_vec();
        self.with_conn(move |conn| {
            conn.transaction::<_, Error, _>(|conn| {
                diesel::update(markets::table)
                    .set(markets::active.eq(false))
                    .execute(conn)?;
                Ok(diesel::update(markets::table.filter(markets::code.eq_any(&codes)))
                    .set(markets::active.eq(true))
                    .execute(conn)?)
            })
        })
        .await
    }

    async fn activate_events(&self, codes: &[String]) -> Result<usize> {
        let codes = codes.to_vec();
        self.with_conn(move |conn| {
            conn.transaction::<_, Error, _>(|conn| {
                diesel::update(events::table)
                    .set(events::active.eq(false))
                    .execute(conn)?;
                let activated = diesel::update(events::table.filter(events::code.eq_any(&codes)))
                    .set(events::active.eq(true))
                    .execute(conn)?;

                let ids: Vec<i32> = events::table
                    .filter(events::active.eq(true))
                    .select(events::id)
                    .load(conn)?;
                for id in ids {
                    let row = score_to_row(&ScoreSnapshot::kickoff(EventId::new(id)))?;
                    diesel::replace_into(scores::table)
                        .values(&row)
                        .execute(conn)?;
                }
                Ok(activated)
            })
        })
        .await
    }

    async fn list_active_events(&self) -> Result<Vec<EventSummary>> {
        self.with_conn(|conn| {
            let rows: Vec<(i32, String, String)> = events::table
                .filter(events::active.eq(true))
                .order(events::id.asc())
                .select((events::id, events::code, events::name))
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(|(id, code, name)| EventSummary {
                    id: EventId::new(id),
                    code,
                    name,
                })
                .collect())
        })
        .await
    }
}
