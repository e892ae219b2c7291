//! Demo reference data: five football matches priced on seven markets.
//!
//! [`demo_catalog`] and [`seed_demo`] assign ids the same way, so a seeded
//! database and the in-memory catalog describe identical rows.

use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::database::schema::{
    competitions, countries, event_prices, event_teams, events, market_collections, markets,
    prices, scores, sports, teams,
};
use crate::domain::{
    Competition, Country, Event, EventId, EventPriceId, EventPriceRecord, EventPriceState,
    Market, MarketCollection, Price, PriceId, Sport, Team,
};

pub struct DemoTeam {
    pub name: &'static str,
    pub rating: i32,
    pub country: &'static str,
}

pub struct DemoEvent {
    pub code: &'static str,
    pub name: &'static str,
    pub competition: &'static str,
    pub country: &'static str,
    pub teams: [&'static str; 2],
}

pub struct DemoPrice {
    pub code: &'static str,
    pub name: &'static str,
    pub coefficient: Decimal,
}

pub struct DemoMarket {
    pub code: &'static str,
    pub name: &'static str,
    pub collection: &'static str,
    pub prices: &'static [DemoPrice],
}

const fn price(code: &'static str, name: &'static str, coefficient: Decimal) -> DemoPrice {
    DemoPrice {
        code,
        name,
        coefficient,
    }
}

pub const SPORT: (&str, &str) = ("Football", "FB");

/// (name, code)
pub static COUNTRIES: [(&str, &str); 6] = [
    ("England", "ENG"),
    ("Europe", "EUR"),
    ("Italy", "ITA"),
    ("France", "FRA"),
    ("Spain", "ESP"),
    ("Germany", "GER"),
];

pub static TEAMS: [DemoTeam; 9] = [
    DemoTeam { name: "Man Utd", rating: 84, country: "ENG" },
    DemoTeam { name: "Arsenal", rating: 85, country: "ENG" },
    DemoTeam { name: "Barcelona", rating: 86, country: "ESP" },
    DemoTeam { name: "Bayern", rating: 87, country: "GER" },
    DemoTeam { name: "Juventus", rating: 83, country: "ITA" },
    DemoTeam { name: "Milan", rating: 82, country: "ITA" },
    DemoTeam { name: "PSG", rating: 86, country: "FRA" },
    DemoTeam { name: "Marseille", rating: 79, country: "FRA" },
    DemoTeam { name: "Real Madrid", rating: 88, country: "ESP" },
];

pub static EVENTS: [DemoEvent; 5] = [
    DemoEvent {
        code: "MA",
        name: "Man Utd vs Arsenal",
        competition: "Premier League",
        country: "ENG",
        teams: ["Man Utd", "Arsenal"],
    },
    DemoEvent {
        code: "BB",
        name: "Barcelona vs Bayern",
        competition: "Champions League",
        country: "EUR",
        teams: ["Barcelona", "Bayern"],
    },
    DemoEvent {
        code: "JM",
        name: "Juventus vs Milan",
        competition: "Serie A",
        country: "ITA",
        teams: ["Juventus", "Milan"],
    },
    DemoEvent {
        code: "PM",
        name: "PSG vs Marseille",
        competition: "Ligue 1",
        country: "FRA",
        teams: ["PSG", "Marseille"],
    },
    DemoEvent {
        code: "RB",
        name: "Real Madrid vs Barcelona",
        competition: "LaLiga",
        country: "ESP",
        teams: ["Real Madrid", "Barcelona"],
    },
];

/// (name, code)
pub static COLLECTIONS: [(&str, &str); 2] = [("Main", "MAIN"), ("Goals", "GOALS")];

pub static MARKETS: [DemoMarket; 7] = [
    DemoMarket {
        code: "1X2",
        name: "Match Result",
        collection: "MAIN",
        prices: &[
            price("1", "Home", dec!(2.10)),
            price("X", "Draw", dec!(3.20)),
            price("2", "Away", dec!(3.40)),
        ],
    },
    DemoMarket {
        code: "BTTS",
        name: "Both Teams To Score",
        collection: "GOALS",
        prices: &[
            price("BTTS_Y", "Yes", dec!(1.85)),
            price("BTTS_N", "No", dec!(1.95)),
        ],
    },
    DemoMarket {
        code: "OU5",
        name: "Over/Under 0.5",
        collection: "GOALS",
        prices: &[
            price("O5", "Over 0.5", dec!(1.05)),
            price("U5", "Under 0.5", dec!(8.00)),
        ],
    },
    DemoMarket {
        code: "OU15",
        name: "Over/Under 1.5",
        collection: "GOALS",
        prices: &[
            price("O15", "Over 1.5", dec!(1.25)),
            price("U15", "Under 1.5", dec!(3.75)),
        ],
    },
    DemoMarket {
        code: "OU25",
        name: "Over/Under 2.5",
        collection: "GOALS",
        prices: &[
            price("O25", "Over 2.5", dec!(1.85)),
            price("U25", "Under 2.5", dec!(1.95)),
        ],
    },
    DemoMarket {
        code: "OU35",
        name: "Over/Under 3.5",
        collection: "GOALS",
        prices: &[
            price("O35", "Over 3.5", dec!(2.75)),
            price("U35", "Under 3.5", dec!(1.40)),
        ],
    },
    DemoMarket {
        code: "OU45",
        name: "Over/Under 4.5",
        collection: "GOALS",
        prices: &[
            price("O45", "Over 4.5", dec!(4.50)),
            price("U45", "Under 4.5", dec!(1.18)),
        ],
    },
];

/// Prices offered on every demo event.
pub const PRICES_PER_EVENT: usize = 15;

/// Event codes of the demo catalog.
#[must_use]
pub fn event_codes() -> Vec<String> {
    EVENTS.iter().map(|event| event.code.to_string()).collect()
}

/// Market codes of the demo catalog.
#[must_use]
pub fn market_codes() -> Vec<String> {
    MARKETS.iter().map(|market| market.code.to_string()).collect()
}

fn row_id(index: usize) -> i32 {
    i32::try_from(index + 1).unwrap_or(i32::MAX)
}

fn position<T>(items: &[T], matches: impl Fn(&T) -> bool) -> usize {
    items.iter().position(matches).unwrap_or_default()
}

fn country_index(code: &str) -> usize {
    position(&COUNTRIES, |(_, c)| *c == code)
}

fn team_index(name: &str) -> usize {
    position(&TEAMS, |team| team.name == name)
}

fn collection_index(code: &str) -> usize {
    position(&COLLECTIONS, |(_, c)| *c == code)
}

/// Every demo price with its market index, in id order.
fn flat_prices() -> impl Iterator<Item = (usize, &'static DemoPrice)> {
    MARKETS
        .iter()
        .enumerate()
        .flat_map(|(market, demo)| demo.prices.iter().map(move |price| (market, price)))
}

fn domain_price(price_index: usize, market_index: usize, demo: &DemoPrice) -> Price {
    let market = &MARKETS[market_index];
    let collection = COLLECTIONS[collection_index(market.collection)];
    Price {
        id: PriceId::new(row_id(price_index)),
        code: demo.code.to_string(),
        name: demo.name.to_string(),
        market: Market {
            id: row_id(market_index),
            code: market.code.to_string(),
            name: market.name.to_string(),
            collection: MarketCollection {
                id: row_id(collection_index(market.collection)),
                name: collection.0.to_string(),
                code: collection.1.to_string(),
            },
        },
    }
}

fn event_price_id(event_index: usize, price_index: usize) -> EventPriceId {
    EventPriceId::new(row_id(event_index * PRICES_PER_EVENT + price_index))
}

/// The demo data as domain objects, all active.
#[must_use]
pub fn demo_catalog() -> (Vec<Event>, Vec<EventPriceRecord>) {
    let sport = Sport {
        id: 1,
        name: SPORT.0.to_string(),
        code: SPORT.1.to_string(),
    };

    let events: Vec<Event> = EVENTS
        .iter()
        .enumerate()
        .map(|(index, demo)| {
            let country_index = country_index(demo.country);
            let (country_name, country_code) = COUNTRIES[country_index];
            Event {
                id: EventId::new(row_id(index)),
                code: demo.code.to_string(),
                name: demo.name.to_string(),
                active: true,
                competition: Competition {
                    id: row_id(index),
                    name: demo.competition.to_string(),
                    country: Country {
                        id: row_id(country_index),
                        name: country_name.to_string(),
                        code: country_code.to_string(),
                        sport: sport.clone(),
                    },
                },
                teams: demo
                    .teams
                    .iter()
                    .map(|name| {
                        let team_index = team_index(name);
                        Team {
                            id: row_id(team_index),
                            name: TEAMS[team_index].name.to_string(),
                            rating: TEAMS[team_index].rating,
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    let mut records = Vec::with_capacity(events.len() * PRICES_PER_EVENT);
    for (event_index, event) in events.iter().enumerate() {
        for (price_index, (market_index, demo)) in flat_prices().enumerate() {
            let price = domain_price(price_index, market_index, demo);
            records.push(EventPriceRecord {
                state: EventPriceState::new(
                    event_price_id(event_index, price_index),
                    event.id,
                    price.id,
                    demo.coefficient,
                    true,
                ),
                price,
            });
        }
    }

    (events, records)
}

/// Rows inserted by [`seed_demo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub events: usize,
    pub markets: usize,
    pub event_prices: usize,
    /// The database already had events, so nothing was written.
    pub skipped: bool,
}

/// Write the demo catalog into an empty database in one transaction.
///
/// A database that already holds events is left untouched.
pub fn seed_demo(conn: &mut SqliteConnection) -> QueryResult<SeedReport> {
    conn.transaction(|conn| {
        let existing: i64 = events::table.count().get_result(conn)?;
        if existing > 0 {
            return Ok(SeedReport {
                skipped: true,
                ..SeedReport::default()
            });
        }

        diesel::insert_into(sports::table)
            .values((
                sports::id.eq(1),
                sports::name.eq(SPORT.0),
                sports::code.eq(SPORT.1),
            ))
            .execute(conn)?;

        for (index, (name, code)) in COUNTRIES.iter().enumerate() {
            diesel::insert_into(countries::table)
                .values((
                    countries::id.eq(row_id(index)),
                    countries::name.eq(*name),
                    countries::code.eq(*code),
                    countries::sport_id.eq(1),
                ))
                .execute(conn)?;
        }

        for (index, team) in TEAMS.iter().enumerate() {
            diesel::insert_into(teams::table)
                .values((
                    teams::id.eq(row_id(index)),
                    teams::name.eq(team.name),
                    teams::rating.eq(team.rating),
                    teams::country_id.eq(row_id(country_index(team.country))),
                ))
                .execute(conn)?;
        }

        for (index, event) in EVENTS.iter().enumerate() {
            let id = row_id(index);
            diesel::insert_into(competitions::table)
                .values((
                    competitions::id.eq(id),
                    competitions::name.eq(event.competition),
                    competitions::country_id.eq(row_id(country_index(event.country))),
                ))
                .execute(conn)?;
            diesel::insert_into(events::table)
                .values((
                    events::id.eq(id),
                    events::code.eq(event.code),
                    events::name.eq(event.name),
                    events::competition_id.eq(id),
                    events::active.eq(true),
                ))
                .execute(conn)?;
            for (slot, team) in event.teams.iter().enumerate() {
                diesel::insert_into(event_teams::table)
                    .values((
                        event_teams::event_id.eq(id),
                        event_teams::team_id.eq(row_id(team_index(team))),
                        event_teams::position.eq(row_id(slot)),
                    ))
                    .execute(conn)?;
            }
            diesel::insert_into(scores::table)
                .values((
                    scores::event_id.eq(id),
                    scores::team1_score.eq(0),
                    scores::team2_score.eq(0),
                    scores::total.eq(0),
                ))
                .execute(conn)?;
        }

        for (index, (name, code)) in COLLECTIONS.iter().enumerate() {
            diesel::insert_into(market_collections::table)
                .values((
                    market_collections::id.eq(row_id(index)),
                    market_collections::name.eq(*name),
                    market_collections::code.eq(*code),
                ))
                .execute(conn)?;
        }

        for (index, market) in MARKETS.iter().enumerate() {
            diesel::insert_into(markets::table)
                .values((
                    markets::id.eq(row_id(index)),
                    markets::code.eq(market.code),
                    markets::name.eq(market.name),
                    markets::collection_id.eq(row_id(collection_index(market.collection))),
                    markets::active.eq(true),
                ))
                .execute(conn)?;
        }

        for (index, (market_index, demo)) in flat_prices().enumerate() {
            diesel::insert_into(prices::table)
                .values((
                    prices::id.eq(row_id(index)),
                    prices::code.eq(demo.code),
                    prices::name.eq(demo.name),
                    prices::market_id.eq(row_id(market_index)),
                    prices::active.eq(true),
                ))
                .execute(conn)?;
        }

        let mut event_price_count = 0;
        for event_index in 0..EVENTS.len() {
            for (price_index, (_, demo)) in flat_prices().enumerate() {
                diesel::insert_into(event_prices::table)
                    .values((
                        event_prices::id.eq(event_price_id(event_index, price_index).get()),
                        event_prices::event_id.eq(row_id(event_index)),
                        event_prices::price_id.eq(row_id(price_index)),
                        event_prices::coefficient.eq(demo.coefficient.to_f64().unwrap_or(1.0)),
                        event_prices::active.eq(true),
                    ))
                    .execute(conn)?;
                event_price_count += 1;
            }
        }

        Ok(SeedReport {
            events: EVENTS.len(),
            markets: MARKETS.len(),
            event_prices: event_price_count,
            skipped: false,
        })
    })
}
