//! Builders for domain primitives used across tests.
//!
//! Every event built here is a football match in England's Premier League
//! and every market sits in the `MAIN` collection, so tests only spell out
//! the ids and codes they assert on.

use rust_decimal_macros::dec;

use crate::domain::{
    Competition, Country, Event, EventId, EventPriceId, EventPriceRecord, EventPriceState, Market,
    MarketCollection, Price, PriceId, Sport, Team,
};

/// Football sport row.
pub fn football() -> Sport {
    Sport {
        id: 1,
        name: "Football".into(),
        code: "FB".into(),
    }
}

/// Active event `id` with two placeholder teams.
pub fn demo_event(id: i32, code: &str, name: &str) -> Event {
    Event {
        id: EventId::new(id),
        code: code.to_string(),
        name: name.to_string(),
        active: true,
        competition: Competition {
            id: 1,
            name: "Premier League".into(),
            country: Country {
                id: 1,
                name: "England".into(),
                code: "ENG".into(),
                sport: football(),
            },
        },
        teams: vec![
            Team {
                id: id * 2 - 1,
                name: format!("{code} Home"),
                rating: 80,
            },
            Team {
                id: id * 2,
                name: format!("{code} Away"),
                rating: 78,
            },
        ],
    }
}

/// Active event price at coefficient 2.00 for `price_code` in `market_code`.
pub fn demo_price_record(
    event_price_id: i32,
    event_id: i32,
    price_id: i32,
    price_code: &str,
    market_code: &str,
) -> EventPriceRecord {
    EventPriceRecord {
        state: EventPriceState::new(
            EventPriceId::new(event_price_id),
            EventId::new(event_id),
            PriceId::new(price_id),
            dec!(2.00),
            true,
        ),
        price: Price {
            id: PriceId::new(price_id),
            code: price_code.to_string(),
            name: price_code.to_string(),
            market: Market {
                id: 1,
                code: market_code.to_string(),
                name: market_code.to_string(),
                collection: MarketCollection {
                    id: 1,
                    name: "Main".into(),
                    code: "MAIN".into(),
                },
            },
        },
    }
}
