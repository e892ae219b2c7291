//! Domain identifier types.
//!
//! Reference rows are keyed by integer primary keys. Wrapping them keeps an
//! event id from being passed where a price id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw row id.
            #[must_use]
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

row_id!(
    /// Identifier of a simulated event (match).
    EventId
);

row_id!(
    /// Identifier of a price (one proposition within a market).
    PriceId
);

row_id!(
    /// Identifier of an event/price pair, the unit that carries a coefficient.
    ///
    /// Published to subscribers as `coefficient_id`.
    EventPriceId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&EventId::new(7)).unwrap();
        assert_eq!(json, "7");

        let back: PriceId = serde_json::from_str("42").unwrap();
        assert_eq!(back, PriceId::new(42));
    }

    #[test]
    fn display_matches_raw_value() {
        assert_eq!(EventPriceId::new(3).to_string(), "3");
        assert_eq!(EventId::from(12).get(), 12);
    }
}
