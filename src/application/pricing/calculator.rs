//! Coefficient bands per market family.
//!
//! The score picks a band; the coefficient is the band floor plus a uniform
//! whole-cents jitter below the band span. Nothing here touches shared
//! state, so the random source is passed in.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{MarketFamily, ScoreSnapshot};

/// Half-open coefficient range `[floor, floor + span_cents / 100)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub floor: Decimal,
    pub span_cents: u32,
}

impl Band {
    const fn new(floor: Decimal, span_cents: u32) -> Self {
        Self { floor, span_cents }
    }

    /// Exclusive upper bound.
    #[must_use]
    pub fn ceiling(&self) -> Decimal {
        self.floor + Decimal::new(i64::from(self.span_cents), 2)
    }

    #[must_use]
    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.floor && value < self.ceiling()
    }

    /// Draw a coefficient from the band.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Decimal {
        let cents = if self.span_cents == 0 {
            0
        } else {
            rng.gen_range(0..self.span_cents)
        };
        self.floor + Decimal::new(i64::from(cents), 2)
    }
}

// 1X2
const RESULT_FAVORED: Band = Band::new(dec!(1.10), 50);
const RESULT_UNFAVORED: Band = Band::new(dec!(3.00), 200);
const RESULT_LEVEL: Band = Band::new(dec!(2.00), 100);
const DRAW_LEVEL: Band = Band::new(dec!(2.50), 100);
const DRAW_NOT_LEVEL: Band = Band::new(dec!(3.00), 150);

// Over/under
const OVER_SETTLED: Band = Band::new(dec!(1.10), 30);
const UNDER_SETTLED: Band = Band::new(dec!(2.50), 150);
const OVER_OPEN: Band = Band::new(dec!(1.80), 60);
const UNDER_OPEN: Band = Band::new(dec!(1.60), 40);

// Both teams to score
const YES_SCORED: Band = Band::new(dec!(1.20), 30);
const NO_SCORED: Band = Band::new(dec!(4.00), 200);
const YES_OPEN: Band = Band::new(dec!(1.80), 60);
const NO_OPEN: Band = Band::new(dec!(1.50), 40);

fn match_result_band(price_code: &str, score: &ScoreSnapshot) -> Option<Band> {
    let diff = score.goal_difference();
    let band = match price_code {
        "1" => match diff.signum() {
            1 => RESULT_FAVORED,
            -1 => RESULT_UNFAVORED,
            _ => RESULT_LEVEL,
        },
        "2" => match diff.signum() {
            -1 => RESULT_FAVORED,
            1 => RESULT_UNFAVORED,
            _ => RESULT_LEVEL,
        },
        "X" if diff == 0 => DRAW_LEVEL,
        "X" => DRAW_NOT_LEVEL,
        _ => return None,
    };
    Some(band)
}

fn over_under_band(family: MarketFamily, price_code: &str, score: &ScoreSnapshot) -> Option<Band> {
    let MarketFamily::OverUnder { line_code } = family else {
        return None;
    };
    let side = price_code.get(..1)?;
    let line = price_code.get(1..)?;
    if line.parse::<u32>().ok()? != line_code {
        return None;
    }
    let settled = score.total() >= family.goals_to_settle()?;
    let band = match (side, settled) {
        ("O", true) => OVER_SETTLED,
        ("O", false) => OVER_OPEN,
        ("U", true) => UNDER_SETTLED,
        ("U", false) => UNDER_OPEN,
        _ => return None,
    };
    Some(band)
}

fn both_teams_band(price_code: &str, score: &ScoreSnapshot) -> Option<Band> {
    let scored = score.both_scored();
    let band = match (price_code, scored) {
        ("BTTS_Y", true) => YES_SCORED,
        ("BTTS_Y", false) => YES_OPEN,
        ("BTTS_N", true) => NO_SCORED,
        ("BTTS_N", false) => NO_OPEN,
        _ => return None,
    };
    Some(band)
}

/// Band for a price of a market given the score.
///
/// `None` for an unsupported market code or a price code that does not
/// belong to the market.
#[must_use]
pub fn band(market_code: &str, price_code: &str, score: &ScoreSnapshot) -> Option<Band> {
    let family = market_code.parse::<MarketFamily>().ok()?;
    match family {
        MarketFamily::MatchResult => match_result_band(price_code, score),
        MarketFamily::OverUnder { .. } => over_under_band(family, price_code, score),
        MarketFamily::BothTeamsToScore => both_teams_band(price_code, score),
    }
}

/// New coefficient for a price, or `None` when there is nothing to publish.
pub fn compute<R: Rng + ?Sized>(
    market_code: &str,
    price_code: &str,
    score: &ScoreSnapshot,
    rng: &mut R,
) -> Option<Decimal> {
    band(market_code, price_code, score).map(|band| band.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn score(team1: u32, team2: u32) -> ScoreSnapshot {
        ScoreSnapshot::new(EventId::new(1), team1, team2)
    }

    fn assert_in_band(market: &str, price: &str, score: &ScoreSnapshot, expected: Band) {
        assert_eq!(band(market, price, score), Some(expected), "{market}/{price}");
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let value = compute(market, price, score, &mut rng).unwrap();
            assert!(expected.contains(value), "{market}/{price} {value} seed {seed}");
            assert_eq!(value.round_dp(2), value);
        }
    }

    #[test]
    fn test_home_leading() {
        let s = score(2, 0);
        assert_in_band("1X2", "1", &s, RESULT_FAVORED);
        assert_in_band("1X2", "2", &s, RESULT_UNFAVORED);
        assert_in_band("1X2", "X", &s, DRAW_NOT_LEVEL);
    }

    #[test]
    fn test_away_leading() {
        let s = score(0, 1);
        assert_in_band("1X2", "1", &s, RESULT_UNFAVORED);
        assert_in_band("1X2", "2", &s, RESULT_FAVORED);
    }

    #[test]
    fn test_level_score() {
        let s = score(1, 1);
        assert_in_band("1X2", "1", &s, RESULT_LEVEL);
        assert_in_band("1X2", "2", &s, RESULT_LEVEL);
        assert_in_band("1X2", "X", &s, DRAW_LEVEL);
    }

    #[test]
    fn test_over_under_settles_past_line() {
        let s = score(2, 1);
        assert_in_band("OU25", "O25", &s, OVER_SETTLED);
        assert_in_band("OU25", "U25", &s, UNDER_SETTLED);
        assert_in_band("OU35", "O35", &s, OVER_OPEN);
        assert_in_band("OU35", "U35", &s, UNDER_OPEN);
    }

    #[test]
    fn test_over_under_lowest_line() {
        assert_in_band("OU5", "O5", &score(0, 0), OVER_OPEN);
        assert_in_band("OU5", "O5", &score(0, 1), OVER_SETTLED);
    }

    #[test]
    fn test_over_settles_exactly_at_goals_to_settle() {
        for code in ["OU5", "OU15", "OU25", "OU35", "OU45"] {
            let family: MarketFamily = code.parse().unwrap();
            let goals = family.goals_to_settle().unwrap();
            let over = format!("O{}", &code[2..]);

            let before = score(goals - 1, 0);
            let at = score(goals, 0);
            assert_eq!(band(code, &over, &before), Some(OVER_OPEN), "{code} before");
            assert_eq!(band(code, &over, &at), Some(OVER_SETTLED), "{code} at");
        }
    }

    #[test]
    fn test_both_teams_to_score() {
        assert_in_band("BTTS", "BTTS_Y", &score(1, 0), YES_OPEN);
        assert_in_band("BTTS", "BTTS_N", &score(1, 0), NO_OPEN);
        assert_in_band("BTTS", "BTTS_Y", &score(1, 2), YES_SCORED);
        assert_in_band("BTTS", "BTTS_N", &score(1, 2), NO_SCORED);
    }

    #[test]
    fn test_unknown_codes_are_noop() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = score(1, 0);
        assert_eq!(compute("CS", "1-0", &s, &mut rng), None);
        assert_eq!(compute("1X2", "O5", &s, &mut rng), None);
        assert_eq!(compute("OU25", "O15", &s, &mut rng), None);
        assert_eq!(compute("OU25", "X25", &s, &mut rng), None);
        assert_eq!(compute("BTTS", "1", &s, &mut rng), None);
    }

    #[test]
    fn test_same_seed_same_coefficient() {
        let s = score(1, 0);
        let a = compute("1X2", "1", &s, &mut StdRng::seed_from_u64(42));
        let b = compute("1X2", "1", &s, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_band_ceiling() {
        assert_eq!(RESULT_FAVORED.ceiling(), dec!(1.60));
        assert!(!RESULT_FAVORED.contains(dec!(1.60)));
        assert!(RESULT_FAVORED.contains(dec!(1.59)));
    }
}
