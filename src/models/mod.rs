use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Price movement relative to the previous observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Initial,
    Up,
    Down,
    Same,
}

impl Trend {
    /// Classify `price` against the last logged price.
    pub fn classify(price: Decimal, last_price: Option<Decimal>) -> Self {
        match last_price {
            None => Trend::Initial,
            Some(last) if price > last => Trend::Up,
            Some(last) if price < last => Trend::Down,
            Some(_) => Trend::Same,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Initial => "initial",
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Same => "same",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Trend::Initial),
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            "same" => Ok(Trend::Same),
            other => Err(format!("unknown movement '{}'", other)),
        }
    }
}

/// One logged price observation. Never mutated once written.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Local>,
    pub price: Decimal,
    pub trend: Trend,
}

/// State carried across poll-loop iterations
#[derive(Debug, Clone)]
pub struct DaemonState {
    /// Price of the last successfully written row.
    pub last_price: Option<Decimal>,
    pub last_heartbeat: Instant,
}

impl DaemonState {
    pub fn new(now: Instant) -> Self {
        Self {
            last_price: None,
            last_heartbeat: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_first_observation_is_initial() {
        assert_eq!(Trend::classify(dec("100.0"), None), Trend::Initial);
    }

    #[test]
    fn test_trend_follows_sign_of_difference() {
        let prices = ["100.0", "105.0", "105.00", "99.5", "99.5", "120"];
        let expected = [
            Trend::Initial,
            Trend::Up,
            Trend::Same,
            Trend::Down,
            Trend::Same,
            Trend::Up,
        ];

        let mut last = None;
        for (price, want) in prices.iter().zip(expected.iter()) {
            let price = dec(price);
            assert_eq!(Trend::classify(price, last), *want, "price {}", price);
            last = Some(price);
        }
    }

    #[test]
    fn test_zero_previous_price_still_compares() {
        assert_eq!(Trend::classify(dec("1"), Some(Decimal::ZERO)), Trend::Up);
    }

    #[test]
    fn test_trend_text_roundtrip() {
        for trend in [Trend::Initial, Trend::Up, Trend::Down, Trend::Same] {
            assert_eq!(trend.to_string().parse::<Trend>().unwrap(), trend);
        }
        assert!("sideways".parse::<Trend>().is_err());
    }
}
