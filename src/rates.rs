// Exchange rate snapshot entity.
// An immutable mapping of currency code to rate against an implicit base currency.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One mapping of currency code to rate, valid at one capture instant.
///
/// Equality is structural: two snapshots are equal when they hold the same
/// codes with the same rates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExchangeRates {
    rates: BTreeMap<String, f64>,
}

/// One converted amount produced by [`ExchangeRates::convert`].
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub currency: String,
    pub amount: f64,
}

impl ExchangeRates {
    pub fn new(rates: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Rate for a currency code, if present.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Iterate over `(code, rate)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Currency codes in sorted order.
    pub fn currency_codes(&self) -> Vec<&str> {
        self.rates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Convert `amount` of `from` into every known currency, sorted by code.
    ///
    /// Returns an empty list when `from` is unknown or its rate is not positive.
    pub fn convert(&self, amount: f64, from: &str) -> Vec<Conversion> {
        let Some(source_rate) = self.rate(from).filter(|rate| *rate > 0.0) else {
            return Vec::new();
        };

        self.iter()
            .map(|(currency, rate)| Conversion {
                currency: currency.to_string(),
                amount: amount / source_rate * rate,
            })
            .collect()
    }
}

impl FromIterator<(String, f64)> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<const N: usize> From<[(&str, f64); N]> for ExchangeRates {
    fn from(pairs: [(&str, f64); N]) -> Self {
        pairs
            .into_iter()
            .map(|(code, rate)| (code.to_string(), rate))
            .collect()
    }
}
