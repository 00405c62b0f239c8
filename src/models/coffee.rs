use serde::{Deserialize, Serialize};

use super::OrderedMap;

/// Price list keyed by coffee name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoffeePrices(OrderedMap<f64>);

impl CoffeePrices {
    #[must_use]
    pub const fn new(prices: OrderedMap<f64>) -> Self {
        Self(prices)
    }

    /// Unknown drinks cost nothing.
    #[must_use]
    pub fn price_of(&self, coffee: &str) -> f64 {
        self.0.get(coffee).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn contains(&self, coffee: &str) -> bool {
        self.0.contains_key(coffee)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, price)| (name, *price))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for CoffeePrices {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
