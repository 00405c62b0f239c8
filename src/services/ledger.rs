//! Spend totals and payer rotation, derived fresh from the documents.
//!
//! Everything here is a pure function of its inputs; callers load the
//! documents and decide what to persist.

use serde::Serialize;

use crate::models::{CoffeePrices, HistoryDocument, HistoryEntry, OrderedMap, UsersDocument};

/// Username -> amount, in `users` document order.
pub type SpendTotals = OrderedMap<f64>;

/// Stored totals may differ from derived ones by float noise only.
const DRIFT_TOLERANCE: f64 = 1e-9;

/// What one history entry costs the user who made it.
#[must_use]
pub fn entry_cost(entry: &HistoryEntry, prices: &CoffeePrices) -> f64 {
    if entry.is_round() {
        entry
            .participants
            .as_ref()
            .map_or(0.0, |participants| round_cost(participants, prices))
    } else {
        prices.price_of(&entry.coffee)
    }
}

/// Derived spend per known user.
///
/// Every user starts at `0.0`. Entries whose `user` is not in `users` are
/// skipped here and surfaced by [`reconcile`] instead.
#[must_use]
pub fn compute_spend_totals(
    users: &UsersDocument,
    history: &HistoryDocument,
    prices: &CoffeePrices,
) -> SpendTotals {
    let mut totals: SpendTotals = users.keys().map(|name| (name, 0.0)).collect();

    for entry in history.values().flatten() {
        if let Some(total) = totals.get_mut(&entry.user) {
            *total += entry_cost(entry, prices);
        }
    }

    totals
}

/// The user with the lowest total; the earliest one wins a tie.
#[must_use]
pub fn determine_next_payer(totals: &SpendTotals) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (name, amount) in totals.iter() {
        if best.is_none_or(|(_, lowest)| *amount < lowest) {
            best = Some((name, *amount));
        }
    }
    best.map(|(name, _)| name)
}

#[must_use]
pub fn determine_payer(
    users: &UsersDocument,
    history: &HistoryDocument,
    prices: &CoffeePrices,
) -> Option<String> {
    let totals = compute_spend_totals(users, history, prices);
    determine_next_payer(&totals).map(str::to_string)
}

/// Every user with a favorite, mapped to that favorite.
#[must_use]
pub fn round_participants(users: &UsersDocument) -> OrderedMap<String> {
    users
        .iter()
        .filter(|(_, record)| record.is_participant())
        .filter_map(|(name, record)| record.favorite.clone().map(|favorite| (name, favorite)))
        .collect()
}

#[must_use]
pub fn round_cost(participants: &OrderedMap<String>, prices: &CoffeePrices) -> f64 {
    participants
        .values()
        .map(|favorite| prices.price_of(favorite))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBalance {
    pub username: String,
    pub stored: f64,
    pub derived: f64,
}

impl UserBalance {
    #[must_use]
    pub fn drift(&self) -> f64 {
        self.stored - self.derived
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.drift().abs() <= DRIFT_TOLERANCE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    pub balances: Vec<UserBalance>,
    /// Usernames that appear in `history` but not in `users`.
    pub orphans: Vec<String>,
}

impl Reconciliation {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.orphans.is_empty() && self.balances.iter().all(UserBalance::is_consistent)
    }
}

/// Compares each stored `total_spent` with the total derived from history.
#[must_use]
pub fn reconcile(
    users: &UsersDocument,
    history: &HistoryDocument,
    prices: &CoffeePrices,
) -> Reconciliation {
    let totals = compute_spend_totals(users, history, prices);

    let balances = users
        .iter()
        .map(|(name, record)| UserBalance {
            username: name.to_string(),
            stored: record.total_spent,
            derived: totals.get(name).copied().unwrap_or(0.0),
        })
        .collect();

    let mut orphans: Vec<String> = Vec::new();
    let referenced = history
        .iter()
        .flat_map(|(owner, entries)| {
            std::iter::once(owner).chain(entries.iter().map(|e| e.user.as_str()))
        });
    for name in referenced {
        if !users.contains_key(name) && !orphans.iter().any(|o| o == name) {
            orphans.push(name.to_string());
        }
    }

    Reconciliation { balances, orphans }
}
