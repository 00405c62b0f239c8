//! Domain service for the coffee fund: rounds, purchases and the views
//! built on the ledger.
//!
//! The document-level operations ([`apply_round`], [`apply_purchase`]) are
//! plain functions over loaded documents; [`FundService`] implementations wrap
//! them in a locked load/apply/save cycle.

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::constants::ROUND_SENTINEL;
use crate::db::PublicUser;
use crate::models::{CoffeePrices, HistoryDocument, HistoryEntry, OrderedMap, UsersDocument};
use crate::services::ledger::{self, Reconciliation, SpendTotals};

/// Errors specific to fund operations.
#[derive(Debug, Error)]
pub enum FundError {
    #[error("No users exist to pay for a round")]
    NoPayer,

    #[error("User not found: {0}")]
    UnknownUser(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for FundError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(format!("{err:#}"))
    }
}

/// Outcome of a settled round.
#[derive(Debug, Clone, Serialize)]
pub struct SettledRound {
    pub payer: String,
    pub cost: f64,
    pub participants: OrderedMap<String>,
    pub payer_total_spent: f64,
    pub entry: HistoryEntry,
}

/// Outcome of a single recorded purchase.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedPurchase {
    pub username: String,
    pub coffee: String,
    pub price: f64,
    pub total_spent: f64,
    pub entry: HistoryEntry,
}

/// Everything the home page shows for one signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub coffee_prices: CoffeePrices,
    pub history: Vec<HistoryEntry>,
    /// Derived from this user's own history.
    pub total_spent: f64,
    pub spend_totals: SpendTotals,
    /// A username, or `"No data"` when there are no users.
    pub current_payer: String,
    pub round_cost: f64,
    pub payment_rule: &'static str,
    pub favorite: Option<String>,
    pub users: Vec<PublicUser>,
}

/// Charges the least-spent user for every participant's favorite.
///
/// Fails before touching either document if there is no payer.
pub fn apply_round(
    users: &mut UsersDocument,
    history: &mut HistoryDocument,
    prices: &CoffeePrices,
    now: DateTime<Local>,
) -> Result<SettledRound, FundError> {
    let payer = ledger::determine_payer(users, history, prices).ok_or(FundError::NoPayer)?;
    let participants = ledger::round_participants(users);
    let cost = ledger::round_cost(&participants, prices);

    let record = users
        .get_mut(&payer)
        .ok_or_else(|| FundError::UnknownUser(payer.clone()))?;
    record.total_spent += cost;
    let payer_total_spent = record.total_spent;

    let entry = HistoryEntry::round(&payer, participants.clone(), now);
    history
        .get_or_insert_with(&payer, Vec::new)
        .push(entry.clone());

    Ok(SettledRound {
        payer,
        cost,
        participants,
        payer_total_spent,
        entry,
    })
}

/// Logs one drink bought by `username` and adds its price to their total.
///
/// Unknown users are rejected before either document changes.
pub fn apply_purchase(
    users: &mut UsersDocument,
    history: &mut HistoryDocument,
    prices: &CoffeePrices,
    username: &str,
    coffee: &str,
    now: DateTime<Local>,
) -> Result<RecordedPurchase, FundError> {
    if coffee.trim().is_empty() {
        return Err(FundError::Validation("Coffee name is required".to_string()));
    }
    if coffee.trim().eq_ignore_ascii_case(ROUND_SENTINEL) {
        return Err(FundError::Validation(format!(
            "'{coffee}' is reserved for settled rounds"
        )));
    }

    let record = users
        .get_mut(username)
        .ok_or_else(|| FundError::UnknownUser(username.to_string()))?;
    let price = prices.price_of(coffee);
    record.total_spent += price;
    let total_spent = record.total_spent;

    let entry = HistoryEntry::purchase(username, coffee, now);
    history
        .get_or_insert_with(username, Vec::new)
        .push(entry.clone());

    Ok(RecordedPurchase {
        username: username.to_string(),
        coffee: coffee.to_string(),
        price,
        total_spent,
        entry,
    })
}

/// Domain service trait for the fund.
#[async_trait::async_trait]
pub trait FundService: Send + Sync {
    async fn coffee_prices(&self) -> Result<CoffeePrices, FundError>;

    /// Derived totals for every user.
    async fn spend_totals(&self) -> Result<SpendTotals, FundError>;

    /// `None` when there are no users.
    async fn next_payer(&self) -> Result<Option<String>, FundError>;

    /// Settles a round for everyone with a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`FundError::NoPayer`] when there are no users; nothing is written.
    async fn settle_round(&self) -> Result<SettledRound, FundError>;

    /// Records a purchase by an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`FundError::UnknownUser`] if the user does not exist; nothing is written.
    async fn record_purchase(
        &self,
        username: &str,
        coffee: &str,
    ) -> Result<RecordedPurchase, FundError>;

    /// Sets or clears (`None`) a user's favorite. Only listed coffees are accepted.
    async fn update_favorite(
        &self,
        username: &str,
        favorite: Option<String>,
    ) -> Result<PublicUser, FundError>;

    async fn history_for(&self, username: &str) -> Result<Vec<HistoryEntry>, FundError>;

    async fn reconcile(&self) -> Result<Reconciliation, FundError>;

    async fn dashboard(&self, username: &str) -> Result<Dashboard, FundError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    fn prices() -> CoffeePrices {
        [("latte", 3.5), ("espresso", 2.0)].into_iter().collect()
    }

    fn user(total: f64, favorite: Option<&str>) -> UserRecord {
        let mut record = UserRecord::new("hash".to_string(), favorite.map(str::to_string));
        record.total_spent = total;
        record
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn round_charges_least_spent_user() {
        let mut users = UsersDocument::new();
        users.insert("A", user(0.0, Some("latte")));
        users.insert("B", user(10.0, Some("espresso")));
        let mut history = HistoryDocument::new();

        let settled = apply_round(&mut users, &mut history, &prices(), Local::now()).unwrap();

        assert_eq!(settled.payer, "A");
        assert!(approx(settled.cost, 5.5));
        assert!(approx(users.get("A").unwrap().total_spent, 5.5));
        assert!(approx(users.get("B").unwrap().total_spent, 10.0));

        let entries = history.get("A").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_round());
        let participants = entries[0].participants.as_ref().unwrap();
        assert_eq!(participants.get("A").map(String::as_str), Some("latte"));
        assert_eq!(participants.get("B").map(String::as_str), Some("espresso"));
    }

    #[test]
    fn round_without_users_changes_nothing() {
        let mut users = UsersDocument::new();
        let mut history = HistoryDocument::new();

        let err = apply_round(&mut users, &mut history, &prices(), Local::now()).unwrap_err();
        assert!(matches!(err, FundError::NoPayer));
        assert!(history.is_empty());
    }

    #[test]
    fn round_with_no_participants_costs_nothing() {
        let mut users = UsersDocument::new();
        users.insert("A", user(0.0, None));
        let mut history = HistoryDocument::new();

        let settled = apply_round(&mut users, &mut history, &prices(), Local::now()).unwrap();
        assert!(approx(settled.cost, 0.0));
        assert!(settled.participants.is_empty());
        assert_eq!(history.get("A").unwrap().len(), 1);
    }

    #[test]
    fn purchase_adds_price_and_one_entry() {
        let mut users = UsersDocument::new();
        users.insert("A", user(1.0, None));
        let mut history = HistoryDocument::new();

        let recorded =
            apply_purchase(&mut users, &mut history, &prices(), "A", "latte", Local::now()).unwrap();

        assert!(approx(recorded.price, 3.5));
        assert!(approx(users.get("A").unwrap().total_spent, 4.5));
        let entries = history.get("A").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].coffee, "latte");
    }

    #[test]
    fn unknown_coffee_still_logged() {
        let mut users = UsersDocument::new();
        users.insert("A", user(2.0, None));
        let mut history = HistoryDocument::new();

        apply_purchase(
            &mut users,
            &mut history,
            &prices(),
            "A",
            "mystery-brew",
            Local::now(),
        )
        .unwrap();

        assert!(approx(users.get("A").unwrap().total_spent, 2.0));
        assert_eq!(history.get("A").unwrap().len(), 1);
    }

    #[test]
    fn purchase_by_unknown_user_changes_nothing() {
        let mut users = UsersDocument::new();
        users.insert("A", user(0.0, None));
        let mut history = HistoryDocument::new();

        let err = apply_purchase(
            &mut users,
            &mut history,
            &prices(),
            "ghost",
            "latte",
            Local::now(),
        )
        .unwrap_err();

        assert!(matches!(err, FundError::UnknownUser(name) if name == "ghost"));
        assert!(history.is_empty());
    }

    #[test]
    fn round_marker_is_not_a_coffee() {
        let mut users = UsersDocument::new();
        users.insert("A", user(0.0, None));
        let mut history = HistoryDocument::new();

        let err = apply_purchase(
            &mut users,
            &mut history,
            &prices(),
            "A",
            "Paid For Round",
            Local::now(),
        )
        .unwrap_err();

        assert!(matches!(err, FundError::Validation(_)));
        assert!(history.is_empty());
        assert!(approx(users.get("A").unwrap().total_spent, 0.0));
    }

    #[test]
    fn payer_rotates_as_totals_diverge() {
        let mut users = UsersDocument::new();
        users.insert("A", user(0.0, Some("latte")));
        users.insert("B", user(0.0, Some("espresso")));
        let mut history = HistoryDocument::new();
        let prices = prices();

        let mut payers = Vec::new();
        for _ in 0..6 {
            let before = ledger::compute_spend_totals(&users, &history, &prices);
            let settled = apply_round(&mut users, &mut history, &prices, Local::now()).unwrap();
            let paid_from = before.get(&settled.payer).copied().unwrap();
            assert!(before.values().all(|v| *v >= paid_from));
            payers.push(settled.payer);
        }

        assert_eq!(payers, vec!["A", "B", "A", "B", "A", "B"]);
    }
}
