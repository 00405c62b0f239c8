//! JSON document store implementation of the `FundService` trait.

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, warn};

use crate::constants::NO_PAYER;
use crate::db::{PublicUser, Store};
use crate::models::{CoffeePrices, HistoryEntry};
use crate::services::fund_service::{
    Dashboard, FundError, FundService, RecordedPurchase, SettledRound, apply_purchase,
    apply_round,
};
use crate::services::ledger::{self, Reconciliation, SpendTotals};

pub struct JsonFundService {
    store: Store,
}

impl JsonFundService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FundService for JsonFundService {
    async fn coffee_prices(&self) -> Result<CoffeePrices, FundError> {
        Ok(self.store.load_prices().await?)
    }

    async fn spend_totals(&self) -> Result<SpendTotals, FundError> {
        let users = self.store.load_users().await?;
        let history = self.store.load_history().await?;
        let prices = self.store.load_prices().await?;
        Ok(ledger::compute_spend_totals(&users, &history, &prices))
    }

    async fn next_payer(&self) -> Result<Option<String>, FundError> {
        let totals = self.spend_totals().await?;
        Ok(ledger::determine_next_payer(&totals).map(str::to_string))
    }

    async fn settle_round(&self) -> Result<SettledRound, FundError> {
        let _guard = self.store.lock_writes().await;

        let mut users = self.store.load_users().await?;
        let mut history = self.store.load_history().await?;
        let prices = self.store.load_prices().await?;

        let settled = apply_round(&mut users, &mut history, &prices, Local::now())?;
        self.store.save_ledger(&users, &history).await?;

        metrics::counter!("coffeefund_rounds_settled_total").increment(1);
        info!(
            payer = %settled.payer,
            cost = settled.cost,
            participants = settled.participants.len(),
            "Round settled"
        );

        Ok(settled)
    }

    async fn record_purchase(
        &self,
        username: &str,
        coffee: &str,
    ) -> Result<RecordedPurchase, FundError> {
        let _guard = self.store.lock_writes().await;

        let mut users = self.store.load_users().await?;
        let mut history = self.store.load_history().await?;
        let prices = self.store.load_prices().await?;

        if !prices.contains(coffee) {
            warn!("Recording purchase of unlisted coffee '{coffee}' at no cost");
        }

        let recorded = apply_purchase(
            &mut users,
            &mut history,
            &prices,
            username,
            coffee,
            Local::now(),
        )?;
        self.store.save_ledger(&users, &history).await?;

        metrics::counter!("coffeefund_purchases_total").increment(1);
        info!(
            user = %recorded.username,
            coffee = %recorded.coffee,
            price = recorded.price,
            "Purchase recorded"
        );

        Ok(recorded)
    }

    async fn update_favorite(
        &self,
        username: &str,
        favorite: Option<String>,
    ) -> Result<PublicUser, FundError> {
        let favorite = favorite.filter(|f| !f.trim().is_empty());

        let _guard = self.store.lock_writes().await;

        if let Some(coffee) = &favorite {
            let prices = self.store.load_prices().await?;
            if !prices.contains(coffee) {
                return Err(FundError::Validation(format!("Unknown coffee: {coffee}")));
            }
        }

        let mut users = self.store.load_users().await?;
        let record = users
            .get_mut(username)
            .ok_or_else(|| FundError::UnknownUser(username.to_string()))?;
        record.favorite = favorite;
        let updated = PublicUser::from_record(username, record);

        self.store.save_users(&users).await?;
        info!(user = %username, favorite = ?updated.favorite, "Favorite updated");

        Ok(updated)
    }

    async fn history_for(&self, username: &str) -> Result<Vec<HistoryEntry>, FundError> {
        let history = self.store.load_history().await?;
        Ok(history.get(username).cloned().unwrap_or_default())
    }

    async fn reconcile(&self) -> Result<Reconciliation, FundError> {
        let users = self.store.load_users().await?;
        let history = self.store.load_history().await?;
        let prices = self.store.load_prices().await?;

        let report = ledger::reconcile(&users, &history, &prices);
        if !report.is_consistent() {
            warn!(
                orphans = report.orphans.len(),
                drifted = report.balances.iter().filter(|b| !b.is_consistent()).count(),
                "Stored totals disagree with history"
            );
        }
        Ok(report)
    }

    async fn dashboard(&self, username: &str) -> Result<Dashboard, FundError> {
        let users = self.store.load_users().await?;
        let history = self.store.load_history().await?;
        let prices = self.store.load_prices().await?;

        let record = users
            .get(username)
            .ok_or_else(|| FundError::UnknownUser(username.to_string()))?;

        let own_history = history.get(username).cloned().unwrap_or_default();
        let total_spent: f64 = own_history
            .iter()
            .filter(|entry| entry.user == username)
            .map(|entry| ledger::entry_cost(entry, &prices))
            .sum();

        let spend_totals = ledger::compute_spend_totals(&users, &history, &prices);
        let current_payer = ledger::determine_next_payer(&spend_totals)
            .unwrap_or(NO_PAYER)
            .to_string();
        let round_cost = ledger::round_cost(&ledger::round_participants(&users), &prices);

        Ok(Dashboard {
            history: own_history,
            total_spent,
            current_payer,
            round_cost,
            payment_rule: "least",
            favorite: record.favorite.clone(),
            users: users
                .iter()
                .map(|(name, record)| PublicUser::from_record(name, record))
                .collect(),
            spend_totals,
            coffee_prices: prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Collection, DocumentBackend, MemoryBackend};
    use crate::models::{UserRecord, UsersDocument};
    use std::sync::Arc;

    async fn seeded_store() -> Store {
        let store = Store::in_memory();
        let prices: CoffeePrices = [("latte", 3.5), ("espresso", 2.0)].into_iter().collect();
        store.save_prices(&prices).await.unwrap();

        let mut users = UsersDocument::new();
        users.insert("A", UserRecord::new("h".to_string(), Some("latte".to_string())));
        users.insert("B", UserRecord::new("h".to_string(), Some("espresso".to_string())));
        store.save_users(&users).await.unwrap();
        store
    }

    /// Accepts single writes but fails any multi-document write.
    struct FailingLedgerBackend {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl DocumentBackend for FailingLedgerBackend {
        async fn get(&self, collection: Collection) -> anyhow::Result<Option<String>> {
            self.inner.get(collection).await
        }

        async fn put(&self, collection: Collection, document: String) -> anyhow::Result<()> {
            self.inner.put(collection, document).await
        }

        async fn put_many(&self, _documents: Vec<(Collection, String)>) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn settle_round_persists_both_documents() {
        let store = seeded_store().await;
        let service = JsonFundService::new(store.clone());

        let settled = service.settle_round().await.unwrap();
        assert_eq!(settled.payer, "A");

        let users = store.load_users().await.unwrap();
        assert!((users.get("A").unwrap().total_spent - 5.5).abs() < 1e-9);
        let history = store.load_history().await.unwrap();
        assert_eq!(history.get("A").unwrap().len(), 1);

        assert_eq!(service.next_payer().await.unwrap().as_deref(), Some("B"));
        assert!(service.reconcile().await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn settle_round_without_users_is_rejected() {
        let service = JsonFundService::new(Store::in_memory());
        assert!(matches!(
            service.settle_round().await,
            Err(FundError::NoPayer)
        ));
        assert_eq!(service.next_payer().await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_write_leaves_documents_untouched() {
        let backend = Arc::new(FailingLedgerBackend {
            inner: MemoryBackend::new(),
        });
        let store = Store::with_backend(backend);
        let mut users = UsersDocument::new();
        users.insert("A", UserRecord::new("h".to_string(), Some("latte".to_string())));
        store.save_users(&users).await.unwrap();

        let service = JsonFundService::new(store.clone());
        let err = service.record_purchase("A", "latte").await.unwrap_err();
        assert!(matches!(err, FundError::Store(msg) if msg.contains("disk full")));

        assert!(store.load_history().await.unwrap().is_empty());
        assert!(store.load_users().await.unwrap().get("A").unwrap().total_spent.abs() < 1e-9);
    }

    #[tokio::test]
    async fn concurrent_purchases_are_all_kept() {
        let store = seeded_store().await;
        let service = Arc::new(JsonFundService::new(store.clone()));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.record_purchase("B", "espresso").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let history = store.load_history().await.unwrap();
        assert_eq!(history.get("B").unwrap().len(), 10);
        let users = store.load_users().await.unwrap();
        assert!((users.get("B").unwrap().total_spent - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn favorite_must_be_listed() {
        let service = JsonFundService::new(seeded_store().await);

        assert!(matches!(
            service.update_favorite("A", Some("mocha".to_string())).await,
            Err(FundError::Validation(_))
        ));

        let updated = service.update_favorite("A", None).await.unwrap();
        assert_eq!(updated.favorite, None);

        let settled = service.settle_round().await.unwrap();
        assert_eq!(settled.participants.keys().collect::<Vec<_>>(), vec!["B"]);
    }

    #[tokio::test]
    async fn dashboard_reports_round_cost_and_payer() {
        let service = JsonFundService::new(seeded_store().await);
        service.record_purchase("A", "latte").await.unwrap();

        let dashboard = service.dashboard("A").await.unwrap();
        assert_eq!(dashboard.current_payer, "B");
        assert!((dashboard.round_cost - 5.5).abs() < 1e-9);
        assert!((dashboard.total_spent - 3.5).abs() < 1e-9);
        assert_eq!(dashboard.history.len(), 1);
        assert_eq!(dashboard.users.len(), 2);

        assert!(matches!(
            service.dashboard("ghost").await,
            Err(FundError::UnknownUser(_))
        ));
    }
}
