//! Smoke tests for the file-backed store: documents written by hand are
//! read back, and ledger operations land on disk.

use coffeefund::config::Config;
use coffeefund::services::FundError;
use coffeefund::state::SharedState;
use std::path::{Path, PathBuf};

fn temp_data_dir() -> PathBuf {
    std::env::temp_dir().join(format!("coffeefund-smoke-test-{}", uuid::Uuid::new_v4()))
}

async fn open_state(data_dir: &Path) -> SharedState {
    let mut config = Config::default();
    config.general.data_dir = data_dir.display().to_string();
    SharedState::new(config)
        .await
        .expect("failed to open shared state")
}

fn read_json(data_dir: &Path, file: &str) -> serde_json::Value {
    let raw = std::fs::read_to_string(data_dir.join(file)).expect("document missing");
    serde_json::from_str(&raw).expect("document is not JSON")
}

fn seed(data_dir: &Path) {
    std::fs::create_dir_all(data_dir).unwrap();
    std::fs::write(
        data_dir.join("coffee.json"),
        r#"{"Espresso": 2.5, "Latte": 3.75}"#,
    )
    .unwrap();
    std::fs::write(
        data_dir.join("users.json"),
        r#"{
            "carol": {"password": "x", "total_spent": 0.0, "favorite": "Latte"},
            "alice": {"password": "x", "total_spent": 0.0, "favorite": "Espresso"},
            "bob": {"password": "x", "total_spent": 0.0, "favorite": ""}
        }"#,
    )
    .unwrap();
}

#[tokio::test]
async fn test_empty_directory_has_no_payer() {
    let data_dir = temp_data_dir();
    let state = open_state(&data_dir).await;

    assert_eq!(state.fund_service.next_payer().await.unwrap(), None);
    assert!(state.fund_service.spend_totals().await.unwrap().is_empty());

    let err = state.fund_service.settle_round().await.unwrap_err();
    assert!(matches!(err, FundError::NoPayer));
    assert!(!data_dir.join("users.json").exists());
    assert!(!data_dir.join("history.json").exists());

    let _ = std::fs::remove_dir_all(&data_dir);
}

#[tokio::test]
async fn test_round_is_persisted_to_both_documents() {
    let data_dir = temp_data_dir();
    seed(&data_dir);
    let state = open_state(&data_dir).await;

    // all totals are zero, so the first user in file order pays
    let settled = state.fund_service.settle_round().await.unwrap();
    assert_eq!(settled.payer, "carol");
    assert_eq!(settled.cost, 6.25);
    assert_eq!(settled.participants.len(), 2);

    let users = read_json(&data_dir, "users.json");
    assert_eq!(users["carol"]["total_spent"], 6.25);
    assert_eq!(users["alice"]["total_spent"], 0.0);

    let history = read_json(&data_dir, "history.json");
    let entries = history["carol"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["coffee"], "paid for round");
    assert_eq!(entries[0]["user"], "carol");
    assert_eq!(entries[0]["participants"]["alice"], "Espresso");
    assert!(entries[0]["participants"].get("bob").is_none());

    let raw = std::fs::read_to_string(data_dir.join("users.json")).unwrap();
    let carol = raw.find("carol").unwrap();
    let alice = raw.find("alice").unwrap();
    let bob = raw.find("bob").unwrap();
    assert!(carol < alice && alice < bob, "user order changed: {raw}");

    // reopening reads the same ledger back
    let reopened = open_state(&data_dir).await;
    let next = reopened.fund_service.next_payer().await.unwrap();
    assert_eq!(next.as_deref(), Some("alice"));
    assert!(reopened.fund_service.reconcile().await.unwrap().is_consistent());

    let _ = std::fs::remove_dir_all(&data_dir);
}

#[tokio::test]
async fn test_purchase_by_unknown_user_writes_nothing() {
    let data_dir = temp_data_dir();
    seed(&data_dir);
    let state = open_state(&data_dir).await;

    let err = state
        .fund_service
        .record_purchase("mallory", "Latte")
        .await
        .unwrap_err();
    assert!(matches!(err, FundError::UnknownUser(name) if name == "mallory"));
    assert!(!data_dir.join("history.json").exists());

    let recorded = state
        .fund_service
        .record_purchase("bob", "Espresso")
        .await
        .unwrap();
    assert_eq!(recorded.total_spent, 2.5);

    let history = read_json(&data_dir, "history.json");
    assert_eq!(history["bob"][0]["coffee"], "Espresso");
    assert!(history.get("mallory").is_none());

    let _ = std::fs::remove_dir_all(&data_dir);
}

#[tokio::test]
async fn test_malformed_document_fails_loudly() {
    let data_dir = temp_data_dir();
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("users.json"), "{ not json").unwrap();
    let state = open_state(&data_dir).await;

    let err = state.fund_service.spend_totals().await.unwrap_err();
    assert!(matches!(err, FundError::Store(_)));

    let _ = std::fs::remove_dir_all(&data_dir);
}

#[tokio::test]
async fn test_failed_cli_mutations_return_errors() {
    use coffeefund::cli::{Commands, dispatch};

    let data_dir = temp_data_dir();
    let state = open_state(&data_dir).await;

    assert!(dispatch(&state, Commands::Settle).await.is_err());
    assert!(
        dispatch(
            &state,
            Commands::Purchase {
                user: "mallory".to_string(),
                coffee: "Latte".to_string(),
            },
        )
        .await
        .is_err()
    );
    assert!(dispatch(&state, Commands::NextPayer).await.is_ok());
    assert!(dispatch(&state, Commands::Totals).await.is_ok());

    let _ = std::fs::remove_dir_all(&data_dir);
}
