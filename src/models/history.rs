use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::OrderedMap;
use crate::constants::{ROUND_SENTINEL, TIMESTAMP_FORMAT};

/// One line of the append-only purchase log.
///
/// `coffee` is either a drink name or [`ROUND_SENTINEL`]; only round entries
/// carry `participants` (username -> drink they were covered for).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub coffee: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<OrderedMap<String>>,
}

impl HistoryEntry {
    #[must_use]
    pub fn purchase(user: &str, coffee: &str, now: DateTime<Local>) -> Self {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            coffee: coffee.to_string(),
            user: user.to_string(),
            participants: None,
        }
    }

    #[must_use]
    pub fn round(payer: &str, participants: OrderedMap<String>, now: DateTime<Local>) -> Self {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            coffee: ROUND_SENTINEL.to_string(),
            user: payer.to_string(),
            participants: Some(participants),
        }
    }

    #[must_use]
    pub fn is_round(&self) -> bool {
        self.coffee.eq_ignore_ascii_case(ROUND_SENTINEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_detection_ignores_case() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"timestamp": "2024-01-01 09:00", "coffee": "Paid For Round", "user": "ann"}"#,
        )
        .unwrap();
        assert!(entry.is_round());
        assert!(entry.participants.is_none());
    }

    #[test]
    fn purchase_omits_participants() {
        let entry = HistoryEntry::purchase("ann", "latte", Local::now());
        assert!(!entry.is_round());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("participants").is_none());
        assert_eq!(json["coffee"], "latte");
    }

    #[test]
    fn round_writes_sentinel_verbatim() {
        let participants: OrderedMap<String> =
            [("ann", "latte".to_string())].into_iter().collect();
        let entry = HistoryEntry::round("ann", participants, Local::now());
        assert_eq!(entry.coffee, "paid for round");
        assert!(entry.is_round());
    }
}
