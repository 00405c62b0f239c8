//! Typed shapes of the three persisted documents.

pub mod coffee;
pub mod history;
pub mod ordered;
pub mod user;

pub use coffee::CoffeePrices;
pub use history::HistoryEntry;
pub use ordered::OrderedMap;
pub use user::UserRecord;

/// `users` document: username -> record.
pub type UsersDocument = OrderedMap<UserRecord>;

/// `history` document: username -> entries in the order they were appended.
pub type HistoryDocument = OrderedMap<Vec<HistoryEntry>>;

/// A document that parsed but breaks a data invariant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidDocument {
    #[error("user '{0}' has a negative or non-finite total_spent")]
    BadTotal(String),

    #[error("coffee '{0}' has a negative or non-finite price")]
    BadPrice(String),

    #[error("empty username")]
    EmptyUsername,

    #[error("history for '{0}' has an entry with no user")]
    MissingEntryUser(String),

    #[error("history for '{0}' has a round entry without participants")]
    RoundWithoutParticipants(String),
}

fn is_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

pub fn validate_users(users: &UsersDocument) -> Result<(), InvalidDocument> {
    for (username, record) in users.iter() {
        if username.is_empty() {
            return Err(InvalidDocument::EmptyUsername);
        }
        if !is_amount(record.total_spent) {
            return Err(InvalidDocument::BadTotal(username.to_string()));
        }
    }
    Ok(())
}

pub fn validate_prices(prices: &CoffeePrices) -> Result<(), InvalidDocument> {
    prices
        .iter()
        .find(|(_, price)| !is_amount(*price))
        .map_or(Ok(()), |(name, _)| {
            Err(InvalidDocument::BadPrice(name.to_string()))
        })
}

pub fn validate_history(history: &HistoryDocument) -> Result<(), InvalidDocument> {
    for (owner, entries) in history.iter() {
        for entry in entries {
            if entry.user.is_empty() {
                return Err(InvalidDocument::MissingEntryUser(owner.to_string()));
            }
            if entry.is_round() && entry.participants.is_none() {
                return Err(InvalidDocument::RoundWithoutParticipants(
                    owner.to_string(),
                ));
            }
        }
    }
    Ok(())
}
