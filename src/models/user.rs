use serde::{Deserialize, Deserializer, Serialize};

/// A registered member of the fund, keyed by username in the `users` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "password")]
    pub password_hash: String,

    #[serde(default)]
    pub total_spent: f64,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub favorite: Option<String>,
}

impl UserRecord {
    #[must_use]
    pub fn new(password_hash: String, favorite: Option<String>) -> Self {
        Self {
            password_hash,
            total_spent: 0.0,
            favorite: favorite.filter(|f| !f.is_empty()),
        }
    }

    /// A user with a favorite drink takes part in rounds.
    #[must_use]
    pub fn is_participant(&self) -> bool {
        self.favorite.as_deref().is_some_and(|f| !f.is_empty())
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_legacy_password_key() {
        let record: UserRecord = serde_json::from_str(
            r#"{"username": "ann", "password": "$argon2id$x", "total_spent": 4.5, "favorite": "latte"}"#,
        )
        .unwrap();
        assert_eq!(record.password_hash, "$argon2id$x");
        assert!((record.total_spent - 4.5).abs() < f64::EPSILON);
        assert_eq!(record.favorite.as_deref(), Some("latte"));
    }

    #[test]
    fn missing_fields_default() {
        let record: UserRecord =
            serde_json::from_str(r#"{"password_hash": "h", "favorite": ""}"#).unwrap();
        assert!(record.total_spent.abs() < f64::EPSILON);
        assert_eq!(record.favorite, None);
        assert!(!record.is_participant());
    }
}
