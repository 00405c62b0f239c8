use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CoffeeDto {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct NextPayerDto {
    /// A username, or `"No data"`.
    pub payer: String,
    pub has_payer: bool,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub coffee: String,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
}
