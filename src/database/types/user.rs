use serde::{Deserialize, Serialize};

/// A registered chat user, keyed by the Telegram chat id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub tg_id: i64,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}
