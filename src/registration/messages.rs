use crate::database::User;
use chrono::{DateTime, Utc};

pub const USER_CONFIRMATION: &str = "✅ You have been registered successfully!";

const NOT_PROVIDED: &str = "not provided";

pub fn admin_notification(user: &User, received_at: DateTime<Utc>) -> String {
    format!(
        "🔔 New user / registration update\n👤 TG_ID: {}\n📱 Phone: {}\n🌍 Location: {}\n🕒 {}",
        user.tg_id,
        user.phone.as_deref().unwrap_or(NOT_PROVIDED),
        describe_location(user.lat, user.lon),
        received_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn describe_location(lat: Option<f64>, lon: Option<f64>) -> String {
    match (lat, lon) {
        (None, None) => NOT_PROVIDED.to_string(),
        (lat, lon) => format!("{}, {}", describe_coordinate(lat), describe_coordinate(lon)),
    }
}

fn describe_coordinate(coordinate: Option<f64>) -> String {
    coordinate.map_or_else(|| "?".to_string(), |c| c.to_string())
}
