use super::RegistrationError;
use crate::database::User;
use serde::Deserialize;
use serde_json::Value;

/// Body posted by the registration form. Fields are kept loose and coerced
/// in [`User::try_from`], so a bad value is reported as malformed input.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationPayload {
    #[serde(default, alias = "id")]
    pub tg_id: Value,
    #[serde(default)]
    pub phone: Value,
    #[serde(default, alias = "latitude")]
    pub lat: Value,
    #[serde(default, alias = "longitude")]
    pub lon: Value,
}

impl TryFrom<RegistrationPayload> for User {
    type Error = RegistrationError;

    fn try_from(payload: RegistrationPayload) -> Result<Self, Self::Error> {
        Ok(User {
            tg_id: parse_tg_id(&payload.tg_id)?,
            phone: parse_phone(&payload.phone)?,
            lat: parse_coordinate("lat", &payload.lat)?,
            lon: parse_coordinate("lon", &payload.lon)?,
        })
    }
}

fn parse_tg_id(value: &Value) -> Result<i64, RegistrationError> {
    let tg_id = match value {
        Value::Null => {
            return Err(RegistrationError::MalformedInput(
                "tg_id is required".to_string(),
            ))
        }
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    tg_id.ok_or_else(|| {
        RegistrationError::MalformedInput(format!("tg_id must be an integer, got {}", value))
    })
}

fn parse_phone(value: &Value) -> Result<Option<String>, RegistrationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(RegistrationError::MalformedInput(format!(
            "phone must be a string, got {}",
            value
        ))),
    }
}

fn parse_coordinate(field: &str, value: &Value) -> Result<Option<f64>, RegistrationError> {
    let coordinate = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match coordinate {
        Some(c) if c.is_finite() => Ok(Some(c)),
        _ => Err(RegistrationError::MalformedInput(format!(
            "{} must be a number, got {}",
            field, value
        ))),
    }
}
