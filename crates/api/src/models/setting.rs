//! System setting types and value conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use loyalty_core::{SettingCategory, SettingType};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SystemSetting {
    pub setting_key: String,
    pub setting_value: String,
    pub setting_type: SettingType,
    pub description: Option<String>,
    pub category: SettingCategory,
    pub updated_at: DateTime<Utc>,
}

impl SystemSetting {
    /// The stored text converted by the setting's own type.
    #[must_use]
    pub fn typed_value(&self) -> Value {
        convert(Some(&self.setting_value), self.setting_type)
    }
}

/// A create-or-update request for one setting.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingUpsert {
    pub key: String,
    pub value: Value,
    #[serde(default, rename = "type")]
    pub setting_type: SettingType,
    pub description: Option<String>,
    #[serde(default)]
    pub category: SettingCategory,
}

impl SettingUpsert {
    /// The text form stored in `system_settings.setting_value`.
    #[must_use]
    pub fn stored_value(&self) -> String {
        stored_text(&self.value, self.setting_type)
    }

    /// Description to store, defaulting to one naming the type.
    #[must_use]
    pub fn description_or_default(&self) -> String {
        self.description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Setting of type {}", self.setting_type))
    }
}

/// Fallback when a setting is missing or its text does not parse.
#[must_use]
pub fn default_for(setting_type: SettingType) -> Value {
    match setting_type {
        SettingType::String => Value::String(String::new()),
        SettingType::Number => Value::from(0),
        SettingType::Boolean => Value::Bool(false),
        SettingType::Json => Value::Null,
    }
}

/// Convert raw setting text to a JSON value of the requested type.
#[must_use]
pub fn convert(raw: Option<&str>, setting_type: SettingType) -> Value {
    let Some(raw) = raw else {
        return default_for(setting_type);
    };
    match setting_type {
        SettingType::String => Value::String(raw.to_owned()),
        SettingType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|n| {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    // Whole numbers serialize without a trailing `.0`.
                    #[allow(clippy::cast_possible_truncation)]
                    Some(Value::from(n as i64))
                } else {
                    serde_json::Number::from_f64(n).map(Value::Number)
                }
            })
            .unwrap_or_else(|| default_for(setting_type)),
        SettingType::Boolean => Value::Bool(raw.trim().eq_ignore_ascii_case("true")),
        SettingType::Json => {
            serde_json::from_str(raw).unwrap_or_else(|_| default_for(setting_type))
        }
    }
}

/// Text stored for a JSON value of the given type.
#[must_use]
pub fn stored_text(value: &Value, setting_type: SettingType) -> String {
    match (setting_type, value) {
        (SettingType::Json, v) => v.to_string(),
        (SettingType::Boolean, Value::Bool(b)) => b.to_string(),
        (SettingType::Boolean, Value::String(s)) => {
            (!s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0").to_string()
        }
        (SettingType::Boolean, Value::Number(n)) => (n.as_f64() != Some(0.0)).to_string(),
        (SettingType::Boolean, Value::Null) => "false".to_owned(),
        (SettingType::Boolean, _) => "true".to_owned(),
        (SettingType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_or_else(|_| "NaN".to_owned(), |n| n.to_string()),
        (_, Value::String(s)) => s.clone(),
        (_, Value::Null) => String::new(),
        (_, v) => v.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_convert_by_type() {
        assert_eq!(convert(Some("Acme"), SettingType::String), json!("Acme"));
        assert_eq!(convert(Some("10"), SettingType::Number), json!(10));
        assert_eq!(convert(Some("1.5"), SettingType::Number), json!(1.5));
        assert_eq!(convert(Some("TRUE"), SettingType::Boolean), json!(true));
        assert_eq!(convert(Some("yes"), SettingType::Boolean), json!(false));
        assert_eq!(
            convert(Some(r#"{"a":[1,2]}"#), SettingType::Json),
            json!({"a": [1, 2]})
        );
    }

    #[test]
    fn test_convert_falls_back_to_defaults() {
        assert_eq!(convert(None, SettingType::String), json!(""));
        assert_eq!(convert(None, SettingType::Boolean), json!(false));
        assert_eq!(convert(Some("abc"), SettingType::Number), json!(0));
        assert_eq!(convert(Some("{broken"), SettingType::Json), Value::Null);
    }

    #[test]
    fn test_stored_text() {
        assert_eq!(stored_text(&json!("$"), SettingType::String), "$");
        assert_eq!(stored_text(&json!(42), SettingType::String), "42");
        assert_eq!(stored_text(&json!(2.5), SettingType::Number), "2.5");
        assert_eq!(stored_text(&json!("7"), SettingType::Number), "7");
        assert_eq!(stored_text(&json!(true), SettingType::Boolean), "true");
        assert_eq!(stored_text(&json!("false"), SettingType::Boolean), "false");
        assert_eq!(stored_text(&json!(0), SettingType::Boolean), "false");
        assert_eq!(stored_text(&json!({"k": 1}), SettingType::Json), r#"{"k":1}"#);
    }

    #[test]
    fn test_upsert_defaults() {
        let upsert: SettingUpsert =
            serde_json::from_value(json!({"key": "chat_enabled", "value": true, "type": "boolean"}))
                .unwrap();
        assert_eq!(upsert.category, SettingCategory::General);
        assert_eq!(upsert.stored_value(), "true");
        assert_eq!(upsert.description_or_default(), "Setting of type boolean");
    }
}
