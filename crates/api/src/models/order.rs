//! Order history types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use loyalty_core::{CustomerId, OrderId, OrderOrigin, OrderStatus, ProductId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub origin: OrderOrigin,
    pub store_name: Option<String>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub points_earned: i32,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

/// Order line as stored; `modifiers` is free-form JSON.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub modifiers: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub modifiers: Vec<String>,
    pub modifiers_display: String,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        let modifiers = row.modifiers.as_ref().map(modifier_names).unwrap_or_default();
        Self {
            modifiers_display: modifiers.join(", "),
            modifiers,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
        }
    }
}

/// Display names from a stored modifiers value.
///
/// Point-of-sale imports wrote modifiers as a plain string, a JSON-encoded
/// string, an array of names or `{name, price}` objects, or a single object.
#[must_use]
pub fn modifier_names(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(parsed @ (Value::Array(_) | Value::Object(_))) => modifier_names(&parsed),
                _ => vec![trimmed.to_owned()],
            }
        }
        Value::Array(items) => items.iter().filter_map(single_name).collect(),
        other => single_name(other).into_iter().collect(),
    }
}

fn single_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(name.trim().to_owned()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_plain_string() {
        assert_eq!(modifier_names(&json!("Extra shot")), vec!["Extra shot"]);
        assert!(modifier_names(&json!("  ")).is_empty());
    }

    #[test]
    fn test_json_encoded_string() {
        let value = json!(r#"[{"name":"Oat milk","price":0.5},"Decaf"]"#);
        assert_eq!(modifier_names(&value), vec!["Oat milk", "Decaf"]);

        let value = json!(r#"{"name":"Gift wrap"}"#);
        assert_eq!(modifier_names(&value), vec!["Gift wrap"]);
    }

    #[test]
    fn test_array_of_mixed_entries() {
        let value = json!([{"name": "Large"}, "No ice", {"price": 1}, null]);
        assert_eq!(modifier_names(&value), vec!["Large", "No ice"]);
    }

    #[test]
    fn test_object_without_name() {
        assert!(modifier_names(&json!({"price": 2})).is_empty());
        assert!(modifier_names(&Value::Null).is_empty());
    }

    #[test]
    fn test_item_display_joins_names() {
        let item = OrderItem::from(OrderItemRow {
            order_id: OrderId::new(1),
            product_id: None,
            product_name: "Latte".to_string(),
            quantity: 2,
            unit_price: Decimal::new(450, 2),
            total_price: Decimal::new(900, 2),
            modifiers: Some(json!(["Oat milk", "Vanilla"])),
        });
        assert_eq!(item.modifiers_display, "Oat milk, Vanilla");
    }
}
