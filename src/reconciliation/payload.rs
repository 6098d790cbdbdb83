//! Order-created webhook payload types.
//!
//! These mirror the subset of Shopify's order payload the reconciliation
//! core reads. Deserialization failure of the whole body is the caller's
//! MalformedPayload path; unknown fields are ignored so payload additions
//! on Shopify's side never break ingestion.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Line-item property carrying the registry item tag
pub const REGISTRY_ITEM_PROPERTY: &str = "_registry_item_id";

/// Line-item property naming the aggregating group-gift purchase
pub const GROUP_GIFT_PROPERTY: &str = "_group_gift_id";

/// Order-created webhook body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderWebhook {
    /// Shopify order identifier
    pub id: i64,
    /// Checkout email, if the customer provided one
    #[serde(default)]
    pub email: Option<String>,
    /// Order currency (ISO 4217)
    pub currency: String,
    /// Shopify financial status (pending, authorized, paid, ...)
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
    pub line_items: Vec<OrderLineItem>,
}

/// Customer block of the order payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One product line within the order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderLineItem {
    /// Shopify line item identifier, unique within the order
    pub id: i64,
    pub quantity: i32,
    /// Unit price as Shopify serializes it: a decimal string
    pub price: String,
    #[serde(default)]
    pub properties: Vec<LineItemProperty>,
}

/// Custom property attached to a line item at checkout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineItemProperty {
    pub name: String,
    pub value: String,
}

impl OrderWebhook {
    /// Display name of the purchaser, if the payload carries one
    pub fn purchaser_name(&self) -> Option<String> {
        let customer = self.customer.as_ref()?;
        match (&customer.first_name, &customer.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Purchaser email: customer block first, checkout email as fallback
    pub fn purchaser_email(&self) -> Option<String> {
        self.customer
            .as_ref()
            .and_then(|c| c.email.clone())
            .or_else(|| self.email.clone())
    }
}

impl OrderLineItem {
    fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// The registry item this line targets, when tagged with a parseable id
    pub fn registry_item_id(&self) -> Option<Uuid> {
        self.property(REGISTRY_ITEM_PROPERTY)
            .and_then(|value| Uuid::parse_str(value).ok())
    }

    /// Whether the line carries the registry tag at all (even unparseable)
    pub fn is_registry_tagged(&self) -> bool {
        self.property(REGISTRY_ITEM_PROPERTY).is_some()
    }

    /// The aggregating group-gift purchase this line contributes to
    pub fn group_gift_id(&self) -> Option<Uuid> {
        self.property(GROUP_GIFT_PROPERTY)
            .and_then(|value| Uuid::parse_str(value).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_shopify_shape_and_ignores_unknown_fields() {
        let body = json!({
            "id": 820982911946154508i64,
            "email": "jon@example.com",
            "currency": "USD",
            "financial_status": "paid",
            "total_price": "30.00",
            "customer": {"first_name": "Jon", "last_name": "Snow"},
            "line_items": [{
                "id": 466157049,
                "quantity": 2,
                "price": "15.00",
                "title": "Stand Mixer",
                "properties": [
                    {"name": "_registry_item_id", "value": "9b2c1f1e-45cd-4c9f-9d6a-0d8f9a1a2b3c"}
                ]
            }]
        });

        let webhook: OrderWebhook = serde_json::from_value(body).unwrap();
        assert_eq!(webhook.purchaser_name(), Some("Jon Snow".to_string()));
        assert_eq!(webhook.purchaser_email(), Some("jon@example.com".to_string()));
        assert!(webhook.line_items[0].registry_item_id().is_some());
        assert!(webhook.line_items[0].group_gift_id().is_none());
    }

    #[test]
    fn untagged_and_badly_tagged_lines() {
        let untagged = OrderLineItem {
            id: 1,
            quantity: 1,
            price: "10.00".to_string(),
            properties: vec![],
        };
        assert!(!untagged.is_registry_tagged());

        let bad_tag = OrderLineItem {
            id: 2,
            quantity: 1,
            price: "10.00".to_string(),
            properties: vec![LineItemProperty {
                name: REGISTRY_ITEM_PROPERTY.to_string(),
                value: "not-a-uuid".to_string(),
            }],
        };
        assert!(bad_tag.is_registry_tagged());
        assert_eq!(bad_tag.registry_item_id(), None);
    }
}
