// src/models/menu.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Menu entry of an owned restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "price_from_number_or_string")]
    pub price: f64,

    #[serde(default)]
    pub category: String,

    #[serde(default, alias = "isVeg", alias = "veg")]
    pub is_veg: bool,
}

/// Menu lookup response
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub restaurant_id: String,
    pub items: Vec<MenuItem>,
    pub notices: Vec<String>,
}

fn price_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => Some(0.0),
        _ => None,
    };
    price.ok_or_else(|| serde::de::Error::custom("price must be a number"))
}
