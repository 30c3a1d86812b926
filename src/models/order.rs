// src/models/order.rs
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{RelayError, RelayResult};

/// Input key that selects a single device instead of the broadcast topic.
pub const TOKEN_FIELD: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence {
    Required,                // Must be present and truthy
    Optional,                // Forwarded when present and not null
    Defaulted(&'static str), // Falls back when absent or falsy
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    Scalar,     // Plain string form of the value
    Structured, // Strings verbatim, anything else as JSON text
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub key: &'static str,
    pub presence: Presence,
    pub coercion: Coercion,
}

const fn rule(key: &'static str, presence: Presence, coercion: Coercion) -> FieldRule {
    FieldRule { key, presence, coercion }
}

/// Every field the relay accepts. Anything not listed here is dropped, and the
/// required fields are checked in the order they appear.
pub const ORDER_SCHEMA: &[FieldRule] = &[
    rule("id", Presence::Required, Coercion::Scalar),
    rule("customerName", Presence::Required, Coercion::Scalar),
    rule("total", Presence::Required, Coercion::Scalar),
    rule("status", Presence::Defaulted("PENDING"), Coercion::Scalar),
    rule("courier", Presence::Optional, Coercion::Scalar),
    rule("phone", Presence::Optional, Coercion::Scalar),
    rule("scheduledTime", Presence::Optional, Coercion::Scalar),
    rule("address", Presence::Optional, Coercion::Scalar),
    rule("email", Presence::Optional, Coercion::Scalar),
    rule("slotStart", Presence::Optional, Coercion::Scalar),
    rule("slotEnd", Presence::Optional, Coercion::Scalar),
    rule("items", Presence::Optional, Coercion::Structured),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Topic(String),
    Token(String),
}

impl Target {
    pub fn describe(&self) -> String {
        match self {
            Target::Topic(topic) => format!("topic:{}", topic),
            Target::Token(_) => "device token".to_string(),
        }
    }
}

/// A normalized order event, built per request and dropped with the response.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    fields: BTreeMap<String, String>,
    pub target: Target,
}

impl OrderNotification {
    /// Validate a decoded request body against [`ORDER_SCHEMA`].
    ///
    /// A body that is not a JSON object is treated as an object with no
    /// fields, so it fails on the first required field.
    pub fn from_json(body: &Value, default_topic: &str) -> RelayResult<Self> {
        let empty = serde_json::Map::new();
        let input = body.as_object().unwrap_or(&empty);

        let mut fields = BTreeMap::new();
        for rule in ORDER_SCHEMA {
            let value = input.get(rule.key);
            match rule.presence {
                Presence::Required => match value {
                    Some(v) if is_truthy(v) => {
                        fields.insert(rule.key.to_string(), coerce(v, rule.coercion));
                    }
                    _ => return Err(RelayError::missing_field(rule.key)),
                },
                Presence::Optional => {
                    if let Some(v) = value.filter(|v| !v.is_null()) {
                        fields.insert(rule.key.to_string(), coerce(v, rule.coercion));
                    }
                }
                Presence::Defaulted(fallback) => {
                    let coerced = match value {
                        Some(v) if is_truthy(v) => coerce(v, rule.coercion),
                        _ => fallback.to_string(),
                    };
                    fields.insert(rule.key.to_string(), coerced);
                }
            }
        }

        let target = match input.get(TOKEN_FIELD) {
            Some(token) if is_truthy(token) => Target::Token(coerce(token, Coercion::Scalar)),
            _ => Target::Topic(default_topic.to_string()),
        };

        Ok(Self { fields, target })
    }

    pub fn id(&self) -> &str {
        self.get("id").unwrap_or_default()
    }

    pub fn customer_name(&self) -> &str {
        self.get("customerName").unwrap_or_default()
    }

    pub fn total(&self) -> &str {
        self.get("total").unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        self.get("status").unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The string-only key/value payload forwarded to the messaging provider.
    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_parts(self) -> (Target, BTreeMap<String, String>) {
        (self.target, self.fields)
    }
}

/// `null`, `false`, zero and the empty string are falsy; everything else,
/// including empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn coerce(value: &Value, coercion: Coercion) -> String {
    match (value, coercion) {
        (Value::String(s), _) => s.clone(),
        (Value::Number(n), Coercion::Scalar) => number_to_string(n),
        (Value::Bool(b), Coercion::Scalar) => b.to_string(),
        (Value::Null, Coercion::Scalar) => "null".to_string(),
        // Compact JSON always serializes; the receiving app decodes it back
        (other, _) => other.to_string(),
    }
}

/// Same text a JSON event producer gets from its own number-to-string: plain
/// decimals in `[1e-6, 1e21)`, exponent form (`1e+21`, `1e-7`) outside it.
fn number_to_string(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() >= 1e21 || f.abs() < 1e-6 => {
            let text = format!("{:e}", f);
            match text.split_once('e') {
                Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
                _ => text,
            }
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
