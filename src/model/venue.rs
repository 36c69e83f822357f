use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Venue metadata from the extras file. Opaque to the occupancy mapper;
/// only the report reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VenueInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    /// Free-form fields, rendered in file order.
    #[serde(flatten)]
    pub details: IndexMap<String, serde_json::Value>,
}

impl VenueInfo {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "(unnamed venue)",
        }
    }

    /// Every displayable field as `(label, text)` pairs: the well-known
    /// fields first, then the free-form ones.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(ref address) = self.address {
            fields.push(("address".to_string(), address.clone()));
        }
        if let Some(ref contact) = self.contact {
            fields.push(("contact".to_string(), contact.clone()));
        }
        for (key, value) in &self.details {
            fields.push((key.clone(), value_text(value)));
        }
        fields
    }
}

/// Plain-text rendering of a metadata value. Strings lose their quotes,
/// nested values fall back to compact JSON.
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) if items.iter().all(|v| !v.is_object()) => items
            .iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
