//! Serde helpers for loosely typed identifiers.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Accepts a string, a number or null; empty strings collapse to `None`.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(raw
        .map(|value| match value {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        })
        .filter(|s| !s.is_empty()))
}
