//! Partial-update helpers.
//!
//! Update payloads distinguish an absent field (leave as is) from an explicit
//! `null` (clear a nullable column). Nullable fields are declared as
//! `Option<Option<T>>` with `#[serde(default, deserialize_with = "deserialize_some")]`.

use serde::{Deserialize, Deserializer};

pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Overwrite `target` when the patch carries a value
pub fn assign<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
