use serde::{Deserialize, Deserializer};

/// Keeps an explicit `null` apart from an absent field in partial updates.
///
/// Use with `#[serde(default, deserialize_with = "...")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub fn deserialize_nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
