//! Serde helper for nullable patch fields.

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null`: absent stays
/// `None`, `null` becomes `Some(None)`, a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}
