use serde::{Deserialize, Deserializer};

/// One attribute of a partial-update payload.
///
/// `Missing` means the key was not sent and the stored value is kept.
/// `Null` means the caller sent an explicit `null`. `Value` carries a
/// replacement. Struct fields of this type need `#[serde(default)]` so an
/// absent key lands on `Missing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    /// Resolve against the currently stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Missing => current,
            Field::Null => None,
            Field::Value(value) => Some(value),
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}
