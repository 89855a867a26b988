/// Tri-state field updates for partial `PUT` bodies
///
/// A JSON update body can say three different things about a field:
///
/// | Wire form            | `Patch`        |
/// |----------------------|----------------|
/// | field missing        | `Absent`       |
/// | `"field": null`      | `Clear`        |
/// | `"field": "value"`   | `Set("value")` |
///
/// Request types declare their fields as `#[serde(default)] Patch<T>` so a
/// missing key falls back to `Absent`.
///
/// Empty strings are a special case: clients historically send `""` for
/// "leave this alone", so [`Patch::non_blank`] folds `Set("")` back into
/// `Absent`. Clearing an optional field is done with an explicit `null`.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::patch::Patch;
///
/// let keep: Patch<String> = Patch::Set(String::new());
/// assert_eq!(keep.non_blank().apply_optional(Some("old".into())), Some("old".into()));
///
/// let clear: Patch<String> = Patch::Clear;
/// assert_eq!(clear.apply_optional(Some("old".into())), None);
/// ```

use serde::{Deserialize, Deserializer};

/// A single field of a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field was not supplied; keep the stored value
    Absent,

    /// Field was explicitly set to `null`
    Clear,

    /// Field carries a new value
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    /// Applies the patch to an optional stored value
    pub fn apply_optional(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }

    /// Applies the patch to a required stored value
    ///
    /// Required fields cannot be cleared, so `Clear` keeps `current`.
    pub fn apply_required(self, current: T) -> T {
        match self {
            Patch::Set(value) => value,
            Patch::Absent | Patch::Clear => current,
        }
    }

    /// Converts the carried value, keeping the variant
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Patch::Absent => Patch::Absent,
            Patch::Clear => Patch::Clear,
            Patch::Set(value) => Patch::Set(f(value)?),
        })
    }
}

impl Patch<String> {
    /// Treats an empty string as an omitted field
    pub fn non_blank(self) -> Self {
        match self {
            Patch::Set(value) if value.is_empty() => Patch::Absent,
            other => other,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}
