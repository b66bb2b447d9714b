use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Represents optional field semantics in update requests.
///
/// - `Unchanged` → field absent from the payload
/// - `SetToNull` → explicitly `null`, clear the stored value
/// - `SetToValue` → set to the provided value
///
/// Fields of this type must carry `#[serde(default)]` so that an absent key
/// deserializes to `Unchanged`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionField<T> {
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<T> Default for OptionField<T> {
    fn default() -> Self {
        OptionField::Unchanged
    }
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => OptionField::SetToNull,
            Some(value) => OptionField::SetToValue(value),
        })
    }
}

/// Serializes as the inner value, or `null` when there is none.
impl<T: Serialize> Serialize for OptionField<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value_ref().serialize(serializer)
    }
}

impl<T> OptionField<T> {
    /// Convert to nested option:
    /// - `None` → unchanged
    /// - `Some(None)` → set null
    /// - `Some(Some(T))` → set to value
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::SetToNull => Some(None),
            Self::SetToValue(v) => Some(Some(v)),
        }
    }

    /// Transform inner value if `SetToValue`
    pub fn map_value<U, F: FnOnce(T) -> U>(self, f: F) -> OptionField<U> {
        match self {
            Self::Unchanged => OptionField::Unchanged,
            Self::SetToNull => OptionField::SetToNull,
            Self::SetToValue(v) => OptionField::SetToValue(f(v)),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// If `SetToValue`, returns a reference to inner value.
    pub fn value_ref(&self) -> Option<&T> {
        if let Self::SetToValue(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Writes the change into `target`, leaving it alone when `Unchanged`.
    pub fn apply(self, target: &mut Option<T>) {
        if let Some(next) = self.into_option() {
            *target = next;
        }
    }
}

impl<T> From<Option<Option<T>>> for OptionField<T> {
    fn from(opt: Option<Option<T>>) -> Self {
        match opt {
            None => OptionField::Unchanged,
            Some(None) => OptionField::SetToNull,
            Some(Some(v)) => OptionField::SetToValue(v),
        }
    }
}

pub type PatchString = OptionField<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default)]
        link: PatchString,
    }

    #[test]
    fn absent_null_and_value_are_distinguished() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"link": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"link": "https://x.dev"}"#).unwrap();

        assert_eq!(absent.link, OptionField::Unchanged);
        assert_eq!(null.link, OptionField::SetToNull);
        assert_eq!(value.link, OptionField::SetToValue("https://x.dev".to_string()));
    }

    #[test]
    fn serializes_as_a_plain_optional_value() {
        assert_eq!(serde_json::to_value(PatchString::SetToValue("x".into())).unwrap(), "x");
        assert!(serde_json::to_value(PatchString::SetToNull).unwrap().is_null());
    }

    #[test]
    fn apply_respects_unchanged() {
        let mut stored = Some("old".to_string());
        PatchString::Unchanged.apply(&mut stored);
        assert_eq!(stored.as_deref(), Some("old"));

        PatchString::SetToNull.apply(&mut stored);
        assert_eq!(stored, None);

        PatchString::SetToValue("new".into()).apply(&mut stored);
        assert_eq!(stored.as_deref(), Some("new"));
    }
}
