use std::{any::type_name, collections::BTreeMap, sync::Arc};

use crate::{
    errors::KwargError,
    types::{Injectable, Instance},
};

/// Keyword arguments handed to a provider or target
///
/// Holds the hatched and available values by parameter name. Parameters that were left to
/// their default are absent - use [`Kwargs::get_or`] for them.
#[derive(Debug, Clone, Default)]
pub struct Kwargs {
    values: BTreeMap<String, Instance>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Instance) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The shared value of `name`
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>, KwargError> {
        let instance = self
            .values
            .get(name)
            .ok_or_else(|| KwargError::Missing(name.to_string()))?;

        instance
            .downcast()
            .map_err(|actual_type| KwargError::DowncastFailed {
                name: name.to_string(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// A clone of the value of `name`
    pub fn cloned<T: Injectable + Clone>(&self, name: &str) -> Result<T, KwargError> {
        self.get::<T>(name).map(|value| T::clone(&value))
    }

    /// A clone of the value of `name`, or `default` if it was not supplied
    ///
    /// A value of the wrong type is still an error.
    pub fn get_or<T: Injectable + Clone>(&self, name: &str, default: T) -> Result<T, KwargError> {
        match self.cloned(name) {
            Err(KwargError::Missing(_)) => Ok(default),
            result => result,
        }
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
impl From<BTreeMap<String, Instance>> for Kwargs {
    fn from(values: BTreeMap<String, Instance>) -> Self {
        Kwargs { values }
    }
}
impl FromIterator<(String, Instance)> for Kwargs {
    fn from_iter<I: IntoIterator<Item = (String, Instance)>>(iter: I) -> Self {
        Kwargs {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("base", Instance::new(10_i32));
        kwargs.insert("tenant_name", Instance::new("acme".to_string()));

        assert_eq!(*kwargs.get::<i32>("base").unwrap(), 10);
        assert_eq!(kwargs.cloned::<String>("tenant_name").unwrap(), "acme");
        assert_eq!(kwargs.names().collect::<Vec<_>>(), vec!["base", "tenant_name"]);
    }

    #[test]
    fn missing_and_mismatched() {
        let kwargs: Kwargs = [("base".to_string(), Instance::new(10_i32))]
            .into_iter()
            .collect();

        assert!(matches!(
            kwargs.get::<i32>("other"),
            Err(KwargError::Missing(name)) if name == "other"
        ));
        assert!(matches!(
            kwargs.get::<String>("base"),
            Err(KwargError::DowncastFailed { actual_type: "i32", .. })
        ));
    }

    #[test]
    fn defaults_only_cover_missing_values() {
        let kwargs: Kwargs = [("value".to_string(), Instance::new("text"))]
            .into_iter()
            .collect();

        assert_eq!(kwargs.get_or("absent", 99_i32).unwrap(), 99);
        assert!(kwargs.get_or("value", 99_i32).is_err());
    }
}
