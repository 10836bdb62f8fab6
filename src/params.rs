use std::{ops::Index, slice, vec};

use serde::{
    de::{self, Deserialize},
    ser::{Serialize, SerializeMap, Serializer},
};

use crate::de::ParamsDeserializer;

/// Ordered mapping of parameter names to string values.
///
/// `Params` is both the result of recognition (path captures merged over route defaults) and the
/// input of generation (options and recalled values). Insertion order is preserved and inserting
/// an existing name overwrites the value in place.
///
/// An empty string is treated as an absent value wherever the router needs a value to be
/// _present_; see [`get_present`](Self::get_present).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    items: Vec<(String, String)>,
}

impl Params {
    /// Constructs an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Params {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Inserts a value, returning the previous value for `name` if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        match self.items.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.items.push((name, value));
                None
            }
        }
    }

    /// Removes a value by name, preserving the order of remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.items.iter().position(|(key, _)| key == name)?;
        Some(self.items.remove(idx).1)
    }

    /// Get parameter by name without type conversion.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, val)| val.as_str())
    }

    /// Get parameter by name, treating empty values as absent.
    pub fn get_present(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|val| !val.is_empty())
    }

    /// Returns matched parameter by name.
    ///
    /// If keyed parameter is not available empty string is used as default value.
    pub fn query(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.items.iter().any(|(key, _)| key == name)
    }

    /// Returns number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Return iterator to items in parameter container.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.items.iter(),
        }
    }

    /// Returns iterator over parameter names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(key, _)| key.as_str())
    }

    /// Retains only the parameters specified by the predicate.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        self.items.retain(|(key, val)| f(key, val));
    }

    /// Deserializes parameters to a specified type `U`.
    ///
    /// Values are percent-decoded before being parsed.
    ///
    /// # Errors
    ///
    /// Returns error when parameters cannot be deserialized into a `U` type.
    ///
    /// # Examples
    /// ```
    /// use pathway::Params;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Show {
    ///     id: u64,
    ///     format: String,
    /// }
    ///
    /// let params = Params::from([("id", "42"), ("format", "json")]);
    /// let show: Show = params.load().unwrap();
    /// assert_eq!(show.id, 42);
    /// assert_eq!(show.format, "json");
    /// ```
    pub fn load<'de, U: Deserialize<'de>>(&'de self) -> Result<U, de::value::Error> {
        Deserialize::deserialize(ParamsDeserializer::new(self))
    }
}

#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: slice::Iter<'a, (String, String)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    #[inline]
    fn next(&mut self) -> Option<(&'a str, &'a str)> {
        self.inner
            .next()
            .map(|(key, val)| (key.as_str(), val.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, val) in iter {
            self.insert(key, val);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(items: [(K, V); N]) -> Self {
        items.into_iter().collect()
    }
}

impl<'a> Index<&'a str> for Params {
    type Output = str;

    fn index(&self, name: &'a str) -> &str {
        self.get(name)
            .expect("Value for parameter is not available")
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;

        for (key, val) in self {
            map.serialize_entry(key, val)?;
        }

        map.end()
    }
}
