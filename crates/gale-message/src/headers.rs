//! Ordered header collection
//!
//! Names keep the case they were set with and their first position; lookups
//! are case-insensitive. Names and values are validated with the `http`
//! crate's `HeaderName`/`HeaderValue` rules.

use crate::{Error, Result};
use http::{HeaderName, HeaderValue};
use smallvec::SmallVec;

/// Header name with its values
type Entry = (String, Vec<String>);

/// HTTP headers (stack-allocated for small header counts)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: SmallVec<[Entry; 16]>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs; a repeated name replaces the
    /// earlier value and keeps its position
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.set(name.as_ref(), vec![value.as_ref().to_string()])?;
        }
        Ok(headers)
    }

    /// Values of a header (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|i| self.entries[i].1.as_slice())
    }

    /// Values joined with `", "`
    pub fn line(&self, name: &str) -> Option<String> {
        self.get(name).map(|values| values.join(", "))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with `name` replaced by `values`
    pub fn with<I, V>(&self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut headers = self.clone();
        let values = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        headers.without_in_place(name);
        headers.set(name, values)?;
        Ok(headers)
    }

    /// Copy with `values` appended to `name`
    pub fn with_added<I, V>(&self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut headers = self.clone();
        let values: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        match headers.position(name) {
            Some(i) => {
                let values = validate_values(values)?;
                headers.entries[i].1.extend(values);
            }
            None => headers.set(name, values)?,
        }
        Ok(headers)
    }

    /// Copy without `name`
    pub fn without(&self, name: &str) -> Self {
        let mut headers = self.clone();
        headers.without_in_place(name);
        headers
    }

    /// Replace `Host` and move it to the front
    pub(crate) fn put_host_first(&mut self, host: String) {
        self.without_in_place("host");
        self.entries.insert(0, ("Host".to_string(), vec![host]));
    }

    fn set(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        validate_name(name)?;
        let values = validate_values(values)?;
        match self.position(name) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((name.to_string(), values)),
        }
        Ok(())
    }

    fn without_in_place(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

fn validate_name(name: &str) -> Result<()> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| Error::InvalidHeader(format!("invalid header name {:?}", name)))
}

fn validate_values(values: Vec<String>) -> Result<Vec<String>> {
    if values.is_empty() {
        return Err(Error::InvalidHeader("header values must not be empty".to_string()));
    }
    values
        .into_iter()
        .map(|value| {
            let value = value.trim_matches(|c| c == ' ' || c == '\t').to_string();
            HeaderValue::from_bytes(value.as_bytes())
                .map(|_| value)
                .map_err(|e| Error::InvalidHeader(e.to_string()))
        })
        .collect()
}
