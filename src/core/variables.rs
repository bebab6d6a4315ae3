//! # Variable Store / 变量存储
//!
//! String bindings available to `@@name@@` placeholders. A store is created
//! per test case from the seed values and grows as tables capture values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::instruction::CompileError;

/// Marker placed before and after a variable name.
pub const VARIABLE_MARKER: &str = "@@";

/// Value assigned to placeholders that can only be resolved at run time.
pub const DUMMY_VALUE: &str = "dummy";

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@@([^@]+)@@").expect("placeholder pattern is valid"));

/// An ordered string-to-string map with last-write-wins semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `key=value` pairs as given on the command line.
    /// Entries without `=` or with an empty key are ignored.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = Self::new();
        for pair in pairs {
            if let Some((key, value)) = pair.as_ref().split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    store.insert(key, value.trim());
                }
            }
        }
        store
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Merges `other` into `self`; values from `other` overwrite existing keys.
    pub fn merge(&mut self, other: &VariableStore) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replaces every `@@name@@` in `text` with its bound value.
    ///
    /// Substitution is single-pass: replacement text is never rescanned.
    /// A placeholder without a binding fails with
    /// [`CompileError::UnresolvedVariable`].
    pub fn substitute(&self, text: &str, step_id: i32) -> Result<String, CompileError> {
        if !text.contains(VARIABLE_MARKER) {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for captures in PLACEHOLDER_PATTERN.captures_iter(text) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = self
                .get(name.as_str())
                .ok_or_else(|| CompileError::UnresolvedVariable {
                    step_id,
                    name: name.as_str().to_string(),
                })?;
            result.push_str(&text[last..whole.start()]);
            result.push_str(value);
            last = whole.end();
        }
        result.push_str(&text[last..]);
        Ok(result)
    }

    /// Binds every placeholder name found in `texts` that is not yet bound to
    /// [`DUMMY_VALUE`]. Used to validate documents whose values are only known
    /// once earlier tables have run.
    pub fn with_placeholders_from<'a, I>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for text in texts {
            for name in placeholder_names(text) {
                if !self.contains(&name) {
                    self.insert(name, DUMMY_VALUE);
                }
            }
        }
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableStore {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.insert(key, value);
        }
        store
    }
}

/// Returns the names of all `@@name@@` placeholders in `text`, in order.
pub fn placeholder_names(text: &str) -> Vec<String> {
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
