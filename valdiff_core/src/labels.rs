//! Contextual labels captured from record fields.
//!
//! A [`LabelScope`] is an immutable view for one subtree: entering a record produces a new
//! scope for its fields, and returning from the record simply drops it. Siblings therefore
//! never observe labels set inside each other.

use crate::value::Field;
use valdiff_common::Label;

/// Ordered, de-duplicated set of label field names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelNames {
    names: Vec<String>,
}

impl LabelNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelScope {
    values: Vec<Option<String>>,
}

impl LabelScope {
    pub fn root(names: &LabelNames) -> Self {
        Self {
            values: vec![None; names.len()],
        }
    }

    /// Record `value` under `name` if it is a configured label. Empty values never override.
    ///
    /// Returns `false` when `names` is not the set this scope was created from and `name`
    /// falls outside it.
    pub fn set_if_matches(&mut self, names: &LabelNames, name: &str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match names.position(name).and_then(|index| self.values.get_mut(index)) {
            Some(slot) => {
                *slot = Some(value.to_string());
                true
            }
            None => false,
        }
    }

    /// Scope seen by the fields of a record: string fields named like a label override the
    /// enclosing values. A string wrapped in held values (`Dyn`) counts as a string field, so
    /// document records and `Option<String>` fields supply labels too.
    pub fn enter_record(&self, names: &LabelNames, fields: &[Field]) -> LabelScope {
        let mut scope = self.clone();
        if names.is_empty() {
            return scope;
        }
        for field in fields {
            if let Some(value) = field.value.unwrap_held().as_str() {
                scope.set_if_matches(names, &field.name, value);
            }
        }
        scope
    }

    /// One label per configured name, in configured order.
    pub fn snapshot(&self, names: &LabelNames) -> Vec<Label> {
        names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| Label::new(name, value.clone().unwrap_or_default()))
            .collect()
    }
}
