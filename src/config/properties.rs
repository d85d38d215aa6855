//! Directive storage and typed access

use super::values::{self, ValueError};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Typed access to directive values.
///
/// Every accessor reads the joined raw value through [`get`](Self::get) and
/// fails with [`ValueError::Empty`] when the directive is absent.
pub trait PropertyAccess {
    /// All values of a directive joined with single spaces, or an empty
    /// string when the directive is absent
    fn get(&self, name: &str) -> String;

    /// Read an `on`/`off` flag
    fn get_bool(&self, name: &str) -> Result<bool, ValueError> {
        values::parse_bool(&non_empty(self.get(name))?)
    }

    /// Read a signed integer
    fn get_int(&self, name: &str) -> Result<i64, ValueError> {
        values::parse_int(&non_empty(self.get(name))?)
    }

    /// Read a byte size (`k`, `m`, `g` suffixes)
    fn get_size(&self, name: &str) -> Result<i64, ValueError> {
        values::parse_size(&non_empty(self.get(name))?)
    }

    /// Read a `number size` buffer pair
    fn get_buf(&self, name: &str) -> Result<(i64, i64), ValueError> {
        values::parse_buffers(&non_empty(self.get(name))?)
    }

    /// Read a duration made of one or more time periods
    fn get_time(&self, name: &str) -> Result<Duration, ValueError> {
        values::parse_time(&non_empty(self.get(name))?)
    }
}

fn non_empty(value: String) -> Result<String, ValueError> {
    if value.is_empty() {
        Err(ValueError::Empty)
    } else {
        Ok(value)
    }
}

/// Directive name to values, in declaration order per name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties(HashMap<String, Vec<String>>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for a directive
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Raw values of a directive
    pub fn values(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Directive names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct directives
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PropertyAccess for Properties {
    fn get(&self, name: &str) -> String {
        self.values(name).join(" ")
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (name, value) in iter {
            props.push(name, value);
        }
        props
    }
}

/// A directive value, tagged with the `if` block it was declared in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalProperty {
    /// Index into [`ConditionalProperties::conditions`]; `None` when declared
    /// directly in the owning block
    pub condition: Option<usize>,
    pub value: String,
}

/// Directives of a block that may contain `if` blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionalProperties {
    conditions: Vec<String>,
    data: HashMap<String, Vec<ConditionalProperty>>,
}

impl ConditionalProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an `if` condition and return its index
    pub fn add_condition(&mut self, condition: impl Into<String>) -> usize {
        self.conditions.push(condition.into());
        self.conditions.len() - 1
    }

    /// Append a value declared under `condition` (`None` for unconditional)
    pub fn push(
        &mut self,
        name: impl Into<String>,
        condition: Option<usize>,
        value: impl Into<String>,
    ) {
        self.data
            .entry(name.into())
            .or_default()
            .push(ConditionalProperty {
                condition,
                value: value.into(),
            });
    }

    /// Condition expressions in the order their `if` blocks appear
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// All tagged values of a directive
    pub fn entries(&self, name: &str) -> &[ConditionalProperty] {
        self.data.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Values of a directive declared under exactly `condition`
    pub fn values_for(&self, name: &str, condition: Option<usize>) -> Vec<&str> {
        self.entries(name)
            .iter()
            .filter(|p| p.condition == condition)
            .map(|p| p.value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Directive names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.conditions.is_empty()
    }
}

impl PropertyAccess for ConditionalProperties {
    /// Values are flattened regardless of the condition they belong to
    fn get(&self, name: &str) -> String {
        self.entries(name)
            .iter()
            .map(|p| p.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
