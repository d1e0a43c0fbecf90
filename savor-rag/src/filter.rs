//! Structured metadata predicates for constraining retrieval.
//!
//! Filters are plain values rather than expression strings, so user input
//! never has to be spliced into a query language.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Comparison applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Field equals the value exactly.
    Eq,
    /// Field is absent or differs from the value.
    Ne,
    /// Field contains the value, ignoring case.
    Contains,
}

/// A single `(field, operator, value)` condition over chunk metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: field.into(), op: FilterOp::Eq, value: value.into() }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: field.into(), op: FilterOp::Ne, value: value.into() }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: field.into(), op: FilterOp::Contains, value: value.into() }
    }

    /// Evaluate the predicate against a metadata map.
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        match (self.op, metadata.get(&self.field)) {
            (FilterOp::Eq, Some(actual)) => actual == &self.value,
            (FilterOp::Ne, Some(actual)) => actual != &self.value,
            (FilterOp::Ne, None) => true,
            (FilterOp::Contains, Some(actual)) => {
                actual.to_lowercase().contains(&self.value.to_lowercase())
            }
            (FilterOp::Eq | FilterOp::Contains, None) => false,
        }
    }
}

/// A conjunction of [`Predicate`]s. An empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataFilter {
    #[serde(default)]
    pub clauses: Vec<Predicate>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause that must also hold.
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.clauses.push(predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        self.clauses.iter().all(|p| p.matches(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn contains_ignores_case() {
        let p = Predicate::contains("location", "beijing");
        assert!(p.matches(&meta(&[("location", "Downtown Beijing")])));
        assert!(!p.matches(&meta(&[("location", "Shanghai")])));
    }

    #[test]
    fn missing_field_only_satisfies_ne() {
        let empty = HashMap::new();
        assert!(!Predicate::eq("cuisine", "sichuan").matches(&empty));
        assert!(!Predicate::contains("cuisine", "sichuan").matches(&empty));
        assert!(Predicate::ne("cuisine", "sichuan").matches(&empty));
    }

    #[test]
    fn all_clauses_must_hold() {
        let filter = MetadataFilter::new()
            .and(Predicate::eq("cuisine", "sichuan"))
            .and(Predicate::contains("location", "chengdu"));
        assert!(filter.matches(&meta(&[("cuisine", "sichuan"), ("location", "Chengdu")])));
        assert!(!filter.matches(&meta(&[("cuisine", "sichuan"), ("location", "Xi'an")])));
        assert!(MetadataFilter::new().matches(&HashMap::new()));
    }

    #[test]
    fn deserializes_from_json() {
        let filter: MetadataFilter = serde_json::from_str(
            r#"{"clauses":[{"field":"filename","op":"eq","value":"menu.md"}]}"#,
        )
        .unwrap();
        assert_eq!(filter.clauses, vec![Predicate::eq("filename", "menu.md")]);
    }
}
