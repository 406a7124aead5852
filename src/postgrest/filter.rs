//! Row filters rendered as PostgREST query parameters

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    column: String,
    value: String,
}

/// Conjunction of column conditions, e.g. `user_id = x AND entry_date = y`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter rows where column equals a value
    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// `(column, "eq.value")` pairs in the order they were added.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.conditions
            .iter()
            .map(|c| (c.column.clone(), format!("eq.{}", c.value)))
            .collect()
    }
}
