//! Query options. Every option replaces all values of its key; the values are
//! merged into the URL's own query string when the request executes.
use crate::option::RequestOption;
use crate::request::{QueryValues, Request};
use std::fmt;

/// Replaces all values of one query key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    key: String,
    values: Vec<String>,
}

impl RequestOption for Query {
    fn apply(&self, request: &mut Request) {
        request.query.insert(self.key.clone(), self.values.clone());
    }
}

pub fn query(key: impl Into<String>, value: impl Into<String>) -> Query {
    Query {
        key: key.into(),
        values: vec![value.into()],
    }
}

pub fn query_int(key: impl Into<String>, value: impl Into<i64>) -> Query {
    query(key, value.into().to_string())
}

pub fn query_uint(key: impl Into<String>, value: impl Into<u64>) -> Query {
    query(key, value.into().to_string())
}

/// Formats `value` at its own precision, so `0.1f32` is written as `0.1`.
pub fn query_float<F>(key: impl Into<String>, value: F) -> Query
where
    F: Into<f64> + fmt::Display,
{
    query(key, value.to_string())
}

pub fn query_bool(key: impl Into<String>, value: bool) -> Query {
    query(key, value.to_string())
}

/// Sets several keys at once. Each key present in `values` replaces that key's
/// values; a key with an empty list removes the key from the final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Values(QueryValues);

impl RequestOption for Values {
    fn apply(&self, request: &mut Request) {
        for (key, values) in &self.0 {
            request.query.insert(key.clone(), values.clone());
        }
    }
}

pub fn query_values(values: QueryValues) -> Values {
    Values(values)
}
