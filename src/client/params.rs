//! Query parameter building
//!
//! The remote API takes structured filter values (`{"gt": 1609459200}`) and
//! membership lists as JSON-encoded strings inside ordinary query
//! parameters. `build_params` forces the fixed page size and performs that
//! encoding; scalar values pass through via their display form.

use crate::types::JsonValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// Records requested per page; fixed by the remote API's maximum
pub const PAGE_LIMIT: i64 = 200;

/// Query parameters keyed by filter name
pub type Params = BTreeMap<String, ParamValue>;

/// A single query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Plain string, passed through unchanged
    String(String),
    /// Integer scalar
    Int(i64),
    /// Float scalar
    Float(f64),
    /// Boolean scalar, transmitted as `true`/`false`
    Bool(bool),
    /// List value, JSON-encoded before transmission
    List(Vec<JsonValue>),
    /// Structured filter expression, JSON-encoded before transmission
    Filter(Filter),
}

impl ParamValue {
    /// Render the value to its wire form
    pub fn encode(&self) -> String {
        match self {
            ParamValue::String(s) => s.clone(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            // Vec and Filter serialization cannot fail.
            ParamValue::List(values) => serde_json::to_string(values).unwrap_or_default(),
            ParamValue::Filter(filter) => serde_json::to_string(filter).unwrap_or_default(),
        }
    }

    /// Whether this value is a scalar (transmitted without JSON encoding)
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ParamValue::List(_) | ParamValue::Filter(_))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Filter> for ParamValue {
    fn from(value: Filter) -> Self {
        ParamValue::Filter(value)
    }
}

/// Structured filter expression, serialized as `{"op": value, ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filter {
    /// Strictly greater than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<JsonValue>,

    /// Greater than or equal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<JsonValue>,

    /// Strictly less than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<JsonValue>,

    /// Less than or equal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<JsonValue>,

    /// Membership
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub within: Option<Vec<JsonValue>>,
}

impl Filter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a greater-than bound
    #[must_use]
    pub fn gt(mut self, value: impl Into<JsonValue>) -> Self {
        self.gt = Some(value.into());
        self
    }

    /// Add a greater-than-or-equal bound
    #[must_use]
    pub fn gte(mut self, value: impl Into<JsonValue>) -> Self {
        self.gte = Some(value.into());
        self
    }

    /// Add a less-than bound
    #[must_use]
    pub fn lt(mut self, value: impl Into<JsonValue>) -> Self {
        self.lt = Some(value.into());
        self
    }

    /// Add a less-than-or-equal bound
    #[must_use]
    pub fn lte(mut self, value: impl Into<JsonValue>) -> Self {
        self.lte = Some(value.into());
        self
    }

    /// Add a membership constraint
    #[must_use]
    pub fn is_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        self.within = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Build the final query pairs: force `limit`, encode every value
///
/// Existing keys are preserved untouched apart from `limit`, which is
/// always overwritten with the fixed page size.
pub fn build_params(mut params: Params) -> Vec<(String, String)> {
    params.insert("limit".to_string(), ParamValue::Int(PAGE_LIMIT));
    params
        .into_iter()
        .map(|(key, value)| (key, value.encode()))
        .collect()
}
