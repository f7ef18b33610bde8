//! # Query: filter & sort engines
//!
//! Client-supplied filter/sort parameters and the two engines applied to
//! extracted arrays. Both engines compare the *string form* of a field
//! (see [`value_text`]), so filtering and sorting stay type-agnostic.

use serde::Deserialize;
use serde_json::Value;

/// Per-request parameters, bound from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub filter_by: Option<String>,
    #[serde(default)]
    pub filter_value: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `desc` (any case) flips the order; everything else is ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

impl Query {
    pub fn order(&self) -> SortOrder {
        SortOrder::parse(self.sort_order.as_deref())
    }

    /// Filter then sort, in that order.
    pub fn apply(&self, elements: Vec<Value>) -> Vec<Value> {
        let filtered = filter(
            elements,
            self.filter_by.as_deref(),
            self.filter_value.as_deref(),
        );
        sort(filtered, self.sort_by.as_deref(), self.order())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Canonical text of a JSON value: strings verbatim, `null` empty, the rest as compact JSON.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}

fn field<'a>(element: &'a Value, name: &str) -> Option<&'a Value> {
    match element {
        Value::Object(map) => map.get(name),
        _ => None,
    }
}

/// Keep objects whose `filter_by` field contains `filter_value`, ignoring case.
/// Identity when either argument is missing or blank.
pub fn filter(elements: Vec<Value>, filter_by: Option<&str>, filter_value: Option<&str>) -> Vec<Value> {
    let (Some(by), Some(needle)) = (non_blank(filter_by), non_blank(filter_value)) else {
        return elements;
    };
    let needle = needle.to_lowercase();

    elements
        .into_iter()
        .filter(|el| {
            field(el, by)
                .map(|v| value_text(v).to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect()
}

/// Drop elements that have no `sort_by` field. Sorting never keeps unsortable records.
pub fn retain_sortable(elements: Vec<Value>, sort_by: &str) -> Vec<Value> {
    elements
        .into_iter()
        .filter(|el| field(el, sort_by).is_some())
        .collect()
}

/// Stable ordinal sort on the string form of `sort_by`.
/// Identity when `sort_by` is missing or blank.
pub fn sort(elements: Vec<Value>, sort_by: Option<&str>, order: SortOrder) -> Vec<Value> {
    let Some(by) = non_blank(sort_by) else {
        return elements;
    };

    let mut keyed: Vec<(String, Value)> = retain_sortable(elements, by)
        .into_iter()
        .map(|el| {
            let key = field(&el, by).map(value_text).unwrap_or_default();
            (key, el)
        })
        .collect();

    match order {
        SortOrder::Asc => keyed.sort_by(|a, b| a.0.cmp(&b.0)),
        SortOrder::Desc => keyed.sort_by(|a, b| b.0.cmp(&a.0)),
    }

    keyed.into_iter().map(|(_, el)| el).collect()
}
