use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_where::{validate_identifier, FilterWhere};
use super::types::{FilterOp, FilterOrderInfo, SortDirection};

/// Evaluates where objects against in-memory rows with the same semantics
/// `FilterWhere` renders for Postgres, including SQL NULL behaviour.
pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(where_data: &Value, row: &Map<String, Value>) -> Result<bool, FilterError> {
        match where_data {
            Value::Null => Ok(true),
            Value::Object(obj) => {
                for (key, value) in obj {
                    let ok = if key.starts_with('$') {
                        Self::logical(key, value, row)?
                    } else {
                        validate_identifier(key)?;
                        Self::field(key, value, row)?
                    };
                    if !ok {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn logical(op: &str, value: &Value, row: &Map<String, Value>) -> Result<bool, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut results = Vec::with_capacity(arr.len());
                for v in arr {
                    results.push(Self::matches(v, row)?);
                }
                Ok(if op == "$and" { results.iter().all(|r| *r) } else { results.iter().any(|r| *r) })
            }
            "$not" => Ok(!Self::matches(value, row)?),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn field(column: &str, value: &Value, row: &Map<String, Value>) -> Result<bool, FilterError> {
        let actual = row.get(column).unwrap_or(&Value::Null);
        if let Value::Object(ops) = value {
            for (op_key, op_val) in ops {
                let operator = FilterWhere::map_operator(op_key)?;
                if !Self::condition(&operator, actual, op_val)? {
                    return Ok(false);
                }
            }
            Ok(true)
        } else {
            Self::condition(&FilterOp::Eq, actual, value)
        }
    }

    fn condition(op: &FilterOp, actual: &Value, expected: &Value) -> Result<bool, FilterError> {
        Ok(match op {
            FilterOp::Eq => {
                if expected.is_null() { actual.is_null() } else { !actual.is_null() && values_equal(actual, expected) }
            }
            FilterOp::Ne => {
                if expected.is_null() { !actual.is_null() } else { !actual.is_null() && !values_equal(actual, expected) }
            }
            FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            FilterOp::Lte => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Like | FilterOp::ILike => {
                let (Some(text), Some(pattern)) = (actual.as_str(), expected.as_str()) else {
                    return Ok(false);
                };
                if matches!(op, FilterOp::ILike) {
                    like(&text.to_lowercase(), &pattern.to_lowercase())
                } else {
                    like(text, pattern)
                }
            }
            FilterOp::In | FilterOp::NIn => {
                let candidates = match expected {
                    Value::Array(values) => values.as_slice(),
                    other => std::slice::from_ref(other),
                };
                if candidates.is_empty() {
                    return Ok(matches!(op, FilterOp::NIn));
                }
                if actual.is_null() {
                    return Ok(false);
                }
                let found = candidates.iter().any(|c| values_equal(actual, c));
                if matches!(op, FilterOp::In) { found } else { !found }
            }
            FilterOp::Between => {
                let bounds = expected
                    .as_array()
                    .filter(|b| b.len() == 2)
                    .ok_or_else(|| FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string()))?;
                matches!(compare(actual, &bounds[0]), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, &bounds[1]), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::Text => {
                return Err(FilterError::UnsupportedOperator("$text".to_string()));
            }
        })
    }

    /// Sort rows the way Postgres would: NULLS LAST ascending, NULLS FIRST descending.
    pub fn sort(rows: &mut [Map<String, Value>], order: &[FilterOrderInfo]) {
        if order.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for info in order {
                let left = a.get(&info.column).unwrap_or(&Value::Null);
                let right = b.get(&info.column).unwrap_or(&Value::Null);
                let ordering = match (left.is_null(), right.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
                };
                let ordering = match info.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// SQL LIKE: `%` any run, `_` one char, backslash escapes the next char.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_at(&text, &pattern)
}

fn like_at(text: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => {
            let rest = &pattern[1..];
            (0..=text.len()).any(|skip| like_at(&text[skip..], rest))
        }
        Some('_') => !text.is_empty() && like_at(&text[1..], &pattern[1..]),
        Some('\\') if pattern.len() > 1 => {
            text.first() == Some(&pattern[1]) && like_at(&text[1..], &pattern[2..])
        }
        Some(c) => text.first() == Some(c) && like_at(&text[1..], &pattern[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn implicit_and_explicit_equality() {
        let r = row(json!({ "status": "PUBLISHED", "semester": 3, "subject_id": null }));
        assert!(FilterMatch::matches(&json!({ "status": "PUBLISHED", "semester": 3 }), &r).unwrap());
        assert!(FilterMatch::matches(&json!({ "semester": { "$eq": 3.0 } }), &r).unwrap());
        assert!(!FilterMatch::matches(&json!({ "status": "DRAFT" }), &r).unwrap());
        assert!(FilterMatch::matches(&json!({ "subject_id": null }), &r).unwrap());
    }

    #[test]
    fn null_columns_never_satisfy_comparisons() {
        let r = row(json!({ "subject_id": null }));
        assert!(!FilterMatch::matches(&json!({ "subject_id": { "$ne": "x" } }), &r).unwrap());
        assert!(!FilterMatch::matches(&json!({ "subject_id": { "$in": ["x"] } }), &r).unwrap());
        assert!(!FilterMatch::matches(&json!({ "subject_id": { "$nin": ["x"] } }), &r).unwrap());
    }

    #[test]
    fn ilike_is_case_insensitive_substring() {
        let r = row(json!({ "title": "Rust Compilers 101" }));
        assert!(FilterMatch::matches(&json!({ "title": { "$ilike": "%compilers%" } }), &r).unwrap());
        assert!(!FilterMatch::matches(&json!({ "title": { "$like": "%compilers%" } }), &r).unwrap());
        assert!(FilterMatch::matches(&json!({ "title": { "$like": "Rust_C%" } }), &r).unwrap());
    }

    #[test]
    fn like_escapes_wildcards() {
        assert!(like("100% done", "100\\% done"));
        assert!(!like("100x done", "100\\% done"));
        assert!(like("a_b", "a\\_b"));
        assert!(!like("axb", "a\\_b"));
    }

    #[test]
    fn logical_operators() {
        let r = row(json!({ "semester": 2, "published_year": 2024 }));
        let either = json!({ "$or": [ { "semester": 5 }, { "published_year": 2024 } ] });
        assert!(FilterMatch::matches(&either, &r).unwrap());
        assert!(!FilterMatch::matches(&json!({ "$not": either }), &r).unwrap());
        assert!(FilterMatch::matches(&json!({ "semester": { "$between": [1, 2] } }), &r).unwrap());
    }

    #[test]
    fn sorts_with_postgres_null_placement() {
        let mut rows = vec![
            row(json!({ "name": "b" })),
            row(json!({ "name": null })),
            row(json!({ "name": "a" })),
        ];
        FilterMatch::sort(&mut rows, &[FilterOrderInfo { column: "name".to_string(), sort: SortDirection::Asc }]);
        assert_eq!(rows[0]["name"], json!("a"));
        assert_eq!(rows[2]["name"], Value::Null);

        FilterMatch::sort(&mut rows, &[FilterOrderInfo { column: "name".to_string(), sort: SortDirection::Desc }]);
        assert_eq!(rows[0]["name"], Value::Null);
        assert_eq!(rows[1]["name"], json!("b"));
    }
}
