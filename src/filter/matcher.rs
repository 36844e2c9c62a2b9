//! In-process evaluation of the filter language, used by stores that keep
//! documents in memory. Semantics follow the SQL rendering in `filter_where`.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOp, FilterOrderInfo, SortDirection};

pub struct FilterMatcher {
    where_data: Value,
    order: Vec<FilterOrderInfo>,
    limit: Option<usize>,
    offset: usize,
}

impl FilterMatcher {
    pub fn new(data: &FilterData, max_limit: Option<i32>) -> Result<Self, FilterError> {
        let where_data = data.where_clause.clone().unwrap_or(Value::Null);
        FilterWhere::validate(&where_data)?;
        // Parse once up front so invalid operators fail even on empty collections
        Self::check(&where_data)?;

        let order = match &data.order {
            Some(order) => FilterOrder::validate_and_parse(order)?,
            None => vec![],
        };

        let limit = match data.limit {
            Some(l) if l < 0 => return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())),
            Some(l) => Some(max_limit.map_or(l, |max| l.min(max)) as usize),
            None => max_limit.map(|max| max.max(0) as usize),
        };
        let offset = match data.offset {
            Some(o) if o < 0 => return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())),
            Some(o) => o as usize,
            None => 0,
        };

        Ok(Self { where_data, order, limit, offset })
    }

    /// Returns the page of matching documents and the total match count
    pub fn apply<'a>(&self, documents: impl Iterator<Item = &'a Map<String, Value>>) -> Result<(Vec<Map<String, Value>>, usize), FilterError> {
        let mut matched = Vec::new();
        for doc in documents {
            if Self::matches(&self.where_data, doc)? {
                matched.push(doc.clone());
            }
        }
        let total = matched.len();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| self.compare_docs(a, b));
        }

        let page = matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    fn check(where_data: &Value) -> Result<(), FilterError> {
        Self::matches(where_data, &Map::new()).map(|_| ())
    }

    pub fn matches(where_data: &Value, doc: &Map<String, Value>) -> Result<bool, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(true),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidCondition("WHERE must be an object".to_string())),
        };

        let mut result = true;
        for (key, value) in obj {
            let ok = match key.as_str() {
                "$and" => {
                    let arr = Self::as_array(key, value)?;
                    let mut all = true;
                    for v in arr {
                        all &= Self::matches(v, doc)?;
                    }
                    all
                }
                "$or" => {
                    let arr = Self::as_array(key, value)?;
                    if arr.is_empty() {
                        true
                    } else {
                        let mut any = false;
                        for v in arr {
                            any |= Self::matches(v, doc)?;
                        }
                        any
                    }
                }
                "$not" => !Self::matches(value, doc)?,
                op if op.starts_with('$') => return Err(FilterError::UnsupportedOperator(op.to_string())),
                field => Self::field_matches(doc.get(field).unwrap_or(&Value::Null), value)?,
            };
            result &= ok;
        }
        Ok(result)
    }

    fn as_array<'v>(op: &str, value: &'v Value) -> Result<&'v Vec<Value>, FilterError> {
        value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))
    }

    fn field_matches(actual: &Value, condition: &Value) -> Result<bool, FilterError> {
        match condition {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) => {
                let mut all = true;
                for (op_key, expected) in obj {
                    let op = FilterWhere::map_operator(op_key)?;
                    all &= Self::op_matches(&op, actual, expected)?;
                }
                Ok(all)
            }
            expected => Self::op_matches(&FilterOp::Eq, actual, expected),
        }
    }

    fn op_matches(op: &FilterOp, actual: &Value, expected: &Value) -> Result<bool, FilterError> {
        Ok(match op {
            FilterOp::Eq => values_equal(actual, expected),
            FilterOp::Ne => {
                if expected.is_null() { !actual.is_null() } else { !actual.is_null() && !values_equal(actual, expected) }
            }
            // SQL comparisons against NULL are never true
            FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            FilterOp::Lte => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Like | FilterOp::ILike => {
                let pattern = expected
                    .as_str()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$like/$ilike require a string".to_string()))?;
                match actual.as_str() {
                    Some(text) if matches!(op, FilterOp::ILike) => like(&text.to_lowercase(), &pattern.to_lowercase()),
                    Some(text) => like(text, pattern),
                    None => false,
                }
            }
            FilterOp::In | FilterOp::NIn => {
                let values = expected
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in/$nin require an array".to_string()))?;
                let found = values.iter().any(|v| values_equal(actual, v));
                if matches!(op, FilterOp::In) { found } else { !actual.is_null() && !found }
            }
            FilterOp::Text => return Err(FilterError::UnsupportedOperator("$text".to_string())),
        })
    }

    fn compare_docs(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        for info in &self.order {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            // NULLs sort last ascending and first descending, as in Postgres
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
            };
            let ord = match info.sort {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
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

#[derive(Clone, Copy, PartialEq)]
enum LikeToken {
    Any,
    One,
    Char(char),
}

/// Splits a LIKE pattern; a backslash makes the next character literal
fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Char(chars.next().unwrap_or('\\')),
            other => LikeToken::Char(other),
        });
    }
    tokens
}

/// SQL LIKE with `%` (any run), `_` (single char) and `\` escapes
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = like_tokens(pattern);
    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        let step = match pattern.get(p) {
            Some(LikeToken::One) => true,
            Some(LikeToken::Char(c)) => *c == text[t],
            _ => false,
        };
        if step {
            t += 1;
            p += 1;
        } else if pattern.get(p) == Some(&LikeToken::Any) {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pattern.get(p) == Some(&LikeToken::Any) {
        p += 1;
    }
    p == pattern.len()
}
