use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    /// Pre-rendered SQL fragment produced by a logical operator
    #[serde(rename = "$text")] Text,
}

/// Query accepted by every document store: `where` in the `$op` JSON
/// language, an order spec, and optional paging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl FilterData {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field = value`, ANDed with existing conditions
    pub fn equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.condition(field, value.into())
    }

    /// `field IN (values)`
    pub fn contains<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.condition(field, json!({ "$in": values }))
    }

    /// Case-insensitive substring match; `%` and `_` in `term` match literally
    pub fn search(self, field: &str, term: &str) -> Self {
        self.condition(field, json!({ "$ilike": format!("%{}%", escape_like(term)) }))
    }

    pub fn order_desc(self, field: &str) -> Self {
        self.push_order(field, "desc")
    }

    pub fn order_asc(self, field: &str) -> Self {
        self.push_order(field, "asc")
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn condition(mut self, field: &str, value: Value) -> Self {
        let mut obj = match self.where_clause.take() {
            Some(Value::Object(obj)) => obj,
            _ => Map::new(),
        };
        // A second condition on the same field merges operator objects, or
        // falls back to an explicit $and so neither condition is lost.
        match (obj.remove(field), value) {
            (None, value) => {
                obj.insert(field.to_string(), value);
            }
            (Some(Value::Object(mut a)), Value::Object(b))
                if a.keys().chain(b.keys()).all(|k| k.starts_with('$')) =>
            {
                a.extend(b);
                obj.insert(field.to_string(), Value::Object(a));
            }
            (Some(a), b) => {
                let and = obj.entry("$and").or_insert_with(|| Value::Array(vec![]));
                if let Value::Array(items) = and {
                    items.push(json!({ field: a }));
                    items.push(json!({ field: b }));
                }
            }
        }
        self.where_clause = Some(Value::Object(obj));
        self
    }

    fn push_order(mut self, field: &str, dir: &str) -> Self {
        let entry = Value::String(format!("{} {}", field, dir));
        self.order = Some(match self.order.take() {
            Some(Value::Array(mut items)) => {
                items.push(entry);
                Value::Array(items)
            }
            Some(existing @ Value::String(_)) => Value::Array(vec![existing, entry]),
            _ => Value::Array(vec![entry]),
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Escapes LIKE wildcards so `term` matches literally (backslash is the
/// default escape character in Postgres)
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_ands_conditions() {
        let data = FilterData::new()
            .equal("user_id", "u1")
            .equal("workspace_id", "w1")
            .order_desc("created_at");
        assert_eq!(data.where_clause, Some(json!({ "user_id": "u1", "workspace_id": "w1" })));
        assert_eq!(data.order, Some(json!(["created_at desc"])));
    }

    #[test]
    fn repeated_field_becomes_explicit_and() {
        let data = FilterData::new().equal("status", "TODO").equal("status", "DONE");
        assert_eq!(
            data.where_clause,
            Some(json!({ "$and": [{ "status": "TODO" }, { "status": "DONE" }] }))
        );
    }

    #[test]
    fn search_escapes_wildcards() {
        let data = FilterData::new().search("name", "50%_off");
        assert_eq!(data.where_clause, Some(json!({ "name": { "$ilike": "%50\\%\\_off%" } })));
    }
}
