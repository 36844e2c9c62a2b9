use serde_json::Value;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders a `where` object into a parameterised Postgres predicate.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidCondition("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.param_values.clear();
        self.conditions.clear();

        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = self.conditions.clone();
        for condition in &conditions_snapshot {
            if let Some(sql) = self.build_sql_condition(condition)? {
                sql_conditions.push(sql);
            }
        }
        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, self.param_values.clone()))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidCondition("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(());
                }
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate(v, self.param_index)?;
                    self.param_index += params.len();
                    self.param_values.extend(params);
                    sql_parts.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                let combined = format!("({})", sql_parts.join(joiner));
                self.conditions.push(FilterWhereInfo { column: combined, operator: FilterOp::Text, data: Value::Null });
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate(value, self.param_index)?;
                self.param_index += params.len();
                self.param_values.extend(params);
                self.conditions.push(FilterWhereInfo { column: format!("NOT ({})", sql), operator: FilterOp::Text, data: Value::Null });
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        Filter::validate_column(field)?;
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
                }
            }
            _ => {
                // Implicit equality: { field: value }
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
            }
        }
        Ok(())
    }

    pub fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<Option<String>, FilterError> {
        // Pseudo conditions where column already contains SQL (logical operators)
        if matches!(condition.operator, FilterOp::Text) {
            return Ok(Some(condition.column.clone()));
        }

        let quoted_column = format!("\"{}\"", condition.column);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { Ok(Some(format!("{} IS NULL", quoted_column))) }
                else { Ok(Some(format!("{} = {}", quoted_column, self.param(condition.data.clone())))) }
            }
            FilterOp::Ne => {
                if condition.data.is_null() { Ok(Some(format!("{} IS NOT NULL", quoted_column))) }
                else { Ok(Some(format!("{} <> {}", quoted_column, self.param(condition.data.clone())))) }
            }
            FilterOp::Gt => Ok(Some(format!("{} > {}", quoted_column, self.param(condition.data.clone())))),
            FilterOp::Gte => Ok(Some(format!("{} >= {}", quoted_column, self.param(condition.data.clone())))),
            FilterOp::Lt => Ok(Some(format!("{} < {}", quoted_column, self.param(condition.data.clone())))),
            FilterOp::Lte => Ok(Some(format!("{} <= {}", quoted_column, self.param(condition.data.clone())))),
            FilterOp::Like => Ok(Some(format!("{} LIKE {}", quoted_column, self.param(condition.data.clone())))),
            FilterOp::ILike => Ok(Some(format!("{} ILIKE {}", quoted_column, self.param(condition.data.clone())))),
            FilterOp::In | FilterOp::NIn => {
                let negate = matches!(condition.operator, FilterOp::NIn);
                if let Value::Array(values) = &condition.data {
                    if values.is_empty() {
                        return Ok(Some(if negate { "1=1" } else { "1=0" }.to_string()));
                    }
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    let keyword = if negate { "NOT IN" } else { "IN" };
                    Ok(Some(format!("{} {} ({})", quoted_column, keyword, params.join(", "))))
                } else {
                    Err(FilterError::InvalidOperatorData("$in/$nin require an array".to_string()))
                }
            }
            FilterOp::Text => Ok(None),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_is_parameterised() {
        let (sql, params) = FilterWhere::generate(&json!({ "user_id": "u1", "workspace_id": "w1" }), 0).unwrap();
        assert_eq!(sql, "\"user_id\" = $1 AND \"workspace_id\" = $2");
        assert_eq!(params, vec![json!("u1"), json!("w1")]);
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn nested_and_keeps_param_numbering() {
        let where_data = json!({
            "$and": [{ "status": "TODO" }, { "status": { "$ne": "DONE" } }],
            "workspace_id": "w1"
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(sql, "((\"status\" = $1) AND (\"status\" <> $2)) AND \"workspace_id\" = $3");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn rejects_unsafe_columns() {
        let err = FilterWhere::generate(&json!({ "name\"; DROP TABLE x; --": 1 }), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidField(_)));
    }
}
