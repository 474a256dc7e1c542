use serde_json::Value;

use super::error::FilterError;
use super::is_valid_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Compiles a JSON where-document into a parameterised SQL predicate.
///
/// Field keys compare a column (`{"user_id": 3}` or `{"name": {"$ilike": "%a%"}}`);
/// `$and`, `$or` and `$not` nest sub-documents. Sibling keys are joined with `AND`.
pub struct FilterWhere {
    param_values: Vec<Value>,
    starting_param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            starting_param_index,
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let clause = filter_where.build_clause(where_data)?;
        Ok((clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build_clause(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.build_logical(key, value)?);
            } else {
                for condition in Self::parse_field_condition(key, value)? {
                    parts.push(self.build_sql_condition(&condition)?);
                }
            }
        }

        if parts.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(parts.join(" AND "))
        }
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Empty conjunction is true, empty disjunction is false
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build_clause(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build_clause(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        match value {
            Value::Object(obj) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    Ok(FilterWhereInfo {
                        column: field.to_string(),
                        operator: Self::map_operator(op_key)?,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            }]),
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NULL", quoted_column))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Ne => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted_column))
                } else {
                    Ok(format!("{} <> {}", quoted_column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Like | FilterOp::ILike => {
                if !condition.data.is_string() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "pattern for '{}' must be a string",
                        condition.column
                    )));
                }
                let keyword = if condition.operator == FilterOp::Like { "LIKE" } else { "ILIKE" };
                Ok(format!("{} {} {}", quoted_column, keyword, self.param(condition.data.clone())))
            }
            FilterOp::In => match &condition.data {
                Value::Array(values) if values.is_empty() => Ok("1=0".to_string()),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                }
                other => Ok(format!("{} = {}", quoted_column, self.param(other.clone()))),
            },
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.starting_param_index + self.param_values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality() {
        let (sql, params) = FilterWhere::generate(&json!({ "user_id": 7 }), 0).unwrap();
        assert_eq!(sql, "\"user_id\" = $1");
        assert_eq!(params, vec![json!(7)]);
    }

    #[test]
    fn or_inside_and_numbers_params_sequentially() {
        let where_data = json!({
            "user_id": 3,
            "$or": [
                { "name": { "$ilike": "%jo%" } },
                { "email": { "$ilike": "%jo%" } }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        // serde_json maps iterate in key order, so "$or" comes first
        assert_eq!(
            sql,
            "((\"name\" ILIKE $1) OR (\"email\" ILIKE $2)) AND \"user_id\" = $3"
        );
        assert_eq!(params, vec![json!("%jo%"), json!("%jo%"), json!(3)]);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "id": { "$in": [1, 2] } }), 2).unwrap();
        assert_eq!(sql, "\"id\" IN ($3, $4)");
    }

    #[test]
    fn empty_in_and_empty_or_match_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
        let (sql, _) = FilterWhere::generate(&json!({ "$or": [] }), 0).unwrap();
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn not_and_null_comparisons() {
        let (sql, params) = FilterWhere::generate(&json!({ "$not": { "phone": null } }), 0).unwrap();
        assert_eq!(sql, "NOT (\"phone\" IS NULL)");
        assert!(params.is_empty());
        let (sql, _) = FilterWhere::generate(&json!({ "phone": { "$ne": null } }), 0).unwrap();
        assert_eq!(sql, "\"phone\" IS NOT NULL");
    }

    #[test]
    fn rejects_bad_columns_and_operators() {
        assert!(matches!(
            FilterWhere::generate(&json!({ "name\" OR 1=1 --": 1 }), 0),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "name": { "$regex": "x" } }), 0),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "name": { "$ilike": 5 } }), 0),
            Err(FilterError::InvalidOperatorData(_))
        ));
        assert!(FilterWhere::validate(&json!("raw sql")).is_err());
    }
}
