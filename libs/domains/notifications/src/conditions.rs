//! Trigger conditions evaluated against an event payload.
//!
//! ```json
//! { "all": [
//!     { "field": "amount", "operator": "gte", "value": 1000 },
//!     { "any": [
//!         { "field": "customer.tier", "operator": "in", "value": ["gold", "platinum"] },
//!         { "field": "flagged", "operator": "exists" }
//!     ]}
//! ]}
//! ```

use serde_json::Value;
use std::cmp::Ordering;
use strum::{Display, EnumString};

use crate::error::{NotificationError, NotificationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    In,
    Exists,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub field: String,
    pub operator: Operator,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Rule(Rule),
}

fn invalid(message: impl Into<String>) -> NotificationError {
    NotificationError::Condition(message.into())
}

impl Condition {
    pub fn parse(value: &Value) -> NotificationResult<Self> {
        let Value::Object(map) = value else {
            return Err(invalid("condition must be an object"));
        };

        if let Some(all) = map.get("all") {
            return Ok(Condition::All(Self::parse_list("all", all)?));
        }
        if let Some(any) = map.get("any") {
            return Ok(Condition::Any(Self::parse_list("any", any)?));
        }

        let field = map
            .get("field")
            .and_then(Value::as_str)
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| invalid("rule needs a non-empty string `field`"))?;
        let operator = map
            .get("operator")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("rule on `{field}` needs an `operator`")))?;
        let operator: Operator = operator
            .parse()
            .map_err(|_| invalid(format!("unknown operator `{operator}`")))?;
        let value = map.get("value").cloned();

        match (operator, &value) {
            (Operator::Exists, None | Some(Value::Bool(_))) => {}
            (Operator::Exists, Some(_)) => return Err(invalid("`exists` takes a boolean value")),
            (Operator::In, Some(Value::Array(_))) => {}
            (Operator::In, _) => return Err(invalid("`in` needs an array value")),
            (_, None) => return Err(invalid(format!("`{operator}` needs a value"))),
            _ => {}
        }

        Ok(Condition::Rule(Rule {
            field: field.trim().to_string(),
            operator,
            value,
        }))
    }

    fn parse_list(key: &str, value: &Value) -> NotificationResult<Vec<Self>> {
        value
            .as_array()
            .ok_or_else(|| invalid(format!("`{key}` must be an array")))?
            .iter()
            .map(Self::parse)
            .collect()
    }

    /// `all: []` holds, `any: []` does not.
    pub fn evaluate(&self, payload: &Value) -> bool {
        match self {
            Condition::All(items) => items.iter().all(|c| c.evaluate(payload)),
            Condition::Any(items) => items.iter().any(|c| c.evaluate(payload)),
            Condition::Rule(rule) => rule.evaluate(payload),
        }
    }
}

/// Parses and evaluates; `None` conditions always hold.
pub fn matches(conditions: Option<&Value>, payload: &Value) -> NotificationResult<bool> {
    match conditions {
        None | Some(Value::Null) => Ok(true),
        Some(raw) => Ok(Condition::parse(raw)?.evaluate(payload)),
    }
}

/// Dot-path lookup; numeric segments index arrays.
pub fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality that treats `5`, `5.0` and `"5"` alike.
fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            matches!((as_number(a), as_number(b)), (Some(x), Some(y)) if x == y)
        }
        (Value::Bool(x), Value::String(s)) | (Value::String(s), Value::Bool(x)) => {
            s.eq_ignore_ascii_case(if *x { "true" } else { "false" })
        }
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        },
    }
}

impl Rule {
    pub fn evaluate(&self, payload: &Value) -> bool {
        let actual = lookup(payload, &self.field).filter(|v| !v.is_null());

        if self.operator == Operator::Exists {
            let wanted = self.value.as_ref().and_then(Value::as_bool).unwrap_or(true);
            return actual.is_some() == wanted;
        }

        let Some(expected) = &self.value else {
            return false;
        };

        let Some(actual) = actual else {
            return self.operator == Operator::Ne;
        };

        match self.operator {
            Operator::Eq => loose_eq(actual, expected),
            Operator::Ne => !loose_eq(actual, expected),
            Operator::Gt => compare(actual, expected) == Some(Ordering::Greater),
            Operator::Gte => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => compare(actual, expected) == Some(Ordering::Less),
            Operator::Lte => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Contains => match (actual, expected) {
                (Value::String(haystack), Value::String(needle)) => {
                    haystack.contains(needle.as_str())
                }
                (Value::Array(items), _) => items.iter().any(|i| loose_eq(i, expected)),
                _ => false,
            },
            Operator::In => expected
                .as_array()
                .is_some_and(|options| options.iter().any(|o| loose_eq(actual, o))),
            Operator::Exists => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn holds(condition: Value, payload: Value) -> bool {
        Condition::parse(&condition).unwrap().evaluate(&payload)
    }

    #[test]
    fn comparison_operators_coerce_numeric_strings() {
        let payload = json!({ "amount": "1500", "count": 3 });
        assert!(holds(json!({"field": "amount", "operator": "gte", "value": 1000}), payload.clone()));
        assert!(holds(json!({"field": "count", "operator": "eq", "value": "3"}), payload.clone()));
        assert!(!holds(json!({"field": "count", "operator": "gt", "value": 3}), payload.clone()));
        assert!(holds(json!({"field": "count", "operator": "lte", "value": 3.0}), payload));
    }

    #[test]
    fn nested_groups_and_dot_paths() {
        let condition = json!({ "all": [
            { "field": "invoice.total", "operator": "gt", "value": 100 },
            { "any": [
                { "field": "customer.tier", "operator": "in", "value": ["gold", "platinum"] },
                { "field": "flagged", "operator": "exists" }
            ]}
        ]});
        assert!(holds(
            condition.clone(),
            json!({ "invoice": { "total": 250 }, "customer": { "tier": "gold" } })
        ));
        assert!(holds(
            condition.clone(),
            json!({ "invoice": { "total": 250 }, "flagged": true })
        ));
        assert!(!holds(
            condition,
            json!({ "invoice": { "total": 250 }, "customer": { "tier": "basic" } })
        ));
    }

    #[test]
    fn contains_works_on_strings_and_arrays() {
        let payload = json!({ "title": "Quarterly audit", "tags": ["urgent", 7] });
        assert!(holds(json!({"field": "title", "operator": "contains", "value": "audit"}), payload.clone()));
        assert!(holds(json!({"field": "tags", "operator": "contains", "value": "7"}), payload.clone()));
        assert!(!holds(json!({"field": "tags", "operator": "contains", "value": "later"}), payload));
    }

    #[test]
    fn missing_fields() {
        let payload = json!({ "status": null });
        assert!(!holds(json!({"field": "status", "operator": "exists"}), payload.clone()));
        assert!(holds(json!({"field": "status", "operator": "exists", "value": false}), payload.clone()));
        assert!(holds(json!({"field": "status", "operator": "ne", "value": "paid"}), payload.clone()));
        assert!(!holds(json!({"field": "status", "operator": "eq", "value": "paid"}), payload));
    }

    #[test]
    fn empty_groups() {
        assert!(holds(json!({ "all": [] }), json!({})));
        assert!(!holds(json!({ "any": [] }), json!({})));
    }

    #[test]
    fn malformed_conditions_are_errors() {
        for bad in [
            json!("amount > 5"),
            json!({ "field": "a", "operator": "between", "value": 1 }),
            json!({ "field": "a", "operator": "eq" }),
            json!({ "field": "a", "operator": "in", "value": "x" }),
            json!({ "all": { "field": "a" } }),
            json!({ "operator": "exists" }),
        ] {
            assert!(
                matches!(Condition::parse(&bad), Err(NotificationError::Condition(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn absent_conditions_always_match() {
        assert!(matches(None, &json!({})).unwrap());
        assert!(matches(Some(&Value::Null), &json!({})).unwrap());
    }
}
