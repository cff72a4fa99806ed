use super::resolver::{resolve, KeyPath};
use super::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Comparison applied to the value found at a condition's key path.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Equals(Value),
    NotEquals(Value),
    OneOf(Vec<Value>),
}

/// A single `field <op> value` test.
///
/// In configuration it is written as `{"field": "status", "equals": "Scheduled"}`
/// with exactly one of `equals`, `notEquals` or `in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub struct FieldCondition {
    pub field: KeyPath,
    pub op: Operator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawCondition {
    field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equals: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not_equals: Option<Value>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    one_of: Option<Vec<Value>>,
}

impl TryFrom<RawCondition> for FieldCondition {
    type Error = ConfigError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        let field = KeyPath::parse(&raw.field)?;
        let op = match (raw.equals, raw.not_equals, raw.one_of) {
            (Some(v), None, None) => Operator::Equals(v),
            (None, Some(v), None) => Operator::NotEquals(v),
            (None, None, Some(vs)) => Operator::OneOf(vs),
            (None, None, None) => {
                return Err(ConfigError::InvalidCondition(format!(
                    "condition on '{field}' has no operator"
                )))
            }
            _ => {
                return Err(ConfigError::InvalidCondition(format!(
                    "condition on '{field}' has more than one operator"
                )))
            }
        };
        Ok(Self { field, op })
    }
}

impl From<FieldCondition> for RawCondition {
    fn from(cond: FieldCondition) -> Self {
        let mut raw = RawCondition {
            field: cond.field.into(),
            equals: None,
            not_equals: None,
            one_of: None,
        };
        match cond.op {
            Operator::Equals(v) => raw.equals = Some(v),
            Operator::NotEquals(v) => raw.not_equals = Some(v),
            Operator::OneOf(vs) => raw.one_of = Some(vs),
        }
        raw
    }
}

impl FieldCondition {
    pub fn new(field: &str, op: Operator) -> Result<Self, ConfigError> {
        Ok(Self {
            field: KeyPath::parse(field)?,
            op,
        })
    }

    pub fn matches(&self, record: &Value) -> bool {
        let actual = resolve(record, &self.field);
        match &self.op {
            Operator::Equals(expected) => actual.is_some_and(|a| values_equal(a, expected)),
            Operator::NotEquals(expected) => !actual.is_some_and(|a| values_equal(a, expected)),
            Operator::OneOf(options) => {
                actual.is_some_and(|a| options.iter().any(|o| values_equal(a, o)))
            }
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// AND-combination of field conditions. An empty set matches every record.
///
/// Besides the explicit list form, a shorthand object is accepted where each
/// key is a key path and each value the expected value (or a list of
/// accepted values): `{"status": "Scheduled"}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawConditionSet", into = "Vec<FieldCondition>")]
pub struct ConditionSet {
    conditions: Vec<FieldCondition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConditionSet {
    List(Vec<FieldCondition>),
    Shorthand(Map<String, Value>),
}

impl TryFrom<RawConditionSet> for ConditionSet {
    type Error = ConfigError;

    fn try_from(raw: RawConditionSet) -> Result<Self, Self::Error> {
        let conditions = match raw {
            RawConditionSet::List(list) => list,
            RawConditionSet::Shorthand(map) => map
                .into_iter()
                .map(|(field, expected)| {
                    let op = match expected {
                        Value::Array(options) => Operator::OneOf(options),
                        other => Operator::Equals(other),
                    };
                    FieldCondition::new(&field, op)
                })
                .collect::<Result<_, _>>()?,
        };
        Ok(Self { conditions })
    }
}

impl From<ConditionSet> for Vec<FieldCondition> {
    fn from(set: ConditionSet) -> Self {
        set.conditions
    }
}

impl ConditionSet {
    pub fn new(conditions: Vec<FieldCondition>) -> Self {
        Self { conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[FieldCondition] {
        &self.conditions
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// Keep only the records matching every condition, preserving order.
pub fn filter_by_conditions(records: Vec<Value>, conditions: &ConditionSet) -> Vec<Value> {
    records
        .into_iter()
        .filter(|record| conditions.matches(record))
        .collect()
}
