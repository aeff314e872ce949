//! Condition expressions.
//!
//! A [`Condition`] is a closed, recursive boolean expression evaluated against
//! one attribute value. Leaf variants compare or test the value directly;
//! `AllOf`, `AnyOf` and `NotOf` combine child conditions.
//!
//! Evaluation is total: a value of the wrong type, or a missing attribute,
//! makes a leaf *not satisfied* instead of raising an error. The only leaves
//! satisfied by a missing attribute are [`Condition::Any`] and
//! [`Condition::NotExists`].
//!
//! In JSON a condition is a tagged object:
//!
//! ```json
//! { "condition": "AnyOf", "values": [
//!     { "condition": "Equals", "value": "admin" },
//!     { "condition": "StartsWith", "value": "ops-", "case_insensitive": true }
//! ] }
//! ```

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::validation::{self, InputKind, ValidationError, Violations};

// ============================================================================
// Operands
// ============================================================================

/// Operand of the numeric comparison variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberOperand {
    pub value: Number,
}

/// Operand of the string variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOperand {
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_insensitive: bool,
}

/// Operand of the collection variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperand {
    pub values: Vec<Value>,
}

impl SetOperand {
    fn contains(&self, value: &Value) -> bool {
        self.values.iter().any(|member| same_value(member, value))
    }
}

/// Structural equality where numbers compare by value, so `1` and `1.0` match
/// the same way they do for `Eq`.
#[allow(clippy::float_cmp)]
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| same_value(x, y)))
        }
        _ => a == b,
    }
}

/// A compiled regular expression that remembers its source.
#[derive(Clone)]
pub struct RegexPattern {
    source: String,
    compiled: Regex,
}

impl RegexPattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            compiled: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegexPattern").field(&self.source).finish()
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for RegexPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Operand of [`Condition::RegexMatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegexOperand {
    pub value: RegexPattern,
}

/// Operand of [`Condition::Cidr`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CidrOperand {
    pub value: IpNet,
}

/// Children of a logic combinator. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operands {
    values: Vec<Condition>,
}

impl Operands {
    /// Wraps a child list, rejecting an empty one.
    pub fn new(values: Vec<Condition>) -> Result<Self, ValidationError> {
        if values.is_empty() {
            return Err(ValidationError::single(
                InputKind::Condition,
                "values",
                EMPTY_OPERANDS,
            ));
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[Condition] {
        &self.values
    }
}

const EMPTY_OPERANDS: &str = "must contain at least one condition";

// ============================================================================
// Condition
// ============================================================================

/// A boolean predicate over a single attribute value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "condition")]
pub enum Condition {
    // -- Numeric comparisons --
    /// Number equal to the operand.
    Eq(NumberOperand),
    /// Number not equal to the operand.
    Neq(NumberOperand),
    /// Number greater than the operand.
    Gt(NumberOperand),
    /// Number greater than or equal to the operand.
    Gte(NumberOperand),
    /// Number less than the operand.
    Lt(NumberOperand),
    /// Number less than or equal to the operand.
    Lte(NumberOperand),

    // -- String predicates --
    /// String equal to the operand.
    Equals(TextOperand),
    /// String not equal to the operand.
    NotEquals(TextOperand),
    /// String contains the operand.
    Contains(TextOperand),
    /// String does not contain the operand.
    NotContains(TextOperand),
    /// String starts with the operand.
    StartsWith(TextOperand),
    /// String ends with the operand.
    EndsWith(TextOperand),
    /// String matches the regular expression (unanchored).
    RegexMatch(RegexOperand),

    // -- Collection membership --
    /// Scalar value is one of the operand values.
    IsIn(SetOperand),
    /// Scalar value is none of the operand values.
    IsNotIn(SetOperand),
    /// Every element of the array value is in the operand values.
    AllIn(SetOperand),
    /// No element of the array value is in the operand values.
    AllNotIn(SetOperand),
    /// Some element of the array value is in the operand values.
    AnyIn(SetOperand),
    /// Some element of the array value is not in the operand values.
    AnyNotIn(SetOperand),
    /// Array value is empty.
    IsEmpty,
    /// Array value is not empty.
    IsNotEmpty,

    // -- Other --
    /// String value is an IP address inside the network.
    #[serde(rename = "CIDR")]
    Cidr(CidrOperand),
    /// The attribute is present (any value, including `null`).
    Exists,
    /// The attribute is absent.
    NotExists,
    /// Always satisfied. Default for unrestricted rule namespaces.
    #[default]
    Any,

    // -- Logical combinators --
    /// Every child is satisfied.
    AllOf(Operands),
    /// At least one child is satisfied.
    AnyOf(Operands),
    /// The first child is not satisfied.
    NotOf(Operands),
}

impl Condition {
    // -- Constructors --

    pub fn all_of(children: Vec<Condition>) -> Result<Self, ValidationError> {
        Operands::new(children).map(Self::AllOf)
    }

    pub fn any_of(children: Vec<Condition>) -> Result<Self, ValidationError> {
        Operands::new(children).map(Self::AnyOf)
    }

    pub fn not_of(children: Vec<Condition>) -> Result<Self, ValidationError> {
        Operands::new(children).map(Self::NotOf)
    }

    /// Shorthand for `NotOf` with a single child.
    pub fn not(child: Condition) -> Self {
        Self::NotOf(Operands {
            values: vec![child],
        })
    }

    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(TextOperand {
            value: value.into(),
            case_insensitive: false,
        })
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        Self::StartsWith(TextOperand {
            value: value.into(),
            case_insensitive: false,
        })
    }

    pub fn gte(value: impl Into<Number>) -> Self {
        Self::Gte(NumberOperand {
            value: value.into(),
        })
    }

    pub fn lt(value: impl Into<Number>) -> Self {
        Self::Lt(NumberOperand {
            value: value.into(),
        })
    }

    pub fn is_in(values: Vec<Value>) -> Self {
        Self::IsIn(SetOperand { values })
    }

    pub fn any_in(values: Vec<Value>) -> Self {
        Self::AnyIn(SetOperand { values })
    }

    pub fn regex_match(pattern: &str) -> Result<Self, ValidationError> {
        RegexPattern::new(pattern)
            .map(|value| Self::RegexMatch(RegexOperand { value }))
            .map_err(|e| ValidationError::single(InputKind::Condition, "value", e.to_string()))
    }

    pub fn cidr(network: &str) -> Result<Self, ValidationError> {
        network
            .parse::<IpNet>()
            .map(|value| Self::Cidr(CidrOperand { value }))
            .map_err(|e| ValidationError::single(InputKind::Condition, "value", e.to_string()))
    }

    /// Parses a condition from JSON, reporting every violation.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let mut violations = Violations::new();
        let condition = parse(value, "condition", &mut violations);
        violations.finish(InputKind::Condition, condition)
    }

    // -- Evaluation --

    /// Evaluates the condition against an attribute value. `None` means the
    /// attribute is absent.
    #[allow(clippy::float_cmp)]
    pub fn is_satisfied(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Eq(op) => compare(value, &op.value, |a, b| a == b),
            Self::Neq(op) => compare(value, &op.value, |a, b| a != b),
            Self::Gt(op) => compare(value, &op.value, |a, b| a > b),
            Self::Gte(op) => compare(value, &op.value, |a, b| a >= b),
            Self::Lt(op) => compare(value, &op.value, |a, b| a < b),
            Self::Lte(op) => compare(value, &op.value, |a, b| a <= b),

            Self::Equals(op) => text(value, op, |v, o| v == o),
            Self::NotEquals(op) => text(value, op, |v, o| v != o),
            Self::Contains(op) => text(value, op, |v, o| v.contains(o)),
            Self::NotContains(op) => text(value, op, |v, o| !v.contains(o)),
            Self::StartsWith(op) => text(value, op, |v, o| v.starts_with(o)),
            Self::EndsWith(op) => text(value, op, |v, o| v.ends_with(o)),
            Self::RegexMatch(op) => value
                .and_then(Value::as_str)
                .is_some_and(|s| op.value.is_match(s)),

            Self::IsIn(op) => scalar(value).is_some_and(|v| op.contains(v)),
            Self::IsNotIn(op) => scalar(value).is_some_and(|v| !op.contains(v)),
            Self::AllIn(op) => array(value).is_some_and(|a| a.iter().all(|v| op.contains(v))),
            Self::AllNotIn(op) => array(value).is_some_and(|a| a.iter().all(|v| !op.contains(v))),
            Self::AnyIn(op) => array(value).is_some_and(|a| a.iter().any(|v| op.contains(v))),
            Self::AnyNotIn(op) => array(value).is_some_and(|a| a.iter().any(|v| !op.contains(v))),
            Self::IsEmpty => array(value).is_some_and(Vec::is_empty),
            Self::IsNotEmpty => array(value).is_some_and(|a| !a.is_empty()),

            Self::Cidr(op) => value
                .and_then(Value::as_str)
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
                .is_some_and(|ip| op.value.contains(&ip)),
            Self::Exists => value.is_some(),
            Self::NotExists => value.is_none(),
            Self::Any => true,

            Self::AllOf(children) => children.values.iter().all(|c| c.is_satisfied(value)),
            Self::AnyOf(children) => children.values.iter().any(|c| c.is_satisfied(value)),
            Self::NotOf(children) => children
                .values
                .first()
                .is_some_and(|c| !c.is_satisfied(value)),
        }
    }
}

// ============================================================================
// Leaf helpers
// ============================================================================

fn compare(value: Option<&Value>, operand: &Number, op: impl Fn(f64, f64) -> bool) -> bool {
    match (value.and_then(Value::as_f64), operand.as_f64()) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

fn text(value: Option<&Value>, operand: &TextOperand, op: impl Fn(&str, &str) -> bool) -> bool {
    let Some(s) = value.and_then(Value::as_str) else {
        return false;
    };
    if operand.case_insensitive {
        op(&s.to_lowercase(), &operand.value.to_lowercase())
    } else {
        op(s, &operand.value)
    }
}

/// Non-container values. Arrays and objects never match `IsIn`/`IsNotIn`.
fn scalar(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_array() && !v.is_object())
}

fn array(value: Option<&Value>) -> Option<&Vec<Value>> {
    value.and_then(Value::as_array)
}

// ============================================================================
// Parsing
// ============================================================================

/// Loose shape of a condition as it arrives from JSON. Combinator children
/// stay raw so that each one can be checked, and reported, individually.
#[derive(Deserialize)]
#[serde(tag = "condition")]
enum ConditionDraft {
    Eq(NumberOperand),
    Neq(NumberOperand),
    Gt(NumberOperand),
    Gte(NumberOperand),
    Lt(NumberOperand),
    Lte(NumberOperand),

    Equals(TextOperand),
    NotEquals(TextOperand),
    Contains(TextOperand),
    NotContains(TextOperand),
    StartsWith(TextOperand),
    EndsWith(TextOperand),
    RegexMatch { value: String },

    IsIn(SetOperand),
    IsNotIn(SetOperand),
    AllIn(SetOperand),
    AllNotIn(SetOperand),
    AnyIn(SetOperand),
    AnyNotIn(SetOperand),
    IsEmpty,
    IsNotEmpty,

    #[serde(rename = "CIDR")]
    Cidr { value: String },
    Exists,
    NotExists,
    Any,

    AllOf(OperandsDraft),
    AnyOf(OperandsDraft),
    #[serde(alias = "Not")]
    NotOf(OperandsDraft),
}

#[derive(Deserialize)]
struct OperandsDraft {
    #[serde(default)]
    values: Vec<Value>,
}

/// Parses and checks one condition at `path`. Returns `None` after recording
/// at least one violation.
pub(crate) fn parse(value: &Value, path: &str, violations: &mut Violations) -> Option<Condition> {
    if value.is_null() {
        violations.push(path, "must be a condition, not null");
        return None;
    }

    let draft = match ConditionDraft::deserialize(value) {
        Ok(draft) => draft,
        Err(e) => {
            violations.push(path, e.to_string());
            return None;
        }
    };

    let condition = match draft {
        ConditionDraft::Eq(op) => Condition::Eq(op),
        ConditionDraft::Neq(op) => Condition::Neq(op),
        ConditionDraft::Gt(op) => Condition::Gt(op),
        ConditionDraft::Gte(op) => Condition::Gte(op),
        ConditionDraft::Lt(op) => Condition::Lt(op),
        ConditionDraft::Lte(op) => Condition::Lte(op),

        ConditionDraft::Equals(op) => Condition::Equals(op),
        ConditionDraft::NotEquals(op) => Condition::NotEquals(op),
        ConditionDraft::Contains(op) => Condition::Contains(op),
        ConditionDraft::NotContains(op) => Condition::NotContains(op),
        ConditionDraft::StartsWith(op) => Condition::StartsWith(op),
        ConditionDraft::EndsWith(op) => Condition::EndsWith(op),
        ConditionDraft::RegexMatch { value } => match RegexPattern::new(&value) {
            Ok(value) => Condition::RegexMatch(RegexOperand { value }),
            Err(e) => {
                violations.push(validation::field(path, "value"), e.to_string());
                return None;
            }
        },

        ConditionDraft::IsIn(op) => Condition::IsIn(op),
        ConditionDraft::IsNotIn(op) => Condition::IsNotIn(op),
        ConditionDraft::AllIn(op) => Condition::AllIn(op),
        ConditionDraft::AllNotIn(op) => Condition::AllNotIn(op),
        ConditionDraft::AnyIn(op) => Condition::AnyIn(op),
        ConditionDraft::AnyNotIn(op) => Condition::AnyNotIn(op),
        ConditionDraft::IsEmpty => Condition::IsEmpty,
        ConditionDraft::IsNotEmpty => Condition::IsNotEmpty,

        ConditionDraft::Cidr { value } => match value.trim().parse::<IpNet>() {
            Ok(value) => Condition::Cidr(CidrOperand { value }),
            Err(e) => {
                violations.push(
                    validation::field(path, "value"),
                    format!("invalid network '{value}': {e}"),
                );
                return None;
            }
        },
        ConditionDraft::Exists => Condition::Exists,
        ConditionDraft::NotExists => Condition::NotExists,
        ConditionDraft::Any => Condition::Any,

        ConditionDraft::AllOf(draft) => Condition::AllOf(parse_operands(draft, path, violations)?),
        ConditionDraft::AnyOf(draft) => Condition::AnyOf(parse_operands(draft, path, violations)?),
        ConditionDraft::NotOf(draft) => Condition::NotOf(parse_operands(draft, path, violations)?),
    };

    Some(condition)
}

fn parse_operands(
    draft: OperandsDraft,
    path: &str,
    violations: &mut Violations,
) -> Option<Operands> {
    let values_path = validation::field(path, "values");
    if draft.values.is_empty() {
        violations.push(values_path, EMPTY_OPERANDS);
        return None;
    }

    let before = violations.len();
    let children: Vec<Condition> = draft
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, child)| parse(child, &validation::index(&values_path, i), violations))
        .collect();

    // Every child must parse; a partially valid combinator is discarded.
    if children.len() != draft.values.len() || violations.len() != before {
        return None;
    }
    Some(Operands { values: children })
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    fn cond(value: Value) -> Condition {
        Condition::from_value(&value).expect("valid condition")
    }

    #[test_case(json!({"condition": "Eq", "value": 5}), json!(5), true ; "eq int")]
    #[test_case(json!({"condition": "Eq", "value": 5}), json!(5.0), true ; "eq int vs float")]
    #[test_case(json!({"condition": "Eq", "value": 5}), json!("5"), false ; "eq string is mismatch")]
    #[test_case(json!({"condition": "Neq", "value": 5}), json!(4), true ; "neq")]
    #[test_case(json!({"condition": "Neq", "value": 5}), json!("x"), false ; "neq string is mismatch")]
    #[test_case(json!({"condition": "Gt", "value": 1.5}), json!(2), true ; "gt")]
    #[test_case(json!({"condition": "Gt", "value": 2}), json!(2), false ; "gt equal")]
    #[test_case(json!({"condition": "Gte", "value": 2}), json!(2), true ; "gte equal")]
    #[test_case(json!({"condition": "Lt", "value": 0}), json!(-1), true ; "lt negative")]
    #[test_case(json!({"condition": "Lte", "value": 3}), json!(true), false ; "lte bool is mismatch")]
    fn test_numeric(condition: Value, value: Value, expected: bool) {
        assert_eq!(cond(condition).is_satisfied(Some(&value)), expected);
    }

    #[test_case(json!({"condition": "Equals", "value": "Alice"}), json!("Alice"), true ; "equals")]
    #[test_case(json!({"condition": "Equals", "value": "Alice"}), json!("alice"), false ; "equals case sensitive")]
    #[test_case(json!({"condition": "Equals", "value": "Alice", "case_insensitive": true}), json!("aLiCe"), true ; "equals case insensitive")]
    #[test_case(json!({"condition": "NotEquals", "value": "a"}), json!("b"), true ; "not equals")]
    #[test_case(json!({"condition": "NotEquals", "value": "a"}), json!(1), false ; "not equals number is mismatch")]
    #[test_case(json!({"condition": "Contains", "value": "doc"}), json!("/docs/x"), true ; "contains")]
    #[test_case(json!({"condition": "NotContains", "value": "doc"}), json!("/img/x"), true ; "not contains")]
    #[test_case(json!({"condition": "NotContains", "value": "doc"}), json!(["doc"]), false ; "not contains array is mismatch")]
    #[test_case(json!({"condition": "StartsWith", "value": "/api"}), json!("/api/users"), true ; "starts with")]
    #[test_case(json!({"condition": "EndsWith", "value": ".PDF", "case_insensitive": true}), json!("a.pdf"), true ; "ends with ci")]
    #[test_case(json!({"condition": "RegexMatch", "value": "^user-[0-9]+$"}), json!("user-42"), true ; "regex")]
    #[test_case(json!({"condition": "RegexMatch", "value": "^user-[0-9]+$"}), json!("user-x"), false ; "regex mismatch")]
    #[test_case(json!({"condition": "RegexMatch", "value": ".*"}), json!(7), false ; "regex number is mismatch")]
    fn test_string(condition: Value, value: Value, expected: bool) {
        assert_eq!(cond(condition).is_satisfied(Some(&value)), expected);
    }

    #[test_case(json!({"condition": "IsIn", "values": ["a", 1]}), json!(1), true ; "is in")]
    #[test_case(json!({"condition": "IsIn", "values": ["a", 1]}), json!(["a"]), false ; "is in array is mismatch")]
    #[test_case(json!({"condition": "IsNotIn", "values": ["a"]}), json!("b"), true ; "is not in")]
    #[test_case(json!({"condition": "AllIn", "values": ["a", "b"]}), json!(["a", "b"]), true ; "all in")]
    #[test_case(json!({"condition": "AllIn", "values": ["a"]}), json!(["a", "c"]), false ; "all in partial")]
    #[test_case(json!({"condition": "AllIn", "values": ["a"]}), json!([]), true ; "all in vacuous")]
    #[test_case(json!({"condition": "AllNotIn", "values": ["a"]}), json!(["b", "c"]), true ; "all not in")]
    #[test_case(json!({"condition": "AnyIn", "values": ["admin"]}), json!(["dev", "admin"]), true ; "any in")]
    #[test_case(json!({"condition": "AnyIn", "values": ["admin"]}), json!([]), false ; "any in empty")]
    #[test_case(json!({"condition": "AnyNotIn", "values": ["a"]}), json!(["a", "z"]), true ; "any not in")]
    #[test_case(json!({"condition": "AnyIn", "values": ["a"]}), json!("a"), false ; "any in scalar is mismatch")]
    #[test_case(json!({"condition": "IsIn", "values": [1, 2]}), json!(1.0), true ; "is in float vs int")]
    #[test_case(json!({"condition": "IsIn", "values": [1.5]}), json!(1), false ; "is in different number")]
    #[test_case(json!({"condition": "IsNotIn", "values": [1]}), json!(1.0), false ; "is not in float vs int")]
    #[test_case(json!({"condition": "AllIn", "values": [1, 2]}), json!([1.0, 2]), true ; "all in float vs int")]
    #[test_case(json!({"condition": "AnyIn", "values": [3.0]}), json!([1, 3]), true ; "any in int vs float")]
    #[test_case(json!({"condition": "AnyNotIn", "values": [1, 2]}), json!([2.0, 1]), false ; "any not in float vs int")]
    #[test_case(json!({"condition": "AllIn", "values": [[1, 2]]}), json!([[1.0, 2]]), true ; "all in nested array numbers")]
    #[test_case(json!({"condition": "IsIn", "values": ["1"]}), json!(1), false ; "is in string vs number")]
    #[test_case(json!({"condition": "IsEmpty"}), json!([]), true ; "is empty")]
    #[test_case(json!({"condition": "IsEmpty"}), json!(""), false ; "is empty string is mismatch")]
    #[test_case(json!({"condition": "IsNotEmpty"}), json!([1]), true ; "is not empty")]
    fn test_collection(condition: Value, value: Value, expected: bool) {
        assert_eq!(cond(condition).is_satisfied(Some(&value)), expected);
    }

    #[test_case(json!("10.1.2.3"), true ; "inside v4")]
    #[test_case(json!("10.2.0.1"), false ; "outside v4")]
    #[test_case(json!("::1"), false ; "v6 outside v4 net")]
    #[test_case(json!("not an ip"), false ; "garbage")]
    #[test_case(json!(167_837_955), false ; "number is mismatch")]
    fn test_cidr(value: Value, expected: bool) {
        let c = cond(json!({"condition": "CIDR", "value": "10.1.0.0/16"}));
        assert_eq!(c.is_satisfied(Some(&value)), expected);
    }

    #[test]
    fn test_cidr_ipv6() {
        let c = Condition::cidr("2001:db8::/32").unwrap();
        assert!(c.is_satisfied(Some(&json!("2001:db8::1"))));
        assert!(!c.is_satisfied(Some(&json!("2001:db9::1"))));
    }

    #[test]
    fn test_missing_attribute() {
        let missing = None;
        assert!(Condition::Any.is_satisfied(missing));
        assert!(Condition::NotExists.is_satisfied(missing));
        assert!(!Condition::Exists.is_satisfied(missing));
        assert!(!Condition::equals("x").is_satisfied(missing));
        assert!(!cond(json!({"condition": "NotEquals", "value": "x"})).is_satisfied(missing));
        assert!(!cond(json!({"condition": "IsNotIn", "values": [1]})).is_satisfied(missing));
        assert!(!Condition::gte(0).is_satisfied(missing));

        // Present but null still exists.
        assert!(Condition::Exists.is_satisfied(Some(&Value::Null)));
    }

    #[test]
    fn test_logic_combinators() {
        let admin_or_ops = Condition::any_of(vec![
            Condition::equals("admin"),
            Condition::starts_with("ops-"),
        ])
        .unwrap();
        assert!(admin_or_ops.is_satisfied(Some(&json!("admin"))));
        assert!(admin_or_ops.is_satisfied(Some(&json!("ops-eu"))));
        assert!(!admin_or_ops.is_satisfied(Some(&json!("dev"))));

        let in_range = Condition::all_of(vec![Condition::gte(18), Condition::lt(65)]).unwrap();
        assert!(in_range.is_satisfied(Some(&json!(30))));
        assert!(!in_range.is_satisfied(Some(&json!(70))));

        let not_admin = Condition::not(Condition::equals("admin"));
        assert!(not_admin.is_satisfied(Some(&json!("dev"))));
        assert!(!not_admin.is_satisfied(Some(&json!("admin"))));
    }

    #[test]
    fn test_not_of_negates_first_child_only() {
        let c = Condition::not_of(vec![Condition::equals("a"), Condition::equals("b")]).unwrap();
        assert!(!c.is_satisfied(Some(&json!("a"))));
        assert!(c.is_satisfied(Some(&json!("b"))));
    }

    #[test]
    fn test_not_alias_is_accepted() {
        let c = cond(json!({"condition": "Not", "values": [{"condition": "Exists"}]}));
        assert_eq!(c, Condition::not(Condition::Exists));
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"condition": "NotOf", "values": [{"condition": "Exists"}]})
        );
    }

    #[test]
    fn test_empty_any_of_is_rejected() {
        let err = Condition::from_value(&json!({"condition": "AnyOf", "values": []})).unwrap_err();
        assert_eq!(err.violations()[0].field, "condition.values");
        assert!(Condition::any_of(vec![]).is_err());
        assert!(Condition::all_of(vec![]).is_err());
        assert!(Condition::not_of(vec![]).is_err());
    }

    #[test]
    fn test_missing_values_is_rejected() {
        let err = Condition::from_value(&json!({"condition": "AllOf"})).unwrap_err();
        assert_eq!(err.violations()[0].message, EMPTY_OPERANDS);
    }

    #[test]
    fn test_null_child_is_rejected() {
        let input = json!({"condition": "AnyOf", "values": [{"condition": "Any"}, null]});
        let err = Condition::from_value(&input).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "condition.values[1]");
    }

    #[test]
    fn test_nested_violations_are_all_reported() {
        let input = json!({"condition": "AllOf", "values": [
            {"condition": "RegexMatch", "value": "("},
            {"condition": "AnyOf", "values": [null]},
            {"condition": "CIDR", "value": "10.0.0.0/99"},
            {"condition": "NoSuchThing"},
        ]});
        let err = Condition::from_value(&input).unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "condition.values[0].value",
                "condition.values[1].values[0]",
                "condition.values[2].value",
                "condition.values[3]",
            ]
        );
    }

    #[test]
    fn test_serde_deserialize_validates() {
        let ok: Condition = serde_json::from_str(r#"{"condition": "Any"}"#).unwrap();
        assert_eq!(ok, Condition::Any);

        let err = serde_json::from_str::<Condition>(r#"{"condition": "AllOf", "values": []}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let c = Condition::all_of(vec![
            Condition::equals("x"),
            Condition::regex_match("^a").unwrap(),
            Condition::cidr("192.168.0.0/24").unwrap(),
            Condition::is_in(vec![json!(1), json!("two")]),
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"condition": "AllOf", "values": [
                {"condition": "Equals", "value": "x"},
                {"condition": "RegexMatch", "value": "^a"},
                {"condition": "CIDR", "value": "192.168.0.0/24"},
                {"condition": "IsIn", "values": [1, "two"]},
            ]})
        );
    }

    fn leaf() -> impl Strategy<Value = Condition> {
        prop_oneof![
            Just(Condition::Any),
            Just(Condition::Exists),
            Just(Condition::NotExists),
            Just(Condition::IsEmpty),
            (-100i64..100).prop_map(|n| Condition::gte(n)),
            (-100i64..100).prop_map(|n| Condition::lt(n)),
            "[a-c]{0,3}".prop_map(|s| Condition::equals(s)),
            "[a-c]{0,3}".prop_map(|s| Condition::starts_with(s)),
        ]
    }

    fn tree() -> impl Strategy<Value = Condition> {
        leaf().prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 1..4)
                    .prop_map(|c| Condition::all_of(c).unwrap()),
                prop::collection::vec(inner.clone(), 1..4)
                    .prop_map(|c| Condition::any_of(c).unwrap()),
                inner.prop_map(Condition::not),
            ]
        })
    }

    fn attribute() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            Just(Some(Value::Null)),
            (-100i64..100).prop_map(|n| Some(json!(n))),
            "[a-c]{0,4}".prop_map(|s| Some(json!(s))),
            Just(Some(json!([]))),
            Just(Some(json!({"k": 1}))),
        ]
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_deterministic(c in tree(), v in attribute()) {
            prop_assert_eq!(c.is_satisfied(v.as_ref()), c.is_satisfied(v.as_ref()));
        }

        #[test]
        fn prop_serialization_preserves_meaning(c in tree(), v in attribute()) {
            let json = serde_json::to_value(&c).unwrap();
            let parsed = Condition::from_value(&json).unwrap();
            prop_assert_eq!(parsed.is_satisfied(v.as_ref()), c.is_satisfied(v.as_ref()));
        }

        #[test]
        fn prop_double_negation(c in tree(), v in attribute()) {
            let twice = Condition::not(Condition::not(c.clone()));
            prop_assert_eq!(twice.is_satisfied(v.as_ref()), c.is_satisfied(v.as_ref()));
        }
    }
}
