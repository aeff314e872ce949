//! Construction-time validation.
//!
//! Untrusted input is parsed in two phases: serde first produces a loose
//! *draft*, then an ordered set of field-level checks turns the draft into a
//! typed value or a [`ValidationError`] listing every violated constraint. A
//! partially valid policy or request is never returned.

use std::fmt;

use thiserror::Error;

/// Maximum length, in characters, of policy uids and request identifiers.
pub const MAX_ID_LEN: usize = 400;

/// What was being constructed when validation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Policy,
    Request,
    Condition,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Policy => "policy",
            Self::Request => "access request",
            Self::Condition => "condition",
        };
        f.write_str(name)
    }
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field, e.g. `rules.subject.values[1]`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error returned when building a policy, request, or condition from
/// untrusted input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The input does not have the expected shape at all.
    #[error("malformed {kind}: {source}")]
    Malformed {
        kind: InputKind,
        #[source]
        source: serde_json::Error,
    },

    /// The input parsed, but one or more constraints are violated.
    #[error("invalid {kind}: {}", join_violations(.violations))]
    Invalid {
        kind: InputKind,
        violations: Vec<Violation>,
    },
}

impl ValidationError {
    /// Returns the input kind that failed validation.
    pub fn kind(&self) -> InputKind {
        match self {
            Self::Malformed { kind, .. } | Self::Invalid { kind, .. } => *kind,
        }
    }

    /// Returns the violated constraints (empty for malformed input).
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Malformed { .. } => &[],
            Self::Invalid { violations, .. } => violations,
        }
    }

    pub(crate) fn single(kind: InputKind, field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            violations: vec![Violation {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates violations while a draft is checked.
#[derive(Debug, Default)]
pub(crate) struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.items.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks that an identifier is present and within [`MAX_ID_LEN`]
    /// characters. The empty string is a valid identifier.
    pub(crate) fn check_id(&mut self, field: &str, id: Option<&str>) {
        match id {
            None => self.push(field, "is required"),
            Some(id) => {
                let len = id.chars().count();
                if len > MAX_ID_LEN {
                    self.push(
                        field,
                        format!("must be at most {MAX_ID_LEN} characters, got {len}"),
                    );
                }
            }
        }
    }

    /// Returns `value` if nothing was violated, otherwise the full list.
    pub(crate) fn finish<T>(self, kind: InputKind, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.items.is_empty() => Ok(value),
            _ => Err(ValidationError::Invalid {
                kind,
                violations: if self.items.is_empty() {
                    // A builder returned `None` without recording why.
                    vec![Violation {
                        field: kind.to_string(),
                        message: "is invalid".to_string(),
                    }]
                } else {
                    self.items
                },
            }),
        }
    }
}

/// Joins a parent field path and a child key.
pub(crate) fn field(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

/// Appends an index to a field path.
pub(crate) fn index(parent: &str, i: usize) -> String {
    format!("{parent}[{i}]")
}
