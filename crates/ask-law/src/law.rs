// law.rs - Compiled law and condition definitions.
//
// A law pairs a condition over world state with the tools it forbids while
// that condition holds. Conditions are typed at compile time: the operator
// is an enum and ordering comparisons carry an integer threshold, so a law
// that reaches a LawBook can always be evaluated.
//
// On the wire a condition is the single string "<field> <op> <value>".

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LawError;

/// Comparison operators of the law language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    GreaterThan,
    LessThan,
    Equals,
    NotEquals,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
        }
    }
}

impl FromStr for Operator {
    type Err = LawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Operator::GreaterThan),
            "<" => Ok(Operator::LessThan),
            "==" => Ok(Operator::Equals),
            "!=" => Ok(Operator::NotEquals),
            other => Err(LawError::InvalidCondition {
                condition: other.to_string(),
                reason: "operator must be one of >, <, ==, !=".to_string(),
            }),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An operator together with its typed comparison value.
///
/// Ordering comparisons are integer comparisons; equality comparisons are
/// string comparisons against the stringified field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Comparison {
    GreaterThan(i64),
    LessThan(i64),
    Equals(String),
    NotEquals(String),
}

impl Comparison {
    /// Type a raw value for the given operator.
    pub fn new(operator: Operator, value: &str) -> Result<Self, LawError> {
        let threshold = || {
            value.parse::<i64>().map_err(|_| LawError::InvalidThreshold {
                operator: operator.symbol().to_string(),
                value: value.to_string(),
            })
        };
        Ok(match operator {
            Operator::GreaterThan => Comparison::GreaterThan(threshold()?),
            Operator::LessThan => Comparison::LessThan(threshold()?),
            Operator::Equals => Comparison::Equals(value.to_string()),
            Operator::NotEquals => Comparison::NotEquals(value.to_string()),
        })
    }

    pub fn operator(&self) -> Operator {
        match self {
            Comparison::GreaterThan(_) => Operator::GreaterThan,
            Comparison::LessThan(_) => Operator::LessThan,
            Comparison::Equals(_) => Operator::Equals,
            Comparison::NotEquals(_) => Operator::NotEquals,
        }
    }

    /// The comparison value as written in the law.
    pub fn value(&self) -> String {
        match self {
            Comparison::GreaterThan(n) | Comparison::LessThan(n) => n.to_string(),
            Comparison::Equals(s) | Comparison::NotEquals(s) => s.clone(),
        }
    }
}

/// A condition over one world-state field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Condition {
    pub field: String,
    pub comparison: Comparison,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: &str) -> Result<Self, LawError> {
        Ok(Self {
            field: field.into(),
            comparison: Comparison::new(operator, value)?,
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.field,
            self.comparison.operator(),
            self.comparison.value()
        )
    }
}

impl FromStr for Condition {
    type Err = LawError;

    /// Parse `"<field> <op> <value>"`: exactly three whitespace-separated parts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [field, op, value] = parts.as_slice() else {
            return Err(LawError::InvalidCondition {
                condition: s.to_string(),
                reason: format!("expected '<field> <op> <value>', got {} parts", parts.len()),
            });
        };
        Condition::new(*field, op.parse()?, value)
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.to_string()
    }
}

impl TryFrom<String> for Condition {
    type Error = LawError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A compiled law.
///
/// Immutable once compiled; the id is derived from the source text, so the
/// same text always yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    /// Short digest of the law's source text.
    pub id: String,
    /// When this holds, the tools in `block_actions` are forbidden.
    pub condition: Condition,
    /// Tool identifiers this law forbids.
    pub block_actions: BTreeSet<String>,
    /// Justification surfaced when the law blocks something.
    pub reason: String,
}

impl Law {
    /// Whether this law forbids the given tool (when its condition holds).
    pub fn blocks(&self, tool: &str) -> bool {
        self.block_actions.contains(tool)
    }
}
