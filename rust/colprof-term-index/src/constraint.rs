//! Column acceptance constraints.
//!
//! A constraint is evaluated once per column, after the whole column has been
//! scanned, over the detected types of the column's distinct values.

use std::{fmt, str::FromStr};

use colprof_common::{Result, error::Error};

use crate::data_type::DataType;

/// Comparison applied to the text ratio of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    GreaterThan(f64),
    AtLeast(f64),
}

impl Threshold {
    pub fn is_satisfied(self, value: f64) -> bool {
        match self {
            Threshold::GreaterThan(limit) => value > limit,
            Threshold::AtLeast(limit) => value >= limit,
        }
    }
}

impl FromStr for Threshold {
    type Err = Error;

    /// Parses `>x`, `>=x` or a bare `x` (same as `>=x`).
    fn from_str(s: &str) -> Result<Threshold> {
        let s = s.trim();
        let (make, number): (fn(f64) -> Threshold, &str) = if let Some(rest) = s.strip_prefix(">=")
        {
            (Threshold::AtLeast, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Threshold::GreaterThan, rest)
        } else {
            (Threshold::AtLeast, s)
        };
        let limit = number
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::invalid_arg("threshold", format!("cannot parse '{s}'")))?;
        Ok(make(limit))
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::GreaterThan(limit) => write!(f, ">{limit}"),
            Threshold::AtLeast(limit) => write!(f, ">={limit}"),
        }
    }
}

/// Decides whether a scanned column is folded into the term index.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ColumnConstraint {
    /// Every column is accepted.
    #[default]
    None,
    /// The fraction of text-typed distinct values must satisfy the threshold.
    Text(Threshold),
}

impl ColumnConstraint {
    pub fn evaluator(&self) -> ConstraintEvaluator {
        ConstraintEvaluator {
            constraint: *self,
            text: 0,
            total: 0,
        }
    }
}

impl FromStr for ColumnConstraint {
    type Err = Error;

    /// Parses `NONE` or `TEXT:<threshold>`, e.g. `TEXT:>=0.5`.
    fn from_str(s: &str) -> Result<ColumnConstraint> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(ColumnConstraint::None);
        }
        match s.split_once(':') {
            Some((kind, threshold)) if kind.eq_ignore_ascii_case("text") => {
                Ok(ColumnConstraint::Text(threshold.parse()?))
            }
            _ => Err(Error::invalid_arg(
                "constraint",
                format!("unknown column constraint '{s}'"),
            )),
        }
    }
}

impl fmt::Display for ColumnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnConstraint::None => f.write_str("NONE"),
            ColumnConstraint::Text(threshold) => write!(f, "TEXT:{threshold}"),
        }
    }
}

/// Per-column accumulator for a [`ColumnConstraint`].
pub struct ConstraintEvaluator {
    constraint: ColumnConstraint,
    text: usize,
    total: usize,
}

impl ConstraintEvaluator {
    /// Records the type of one distinct value.
    pub fn consume(&mut self, data_type: DataType) {
        self.total += 1;
        if data_type.is_text() {
            self.text += 1;
        }
    }

    /// An empty column evaluates its threshold against a ratio of zero.
    pub fn is_satisfied(&self) -> bool {
        match self.constraint {
            ColumnConstraint::None => true,
            ColumnConstraint::Text(threshold) => {
                let ratio = if self.total == 0 {
                    0.0
                } else {
                    self.text as f64 / self.total as f64
                };
                threshold.is_satisfied(ratio)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnConstraint, Threshold};
    use crate::data_type::DataType;

    #[test]
    fn test_parse() {
        assert_eq!(
            "NONE".parse::<ColumnConstraint>().unwrap(),
            ColumnConstraint::None
        );
        assert_eq!(
            "TEXT:>0.5".parse::<ColumnConstraint>().unwrap(),
            ColumnConstraint::Text(Threshold::GreaterThan(0.5))
        );
        assert_eq!(
            "text:0.25".parse::<ColumnConstraint>().unwrap(),
            ColumnConstraint::Text(Threshold::AtLeast(0.25))
        );
        assert!("TEXT:abc".parse::<ColumnConstraint>().is_err());
        assert!("NUMERIC:>0".parse::<ColumnConstraint>().is_err());
    }

    #[test]
    fn test_text_ratio() {
        let constraint: ColumnConstraint = "TEXT:>=0.5".parse().unwrap();
        let mut evaluator = constraint.evaluator();
        evaluator.consume(DataType::Text);
        evaluator.consume(DataType::Integer);
        assert!(evaluator.is_satisfied());
        evaluator.consume(DataType::Date);
        assert!(!evaluator.is_satisfied());

        assert!(!constraint.evaluator().is_satisfied());
        let zero: ColumnConstraint = "TEXT:>=0".parse().unwrap();
        assert!(zero.evaluator().is_satisfied());
        assert!(ColumnConstraint::None.evaluator().is_satisfied());
    }
}
