//! Adjacency match rules for the fold engine
//!
//! A rule describes one comparison between the running accumulator
//! record ("left") and the candidate record ("right"). Ordinary rules
//! are AND-ed per adjacent pair; `any` rules gate the whole group.

use crate::error::{Error, Result};
use crate::record::{Header, Record};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What the accumulator side is compared against.
///
/// Exactly one semantics per rule: another column of the candidate, a
/// literal matched against the candidate, or a literal matched against
/// the accumulator itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparand {
    /// Compare left[rule.left] against right[column]
    #[serde(rename = "right")]
    Column(String),
    /// Compare right[rule.left] against a fixed value
    #[serde(rename = "equals")]
    Literal(String),
    /// Compare left[rule.left] against a fixed value
    #[serde(rename = "accumulator_equals")]
    AccumulatorLiteral(String),
}

/// One configured comparison used to decide whether two adjacent
/// records should merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// The accumulator-side column (always required)
    pub left: String,
    /// What to compare it against
    #[serde(flatten)]
    pub comparand: Comparand,
    /// Negate the raw result
    #[serde(default)]
    pub inverse: bool,
    /// Group-wide existence gate instead of a per-pair condition
    #[serde(default, rename = "any")]
    pub match_any: bool,
}

impl MatchRule {
    /// Plain field-to-field rule
    pub fn columns(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            comparand: Comparand::Column(right.into()),
            inverse: false,
            match_any: false,
        }
    }

    /// Negate the rule's raw result
    pub fn inverted(mut self) -> Self {
        self.inverse = true;
        self
    }

    /// Turn the rule into a group-wide existence gate
    pub fn any(mut self) -> Self {
        self.match_any = true;
        self
    }

    /// Parse one compact rule spec.
    ///
    /// Grammar, after optional `!` (inverse) and `?` (group-wide)
    /// prefixes:
    ///
    /// - `left:right` compares the accumulator's `left` column to the
    ///   incoming record's `right` column
    /// - `col=value` compares the incoming record's `col` to a literal
    /// - `col:=value` compares the accumulator's `col` to a literal
    pub fn parse(spec: &str) -> Result<Self> {
        let mut rest = spec;
        let mut inverse = false;
        let mut match_any = false;

        loop {
            if let Some(stripped) = rest.strip_prefix('!') {
                inverse = true;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix('?') {
                match_any = true;
                rest = stripped;
            } else {
                break;
            }
        }

        let (left, comparand) = if let Some((left, value)) = rest.split_once(":=") {
            (left, Comparand::AccumulatorLiteral(value.to_string()))
        } else if let Some((left, value)) = rest.split_once('=') {
            (left, Comparand::Literal(value.to_string()))
        } else if let Some((left, right)) = rest.split_once(':') {
            if right.is_empty() {
                return Err(Error::InvalidRule(spec.to_string()));
            }
            (left, Comparand::Column(right.to_string()))
        } else {
            return Err(Error::InvalidRule(spec.to_string()));
        };

        if left.is_empty() {
            return Err(Error::InvalidRule(spec.to_string()));
        }

        Ok(Self {
            left: left.to_string(),
            comparand,
            inverse,
            match_any,
        })
    }

    /// Parse a comma-separated list of compact rule specs,
    /// eg `id:id,end:start`
    pub fn parse_list(specs: &str) -> Result<Vec<Self>> {
        specs.split(',').map(Self::parse).collect()
    }
}

/// Load a rule list from a JSON file
pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<Vec<MatchRule>> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
        path: path.as_ref().to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(Error::Json)
}

/// Evaluate one rule against an adjacent pair.
///
/// Missing columns compare as empty string, never an error: one
/// malformed optional column must not stop merging of the others.
/// No side effects.
pub fn evaluate(header: &Header, left: &Record, right: &Record, rule: &MatchRule) -> bool {
    let raw = match &rule.comparand {
        Comparand::Column(column) => left.get(header, &rule.left) == right.get(header, column),
        Comparand::Literal(value) => right.get(header, &rule.left) == value,
        Comparand::AccumulatorLiteral(value) => left.get(header, &rule.left) == value,
    };

    if rule.inverse {
        !raw
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Header {
        Header::new(vec![
            "paycode".to_string(),
            "start".to_string(),
            "end".to_string(),
        ])
    }

    fn record(paycode: &str, start: &str, end: &str) -> Record {
        Record::new(
            vec![paycode.to_string(), start.to_string(), end.to_string()],
            2,
        )
    }

    #[test]
    fn test_evaluate_field_to_field() {
        let header = header();
        let left = record("foo", "11am", "5pm");
        let right = record("foo", "9am", "11am");

        let rule = MatchRule::columns("start", "end");
        assert!(evaluate(&header, &left, &right, &rule));

        let miss = record("foo", "1pm", "5pm");
        assert!(!evaluate(&header, &miss, &right, &rule));
    }

    #[test]
    fn test_evaluate_inverse_negates() {
        let header = header();
        let left = record("foo", "11am", "5pm");
        let right = record("foo", "9am", "11am");

        let rule = MatchRule::columns("start", "end");
        let inverted = rule.clone().inverted();

        for (l, r) in [(&left, &right), (&right, &left)] {
            assert_eq!(
                evaluate(&header, l, r, &inverted),
                !evaluate(&header, l, r, &rule)
            );
        }
    }

    #[test]
    fn test_evaluate_literal_right() {
        let header = header();
        let left = record("foo", "9am", "11am");
        let right = record("bar", "11am", "5pm");

        let hit = MatchRule {
            left: "paycode".to_string(),
            comparand: Comparand::Literal("bar".to_string()),
            inverse: false,
            match_any: false,
        };
        assert!(evaluate(&header, &left, &right, &hit));

        let miss = MatchRule {
            comparand: Comparand::Literal("foo".to_string()),
            ..hit
        };
        assert!(!evaluate(&header, &left, &right, &miss));
    }

    #[test]
    fn test_evaluate_literal_left() {
        let header = header();
        let left = record("foo", "9am", "11am");
        let right = record("bar", "11am", "5pm");

        let hit = MatchRule {
            left: "paycode".to_string(),
            comparand: Comparand::AccumulatorLiteral("foo".to_string()),
            inverse: false,
            match_any: false,
        };
        assert!(evaluate(&header, &left, &right, &hit));

        let miss = MatchRule {
            comparand: Comparand::AccumulatorLiteral("bar".to_string()),
            ..hit
        };
        assert!(!evaluate(&header, &left, &right, &miss));
    }

    #[test]
    fn test_evaluate_missing_column_reads_empty() {
        let header = header();
        let left = record("foo", "9am", "11am");
        let right = record("bar", "11am", "5pm");

        let rule = MatchRule::columns("absent", "also_absent");
        assert!(evaluate(&header, &left, &right, &rule));

        let rule = MatchRule {
            left: "absent".to_string(),
            comparand: Comparand::Literal(String::new()),
            inverse: false,
            match_any: false,
        };
        assert!(evaluate(&header, &left, &right, &rule));
    }

    #[test]
    fn test_parse_field_to_field() {
        let rule = MatchRule::parse("end:start").unwrap();
        assert_eq!(rule, MatchRule::columns("end", "start"));
    }

    #[test]
    fn test_parse_prefixes() {
        let rule = MatchRule::parse("!end:start").unwrap();
        assert!(rule.inverse);
        assert!(!rule.match_any);

        let rule = MatchRule::parse("?!flag=yep").unwrap();
        assert!(rule.inverse);
        assert!(rule.match_any);
        assert_eq!(rule.comparand, Comparand::Literal("yep".to_string()));
    }

    #[test]
    fn test_parse_literals() {
        let rule = MatchRule::parse("paycode=bar").unwrap();
        assert_eq!(rule.left, "paycode");
        assert_eq!(rule.comparand, Comparand::Literal("bar".to_string()));

        let rule = MatchRule::parse("paycode:=foo").unwrap();
        assert_eq!(
            rule.comparand,
            Comparand::AccumulatorLiteral("foo".to_string())
        );
    }

    #[test]
    fn test_parse_list() {
        let rules = MatchRule::parse_list("id:id,end:start").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1], MatchRule::columns("end", "start"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MatchRule::parse("").is_err());
        assert!(MatchRule::parse("no_separator").is_err());
        assert!(MatchRule::parse(":start").is_err());
        assert!(MatchRule::parse("end:").is_err());
    }

    #[test]
    fn test_rule_json_round_trip() {
        let rules = vec![
            MatchRule::columns("end", "start"),
            MatchRule::parse("!end=never").unwrap(),
            MatchRule::parse("?flag=yep").unwrap(),
        ];

        let json = serde_json::to_string(&rules).unwrap();
        let back: Vec<MatchRule> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }

    #[test]
    fn test_rule_json_field_names() {
        let json = r#"[
            {"left": "end", "right": "start"},
            {"left": "end", "equals": "never", "inverse": true},
            {"left": "flag", "equals": "yep", "any": true},
            {"left": "paycode", "accumulator_equals": "foo"}
        ]"#;

        let rules: Vec<MatchRule> = serde_json::from_str(json).unwrap();
        assert_eq!(rules[0], MatchRule::columns("end", "start"));
        assert!(rules[1].inverse);
        assert!(rules[2].match_any);
        assert_eq!(
            rules[3].comparand,
            Comparand::AccumulatorLiteral("foo".to_string())
        );
    }
}
