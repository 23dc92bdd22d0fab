//! # Rule Evaluator
//!
//! Boolean metadata expressions such as
//! `genre:Action AND NOT genre:Sci-Fi OR actor:Keanu Reeves`.
//!
//! ## Grammar
//!
//! An expression is a chain of terms joined by `AND`, `OR`, `AND NOT` or
//! `OR NOT` (case-insensitive, surrounded by whitespace). A term may carry a
//! `genre:`, `actor:`, `studio:`, `tag:` or `year:` prefix; otherwise the
//! caller's default field applies. A leading `NOT` negates the first term.
//!
//! ## Evaluation
//!
//! There is no precedence. The first term seeds the result, inverted when its
//! operator is a NOT variant, and the remaining terms fold left to right.

use core_library::{CatalogItem, MetadataField};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Infix operator tokens, longest alternatives first.
static OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(AND NOT|OR NOT|AND|OR)\s+").expect("operator regex should compile")
});

static LEADING_NOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^NOT\s+").expect("leading NOT regex should compile"));

/// How a rule combines with the result so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOperator {
    And,
    Or,
    /// Also spelled `NOT`
    AndNot,
    OrNot,
}

impl RuleOperator {
    /// Parse an operator token; inner whitespace runs count as one space.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "AND" => Some(RuleOperator::And),
            "OR" => Some(RuleOperator::Or),
            "AND NOT" | "NOT" => Some(RuleOperator::AndNot),
            "OR NOT" => Some(RuleOperator::OrNot),
            _ => None,
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, RuleOperator::AndNot | RuleOperator::OrNot)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOperator::And => "AND",
            RuleOperator::Or => "OR",
            RuleOperator::AndNot => "AND NOT",
            RuleOperator::OrNot => "OR NOT",
        }
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One condition in a rule chain.
///
/// `value` is stored trimmed and lower-cased. A rule whose field is unknown
/// or whose value is empty never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub operator: RuleOperator,
    pub field: Option<MetadataField>,
    pub value: String,
}

impl Rule {
    pub fn new(operator: RuleOperator, field: MetadataField, value: &str) -> Self {
        Self {
            operator,
            field: Some(field),
            value: value.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        let Some(field) = self.field else {
            return false;
        };
        if self.value.is_empty() {
            return false;
        }

        let equals = |candidate: &str| candidate.trim().to_lowercase() == self.value;
        match field {
            MetadataField::Genre => item.genres.iter().any(|genre| equals(genre)),
            MetadataField::Tag => item.tags.iter().any(|tag| equals(tag)),
            MetadataField::Studio => item.studios.iter().any(|studio| equals(studio)),
            MetadataField::Actor => item
                .people
                .iter()
                .filter(|person| person.is_actor())
                .any(|person| equals(&person.name)),
            MetadataField::Year => item
                .production_year
                .is_some_and(|year| year.to_string() == self.value),
        }
    }
}

/// Whether a filter value should be read as an expression rather than a
/// literal: it holds an operator token with whitespace on both sides. A
/// leading `NOT` alone keeps the value literal (`Not Rated`).
pub fn is_expression(value: &str) -> bool {
    OPERATOR.is_match(value)
}

fn parse_term(term: &str, default_field: MetadataField) -> (MetadataField, &str) {
    if let Some((prefix, value)) = term.split_once(':') {
        if let Some(field) = MetadataField::parse(prefix) {
            return (field, value.trim());
        }
    }
    (default_field, term.trim())
}

/// Parse an expression into its rule chain.
///
/// The first rule's operator is `AND` unless the expression starts with
/// `NOT`, in which case it is `AND NOT`.
pub fn parse_expression(expression: &str, default_field: MetadataField) -> Vec<Rule> {
    let mut expression = expression.trim();
    let mut first_operator = RuleOperator::And;

    if let Some(found) = LEADING_NOT.find(expression) {
        first_operator = RuleOperator::AndNot;
        expression = &expression[found.end()..];
    }

    let mut rules = Vec::new();
    let mut operator = first_operator;
    let mut term_start = 0;

    for captures in OPERATOR.captures_iter(expression) {
        let (Some(whole), Some(token)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let (field, value) = parse_term(&expression[term_start..whole.start()], default_field);
        rules.push(Rule::new(operator, field, value));

        // The regex only captures known tokens
        operator = RuleOperator::parse(token.as_str()).unwrap_or(RuleOperator::And);
        term_start = whole.end();
    }

    let (field, value) = parse_term(&expression[term_start..], default_field);
    rules.push(Rule::new(operator, field, value));

    debug!(count = rules.len(), "Parsed rule expression");
    rules
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Build rules from stored `{operator, type, value}` records.
///
/// Entries that are not objects, lack a type or value, or name an unknown
/// operator are skipped. The operator defaults to `AND`.
pub fn rules_from_records(records: &[Value]) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(records.len());

    for record in records {
        let Some(object) = record.as_object() else {
            warn!(rule = %record, "Skipping malformed rule");
            continue;
        };

        let kind = scalar(object.get("type")).unwrap_or_default();
        let value = scalar(object.get("value")).unwrap_or_default();
        let kind = kind.trim().to_lowercase();
        let value = value.trim().to_lowercase();
        if kind.is_empty() || value.is_empty() {
            debug!(rule = %record, "Skipping rule without type or value");
            continue;
        }

        let operator = scalar(object.get("operator")).unwrap_or_else(|| "AND".to_string());
        let Some(operator) = RuleOperator::parse(&operator) else {
            warn!(rule = %record, "Skipping rule with unknown operator");
            continue;
        };

        rules.push(Rule {
            operator,
            field: MetadataField::parse(&kind),
            value,
        });
    }

    rules
}

/// Evaluate a rule chain against one item. An empty chain matches everything.
pub fn evaluate(rules: &[Rule], item: &CatalogItem) -> bool {
    let Some((first, rest)) = rules.split_first() else {
        return true;
    };

    let mut result = first.matches(item);
    if first.operator.is_negated() {
        result = !result;
    }

    for rule in rest {
        let matched = rule.matches(item);
        result = match rule.operator {
            RuleOperator::And => result && matched,
            RuleOperator::Or => result || matched,
            RuleOperator::AndNot => result && !matched,
            RuleOperator::OrNot => result || !matched,
        };
    }

    result
}
