use std::fmt;

use crate::errors::{Error, ErrorCode};

/// Comparison operator of a single filter term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equal => write!(f, "=="),
            Operator::NotEqual => write!(f, "!="),
            Operator::GreaterThan => write!(f, "=gt="),
            Operator::LessThan => write!(f, "=lt="),
            Operator::GreaterThanOrEqual => write!(f, "=ge="),
            Operator::LessThanOrEqual => write!(f, "=le="),
        }
    }
}

impl Operator {
    /// SQL comparison operator for this filter operator
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
        }
    }
}

/// One `field <op> value` term of a conjunctive filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

/// Sort request: a single field with optional `-` prefix for descending
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

const OPERATORS: &[(&str, Operator)] = &[
    ("==", Operator::Equal),
    ("!=", Operator::NotEqual),
    ("=ge=", Operator::GreaterThanOrEqual),
    ("=le=", Operator::LessThanOrEqual),
    ("=gt=", Operator::GreaterThan),
    ("=lt=", Operator::LessThan),
];

/// Parse a conjunction-only filter expression
///
/// Terms are `field==value`, `field!=value` or `field=ge=|=le=|=gt=|=lt=value`,
/// joined by `;`. Field validation happens later against the resource
/// registry; this only establishes the shape.
pub fn parse_filter(expression: &str) -> Result<Vec<FilterTerm>, Error> {
    let mut terms = Vec::new();

    for raw_term in expression.split(';') {
        let raw_term = raw_term.trim();
        if raw_term.is_empty() {
            return Err(invalid(expression, "empty filter term"));
        }
        terms.push(parse_term(expression, raw_term)?);
    }

    Ok(terms)
}

fn parse_term(expression: &str, term: &str) -> Result<FilterTerm, Error> {
    // Earliest operator occurrence wins so values may contain '='
    let mut found: Option<(usize, &str, Operator)> = None;
    for (pattern, operator) in OPERATORS {
        if let Some(pos) = term.find(pattern) {
            match found {
                Some((best, _, _)) if best <= pos => {}
                _ => found = Some((pos, pattern, *operator)),
            }
        }
    }

    let (pos, pattern, operator) = found.ok_or_else(|| {
        invalid(
            expression,
            &format!("term '{}' has no comparison operator", term),
        )
    })?;

    let field = term[..pos].trim();
    let value = term[pos + pattern.len()..].trim().trim_matches('"');

    if field.is_empty() {
        return Err(invalid(
            expression,
            &format!("term '{}' is missing a field name", term),
        ));
    }
    if value.is_empty() {
        return Err(invalid(
            expression,
            &format!("term '{}' is missing a value", term),
        ));
    }

    Ok(FilterTerm {
        field: field.to_string(),
        operator,
        value: value.to_string(),
    })
}

/// Parse a sort parameter; field validation happens against the registry
pub fn parse_sort(raw: &str) -> SortSpec {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('-') {
        Some(field) => SortSpec {
            field: field.to_string(),
            descending: true,
        },
        None => SortSpec {
            field: trimmed.to_string(),
            descending: false,
        },
    }
}

fn invalid(expression: &str, reason: &str) -> Error {
    Error::new(ErrorCode::InvalidFilter)
        .with_arg(expression)
        .with_arg(reason)
}
