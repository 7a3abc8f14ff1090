//! Filter expressions for the record API.
//!
//! Filters are kept as a predicate list with an explicit join operator and
//! only rendered to the backend's text syntax at request time. String values
//! are always quoted and escaped, so ids or search terms containing `"` or `\`
//! cannot terminate the literal early.

use std::fmt;

/// Comparison operators understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    /// Case-insensitive substring match
    Like,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Any element of a multi-valued field equals the value
    AnyEq,
}

impl Op {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Like => "~",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::AnyEq => "?=",
        }
    }
}

/// How the terms of a [`Filter`] are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    And,
    Or,
}

impl Join {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => " && ",
            Self::Or => " || ",
        }
    }
}

/// Literal on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "\"{}\"", escape_text(text)),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// A single term of a filter
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Compare {
        field: String,
        op: Op,
        value: FilterValue,
    },
    Group(Filter),
}

/// A list of terms joined by one operator
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    join: Join,
    terms: Vec<Term>,
}

impl Filter {
    /// Terms that must all hold
    #[must_use]
    pub const fn all() -> Self {
        Self {
            join: Join::And,
            terms: Vec::new(),
        }
    }

    /// Terms of which at least one must hold
    #[must_use]
    pub const fn any() -> Self {
        Self {
            join: Join::Or,
            terms: Vec::new(),
        }
    }

    #[must_use]
    pub fn compare(mut self, field: &str, op: Op, value: impl Into<FilterValue>) -> Self {
        self.terms.push(Term::Compare {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn eq(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(field, Op::Eq, value)
    }

    #[must_use]
    pub fn like(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(field, Op::Like, value)
    }

    #[must_use]
    pub fn gte(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(field, Op::Gte, value)
    }

    #[must_use]
    pub fn any_eq(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(field, Op::AnyEq, value)
    }

    /// Nest another filter. Empty filters are skipped.
    #[must_use]
    pub fn group(mut self, filter: Self) -> Self {
        if !filter.is_empty() {
            self.terms.push(Term::Group(filter));
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub const fn join(&self) -> Join {
        self.join
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, term) in self.terms.iter().enumerate() {
            if index > 0 {
                f.write_str(self.join.as_str())?;
            }
            match term {
                Term::Compare { field, op, value } => {
                    write!(f, "{field} {} {value}", op.as_str())?;
                }
                Term::Group(inner) if inner.terms.len() == 1 => write!(f, "{inner}")?,
                Term::Group(inner) => write!(f, "({inner})")?,
            }
        }
        Ok(())
    }
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
