/// Parameter constraints for `[name(constraint)]` segments
///
/// A constraint is a restricted regular expression that must match the
/// *entire* text of the request segment it is tested against.
use std::fmt;

use regex::Regex;

use crate::RouteError;

/// Characters that may never appear inside a constraint
pub const FORBIDDEN_CONSTRAINT_CHARS: [char; 6] = ['/', '\\', '?', ':', '(', ')'];

/// A compiled, anchored parameter constraint
///
/// Equality and hashing use the constraint source text, so two segments
/// written with the same constraint compare equal.
#[derive(Clone)]
pub struct ParameterConstraint {
    source: String,
    regex: Regex,
}

impl ParameterConstraint {
    /// Parses and compiles a constraint
    ///
    /// `segment` is only used for error reporting.
    ///
    /// # Examples
    ///
    /// ```
    /// use trellis_router::ParameterConstraint;
    ///
    /// let digits = ParameterConstraint::parse("[0-9]+", "[id([0-9]+)]").unwrap();
    /// assert!(digits.is_match("123"));
    /// assert!(!digits.is_match("12a"));
    ///
    /// assert!(ParameterConstraint::parse("a/b", "[x(a/b)]").is_err());
    /// ```
    pub fn parse(source: &str, segment: &str) -> Result<Self, RouteError> {
        if source.is_empty() {
            return Err(RouteError::invalid_constraint(segment, "constraint is empty"));
        }

        if let Some(c) = source.chars().find(|c| FORBIDDEN_CONSTRAINT_CHARS.contains(c)) {
            return Err(RouteError::invalid_constraint(
                segment,
                format!("character `{}` is not allowed in a constraint", c),
            ));
        }

        let regex = Regex::new(&format!("^(?:{})$", source))
            .map_err(|e| RouteError::invalid_constraint(segment, e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Whether the full segment text satisfies the constraint
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The constraint as written in the source path
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for ParameterConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ParameterConstraint {}

impl fmt::Debug for ParameterConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParameterConstraint").field(&self.source).finish()
    }
}

impl fmt::Display for ParameterConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
