//! Validation errors
//!
//! Every failure raised while constructing a filter is reported as a
//! [`ValidationError`] carrying the location of the offending input, a
//! human-readable message and a machine-readable error kind. One construction
//! collects all of its failures into a [`ValidationErrors`] so a client sees
//! every problem with its query string at once.
//!
//! # Example
//!
//! ```rust
//! use filtercrate::validation::{ValidationError, ValidationErrors};
//!
//! let mut errors = ValidationErrors::new();
//! errors.add(ValidationError::new("count", "int_parsing", "Input should be a valid integer"));
//!
//! assert_eq!(errors.len(), 1);
//! assert!(errors.into_result().is_err());
//! ```

use serde::Serialize;
use std::fmt;

/// One element of an error location: a field name or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocItem {
    Key(String),
    Index(usize),
}

impl From<&str> for LocItem {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for LocItem {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for LocItem {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for LocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Validation error with location, message and kind
///
/// Serializes as `{"loc": [...], "msg": "...", "type": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Path to the offending input, outermost first
    pub loc: Vec<LocItem>,
    /// Human-readable error message
    pub msg: String,
    /// Error kind, e.g. `missing` or `int_parsing`
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationError {
    /// Create an error located at a single field
    #[must_use]
    pub fn new(field: impl Into<LocItem>, kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: vec![field.into()],
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Create an error that is not attached to a field yet
    #[must_use]
    pub fn unlocated(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: Vec::new(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Prepend a location element
    #[must_use]
    pub fn within(mut self, parent: impl Into<LocItem>) -> Self {
        self.loc.insert(0, parent.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = self
            .loc
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{loc}: {}", self.msg)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add every error of a nested construction under `parent`
    pub fn extend_within(&mut self, parent: &LocItem, nested: Self) {
        self.errors
            .extend(nested.errors.into_iter().map(|error| error.within(parent.clone())));
    }

    /// Check if there are any errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Get all errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Convert to Result
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
