//! Configuration and input validation
//!
//! Provides comprehensive validation for:
//! - Configuration files
//! - Saved query records and log mappings
//! - User inputs
//! - Patterns and formats
//!
//! # Example
//!
//! ```rust,ignore
//! use querydeck_core::validation::{Validator, ValidationResult};
//!
//! let result = Validator::new()
//!     .required("key", &record.key)
//!     .max_length("key", &record.key, 200)
//!     .validate();
//!
//! if !result.is_valid() {
//!     for error in result.errors() {
//!         eprintln!("Validation error: {}", error);
//!     }
//! }
//! ```

use crate::error::{Error, ErrorCode, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Longest allowed saved-query key, in characters.
pub const MAX_KEY_LENGTH: usize = 200;

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                ErrorCode::ValidationError,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate minimum length (in characters)
    pub fn min_length(mut self, field: &str, value: &str, min: usize) -> Self {
        let len = value.chars().count();
        if len < min {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be at least {} characters", min),
                code: "MIN_LENGTH".to_string(),
                expected: Some(format!(">= {} chars", min)),
                actual: Some(format!("{} chars", len)),
            });
        }
        self
    }

    /// Validate maximum length (in characters)
    pub fn max_length(mut self, field: &str, value: &str, max: usize) -> Self {
        let len = value.chars().count();
        if len > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be at most {} characters", max),
                code: "MAX_LENGTH".to_string(),
                expected: Some(format!("<= {} chars", max)),
                actual: Some(format!("{} chars", len)),
            });
        }
        self
    }

    /// Validate against a regex pattern
    pub fn pattern(mut self, field: &str, value: &str, pattern: &str, description: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(value) {
                    self.result.add_error(ValidationError {
                        field: field.to_string(),
                        message: format!("Must match {}", description),
                        code: "PATTERN".to_string(),
                        expected: Some(description.to_string()),
                        actual: Some(value.to_string()),
                    });
                }
            }
            Err(_) => {
                self.result.add_error(ValidationError {
                    field: field.to_string(),
                    message: "Invalid validation pattern".to_string(),
                    code: "INTERNAL".to_string(),
                    expected: None,
                    actual: None,
                });
            }
        }
        self
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be one of: {}", allowed.join(", ")),
                code: "ONE_OF".to_string(),
                expected: Some(allowed.join(", ")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {} and {}", min, max),
                code: "RANGE".to_string(),
                expected: Some(format!("{} - {}", min, max)),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate that a path exists
    pub fn path_exists(mut self, field: &str, path: &Path) -> Self {
        if !path.exists() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Path does not exist: {}", path.display()),
                code: "PATH_NOT_FOUND".to_string(),
                expected: Some("existing path".to_string()),
                actual: Some(path.display().to_string()),
            });
        }
        self
    }

    /// Add a custom validation
    pub fn custom<F>(mut self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message,
                code: "CUSTOM".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Validate a saved query record before it enters the library.
pub fn validate_record(category: &str, key: &str, query: &str) -> ValidationResult {
    Validator::new()
        .required("category", category)
        .required("key", key)
        .max_length("key", key, MAX_KEY_LENGTH)
        .required("query", query)
        .validate()
}

/// Validate a log mapping entry.
pub fn validate_mapping(service: &str, source_category: &str) -> ValidationResult {
    Validator::new()
        .required("service", service)
        .required("source_category", source_category)
        .warn_if(
            "source_category",
            source_category.contains(char::is_whitespace),
            "Source categories normally contain no whitespace",
        )
        .validate()
}

/// Validate configuration schema
pub fn validate_config(config: &HashMap<String, serde_json::Value>) -> ValidationResult {
    let mut result = ValidationResult::new();

    // Check for unknown keys
    let known_keys = [
        "general",
        "library",
        "sumo",
        "confluence",
        "assist",
        "rate_limit",
        "activity",
    ];

    for key in config.keys() {
        if !known_keys.contains(&key.as_str()) {
            result.add_warning(ValidationError {
                field: key.clone(),
                message: format!("Unknown configuration key: {}", key),
                code: "UNKNOWN_KEY".to_string(),
                expected: Some(known_keys.join(", ")),
                actual: Some(key.clone()),
            });
        }
    }

    result
}
