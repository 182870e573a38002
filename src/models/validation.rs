use std::collections::HashMap;
use std::fmt;

use super::contract::field_position;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field check that failed for one document, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        // One message per field; the first recorded failure is the useful one.
        if self.errors.iter().any(|e| e.field == field) {
            return;
        }
        self.errors.push(FieldError { field, message: message.into() });
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for error in other.errors {
            self.push(error.field, error.message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    /// The failure reported to clients: earliest field in document order.
    pub fn first(&self) -> Option<&FieldError> {
        // Fields outside the document order sort last.
        self.errors.iter().min_by_key(|e| field_position(e.field).unwrap_or(usize::MAX))
    }

    pub fn into_field_map(self) -> HashMap<String, String> {
        self.errors.into_iter().map(|e| (e.field.to_string(), e.message)).collect()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(error) => write!(f, "{}", error.message),
            None => write!(f, "Validation failed"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_follows_document_order_not_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.push("minPrice", "Minimum price is required");
        errors.push("cropName", "Crop name is required");
        errors.push("email", "Email is required");

        assert_eq!(errors.first().map(|e| e.field), Some("cropName"));
        assert_eq!(errors.to_string(), "Crop name is required");
    }

    #[test]
    fn non_listing_fields_sort_after_listing_fields() {
        assert_eq!(field_position("cropName"), Some(0));
        assert_eq!(field_position("password"), None);

        let mut errors = ValidationErrors::new();
        errors.push("password", "Password is required");
        errors.push("name", "Name is required");
        errors.push("state", "State is required");
        assert_eq!(errors.first().map(|e| e.field), Some("state"));

        let mut account = ValidationErrors::new();
        account.push("password", "Password is required");
        account.push("name", "Name is required");
        assert_eq!(account.to_string(), "Password is required");
    }

    #[test]
    fn keeps_one_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.push("quantity", "Quantity must be a number");
        errors.push("quantity", "Quantity is required");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("quantity"), Some("Quantity must be a number"));
    }

    #[test]
    fn empty_errors_pass_through_value() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));
    }
}
