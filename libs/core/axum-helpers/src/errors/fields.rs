//! Field-level validation failures.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

/// One failing field in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub name: String,
    pub message: String,
}

impl FieldError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Ordered collection of field failures.
///
/// Validators push into it instead of returning early, so a caller sees every
/// failing field in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(name, message));
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True if at least one failure names `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.name == field)
    }

    /// Names of the failing fields, deduplicated, in first-seen order.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for error in &self.0 {
            if !names.contains(&error.name.as_str()) {
                names.push(&error.name);
            }
        }
        names
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FieldErrors {
    /// Flattens `validator` output, using each error's message when set and its
    /// code otherwise. Fields are sorted so responses are stable.
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        collect(&errors, None, &mut out);
        out.0.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

fn collect(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = match prefix {
            Some(p) => format!("{p}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(name.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, Some(&name), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, Some(&format!("{name}[{index}]")), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(email(message = "must be a valid email address"))]
        email: String,
        #[validate(length(min = 2))]
        name: String,
    }

    #[test]
    fn test_from_validation_errors_keeps_messages_and_codes() {
        let input = Signup {
            email: "nope".into(),
            name: "x".into(),
        };
        let errors = FieldErrors::from(input.validate().unwrap_err());

        let collected = errors.into_inner();
        assert_eq!(
            collected,
            vec![
                FieldError::new("email", "must be a valid email address"),
                FieldError::new("name", "length"),
            ]
        );
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.push("password", "too short");
        let err = errors.into_result().unwrap_err();
        assert!(err.contains("password"));
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn test_field_names_deduplicates() {
        let mut errors = FieldErrors::new();
        errors.push("password", "too short");
        errors.push("password", "needs a digit");
        errors.push("email", "invalid");
        assert_eq!(errors.field_names(), vec!["password", "email"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut errors = FieldErrors::new();
        errors.push("role", "unknown role");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "name": "role", "message": "unknown role" }])
        );
    }
}
