// tools for validation of input

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{self, Display},
};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    field: String,
    /// e.g. "required", "invalid_format"
    code: String,
    /// human-friendly (or built from code + params)
    message: String,
    params: HashMap<String, String>,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}: {}", self.field, self.code)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if !self.params.is_empty() {
            write!(f, "\nparams:")?;
        }
        for (key, value) in self.params.iter() {
            write!(f, "\n{key}: {value}")?;
        }
        Ok(())
    }
}

impl FieldError {
    pub fn get_field(&self) -> &str {
        &self.field
    }
    pub fn get_code(&self) -> &str {
        self.code.as_str()
    }
    pub fn get_message(&self) -> &str {
        &self.message
    }
    pub fn get_params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

impl FieldError {
    pub fn builder() -> FieldErrorBuilder<NoField> {
        FieldErrorBuilder {
            field: NoField {},
            code: "".into(),
            message: "".into(),
            params: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Error, Default, Serialize, Deserialize, PartialEq, Eq)]
#[error("validation failed with {} error(s)", errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl From<FieldError> for ValidationErrors {
    fn from(value: FieldError) -> Self {
        Self {
            errors: vec![value],
        }
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }
    pub fn add(&mut self, err: FieldError) {
        self.errors.push(err);
    }
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

pub type ValidationResult<T> = Result<T, ValidationErrors>;

pub struct NoField {}
pub struct Field(String);

pub struct FieldErrorBuilder<F> {
    field: F,
    code: String,
    message: String,
    params: HashMap<String, String>,
}

impl FieldErrorBuilder<NoField> {
    pub fn set_field(self, field: impl Into<String>) -> FieldErrorBuilder<Field> {
        FieldErrorBuilder {
            field: Field(field.into()),
            code: self.code,
            message: self.message,
            params: self.params,
        }
    }
}

impl FieldErrorBuilder<Field> {
    /// set code to required
    pub fn add_required(mut self) -> Self {
        self.code = "required".into();
        self
    }
    /// set code to invalid_format
    pub fn add_invalid_format(mut self) -> Self {
        self.code = "invalid_format".into();
        self
    }
    /// set user defined code
    pub fn add_user_defined_code(mut self, code: &str) -> Self {
        self.code = code.into();
        self
    }
    pub fn add_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
    pub fn add_params(mut self, key: String, value: impl Into<String>) -> Self {
        self.params.insert(key, value.into());
        self
    }
    pub fn build(self) -> FieldError {
        FieldError {
            field: self.field.0,
            code: self.code,
            message: self.message,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_display_prefers_message() {
        let err = FieldError::builder()
            .set_field("team_count")
            .add_user_defined_code("invalid_team_count")
            .add_message("team_count must be even")
            .build();
        assert_eq!(err.to_string(), "team_count must be even");
    }

    #[test]
    fn field_error_display_falls_back_to_field_and_code() {
        let err = FieldError::builder().set_field("name").add_required().build();
        assert_eq!(err.to_string(), "name: required");
    }

    #[test]
    fn validation_errors_merge_accumulates() {
        let mut errs = ValidationErrors::new();
        errs.add(FieldError::builder().set_field("a").add_required().build());
        let mut more = ValidationErrors::new();
        more.add(FieldError::builder().set_field("b").add_required().build());
        errs.merge(more);
        assert_eq!(errs.errors.len(), 2);
    }
}
