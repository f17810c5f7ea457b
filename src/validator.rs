// src/validator.rs - Client-side validation and server field-error mapping
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::{ApiError, ApiResult, ErrorDetail};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

pub const PASSWORD_MIN_LENGTH: usize = 8;

// ==================== FIELD ERROR ====================

/// Form field a validation message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormField {
    Email,
    Password,
    Name,
    Title,
    Formula,
    Location,
    Purity,
    Quantity,
    Reason,
    Other(String),
}

impl FormField {
    pub fn from_name(name: &str) -> Self {
        match name {
            "email" | "contactEmail" | "contact_email" => FormField::Email,
            "password" => FormField::Password,
            "name" => FormField::Name,
            "title" => FormField::Title,
            "formula" => FormField::Formula,
            "location" => FormField::Location,
            "purity" => FormField::Purity,
            "dosage" | "quantity" | "value" | "currentVolume" | "originalVolume" => FormField::Quantity,
            "reason" => FormField::Reason,
            other => FormField::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FormField::Email => "email",
            FormField::Password => "password",
            FormField::Name => "name",
            FormField::Title => "title",
            FormField::Formula => "formula",
            FormField::Location => "location",
            FormField::Purity => "purity",
            FormField::Quantity => "quantity",
            FormField::Reason => "reason",
            FormField::Other(name) => name,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What went wrong with a field; the UI maps each kind to a localized message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Required,
    InvalidFormat,
    TooShort,
    TooLong,
    OutOfRange,
    Server(String),
}

impl MessageKind {
    /// Maps the `code` set on `#[validate(...)]` attributes.
    pub fn from_code(code: &str) -> Self {
        match code {
            "required" => MessageKind::Required,
            "invalid_format" | "email" => MessageKind::InvalidFormat,
            "too_short" => MessageKind::TooShort,
            "too_long" => MessageKind::TooLong,
            "out_of_range" | "range" => MessageKind::OutOfRange,
            other => MessageKind::Server(other.to_string()),
        }
    }

    /// Maps a 422 item `type` (`missing`, `string_too_short`, `value_error.email`, ...).
    fn from_server_type(kind: &str, message: &str) -> Self {
        if kind == "missing" || kind.ends_with(".missing") {
            MessageKind::Required
        } else if kind.contains("too_short") {
            MessageKind::TooShort
        } else if kind.contains("too_long") {
            MessageKind::TooLong
        } else if kind.contains("email") || kind.contains("pattern") {
            MessageKind::InvalidFormat
        } else if kind.starts_with("greater_than") || kind.starts_with("less_than") {
            MessageKind::OutOfRange
        } else {
            MessageKind::Server(message.to_string())
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MessageKind::Required => write!(f, "required"),
            MessageKind::InvalidFormat => write!(f, "invalid format"),
            MessageKind::TooShort => write!(f, "too short"),
            MessageKind::TooLong => write!(f, "too long"),
            MessageKind::OutOfRange => write!(f, "out of range"),
            MessageKind::Server(message) => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub kind: MessageKind,
}

impl FieldError {
    pub fn new(field: FormField, kind: MessageKind) -> Self {
        Self { field, kind }
    }
}

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn add_error(&mut self, field: FormField, kind: MessageKind) {
        self.errors.push(FieldError::new(field, kind));
    }

    pub fn check(&mut self, field: FormField, outcome: Result<(), MessageKind>) {
        if let Err(kind) = outcome {
            self.add_error(field, kind);
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    pub fn into_result(self) -> ApiResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_empty(value: &str) -> Result<(), MessageKind> {
        if value.trim().is_empty() {
            Err(MessageKind::Required)
        } else {
            Ok(())
        }
    }

    pub fn email(value: &str) -> Result<(), MessageKind> {
        Self::not_empty(value)?;
        if EMAIL_REGEX.is_match(value.trim()) {
            Ok(())
        } else {
            Err(MessageKind::InvalidFormat)
        }
    }

    /// At least eight characters with one letter and one digit.
    pub fn password(value: &str) -> Result<(), MessageKind> {
        if value.is_empty() {
            return Err(MessageKind::Required);
        }
        if value.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(MessageKind::TooShort);
        }
        let has_letter = value.chars().any(|c| c.is_alphabetic());
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        if !(has_letter && has_digit) {
            return Err(MessageKind::InvalidFormat);
        }
        Ok(())
    }

    pub fn quantity(value: f64) -> Result<(), MessageKind> {
        if !value.is_finite() || value < 0.0 {
            return Err(MessageKind::OutOfRange);
        }
        Ok(())
    }

    /// Parses a dosage typed into a form field.
    pub fn dosage(value: &str) -> Result<f64, MessageKind> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MessageKind::Required);
        }
        let parsed: f64 = trimmed.parse().map_err(|_| MessageKind::InvalidFormat)?;
        Self::quantity(parsed)?;
        Ok(parsed)
    }
}

// ==================== MAPPING ====================

pub fn fields_from_validation_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields = Vec::new();
    for (field, errs) in errors.field_errors() {
        let name: &str = &field;
        for err in errs.iter() {
            fields.push(FieldError::new(
                FormField::from_name(name),
                MessageKind::from_code(&err.code),
            ));
        }
    }
    fields.sort_by(|a, b| a.field.as_str().cmp(b.field.as_str()));
    fields
}

/// Maps a 422 `detail` list (`[{"loc": ["body", "email"], "msg": ..., "type": ...}]`)
/// to field errors. The last string segment of `loc` names the field.
pub fn fields_from_422(detail: &ErrorDetail) -> Vec<FieldError> {
    let items = match detail {
        ErrorDetail::Structured(Value::Array(items)) => items,
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| {
            let field = item
                .get("loc")
                .and_then(Value::as_array)
                .and_then(|loc| loc.iter().rev().find_map(Value::as_str))
                .filter(|name| *name != "body")?;
            let message = item.get("msg").and_then(Value::as_str).unwrap_or_default();
            let kind = item.get("type").and_then(Value::as_str).unwrap_or_default();
            Some(FieldError::new(
                FormField::from_name(field),
                MessageKind::from_server_type(kind, message),
            ))
        })
        .collect()
}
