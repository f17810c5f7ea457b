// src/models/user.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use validator::{Validate, ValidationError};

use crate::validator::FieldValidator;

// ==================== USER ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub affiliation: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: Option<String>,
    pub last_login_at: Option<String>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.email)
    }
}

// ==================== AUTH ====================

pub(crate) fn validate_password_policy(password: &str) -> Result<(), ValidationError> {
    FieldValidator::password(password).map_err(|kind| {
        let code = match kind {
            crate::validator::MessageKind::Required => "required",
            crate::validator::MessageKind::TooShort => "too_short",
            _ => "invalid_format",
        };
        ValidationError::new(code)
    })
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(code = "invalid_format"), length(min = 1, code = "required"))]
    pub email: String,
    #[validate(length(min = 1, code = "required"))]
    pub password: String,
}

/// Consent flags collected at signup; the first four must all be true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentPayload {
    pub required: bool,
    pub iot_environment: bool,
    pub iot_reagent: bool,
    pub video: bool,
    #[serde(default)]
    pub marketing: bool,
    pub version: String,
}

impl ConsentPayload {
    pub fn all_accepted(version: &str) -> Self {
        Self {
            required: true,
            iot_environment: true,
            iot_reagent: true,
            video: true,
            marketing: false,
            version: version.to_string(),
        }
    }

    pub fn has_required(&self) -> bool {
        self.required && self.iot_environment && self.iot_reagent && self.video
    }
}

fn validate_consent(consent: &ConsentPayload) -> Result<(), ValidationError> {
    if consent.has_required() {
        Ok(())
    } else {
        Err(ValidationError::new("required"))
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(code = "invalid_format"), length(min = 1, code = "required"))]
    pub email: String,
    #[validate(custom(function = "validate_password_policy"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, code = "required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(code = "invalid_format"))]
    pub contact_email: Option<String>,
    #[validate(custom(function = "validate_consent"))]
    pub consent: ConsentPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token_type: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserSelfUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, code = "required"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(code = "invalid_format"))]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl UserSelfUpdateRequest {
    pub fn apply_to(&self, user: &mut User) {
        let fields = [
            (&self.name, &mut user.name),
            (&self.affiliation, &mut user.affiliation),
            (&self.department, &mut user.department),
            (&self.position, &mut user.position),
            (&self.phone, &mut user.phone),
            (&self.contact_email, &mut user.contact_email),
            (&self.profile_image_url, &mut user.profile_image_url),
        ];
        for (update, slot) in fields {
            if let Some(value) = update {
                *slot = Some(value.clone());
            }
        }
    }
}

// ==================== ADMIN ====================

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    #[validate(email(code = "invalid_format"), length(min = 1, code = "required"))]
    pub email: String,
    #[validate(custom(function = "validate_password_policy"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, code = "required"))]
    pub name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(code = "invalid_format"))]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[validate(custom(function = "validate_consent"))]
    pub consent: ConsentPayload,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, code = "required"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(code = "invalid_format"))]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl UserUpdateRequest {
    /// Applies the present fields to a local copy for optimistic display.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = Some(name.clone());
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(v) = &self.affiliation {
            user.affiliation = Some(v.clone());
        }
        if let Some(v) = &self.department {
            user.department = Some(v.clone());
        }
        if let Some(v) = &self.position {
            user.position = Some(v.clone());
        }
        if let Some(v) = &self.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &self.contact_email {
            user.contact_email = Some(v.clone());
        }
        if let Some(v) = &self.profile_image_url {
            user.profile_image_url = Some(v.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(custom(function = "validate_password_policy"))]
    pub password: String,
}

// ==================== AUTH LOGS ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLog {
    pub id: i64,
    pub event_type: String,
    pub success: bool,
    pub logged_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthLogListResponse {
    #[serde(default)]
    pub items: Vec<AuthLog>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{fields_from_validation_errors, FormField, MessageKind};

    #[test]
    fn test_user_deserialize_camel_case() {
        let user: User = serde_json::from_str(
            r#"{
                "id": 7, "email": "kim@lab.io", "name": "Dr. Kim",
                "contactEmail": null, "profileImageUrl": "/avatars/avatar-1.png",
                "role": "admin", "isActive": false,
                "createdAt": "2026-01-01T00:00:00", "lastLoginAt": null
            }"#,
        )
        .unwrap();
        assert_eq!(user.id, 7);
        assert!(user.is_admin());
        assert!(!user.is_active);
        assert_eq!(user.display_name(), "Dr. Kim");
        assert_eq!(user.profile_image_url.as_deref(), Some("/avatars/avatar-1.png"));
    }

    #[test]
    fn test_login_response_snake_case() {
        let response: LoginResponse = serde_json::from_str(
            r#"{
                "token_type": "bearer", "access_token": "a", "refresh_token": "r",
                "expires_in": 3600, "csrf_token": "c",
                "user": {"id": 1, "email": "a@b.io", "role": "user"}
            }"#,
        )
        .unwrap();
        assert_eq!(response.csrf_token.as_deref(), Some("c"));
        assert_eq!(response.user.role, UserRole::User);
        assert!(response.user.is_active);
    }

    #[test]
    fn test_signup_validation_maps_fields() {
        let request = SignupRequest {
            email: "bad".to_string(),
            password: "short".to_string(),
            name: "Kim".to_string(),
            affiliation: None,
            department: None,
            position: None,
            phone: None,
            contact_email: None,
            consent: ConsentPayload::all_accepted("v1"),
        };
        let errors = request.validate().unwrap_err();
        let fields = fields_from_validation_errors(&errors);
        assert!(fields.iter().any(|f| f.field == FormField::Email && f.kind == MessageKind::InvalidFormat));
        assert!(fields.iter().any(|f| f.field == FormField::Password && f.kind == MessageKind::TooShort));
    }

    #[test]
    fn test_signup_requires_consent() {
        let mut consent = ConsentPayload::all_accepted("v1");
        consent.video = false;
        let request = SignupRequest {
            email: "kim@lab.io".to_string(),
            password: "Test1234".to_string(),
            name: "Kim".to_string(),
            affiliation: None,
            department: None,
            position: None,
            phone: None,
            contact_email: None,
            consent,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_apply_and_serialize() {
        let mut user: User = serde_json::from_str(r#"{"id": 2, "email": "x@lab.io"}"#).unwrap();
        let update = UserUpdateRequest {
            name: Some("Park".to_string()),
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        update.apply_to(&mut user);
        assert_eq!(user.name.as_deref(), Some("Park"));
        assert!(user.is_admin());

        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Park", "role": "admin"}));
    }
}
