//! Session identity.
//!
//! Neither path here authenticates anyone: identity tokens are decoded
//! without signature verification and local passwords are never checked.
//! The resulting [`User`] is a display placeholder for a non-sensitive club
//! client and must not gate anything that needs real authorization.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    error::{require, FormError},
    models::User,
};

/// Email used when the local form leaves it blank.
pub const DEFAULT_EMAIL: &str = "user@example.com";
/// Full name used when the local form leaves it blank.
pub const DEFAULT_FULL_NAME: &str = "ผู้ใช้ใหม่";
/// Student id used when the local form leaves it blank.
pub const DEFAULT_STUDENT_ID: &str = "000000";
/// Classroom used when the local form leaves it blank.
pub const DEFAULT_CLASSROOM: &str = "N/A";

/// Failures decoding an identity assertion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The token is not three dot-separated segments.
    #[error("identity token is malformed")]
    Malformed,
    /// The payload segment is not valid base64url.
    #[error("identity token payload is not base64url")]
    Encoding,
    /// The payload is not JSON or lacks email/name.
    #[error("identity token claims are invalid: {0}")]
    Claims(String),
}

/// Claims read from an identity token payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Account email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Profile picture URL.
    #[serde(default)]
    pub picture: Option<String>,
}

impl IdentityClaims {
    /// Session user for these claims; student id and classroom stay empty
    /// until the borrow form collects them.
    pub fn into_user(self) -> User {
        User {
            email: self.email,
            full_name: self.name,
            student_id: String::new(),
            classroom: String::new(),
            picture: self.picture.filter(|value| !value.is_empty()),
            is_logged_in: true,
        }
    }
}

/// Decode the payload of a `header.payload.signature` token.
///
/// The signature is ignored.
pub fn decode_identity_token(token: &str) -> Result<IdentityClaims, AuthError> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(AuthError::Malformed),
    };

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|_| AuthError::Encoding)?;

    serde_json::from_slice(&bytes).map_err(|err| AuthError::Claims(err.to_string()))
}

/// Which local form variant is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Email and password only.
    #[default]
    SignIn,
    /// Also asks for name, student id, and classroom.
    Register,
}

impl AuthMode {
    /// The other variant.
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignIn => AuthMode::Register,
            AuthMode::Register => AuthMode::SignIn,
        }
    }
}

/// Values typed into the local sign-in/register form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCredentials {
    /// Form variant.
    pub mode: AuthMode,
    /// Account email.
    pub email: String,
    /// Accepted as typed; never compared against anything.
    pub password: String,
    /// Register only.
    pub full_name: String,
    /// Register only.
    pub student_id: String,
    /// Register only.
    pub classroom: String,
}

impl LocalCredentials {
    /// Required-field check for the current mode.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.mode == AuthMode::Register {
            require("full name", &self.full_name)?;
            require("student id", &self.student_id)?;
            require("classroom", &self.classroom)?;
        }
        require("email", &self.email)?;
        require("password", &self.password)?;
        Ok(())
    }

    /// Fabricate a session user; blank fields take the placeholder defaults.
    pub fn into_user(self) -> User {
        User {
            email: or_default(&self.email, DEFAULT_EMAIL),
            full_name: or_default(&self.full_name, DEFAULT_FULL_NAME),
            student_id: or_default(&self.student_id, DEFAULT_STUDENT_ID),
            classroom: or_default(&self.classroom, DEFAULT_CLASSROOM),
            picture: None,
            is_logged_in: true,
        }
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    fn token_with(payload: &str, padded: bool) -> String {
        let encoded = if padded {
            URL_SAFE.encode(payload)
        } else {
            URL_SAFE_NO_PAD.encode(payload)
        };
        format!("eyJhbGciOiJSUzI1NiJ9.{encoded}.signature")
    }

    #[test]
    fn decodes_claims_with_and_without_padding() {
        let payload = r#"{"email":"somchai@school.ac.th","name":"สมชาย ใจดี","picture":"https://img/p.png"}"#;
        for padded in [false, true] {
            let claims = decode_identity_token(&token_with(payload, padded)).unwrap();
            assert_eq!(claims.email, "somchai@school.ac.th");
            assert_eq!(claims.name, "สมชาย ใจดี");
            assert_eq!(claims.picture.as_deref(), Some("https://img/p.png"));
        }
    }

    #[test]
    fn assertion_user_has_pending_student_fields() {
        let claims = decode_identity_token(&token_with(r#"{"email":"a@b.c","name":"A"}"#, false))
            .unwrap();
        let user = claims.into_user();
        assert!(user.is_logged_in);
        assert!(user.student_id.is_empty());
        assert!(user.classroom.is_empty());
        assert_eq!(user.picture, None);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(decode_identity_token("not-a-token"), Err(AuthError::Malformed));
        assert_eq!(decode_identity_token("a..c"), Err(AuthError::Malformed));
        assert_eq!(decode_identity_token("a.b.c.d"), Err(AuthError::Malformed));
        assert_eq!(decode_identity_token("a.!!!.c"), Err(AuthError::Encoding));
        assert!(matches!(
            decode_identity_token(&token_with(r#"{"email":"a@b.c"}"#, false)),
            Err(AuthError::Claims(_))
        ));
    }

    #[test]
    fn sign_in_requires_email_and_password_only() {
        let mut credentials = LocalCredentials {
            email: "a@b.c".to_string(),
            ..LocalCredentials::default()
        };
        assert_eq!(
            credentials.validate(),
            Err(FormError::MissingField("password"))
        );
        credentials.password = "secret".to_string();
        assert_eq!(credentials.validate(), Ok(()));

        let user = credentials.into_user();
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.full_name, DEFAULT_FULL_NAME);
        assert_eq!(user.student_id, DEFAULT_STUDENT_ID);
        assert_eq!(user.classroom, DEFAULT_CLASSROOM);
    }

    #[test]
    fn register_requires_student_fields() {
        let credentials = LocalCredentials {
            mode: AuthMode::Register,
            email: "a@b.c".to_string(),
            password: "x".to_string(),
            full_name: "Somchai".to_string(),
            ..LocalCredentials::default()
        };
        assert_eq!(
            credentials.validate(),
            Err(FormError::MissingField("student id"))
        );
    }
}
