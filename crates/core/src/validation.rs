//! Form validation for login and registration.
//!
//! These are boundary checks on user input. A form that fails validation is
//! re-rendered with field-level messages and never reaches the backend.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::Email;

/// Minimum password length accepted by the storefront.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Minimum display-name length.
pub const MIN_NAME_LENGTH: usize = 3;
/// Minimum number of digits in a phone number.
pub const MIN_PHONE_LENGTH: usize = 10;

const MSG_INVALID_EMAIL: &str = "Email inválido";
const MSG_SHORT_PASSWORD: &str = "A senha deve ter pelo menos 6 caracteres";
const MSG_EMAIL_MISMATCH: &str = "Os emails não coincidem";
const MSG_PASSWORD_MISMATCH: &str = "As senhas não coincidem";
const MSG_SHORT_NAME: &str = "O nome deve ter pelo menos 3 caracteres";
const MSG_SHORT_PHONE: &str = "Número de telefone inválido";
const MSG_PHONE_DIGITS: &str = "Telefone deve conter apenas números";

/// Field name → first validation message for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    /// Record a message unless the field already has one.
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    fn finish(self, email: Option<Email>) -> Result<Email, Self> {
        match email {
            Some(email) if self.is_empty() => Ok(email),
            _ => Err(self),
        }
    }
}

/// Login form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    /// Validate the login form and return the trimmed email.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when the email is malformed or the
    /// password is shorter than [`MIN_PASSWORD_LENGTH`].
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = check_email(&mut errors, "email", &self.email);
        check_password(&mut errors, "password", &self.password);
        errors.finish(email)
    }
}

/// Registration form input.
///
/// Email and password are each entered twice and must match exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub confirm_email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub phone: String,
}

impl RegistrationInput {
    /// Validate the registration form and return the trimmed email.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages for every field that fails.
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.name.trim().chars().count() < MIN_NAME_LENGTH {
            errors.push("name", MSG_SHORT_NAME);
        }

        let email = check_email(&mut errors, "email", &self.email);
        if self.confirm_email != self.email {
            errors.push("confirm_email", MSG_EMAIL_MISMATCH);
        }

        check_password(&mut errors, "password", &self.password);
        if self.confirm_password != self.password {
            errors.push("confirm_password", MSG_PASSWORD_MISMATCH);
        }

        if self.phone.chars().count() < MIN_PHONE_LENGTH {
            errors.push("phone", MSG_SHORT_PHONE);
        }
        if !self.phone.chars().all(|c| c.is_ascii_digit()) {
            errors.push("phone", MSG_PHONE_DIGITS);
        }

        errors.finish(email)
    }
}

fn check_email(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<Email> {
    let email = Email::parse(value).ok();
    if email.is_none() {
        errors.push(field, MSG_INVALID_EMAIL);
    }
    email
}

fn check_password(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(field, MSG_SHORT_PASSWORD);
    }
}
