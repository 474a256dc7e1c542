//! Explicit form schemas.
//!
//! Each form lists its fields as [`FieldSpec`]s. The generic pass in
//! [`check_fields`] enforces presence and length; form-specific rules
//! (email shape, password confirmation, ...) run afterwards. Storage
//! columns are not consulted, so a schema change on one side never
//! silently changes the other.

pub mod contact;
pub mod login;
pub mod signup;

use std::collections::BTreeMap;

pub use contact::{ContactForm, CONTACT_FIELDS};
pub use login::{LoginForm, LOGIN_FIELDS};
pub use signup::{NewAccount, SignupForm, SIGNUP_FIELDS};

pub const REQUIRED_MESSAGE: &str = "This field is required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Tel,
    Password,
    TextArea,
}

impl InputKind {
    pub fn html_type(self) -> &'static str {
        match self {
            InputKind::Text | InputKind::TextArea => "text",
            InputKind::Email => "email",
            InputKind::Tel => "tel",
            InputKind::Password => "password",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    pub required: bool,
    pub max_length: Option<usize>,
}

/// Errors collected while validating one submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Presence and length checks shared by every form.
/// `value` returns the already-normalised submitted value of a field.
pub fn check_fields<'a>(
    specs: &[FieldSpec],
    value: impl Fn(&str) -> &'a str,
    errors: &mut FormErrors,
) {
    for spec in specs {
        let v = value(spec.name);
        if v.is_empty() {
            if spec.required {
                errors.add(spec.name, REQUIRED_MESSAGE);
            }
            continue;
        }
        if let Some(max) = spec.max_length {
            let len = v.chars().count();
            if len > max {
                errors.add(
                    spec.name,
                    format!("Ensure this value has at most {} characters (it has {}).", max, len),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: [FieldSpec; 2] = [
        FieldSpec { name: "a", label: "A", kind: InputKind::Text, required: true, max_length: Some(3) },
        FieldSpec { name: "b", label: "B", kind: InputKind::Text, required: false, max_length: None },
    ];

    #[test]
    fn required_and_length() {
        let mut errors = FormErrors::default();
        check_fields(&SPECS, |_| "", &mut errors);
        assert_eq!(errors.field("a"), [REQUIRED_MESSAGE.to_string()]);
        assert!(!errors.has_field("b"));

        let mut errors = FormErrors::default();
        check_fields(&SPECS, |name| if name == "a" { "abcd" } else { "" }, &mut errors);
        assert_eq!(
            errors.field("a"),
            ["Ensure this value has at most 3 characters (it has 4).".to_string()]
        );
    }

    #[test]
    fn into_result_only_fails_with_errors() {
        assert_eq!(FormErrors::default().into_result(1), Ok(1));
        let mut errors = FormErrors::default();
        errors.add_non_field("nope");
        assert!(errors.into_result(1).is_err());
    }
}
