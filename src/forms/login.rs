use serde::Deserialize;

use super::{check_fields, FieldSpec, FormErrors, InputKind};

pub const LOGIN_FIELDS: [FieldSpec; 2] = [
    FieldSpec { name: "username", label: "Username", kind: InputKind::Text, required: true, max_length: Some(150) },
    FieldSpec { name: "password", label: "Password", kind: InputKind::Password, required: true, max_length: None },
];

pub const INVALID_LOGIN_MESSAGE: &str = "Please enter a correct username and password.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "password" => &self.password,
            _ => "",
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        check_fields(&LOGIN_FIELDS, |name| self.value(name).trim(), &mut errors);
        errors.into_result(())
    }
}

/// Only same-site absolute paths are honoured as post-login targets.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fields_required() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert!(errors.has_field("username"));
        assert!(errors.has_field("password"));
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/update/3/")), Some("/update/3/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
