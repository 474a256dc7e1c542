use serde::Deserialize;

use super::{check_fields, FieldSpec, FormErrors, InputKind};

pub const SIGNUP_FIELDS: [FieldSpec; 3] = [
    FieldSpec { name: "username", label: "Username", kind: InputKind::Text, required: true, max_length: Some(150) },
    FieldSpec { name: "password1", label: "Password", kind: InputKind::Password, required: true, max_length: None },
    FieldSpec { name: "password2", label: "Password confirmation", kind: InputKind::Password, required: true, max_length: None },
];

pub const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// A registration that passed every local check. Username uniqueness is
/// checked against the user store by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

impl SignupForm {
    pub fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "password1" => &self.password1,
            "password2" => &self.password2,
            _ => "",
        }
    }

    pub fn validate(&self, min_password_length: usize) -> Result<NewAccount, FormErrors> {
        let username = self.username.trim();
        let mut errors = FormErrors::default();
        check_fields(
            &SIGNUP_FIELDS,
            |name| if name == "username" { username } else { self.value(name) },
            &mut errors,
        );

        if !username.is_empty() && !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                for message in password_problems(&self.password2, username, min_password_length) {
                    errors.add("password2", message);
                }
            }
        }

        errors.into_result(NewAccount {
            username: username.to_string(),
            password: self.password1.clone(),
        })
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn password_problems(password: &str, username: &str, min_length: usize) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < min_length {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            min_length
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    let (pw, user) = (password.to_lowercase(), username.to_lowercase());
    if user.chars().count() >= 3 && (pw.contains(&user) || user.contains(&pw)) {
        problems.push("The password is too similar to the username.".to_string());
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, p1: &str, p2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn valid_signup() {
        let account = form(" alice ", "s3cret-pass", "s3cret-pass").validate(8).unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.password, "s3cret-pass");
    }

    #[test]
    fn mismatched_confirmation() {
        let errors = form("alice", "s3cret-pass", "s3cret-pasz").validate(8).unwrap_err();
        assert_eq!(errors.field("password2"), ["The two password fields didn't match.".to_string()]);
    }

    #[test]
    fn password_rules() {
        let errors = form("alice", "1234", "1234").validate(8).unwrap_err();
        let messages = errors.field("password2");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("too short"));
        assert!(messages[1].contains("entirely numeric"));

        let errors = form("alice", "alice-2024!", "alice-2024!").validate(8).unwrap_err();
        assert!(errors.field("password2")[0].contains("too similar"));
    }

    #[test]
    fn username_rules() {
        let errors = form("bad name!", "s3cret-pass", "s3cret-pass").validate(8).unwrap_err();
        assert!(errors.has_field("username"));

        let errors = form("", "", "").validate(8).unwrap_err();
        for field in ["username", "password1", "password2"] {
            assert!(errors.has_field(field), "{} should be required", field);
        }
    }
}
