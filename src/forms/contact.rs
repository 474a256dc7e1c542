use serde::Deserialize;

use super::{check_fields, FieldSpec, FormErrors, InputKind};
use crate::database::models::{Contact, ContactInput};

pub const CONTACT_FIELDS: [FieldSpec; 4] = [
    FieldSpec { name: "name", label: "Name", kind: InputKind::Text, required: true, max_length: Some(100) },
    FieldSpec { name: "phone", label: "Phone", kind: InputKind::Tel, required: false, max_length: Some(20) },
    FieldSpec { name: "email", label: "Email", kind: InputKind::Email, required: false, max_length: Some(254) },
    FieldSpec { name: "address", label: "Address", kind: InputKind::TextArea, required: false, max_length: Some(255) },
];

/// Submitted contact fields. Missing keys deserialize as empty strings so
/// they surface as field errors rather than a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl ContactForm {
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            address: contact.address.clone(),
        }
    }

    pub fn value(&self, field: &str) -> &str {
        match field {
            "name" => &self.name,
            "phone" => &self.phone,
            "email" => &self.email,
            "address" => &self.address,
            _ => "",
        }
    }

    /// Trim every field, then check the schema and field shapes.
    pub fn validate(&self) -> Result<ContactInput, FormErrors> {
        let input = ContactInput {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
        };

        let mut errors = FormErrors::default();
        check_fields(
            &CONTACT_FIELDS,
            |field| match field {
                "name" => input.name.as_str(),
                "phone" => input.phone.as_str(),
                "email" => input.email.as_str(),
                "address" => input.address.as_str(),
                _ => "",
            },
            &mut errors,
        );

        if !input.phone.is_empty() && !is_valid_phone(&input.phone) {
            errors.add("phone", "Enter a valid phone number.");
        }
        if !input.email.is_empty() && !is_valid_email(&input.email) {
            errors.add("email", "Enter a valid email address.");
        }

        errors.into_result(input)
    }
}

fn is_valid_phone(phone: &str) -> bool {
    phone.chars().any(|c| c.is_ascii_digit())
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}
