use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest identity document the backend accepts.
pub const MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// Default value of the `event` form field for club registrations.
const DEFAULT_EVENT: &str = "Badminton";

/// A player registration as listed on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub dob: Option<String>,
    pub gender: String,
    pub state: String,
    #[serde(default)]
    pub district: String,
    pub level: String,
    pub email: String,
    pub phone_no: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub document_exists: Option<bool>,
    #[serde(default)]
    pub document_name: Option<String>,
    pub created_at: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Only JPG documents are accepted")]
    UnsupportedDocument,

    #[error("Document too large ({0} bytes, max 2MB)")]
    DocumentTooLarge(usize),
}

/// Identity document attached to a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Form submitted by a player signing up for a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewRegistration {
    pub name: String,
    pub age: String,
    pub dob: String,
    pub gender: String,
    pub state: String,
    pub district: String,
    /// National / State / District
    pub level: String,
    pub email: String,
    pub phone_no: String,
    pub address: String,
    pub event: String,
    pub event_id: Option<String>,
    pub document: Option<Document>,
}

impl NewRegistration {
    pub fn validate(&self) -> Result<(), RegistrationError> {
        let required = [
            ("Name", &self.name),
            ("Age", &self.age),
            ("Date of birth", &self.dob),
            ("Gender", &self.gender),
            ("State", &self.state),
            ("Level of playing", &self.level),
            ("Email ID", &self.email),
            ("Contact number", &self.phone_no),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(RegistrationError::MissingField(*field));
        }

        if let Some(doc) = &self.document {
            let lower = doc.file_name.to_ascii_lowercase();
            if !(lower.ends_with(".jpg") || lower.ends_with(".jpeg")) {
                return Err(RegistrationError::UnsupportedDocument);
            }
            if doc.bytes.len() > MAX_DOCUMENT_BYTES {
                return Err(RegistrationError::DocumentTooLarge(doc.bytes.len()));
            }
        }
        Ok(())
    }

    /// Field/value pairs in the order the backend form expects.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let event = if self.event.trim().is_empty() {
            DEFAULT_EVENT.to_string()
        } else {
            self.event.clone()
        };
        let mut fields = vec![
            ("name", self.name.trim().to_string()),
            ("age", self.age.trim().to_string()),
            ("dob", self.dob.trim().to_string()),
            ("gender", self.gender.clone()),
            ("state", self.state.clone()),
            ("district", self.district.clone()),
            ("level", self.level.clone()),
            ("email", self.email.trim().to_string()),
            ("phone_no", self.phone_no.trim().to_string()),
            ("address", self.address.clone()),
            ("event", event),
        ];
        if let Some(id) = &self.event_id {
            fields.push(("event_id", id.clone()));
        }
        fields
    }

    /// Validate and build the multipart body.
    pub fn into_form(self) -> Result<Form, RegistrationError> {
        self.validate()?;
        let mut form = Form::new();
        for (name, value) in self.fields() {
            form = form.text(name, value);
        }
        if let Some(doc) = self.document {
            let part = Part::bytes(doc.bytes)
                .file_name(doc.file_name)
                .mime_str("image/jpeg")
                .map_err(|_| RegistrationError::UnsupportedDocument)?;
            form = form.part("document", part);
        }
        Ok(form)
    }
}
