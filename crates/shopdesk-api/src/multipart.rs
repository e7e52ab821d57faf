// ── Multipart payloads ──
//
// Plain JSON bodies cannot carry binary uploads (item photos, scanned
// receipts), so create/update have a multipart variant. Field encoding:
// files pass through untouched, dates become ISO-8601 strings, every
// other scalar is stringified. Nulls are dropped.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

/// Binary file attached to a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, keeping its base name.
    pub async fn from_path(path: &Path) -> Result<Self, Error> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Multipart(format!("failed to read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }
}

/// One multipart field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Date(DateTime<Utc>),
    File(FilePart),
}

impl FormValue {
    /// Text encoding for non-file values. Dates use millisecond ISO-8601 with `Z`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::File(_) => None,
        }
    }
}

/// Ordered list of multipart fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    fields: Vec<(String, FormValue)>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a payload from any serializable object.
    ///
    /// Top-level keys become fields. Strings pass through, numbers and
    /// booleans stringify, arrays/objects are sent as JSON text, and nulls
    /// are skipped.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, Error> {
        let value = serde_json::to_value(data).map_err(|e| Error::Multipart(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(Error::Multipart("payload must serialize to a JSON object".into()));
        };

        let mut payload = Self::new();
        for (key, value) in map {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other @ (Value::Array(_) | Value::Object(_)) => other.to_string(),
            };
            payload.fields.push((key, FormValue::Text(text)));
        }
        Ok(payload)
    }

    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, FormValue::Text(value.to_string()));
        self
    }

    pub fn date(mut self, name: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.set(name, FormValue::Date(value));
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.set(name, FormValue::File(file));
        self
    }

    /// Replace an existing field of the same name, or append.
    pub fn set(&mut self, name: impl Into<String>, value: FormValue) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn has_files(&self) -> bool {
        self.fields
            .iter()
            .any(|(_, v)| matches!(v, FormValue::File(_)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert into a `reqwest` form.
    pub fn into_form(self) -> Result<Form, Error> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::File(file) => {
                    let mut part = Part::bytes(file.bytes).file_name(file.file_name);
                    if let Some(mime) = file.mime {
                        part = part
                            .mime_str(&mime)
                            .map_err(|e| Error::Multipart(format!("invalid mime {mime}: {e}")))?;
                    }
                    form.part(name, part)
                }
                other => {
                    let text = other.as_text().unwrap_or_default();
                    form.text(name, text)
                }
            };
        }
        Ok(form)
    }
}
