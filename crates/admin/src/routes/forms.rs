//! Multipart form collection.
//!
//! Upload forms arrive as `multipart/form-data`. This module drains the
//! stream into text fields and files so handlers can validate everything
//! before writing anything.

use axum::extract::Multipart;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::UploadedFile;

/// A form that only carries the CSRF token.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// A fully read multipart submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl MultipartForm {
    /// Read every part.
    ///
    /// Parts with a file name are files; an empty file part (a file input
    /// left blank) is dropped. Everything else is a text field, repeated
    /// names kept in order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the body is not valid multipart or
    /// a text field is not UTF-8.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let bytes = field.bytes().await.map_err(malformed)?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.push((
                    name,
                    UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    },
                ));
            } else {
                let value = field.text().await.map_err(malformed)?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    /// Build a form from already-split parts.
    #[must_use]
    pub const fn from_parts(
        fields: Vec<(String, String)>,
        files: Vec<(String, UploadedFile)>,
    ) -> Self {
        Self { fields, files }
    }

    /// All text fields in submission order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value of a text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of a text field, trimmed; empty when absent.
    #[must_use]
    pub fn trimmed(&self, name: &str) -> String {
        self.text(name).map(str::trim).unwrap_or_default().to_string()
    }

    /// Every value submitted under `name`.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a checkbox-style field was submitted.
    #[must_use]
    pub fn is_checked(&self, name: &str) -> bool {
        self.text(name).is_some()
    }

    /// Remove and return the first file submitted under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(index).1)
    }
}

fn malformed(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed form upload: {}", err.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MultipartForm {
        MultipartForm::from_parts(
            vec![
                ("name".into(), "  Oysters ".into()),
                ("dietary_tags[]".into(), "gluten-free".into()),
                ("dietary_tags[]".into(), "dairy-free".into()),
                ("featured".into(), "1".into()),
            ],
            vec![(
                "image".into(),
                UploadedFile {
                    file_name: "oysters.png".into(),
                    bytes: vec![1, 2, 3],
                },
            )],
        )
    }

    #[test]
    fn test_field_access() {
        let form = form();
        assert_eq!(form.trimmed("name"), "Oysters");
        assert_eq!(form.trimmed("missing"), "");
        assert!(form.is_checked("featured"));
        assert!(!form.is_checked("active"));
        assert_eq!(
            form.all("dietary_tags[]").collect::<Vec<_>>(),
            ["gluten-free", "dairy-free"]
        );
    }

    #[test]
    fn test_take_file_once() {
        let mut form = form();
        assert_eq!(
            form.take_file("image").map(|f| f.file_name).as_deref(),
            Some("oysters.png")
        );
        assert!(form.take_file("image").is_none());
    }
}
