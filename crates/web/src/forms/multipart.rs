//! Reading `multipart/form-data` submissions into plain fields.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use catalog_core::ImageFile;

/// A decoded form submission.
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    files: Vec<(String, ImageFile)>,
}

impl FormFields {
    /// Value of a text field. Missing fields read as empty.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.text.get(name).map_or("", String::as_str)
    }

    /// Value of a text field, or `None` if it was not submitted.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Every file submitted under `name`, in submission order.
    pub fn files<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ImageFile> + 'a {
        self.files
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, file)| file)
    }

    /// Take every file submitted under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<ImageFile> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = kept;
        taken.into_iter().map(|(_, file)| file).collect()
    }

    /// Take the first file submitted under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<ImageFile> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.text.insert(name.into(), value.into());
    }

    pub fn insert_file(&mut self, name: impl Into<String>, file: ImageFile) {
        self.files.push((name.into(), file));
    }
}

/// Drain a multipart body.
///
/// Parts carrying a filename are files (including the empty part a browser
/// sends for a blank file input); everything else is text. Unnamed parts are
/// dropped.
///
/// # Errors
///
/// Returns an error if the body is malformed or exceeds the body limit.
pub async fn read_form_fields(mut multipart: Multipart) -> Result<FormFields, MultipartError> {
    let mut fields = FormFields::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let data = field.bytes().await?;
            fields.insert_file(name, ImageFile::new(file_name, content_type, data.to_vec()));
        } else {
            let value = field.text().await?;
            fields.insert_text(name, value);
        }
    }

    Ok(fields)
}
