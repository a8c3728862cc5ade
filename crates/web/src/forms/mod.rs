//! Form drafts for the upload views.
//!
//! A draft is the state of one form between requests: the entered fields,
//! staged images with their previews, and an explicit [`FormState`]. Drafts
//! live in the visitor's session and are read-modify-written by each request.
//!
//! # Forms
//!
//! - [`ProductForm`] - single product with one or more images
//! - [`BulkForm`] - ordered rows, one product and one image per row

pub mod bulk;
pub mod multipart;
pub mod product;

pub use bulk::{BulkAction, BulkForm, BulkRow, BulkUploadError, RowEdit};
pub use multipart::{FormFields, read_form_fields};
pub use product::{ProductAction, ProductFields, ProductForm, ValidationError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use catalog_core::{ImageFile, UploadId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a form submission.
///
/// `Success` and `Error` are shown once and then acknowledged back to `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FormState {
    #[default]
    Idle,
    /// An upload is in flight; the form is locked.
    Submitting { upload: UploadId },
    Success { message: String },
    Error { message: String },
}

impl FormState {
    /// Whether inputs are disabled.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }

    /// The upload this form is waiting on, if any.
    #[must_use]
    pub const fn pending_upload(&self) -> Option<UploadId> {
        match self {
            Self::Submitting { upload } => Some(*upload),
            _ => None,
        }
    }

    /// Take the terminal message (if any) and return to `Idle`.
    pub fn acknowledge(&mut self) -> Option<FlashMessage> {
        let message = match self {
            Self::Success { message } => FlashMessage::success(std::mem::take(message)),
            Self::Error { message } => FlashMessage::error(std::mem::take(message)),
            Self::Idle | Self::Submitting { .. } => return None,
        };
        *self = Self::Idle;
        Some(message)
    }
}

/// Kind of a one-shot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    /// CSS modifier for the message box.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A message shown once above a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub const fn success(text: String) -> Self {
        Self {
            kind: MessageKind::Success,
            text,
        }
    }

    #[must_use]
    pub const fn error(text: String) -> Self {
        Self {
            kind: MessageKind::Error,
            text,
        }
    }
}

/// Errors reading back a staged image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StagingError {
    #[error("image {0} is not a base64 data URL")]
    Malformed(String),
    #[error("image {0} could not be decoded")]
    Decode(String),
}

/// An image held in a draft.
///
/// The file is kept as a data URL, which is also its preview: rendering the
/// preview and re-reading the file for upload use the same bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: String,
    pub data_url: String,
}

impl StagedImage {
    /// Stage a file, producing its data-URL preview.
    #[must_use]
    pub fn from_file(file: &ImageFile) -> Self {
        Self {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            data_url: format!(
                "data:{};base64,{}",
                file.content_type,
                STANDARD.encode(&file.data)
            ),
        }
    }

    /// Decode the staged bytes back into a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data URL is not valid base64.
    pub fn to_file(&self) -> Result<ImageFile, StagingError> {
        let encoded = self
            .data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, encoded)| encoded)
            .ok_or_else(|| StagingError::Malformed(self.file_name.clone()))?;

        let data = STANDARD
            .decode(encoded)
            .map_err(|_| StagingError::Decode(self.file_name.clone()))?;

        Ok(ImageFile::new(
            self.file_name.clone(),
            self.content_type.clone(),
            data,
        ))
    }
}

impl std::fmt::Debug for StagedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("data_url_len", &self.data_url.len())
            .finish()
    }
}

/// Whether an uploaded file should be staged.
///
/// Browsers submit an empty, unnamed part for a file input left blank, and the
/// inputs only accept images.
#[must_use]
pub fn is_stageable(file: &ImageFile) -> bool {
    !file.is_empty() && !file.file_name.is_empty() && file.content_type.starts_with("image/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_staged_image_roundtrips_bytes() {
        let file = png("a.png");
        let staged = StagedImage::from_file(&file);
        assert!(staged.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(staged.to_file().unwrap(), file);
    }

    #[test]
    fn test_corrupt_data_url_is_reported() {
        let staged = StagedImage {
            file_name: "x.png".to_string(),
            content_type: "image/png".to_string(),
            data_url: "https://elsewhere".to_string(),
        };
        assert_eq!(
            staged.to_file(),
            Err(StagingError::Malformed("x.png".to_string()))
        );
    }

    #[test]
    fn test_blank_file_inputs_are_not_stageable() {
        assert!(!is_stageable(&ImageFile::new("", "application/octet-stream", vec![])));
        assert!(!is_stageable(&ImageFile::new("notes.txt", "text/plain", vec![1])));
        assert!(is_stageable(&png("a.png")));
    }

    #[test]
    fn test_acknowledge_returns_to_idle_once() {
        let mut state = FormState::Error {
            message: "boom".to_string(),
        };
        let message = state.acknowledge().unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        assert_eq!(message.text, "boom");
        assert_eq!(state, FormState::Idle);
        assert!(state.acknowledge().is_none());
    }

    #[test]
    fn test_submitting_is_locked_and_not_acknowledged() {
        let upload = UploadId::new();
        let mut state = FormState::Submitting { upload };
        assert!(state.is_locked());
        assert_eq!(state.pending_upload(), Some(upload));
        assert!(state.acknowledge().is_none());
        assert!(state.is_locked());
    }
}
