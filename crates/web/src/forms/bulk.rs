//! Bulk-upload form: an ordered list of rows, one product per row.

use std::str::FromStr;

use catalog_core::{BulkProductInput, BulkUploadPayload, ImageFile, RowId, UploadId, price};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FlashMessage, FormState, StagedImage, is_stageable};

/// Confirmation shown after a batch is accepted.
pub const SUCCESS_MESSAGE: &str = "Bulk upload successful";

/// Shown when a batch fails without a usable message.
pub const FAILURE_FALLBACK: &str = "Bulk upload failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkUploadError {
    #[error("Add at least one product with image before uploading.")]
    NoCompleteRows,
    #[error("Image {0} could not be read, please attach it again")]
    UnreadableImage(String),
    #[error("An upload is already in progress")]
    InProgress,
}

/// One row of the bulk form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRow {
    pub id: RowId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: Option<StagedImage>,
}

impl BulkRow {
    fn empty() -> Self {
        Self {
            id: RowId::new(),
            name: String::new(),
            description: String::new(),
            price: String::new(),
            image: None,
        }
    }

    /// A row is uploaded only if it has a name and an image.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && self.image.is_some()
    }
}

/// Text edits for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowEdit {
    pub name: String,
    pub description: String,
    pub price: String,
}

/// What the visitor asked the bulk form to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkAction {
    /// Save edits and attach newly chosen images.
    #[default]
    Stage,
    AddRow,
    RemoveRow(RowId),
    ClearImage(RowId),
    /// Build the batch and upload it.
    Upload,
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" | "stage" => return Ok(Self::Stage),
            "add-row" => return Ok(Self::AddRow),
            "upload" => return Ok(Self::Upload),
            _ => {}
        }

        let row = |prefix: &str| {
            s.strip_prefix(prefix)
                .and_then(|id| id.parse::<RowId>().ok())
        };
        if let Some(id) = row("remove-row:") {
            Ok(Self::RemoveRow(id))
        } else if let Some(id) = row("clear-image:") {
            Ok(Self::ClearImage(id))
        } else {
            Err(format!("unknown form action '{s}'"))
        }
    }
}

/// Draft of the bulk-upload form.
///
/// Starts with one empty row; every row can be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkForm {
    rows: Vec<BulkRow>,
    #[serde(default)]
    state: FormState,
}

impl Default for BulkForm {
    fn default() -> Self {
        Self {
            rows: vec![BulkRow::empty()],
            state: FormState::Idle,
        }
    }
}

impl BulkForm {
    #[must_use]
    pub fn rows(&self) -> &[BulkRow] {
        &self.rows
    }

    #[must_use]
    pub const fn state(&self) -> &FormState {
        &self.state
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Append an empty row and return its ID.
    pub fn add_row(&mut self) -> Option<RowId> {
        if self.is_locked() {
            return None;
        }
        let row = BulkRow::empty();
        let id = row.id;
        self.rows.push(row);
        Some(id)
    }

    /// Remove a row. Returns whether a row was removed.
    pub fn remove_row(&mut self, id: RowId) -> bool {
        if self.is_locked() {
            return false;
        }
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        self.rows.len() < before
    }

    /// Apply text edits to a row. Unknown rows are ignored.
    pub fn update_row(&mut self, id: RowId, edit: RowEdit) -> bool {
        if self.is_locked() {
            return false;
        }
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        row.name = edit.name;
        row.description = edit.description;
        row.price = edit.price;
        true
    }

    /// Set or clear a row's image.
    ///
    /// Files that are not stageable (a blank input, a non-image) leave the
    /// current image in place; pass `None` to clear it.
    pub fn set_row_image(&mut self, id: RowId, file: Option<ImageFile>) -> bool {
        if self.is_locked() {
            return false;
        }
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        match file {
            None => {
                row.image = None;
                true
            }
            Some(file) if is_stageable(&file) => {
                row.image = Some(StagedImage::from_file(&file));
                true
            }
            Some(_) => false,
        }
    }

    fn row_mut(&mut self, id: RowId) -> Option<&mut BulkRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    /// Collect complete rows into a payload, in row order.
    ///
    /// Rows without a name or an image are skipped. Prices are read leniently:
    /// blank or unparsable values become zero.
    ///
    /// # Errors
    ///
    /// Returns [`BulkUploadError::NoCompleteRows`] if nothing would be sent.
    pub fn payload(&self) -> Result<BulkUploadPayload, BulkUploadError> {
        let mut payload = BulkUploadPayload::new();
        for row in self.rows.iter().filter(|row| row.is_complete()) {
            let Some(image) = &row.image else { continue };
            let file = image
                .to_file()
                .map_err(|_| BulkUploadError::UnreadableImage(image.file_name.clone()))?;
            payload.push(
                BulkProductInput {
                    name: row.name.trim().to_string(),
                    description: row.description.clone(),
                    price: price::parse_lenient(&row.price),
                },
                file,
            );
        }

        if payload.is_empty() {
            return Err(BulkUploadError::NoCompleteRows);
        }
        Ok(payload)
    }

    /// Build the payload and, if non-empty, lock the form for `upload`.
    ///
    /// # Errors
    ///
    /// Returns the reason nothing was sent; the message is also recorded on
    /// the form.
    pub fn submit(&mut self, upload: UploadId) -> Result<BulkUploadPayload, BulkUploadError> {
        if self.is_locked() {
            return Err(BulkUploadError::InProgress);
        }
        match self.payload() {
            Ok(payload) => {
                self.state = FormState::Submitting { upload };
                Ok(payload)
            }
            Err(e) => {
                self.state = FormState::Error {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Apply the result of `upload`; see [`super::ProductForm::finish`].
    ///
    /// Success resets the form to a single empty row.
    pub fn finish(&mut self, upload: UploadId, result: Result<(), &str>) -> bool {
        if self.state.pending_upload() != Some(upload) {
            return false;
        }
        match result {
            Ok(()) => {
                *self = Self {
                    state: FormState::Success {
                        message: SUCCESS_MESSAGE.to_string(),
                    },
                    ..Self::default()
                };
            }
            Err(message) => {
                let message = if message.trim().is_empty() {
                    FAILURE_FALLBACK.to_string()
                } else {
                    message.to_string()
                };
                self.state = FormState::Error { message };
            }
        }
        true
    }

    /// Take the pending one-shot message and return to idle.
    pub fn acknowledge(&mut self) -> Option<FlashMessage> {
        self.state.acknowledge()
    }
}
