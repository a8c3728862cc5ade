//! Single-product creation form.

use std::str::FromStr;

use catalog_core::{CreateProductPayload, ImageFile, Price, UploadId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FlashMessage, FormState, StagedImage, is_stageable};

/// Confirmation shown after a product is created.
pub const SUCCESS_MESSAGE: &str = "Product added successfully!";

/// Shown when an upload fails without a usable message.
pub const FAILURE_FALLBACK: &str = "Failed to add product";

/// Reasons a submit is rejected before any network call.
///
/// Checks run in declaration order; only the first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Product name is required")]
    NameRequired,
    #[error("Description is required")]
    DescriptionRequired,
    #[error("Price must be greater than 0")]
    InvalidPrice,
    #[error("At least one image is required")]
    ImageRequired,
    #[error("Image {0} could not be read, please attach it again")]
    UnreadableImage(String),
    #[error("An upload is already in progress")]
    InProgress,
}

/// Text inputs of the form, as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: String,
}

/// What the visitor asked the form to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductAction {
    /// Save fields and attach newly chosen images.
    #[default]
    Stage,
    /// Remove the image at this index.
    RemoveImage(usize),
    /// Validate and upload.
    Submit,
}

impl FromStr for ProductAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "stage" => Ok(Self::Stage),
            "submit" => Ok(Self::Submit),
            other => other
                .strip_prefix("remove:")
                .and_then(|index| index.parse().ok())
                .map(Self::RemoveImage)
                .ok_or_else(|| format!("unknown form action '{other}'")),
        }
    }
}

/// Draft of the single-product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    name: String,
    description: String,
    price: String,
    images: Vec<StagedImage>,
    #[serde(default)]
    state: FormState,
}

impl ProductForm {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn price(&self) -> &str {
        &self.price
    }

    /// Staged images in selection order; previews share the same index.
    #[must_use]
    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    #[must_use]
    pub const fn state(&self) -> &FormState {
        &self.state
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Replace the text inputs. Ignored while locked.
    pub fn set_fields(&mut self, fields: ProductFields) {
        if self.is_locked() {
            return;
        }
        self.name = fields.name;
        self.description = fields.description;
        self.price = fields.price;
    }

    /// Append images to the selection. Ignored while locked.
    ///
    /// Returns the number of images actually staged; blank inputs and
    /// non-image files are skipped.
    pub fn add_images(&mut self, files: impl IntoIterator<Item = ImageFile>) -> usize {
        if self.is_locked() {
            return 0;
        }
        let before = self.images.len();
        self.images.extend(
            files
                .into_iter()
                .filter(is_stageable)
                .map(|file| StagedImage::from_file(&file)),
        );
        self.images.len() - before
    }

    /// Remove the image (and its preview) at `index`.
    ///
    /// Out-of-range indices and locked forms are left untouched.
    pub fn remove_image(&mut self, index: usize) -> bool {
        if self.is_locked() || index >= self.images.len() {
            return false;
        }
        self.images.remove(index);
        true
    }

    /// Check the required fields and build the upload payload.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<CreateProductPayload, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::DescriptionRequired);
        }
        let price = Price::parse(&self.price).map_err(|_| ValidationError::InvalidPrice)?;
        if self.images.is_empty() {
            return Err(ValidationError::ImageRequired);
        }

        let images = self
            .images
            .iter()
            .map(|image| {
                image
                    .to_file()
                    .map_err(|_| ValidationError::UnreadableImage(image.file_name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CreateProductPayload {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            price,
            images,
        })
    }

    /// Validate and, if accepted, lock the form for `upload`.
    ///
    /// A rejected submit leaves the entered data intact and records the
    /// validation message.
    ///
    /// # Errors
    ///
    /// Returns the validation failure, or [`ValidationError::InProgress`] if
    /// the form is already submitting.
    pub fn submit(&mut self, upload: UploadId) -> Result<CreateProductPayload, ValidationError> {
        if self.is_locked() {
            return Err(ValidationError::InProgress);
        }
        match self.validate() {
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

    /// Apply the result of `upload`.
    ///
    /// Only applies while the form is still waiting on that upload; returns
    /// whether it did. Success clears every field and image; failure keeps
    /// them for a retry.
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![1, 2, 3, 4])
    }

    fn filled() -> ProductForm {
        let mut form = ProductForm::default();
        form.set_fields(ProductFields {
            name: "Lamp".to_string(),
            description: "Brass desk lamp".to_string(),
            price: "49.90".to_string(),
        });
        form.add_images([image("lamp.png")]);
        form
    }

    #[test]
    fn test_empty_name_is_rejected_first() {
        let form = ProductForm::default();
        assert_eq!(form.validate(), Err(ValidationError::NameRequired));
        assert_eq!(
            ValidationError::NameRequired.to_string(),
            "Product name is required"
        );
    }

    #[test]
    fn test_payload_name_is_trimmed() {
        let mut form = filled();
        form.set_fields(ProductFields {
            name: "  Lamp \n".to_string(),
            description: "Brass desk lamp".to_string(),
            price: "49.90".to_string(),
        });
        let payload = form.validate().unwrap();
        assert_eq!(payload.name, "Lamp");
        assert_eq!(payload.description, "Brass desk lamp");
    }

    #[test]
    fn test_whitespace_description_is_rejected() {
        let mut form = filled();
        form.set_fields(ProductFields {
            name: "Lamp".to_string(),
            description: "   ".to_string(),
            price: "1".to_string(),
        });
        assert_eq!(form.validate(), Err(ValidationError::DescriptionRequired));
    }

    #[test]
    fn test_bad_prices_are_rejected() {
        for price in ["0", "-3", "abc", ""] {
            let mut form = filled();
            form.set_fields(ProductFields {
                name: "Lamp".to_string(),
                description: "Desk lamp".to_string(),
                price: price.to_string(),
            });
            assert_eq!(
                form.validate(),
                Err(ValidationError::InvalidPrice),
                "price {price:?}"
            );
        }
        assert_eq!(
            ValidationError::InvalidPrice.to_string(),
            "Price must be greater than 0"
        );
    }

    #[test]
    fn test_missing_images_are_rejected() {
        let mut form = filled();
        assert!(form.remove_image(0));
        assert_eq!(form.validate(), Err(ValidationError::ImageRequired));
        assert_eq!(
            ValidationError::ImageRequired.to_string(),
            "At least one image is required"
        );
    }

    #[test]
    fn test_image_selection_is_additive() {
        let mut form = filled();
        let added = form.add_images([image("b.png"), image("c.png")]);
        assert_eq!(added, 2);
        let names: Vec<_> = form.images().iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["lamp.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_remove_image_keeps_file_and_preview_aligned() {
        let mut form = filled();
        form.add_images([image("b.png"), image("c.png")]);
        assert!(form.remove_image(1));
        let names: Vec<_> = form.images().iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["lamp.png", "c.png"]);
        assert!(!form.remove_image(7));
    }

    #[test]
    fn test_submit_locks_form_and_builds_payload() {
        let mut form = filled();
        let upload = UploadId::new();
        let payload = form.submit(upload).unwrap();

        assert_eq!(payload.name, "Lamp");
        assert_eq!(payload.price.to_string(), "49.90");
        assert_eq!(payload.images.len(), 1);
        assert_eq!(payload.images[0].data, vec![1, 2, 3, 4]);
        assert!(form.is_locked());

        // Inputs are disabled while submitting.
        form.set_fields(ProductFields::default());
        assert_eq!(form.add_images([image("late.png")]), 0);
        assert!(!form.remove_image(0));
        assert_eq!(form.name(), "Lamp");
        assert_eq!(form.submit(UploadId::new()), Err(ValidationError::InProgress));
    }

    #[test]
    fn test_rejected_submit_records_message_and_keeps_data() {
        let mut form = filled();
        form.set_fields(ProductFields {
            name: String::new(),
            description: "Desk lamp".to_string(),
            price: "3".to_string(),
        });
        assert!(form.submit(UploadId::new()).is_err());
        assert_eq!(form.images().len(), 1);
        let message = form.acknowledge().unwrap();
        assert_eq!(message.text, "Product name is required");
    }

    #[test]
    fn test_success_clears_everything() {
        let mut form = filled();
        let upload = UploadId::new();
        form.submit(upload).unwrap();

        assert!(form.finish(upload, Ok(())));
        assert_eq!(form.name(), "");
        assert_eq!(form.price(), "");
        assert!(form.images().is_empty());
        assert_eq!(form.acknowledge().unwrap().text, SUCCESS_MESSAGE);
        assert_eq!(form.state(), &FormState::Idle);
    }

    #[test]
    fn test_failure_keeps_data_for_retry() {
        let mut form = filled();
        let upload = UploadId::new();
        form.submit(upload).unwrap();

        assert!(form.finish(upload, Err("Product already exists")));
        assert_eq!(form.name(), "Lamp");
        assert_eq!(form.images().len(), 1);
        assert!(!form.is_locked());
        assert_eq!(form.acknowledge().unwrap().text, "Product already exists");
    }

    #[test]
    fn test_blank_failure_uses_fallback() {
        let mut form = filled();
        let upload = UploadId::new();
        form.submit(upload).unwrap();
        form.finish(upload, Err(""));
        assert_eq!(form.acknowledge().unwrap().text, FAILURE_FALLBACK);
    }

    #[test]
    fn test_stale_upload_result_is_ignored() {
        let mut form = filled();
        let upload = UploadId::new();
        form.submit(upload).unwrap();

        assert!(!form.finish(UploadId::new(), Ok(())));
        assert!(form.is_locked());
        assert_eq!(form.name(), "Lamp");
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("".parse::<ProductAction>(), Ok(ProductAction::Stage));
        assert_eq!("submit".parse::<ProductAction>(), Ok(ProductAction::Submit));
        assert_eq!(
            "remove:2".parse::<ProductAction>(),
            Ok(ProductAction::RemoveImage(2))
        );
        assert!("remove:x".parse::<ProductAction>().is_err());
        assert!("explode".parse::<ProductAction>().is_err());
    }
}
