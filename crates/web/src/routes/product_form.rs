//! Single-product creation form handlers.
//!
//! The draft lives in the session. Every POST carries the whole form: text
//! fields are saved, newly chosen images are appended, and then the requested
//! action runs. Submitting hands the payload to the upload tracker and locks
//! the draft until the upload's result is applied.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use catalog_core::UploadId;
use tower_sessions::Session;
use tracing::instrument;

use super::{MessageView, UploadView};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::forms::{ProductAction, ProductFields, ProductForm, read_form_fields};
use crate::models::session;
use crate::state::AppState;
use crate::uploads::UploadKind;

/// Path of the form page.
pub const FORM_PATH: &str = "/products/new";

/// A staged image with its preview.
#[derive(Clone)]
pub struct ImagePreviewView {
    pub index: usize,
    pub file_name: String,
    pub data_url: String,
}

/// New product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/new.html")]
pub struct NewProductTemplate {
    pub name: String,
    pub description: String,
    pub price: String,
    pub images: Vec<ImagePreviewView>,
    pub message: Option<MessageView>,
    pub upload: Option<UploadView>,
}

impl NewProductTemplate {
    fn new(form: &ProductForm, message: Option<MessageView>, upload: Option<UploadView>) -> Self {
        Self {
            name: form.name().to_string(),
            description: form.description().to_string(),
            price: form.price().to_string(),
            images: form
                .images()
                .iter()
                .enumerate()
                .map(|(index, image)| ImagePreviewView {
                    index,
                    file_name: image.file_name.clone(),
                    data_url: image.data_url.clone(),
                })
                .collect(),
            message,
            upload,
        }
    }
}

/// Display the form.
///
/// A pending success or error message is shown once.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<NewProductTemplate> {
    let mut form = session::load_product_form(&session).await;

    let message = form.acknowledge().map(MessageView::from);
    if message.is_some() {
        session::save_product_form(&session, &form).await?;
    }

    let upload = match form.state().pending_upload() {
        Some(id) => Some(UploadView::load(&state, id).await),
        None => None,
    };

    Ok(NewProductTemplate::new(&form, message, upload))
}

/// Handle a form post.
#[instrument(skip(state, session, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let mut fields = read_form_fields(multipart).await?;
    let action: ProductAction = fields.text("action").parse().map_err(AppError::BadRequest)?;

    let mut form = session::load_product_form(&session).await;
    if form.is_locked() {
        tracing::debug!("Ignoring post to a locked product form");
        return Ok(Redirect::to(FORM_PATH).into_response());
    }

    form.set_fields(ProductFields {
        name: fields.text("name").to_string(),
        description: fields.text("description").to_string(),
        price: fields.text("price").to_string(),
    });
    let staged = form.add_images(fields.take_files("images"));
    if staged > 0 {
        tracing::debug!(staged, "Staged product images");
    }

    match action {
        ProductAction::Stage => {}
        ProductAction::RemoveImage(index) => {
            form.remove_image(index);
        }
        ProductAction::Submit => {
            let upload = UploadId::new();
            match form.submit(upload) {
                Ok(payload) => {
                    let products = state.products().clone();
                    state
                        .uploads()
                        .start(upload, UploadKind::Product, move |progress| async move {
                            products
                                .create_product(&payload, move |percent| progress.report(percent))
                                .await
                                .map(|product| Some(product.id))
                        })
                        .await;

                    add_breadcrumb(
                        "upload",
                        "Product submitted",
                        Some(&[("upload_id", upload.to_string().as_str())]),
                    );
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Product form rejected");
                }
            }
        }
    }

    session::save_product_form(&session, &form).await?;
    Ok(Redirect::to(FORM_PATH).into_response())
}
