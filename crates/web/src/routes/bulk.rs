//! Bulk-upload form handlers.
//!
//! Row inputs are named after the row ID (`name_{row}`, `description_{row}`,
//! `price_{row}`, `file_{row}`) so edits stay attached to their row while rows
//! are added and removed.

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
use crate::forms::{BulkAction, BulkForm, BulkRow, FormFields, RowEdit, read_form_fields};
use crate::models::session;
use crate::state::AppState;
use crate::uploads::UploadKind;

/// Path of the form page.
pub const FORM_PATH: &str = "/bulk-upload";

/// One row of the bulk form.
#[derive(Clone)]
pub struct BulkRowView {
    pub id: String,
    pub number: usize,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_name: Option<String>,
    pub preview: Option<String>,
}

impl BulkRowView {
    fn new(number: usize, row: &BulkRow) -> Self {
        Self {
            id: row.id.to_string(),
            number,
            name: row.name.clone(),
            description: row.description.clone(),
            price: row.price.clone(),
            image_name: row.image.as_ref().map(|image| image.file_name.clone()),
            preview: row.image.as_ref().map(|image| image.data_url.clone()),
        }
    }
}

/// Bulk-upload form template.
#[derive(Template, WebTemplate)]
#[template(path = "bulk/index.html")]
pub struct BulkUploadTemplate {
    pub rows: Vec<BulkRowView>,
    pub ready_count: usize,
    pub message: Option<MessageView>,
    pub upload: Option<UploadView>,
}

impl BulkUploadTemplate {
    fn new(form: &BulkForm, message: Option<MessageView>, upload: Option<UploadView>) -> Self {
        Self {
            rows: form
                .rows()
                .iter()
                .enumerate()
                .map(|(index, row)| BulkRowView::new(index + 1, row))
                .collect(),
            ready_count: form.rows().iter().filter(|row| row.is_complete()).count(),
            message,
            upload,
        }
    }
}

/// Display the bulk form.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<BulkUploadTemplate> {
    let mut form = session::load_bulk_form(&session).await;

    let message = form.acknowledge().map(MessageView::from);
    if message.is_some() {
        session::save_bulk_form(&session, &form).await?;
    }

    let upload = match form.state().pending_upload() {
        Some(id) => Some(UploadView::load(&state, id).await),
        None => None,
    };

    Ok(BulkUploadTemplate::new(&form, message, upload))
}

/// Apply submitted row inputs to the draft.
///
/// Rows whose inputs were not submitted are left as they are.
fn apply_rows(form: &mut BulkForm, fields: &mut FormFields) {
    let ids: Vec<_> = form.rows().iter().map(|row| row.id).collect();
    for id in ids {
        if let Some(name) = fields.get(&format!("name_{id}")) {
            let edit = RowEdit {
                name: name.to_string(),
                description: fields.text(&format!("description_{id}")).to_string(),
                price: fields.text(&format!("price_{id}")).to_string(),
            };
            form.update_row(id, edit);
        }
        if let Some(file) = fields.take_file(&format!("file_{id}")) {
            form.set_row_image(id, Some(file));
        }
    }
}

/// Handle a bulk form post.
#[instrument(skip(state, session, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let mut fields = read_form_fields(multipart).await?;
    let action: BulkAction = fields.text("action").parse().map_err(AppError::BadRequest)?;

    let mut form = session::load_bulk_form(&session).await;
    if form.is_locked() {
        tracing::debug!("Ignoring post to a locked bulk form");
        return Ok(Redirect::to(FORM_PATH).into_response());
    }

    apply_rows(&mut form, &mut fields);

    match action {
        BulkAction::Stage => {}
        BulkAction::AddRow => {
            form.add_row();
        }
        BulkAction::RemoveRow(id) => {
            form.remove_row(id);
        }
        BulkAction::ClearImage(id) => {
            form.set_row_image(id, None);
        }
        BulkAction::Upload => {
            let upload = UploadId::new();
            match form.submit(upload) {
                Ok(payload) => {
                    let count = payload.len();
                    let products = state.products().clone();
                    state
                        .uploads()
                        .start(upload, UploadKind::Bulk, move |progress| async move {
                            products
                                .bulk_upload(&payload, move |percent| progress.report(percent))
                                .await
                                .map(|()| None)
                        })
                        .await;

                    add_breadcrumb(
                        "upload",
                        "Bulk upload submitted",
                        Some(&[
                            ("upload_id", upload.to_string().as_str()),
                            ("products", count.to_string().as_str()),
                        ]),
                    );
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Bulk form rejected");
                }
            }
        }
    }

    session::save_bulk_form(&session, &form).await?;
    Ok(Redirect::to(FORM_PATH).into_response())
}
