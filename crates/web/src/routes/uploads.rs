//! Upload status handlers.
//!
//! The status page is where an upload's result is applied to the form that
//! started it. A success is confirmed here before moving on to the listing;
//! a failure or cancellation sends the visitor back to the form, which shows
//! the message and keeps the entered data.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{
        IntoResponse, Redirect, Response, Sse,
        sse::{Event, KeepAlive},
    },
};
use catalog_core::UploadId;
use futures::Stream;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::forms::{bulk, product};
use crate::models::session;
use crate::state::AppState;
use crate::uploads::{UploadKind, UploadStatus};

/// Message recorded when an upload is no longer tracked.
pub const EXPIRED_MESSAGE: &str = "Upload status is no longer available, please try again";

/// Where a successful upload leads.
const LISTING_PATH: &str = "/products";

/// Upload progress page template.
#[derive(Template, WebTemplate)]
#[template(path = "uploads/show.html")]
pub struct UploadProgressTemplate {
    pub id: String,
    pub title: &'static str,
    pub percent: u8,
    pub form_path: &'static str,
}

/// Upload success page template.
#[derive(Template, WebTemplate)]
#[template(path = "uploads/done.html")]
pub struct UploadDoneTemplate {
    pub message: String,
    pub redirect_to: &'static str,
    pub redirect_delay_ms: u128,
    pub redirect_secs: u64,
}

const fn title(kind: UploadKind) -> &'static str {
    match kind {
        UploadKind::Product => "Uploading product",
        UploadKind::Bulk => "Uploading products",
    }
}

fn parse_id(id: &str) -> Result<UploadId> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("upload {id}")))
}

/// Apply a terminal result to the draft waiting on it.
///
/// Returns the success message to show, if the draft had one.
async fn apply_outcome(
    session: &Session,
    kind: UploadKind,
    id: UploadId,
    outcome: std::result::Result<(), &str>,
) -> Result<Option<String>> {
    let message = match kind {
        UploadKind::Product => {
            let mut form = session::load_product_form(session).await;
            if !form.finish(id, outcome) {
                return Ok(None);
            }
            let message = if outcome.is_ok() {
                form.acknowledge().map(|message| message.text)
            } else {
                None
            };
            session::save_product_form(session, &form).await?;
            message
        }
        UploadKind::Bulk => {
            let mut form = session::load_bulk_form(session).await;
            if !form.finish(id, outcome) {
                return Ok(None);
            }
            let message = if outcome.is_ok() {
                form.acknowledge().map(|message| message.text)
            } else {
                None
            };
            session::save_bulk_form(session, &form).await?;
            message
        }
    };
    Ok(message)
}

/// Unlock whichever draft is still waiting on an upload that is gone.
async fn release_expired(session: &Session, id: UploadId) -> Result<Option<UploadKind>> {
    let mut product_form = session::load_product_form(session).await;
    if product_form.finish(id, Err(EXPIRED_MESSAGE)) {
        session::save_product_form(session, &product_form).await?;
        return Ok(Some(UploadKind::Product));
    }

    let mut bulk_form = session::load_bulk_form(session).await;
    if bulk_form.finish(id, Err(EXPIRED_MESSAGE)) {
        session::save_bulk_form(session, &bulk_form).await?;
        return Ok(Some(UploadKind::Bulk));
    }

    Ok(None)
}

/// Show an upload's progress, or apply its result once finished.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&id)?;

    let Some((kind, status)) = state.uploads().status(id).await else {
        return match release_expired(&session, id).await? {
            Some(kind) => {
                tracing::warn!(upload_id = %id, %kind, "Upload expired before its result was seen");
                Ok(Redirect::to(kind.form_path()).into_response())
            }
            None => Err(AppError::NotFound(format!("upload {id}"))),
        };
    };

    match status.outcome() {
        None => Ok(UploadProgressTemplate {
            id: id.to_string(),
            title: title(kind),
            percent: status.percent(),
            form_path: kind.form_path(),
        }
        .into_response()),
        Some(Ok(())) => {
            let message = apply_outcome(&session, kind, id, Ok(()))
                .await?
                .unwrap_or_else(|| match kind {
                    UploadKind::Product => product::SUCCESS_MESSAGE.to_string(),
                    UploadKind::Bulk => bulk::SUCCESS_MESSAGE.to_string(),
                });
            let delay = state.config().redirect_delay;

            Ok(UploadDoneTemplate {
                message,
                redirect_to: LISTING_PATH,
                redirect_delay_ms: delay.as_millis(),
                redirect_secs: delay.as_secs() + u64::from(delay.subsec_nanos() > 0),
            }
            .into_response())
        }
        Some(Err(message)) => {
            apply_outcome(&session, kind, id, Err(message)).await?;
            Ok(Redirect::to(kind.form_path()).into_response())
        }
    }
}

fn status_event(status: &UploadStatus) -> Event {
    let json = serde_json::to_string(status)
        .unwrap_or_else(|_| r#"{"status":"failed","message":"Failed to serialize status"}"#.to_string());
    Event::default().event("status").data(json)
}

/// Stream an upload's status as server-sent events.
///
/// Sends the current status at once, then every change, and ends after the
/// first terminal status.
#[instrument(skip(state))]
pub async fn events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let id = parse_id(&id)?;
    let mut updates = state
        .uploads()
        .subscribe(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("upload {id}")))?;

    let stream = async_stream::stream! {
        loop {
            let status = updates.borrow_and_update().clone();
            let terminal = status.is_terminal();
            yield Ok::<_, Infallible>(status_event(&status));
            if terminal || updates.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Cancel an upload and show its status page.
#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect> {
    let id = parse_id(&id)?;
    if !state.uploads().cancel(id).await {
        tracing::debug!(upload_id = %id, "Nothing to cancel");
    }
    Ok(Redirect::to(&format!("/uploads/{id}")))
}
