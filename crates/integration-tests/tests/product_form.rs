//! Single-product form: validation, staging, and the upload lifecycle.

#![allow(clippy::unwrap_used)]

use catalog_integration_tests::{
    REJECTED_MESSAGE, REJECTED_NAME, SLOW_NAME, TestContext, UploadOutcome, location, png,
    pending_upload_id, product_form,
};
use reqwest::StatusCode;
use reqwest::multipart::Part;

const FORM: &str = "/products/new";

/// Submit the form and return the upload it now waits on.
async fn submit(ctx: &TestContext, name: &str) -> String {
    let form = product_form(name, "Brass desk lamp", "24.50", "submit").part("images", png("lamp.png"));
    let resp = ctx.post_form(FORM, form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some(FORM));

    let body = ctx.get_text(FORM).await;
    assert!(body.contains("<fieldset disabled>"));
    pending_upload_id(&body).expect("form should be waiting on an upload")
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_blank_form_shows_name_required() {
    let ctx = TestContext::new().await;

    let resp = ctx.post_form(FORM, product_form("", "", "", "submit")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = ctx.get_text(FORM).await;
    assert!(body.contains("Product name is required"));
    assert!(ctx.backend.created().is_empty());
}

#[tokio::test]
async fn test_invalid_price_is_rejected_and_fields_kept() {
    let ctx = TestContext::new().await;

    for price in ["0", "-3", "abc"] {
        let form = product_form("Lamp", "Brass", price, "submit").part("images", png("a.png"));
        ctx.post_form(FORM, form).await;

        let body = ctx.get_text(FORM).await;
        assert!(body.contains("Price must be greater than 0"), "price {price}");
        assert!(body.contains(r#"value="Lamp""#));
    }
    assert!(ctx.backend.created().is_empty());
}

#[tokio::test]
async fn test_missing_image_is_rejected() {
    let ctx = TestContext::new().await;

    ctx.post_form(FORM, product_form("Lamp", "Brass", "5", "submit")).await;

    let body = ctx.get_text(FORM).await;
    assert!(body.contains("At least one image is required"));
    assert!(ctx.backend.created().is_empty());
}

#[tokio::test]
async fn test_validation_message_is_shown_once() {
    let ctx = TestContext::new().await;

    ctx.post_form(FORM, product_form("", "", "", "submit")).await;

    assert!(ctx.get_text(FORM).await.contains("Product name is required"));
    assert!(!ctx.get_text(FORM).await.contains("Product name is required"));
}

// =============================================================================
// Staging
// =============================================================================

#[tokio::test]
async fn test_staged_images_can_be_removed() {
    let ctx = TestContext::new().await;

    let form = product_form("Lamp", "", "", "stage")
        .part("images", png("a.png"))
        .part("images", png("b.png"));
    ctx.post_form(FORM, form).await;

    let body = ctx.get_text(FORM).await;
    assert!(body.contains(r#"alt="a.png""#));
    assert!(body.contains(r#"alt="b.png""#));
    assert!(body.contains("data:image/png;base64,"));

    ctx.post_form(FORM, product_form("Lamp", "", "", "remove:0")).await;

    let body = ctx.get_text(FORM).await;
    assert!(!body.contains(r#"alt="a.png""#));
    assert!(body.contains(r#"alt="b.png""#));
}

#[tokio::test]
async fn test_non_image_files_are_not_staged() {
    let ctx = TestContext::new().await;

    let notes = Part::bytes(b"hello".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    ctx.post_form(FORM, product_form("Lamp", "", "", "stage").part("images", notes))
        .await;

    assert!(!ctx.get_text(FORM).await.contains("notes.txt"));
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let ctx = TestContext::new().await;

    let resp = ctx.post_form(FORM, product_form("Lamp", "", "", "explode")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Upload Lifecycle
// =============================================================================

#[tokio::test]
async fn test_successful_create_clears_form() {
    let ctx = TestContext::new().await;

    let id = submit(&ctx, "Lamp").await;

    let UploadOutcome::Done(body) = ctx.wait_for_upload(&id).await else {
        panic!("upload should succeed");
    };
    assert!(body.contains("Product added successfully!"));
    assert!(body.contains(r#"data-redirect-to="/products""#));

    let created = ctx.backend.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].metadata["name"], "Lamp");
    assert_eq!(created[0].metadata["description"], "Brass desk lamp");
    assert_eq!(created[0].metadata["price"].as_f64(), Some(24.5));
    assert_eq!(created[0].files, vec!["lamp.png".to_string()]);

    let form = ctx.get_text(FORM).await;
    assert!(pending_upload_id(&form).is_none());
    assert!(form.contains(r#"id="name" name="name" type="text" value="""#));
    assert!(!form.contains("lamp.png"));
}

#[tokio::test]
async fn test_events_stream_reports_terminal_status() {
    let ctx = TestContext::new().await;

    let id = submit(&ctx, "Lamp").await;

    let resp = ctx.get(&format!("/uploads/{id}/events")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("event: status"));
    assert!(body.contains(r#""status":"succeeded""#));
}

#[tokio::test]
async fn test_backend_rejection_returns_to_form_with_message() {
    let ctx = TestContext::new().await;

    let id = submit(&ctx, REJECTED_NAME).await;

    let UploadOutcome::Redirected(target) = ctx.wait_for_upload(&id).await else {
        panic!("upload should fail");
    };
    assert_eq!(target, FORM);

    let body = ctx.get_text(FORM).await;
    assert!(body.contains(REJECTED_MESSAGE));
    assert!(body.contains(&format!(r#"value="{REJECTED_NAME}""#)));
    assert!(body.contains(r#"alt="lamp.png""#));
    assert!(pending_upload_id(&body).is_none());
}

#[tokio::test]
async fn test_cancel_unlocks_form() {
    let ctx = TestContext::new().await;

    let id = submit(&ctx, SLOW_NAME).await;

    let resp = ctx.post_empty(&format!("/uploads/{id}/cancel")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some(format!("/uploads/{id}")));

    let UploadOutcome::Redirected(target) = ctx.wait_for_upload(&id).await else {
        panic!("cancelled upload should return to the form");
    };
    assert_eq!(target, FORM);

    let body = ctx.get_text(FORM).await;
    assert!(body.contains("Upload cancelled"));
    assert!(body.contains(&format!(r#"value="{SLOW_NAME}""#)));
    assert!(ctx.backend.created().is_empty());
}

#[tokio::test]
async fn test_locked_form_ignores_posts() {
    let ctx = TestContext::new().await;

    let id = submit(&ctx, SLOW_NAME).await;

    let form = product_form("Other", "Other", "1", "submit").part("images", png("o.png"));
    let resp = ctx.post_form(FORM, form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = ctx.get_text(FORM).await;
    assert_eq!(pending_upload_id(&body), Some(id.clone()));
    assert!(body.contains(&format!(r#"value="{SLOW_NAME}""#)));

    ctx.post_empty(&format!("/uploads/{id}/cancel")).await;
}

#[tokio::test]
async fn test_unknown_upload_is_not_found() {
    let ctx = TestContext::new().await;

    let resp = ctx.get(&format!("/uploads/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx.get("/uploads/not-a-uuid").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
