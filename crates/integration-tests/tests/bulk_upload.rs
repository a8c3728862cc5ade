//! Bulk-upload form: rows, exclusion of incomplete rows, and the upload.

#![allow(clippy::unwrap_used)]

use catalog_integration_tests::{TestContext, UploadOutcome, bulk_row_ids, location, pending_upload_id, png};
use reqwest::StatusCode;
use reqwest::multipart::Form;

const FORM: &str = "/bulk-upload";

fn row(form: Form, id: &str, name: &str, description: &str, price: &str) -> Form {
    form.text(format!("name_{id}"), name.to_string())
        .text(format!("description_{id}"), description.to_string())
        .text(format!("price_{id}"), price.to_string())
}

/// Add a row and return the IDs of every row, in order.
async fn add_row(ctx: &TestContext) -> Vec<String> {
    let resp = ctx
        .post_form(FORM, Form::new().text("action", "add-row"))
        .await;
    assert_eq!(location(&resp).as_deref(), Some(FORM));
    bulk_row_ids(&ctx.get_text(FORM).await)
}

#[tokio::test]
async fn test_form_starts_with_one_empty_row() {
    let ctx = TestContext::new().await;

    let body = ctx.get_text(FORM).await;
    assert_eq!(bulk_row_ids(&body).len(), 1);
    assert!(body.contains("Upload 0 product(s)"));
}

#[tokio::test]
async fn test_rows_can_be_added_and_removed() {
    let ctx = TestContext::new().await;

    let rows = add_row(&ctx).await;
    assert_eq!(rows.len(), 2);

    let remove = Form::new().text("action", format!("remove-row:{}", rows[0]));
    ctx.post_form(FORM, remove).await;

    let remaining = bulk_row_ids(&ctx.get_text(FORM).await);
    assert_eq!(remaining, vec![rows[1].clone()]);
}

#[tokio::test]
async fn test_all_rows_can_be_removed() {
    let ctx = TestContext::new().await;

    let rows = bulk_row_ids(&ctx.get_text(FORM).await);
    let form = row(Form::new(), &rows[0], "Mug", "", "").text("action", format!("remove-row:{}", rows[0]));
    ctx.post_form(FORM, form).await;

    let body = ctx.get_text(FORM).await;
    assert!(bulk_row_ids(&body).is_empty());
    assert!(!body.contains(r#"value="Mug""#));

    ctx.post_form(FORM, Form::new().text("action", "upload")).await;
    let body = ctx.get_text(FORM).await;
    assert!(body.contains("Add at least one product with image before uploading."));
    assert!(ctx.backend.bulk_uploads().is_empty());

    assert_eq!(add_row(&ctx).await.len(), 1);
}

#[tokio::test]
async fn test_upload_without_complete_rows_makes_no_request() {
    let ctx = TestContext::new().await;

    let rows = bulk_row_ids(&ctx.get_text(FORM).await);
    let form = row(Form::new(), &rows[0], "Mug", "Ceramic", "8").text("action", "upload");
    ctx.post_form(FORM, form).await;

    let body = ctx.get_text(FORM).await;
    assert!(body.contains("Add at least one product with image before uploading."));
    assert!(body.contains(r#"value="Mug""#));
    assert!(pending_upload_id(&body).is_none());
    assert!(ctx.backend.bulk_uploads().is_empty());
}

#[tokio::test]
async fn test_upload_sends_only_complete_rows() {
    let ctx = TestContext::new().await;

    let rows = add_row(&ctx).await;
    let rows = {
        let mut form = Form::new().text("action", "add-row");
        form = row(form, &rows[0], "Mug", "Ceramic", "8.50").part(format!("file_{}", rows[0]), png("mug.png"));
        form = row(form, &rows[1], "Bowl", "No image", "4");
        ctx.post_form(FORM, form).await;
        bulk_row_ids(&ctx.get_text(FORM).await)
    };
    assert_eq!(rows.len(), 3);

    // Third row has an image but no name.
    let form = row(Form::new(), &rows[2], "", "", "").part(format!("file_{}", rows[2]), png("nameless.png"));
    ctx.post_form(FORM, form.text("action", "stage")).await;
    assert!(ctx.get_text(FORM).await.contains("Upload 1 product(s)"));

    ctx.post_form(FORM, Form::new().text("action", "upload")).await;
    let id = pending_upload_id(&ctx.get_text(FORM).await).expect("bulk form should be uploading");

    let UploadOutcome::Done(body) = ctx.wait_for_upload(&id).await else {
        panic!("bulk upload should succeed");
    };
    assert!(body.contains("Bulk upload successful"));

    let uploads = ctx.backend.bulk_uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(
        uploads[0].metadata,
        serde_json::json!([{ "name": "Mug", "description": "Ceramic", "price": 8.5 }])
    );
    assert_eq!(uploads[0].files, vec!["mug.png".to_string()]);

    let form = ctx.get_text(FORM).await;
    assert_eq!(bulk_row_ids(&form).len(), 1);
    assert!(!form.contains(r#"value="Mug""#));
}

#[tokio::test]
async fn test_cleared_image_excludes_row() {
    let ctx = TestContext::new().await;

    let rows = bulk_row_ids(&ctx.get_text(FORM).await);
    let form = row(Form::new(), &rows[0], "Mug", "", "3")
        .part(format!("file_{}", rows[0]), png("mug.png"))
        .text("action", "stage");
    ctx.post_form(FORM, form).await;
    assert!(ctx.get_text(FORM).await.contains("Upload 1 product(s)"));

    let clear = Form::new().text("action", format!("clear-image:{}", rows[0]));
    ctx.post_form(FORM, clear).await;

    let body = ctx.get_text(FORM).await;
    assert!(body.contains("Upload 0 product(s)"));
    assert!(body.contains(&format!(r#"name="file_{}""#, rows[0])));
}

#[tokio::test]
async fn test_malformed_row_action_is_bad_request() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post_form(FORM, Form::new().text("action", "remove-row:nope"))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
