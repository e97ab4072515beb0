//! Multipart file uploads, read whole or as named upload files.

use axum::{
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiResult;
use crate::extract::MultipartForm;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(main_page))
        .route("/file/", post(create_file))
        .route("/uploadfile/", post(create_upload_file))
        .route("/files/", post(create_files))
        .route("/uploadfiles/", post(create_upload_files))
}

pub async fn create_file(form: MultipartForm) -> ApiResult<Json<Value>> {
    let file = form.required_file("file")?;
    debug!(size = file.data.len(), "File received");
    Ok(Json(json!({ "file_size": file.data.len() })))
}

pub async fn create_upload_file(form: MultipartForm) -> ApiResult<Json<Value>> {
    let file = form.required_file("file")?;
    Ok(Json(json!({ "filename": file.filename })))
}

pub async fn create_files(form: MultipartForm) -> ApiResult<Json<Value>> {
    let sizes: Vec<usize> = form
        .required_files("files")?
        .iter()
        .map(|file| file.data.len())
        .collect();
    Ok(Json(json!({ "file_sizes": sizes })))
}

pub async fn create_upload_files(form: MultipartForm) -> ApiResult<Json<Value>> {
    let names: Vec<Option<String>> = form
        .required_files("files")?
        .iter()
        .map(|file| file.filename.clone())
        .collect();
    Ok(Json(json!({ "filenames": names })))
}

const UPLOAD_PAGE: &str = r#"<body>
<form action="/files/files/" enctype="multipart/form-data" method="post">
<input name="files" type="file" multiple>
<input type="submit">
</form>
<form action="/files/uploadfiles/" enctype="multipart/form-data" method="post">
<input name="files" type="file" multiple>
<input type="submit">
</form>
</body>
"#;

pub async fn main_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}
