use axum::{response::Json, routing::post, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::MultipartForm;
use crate::validation::{all3, coerce_str};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/files/", post(create_file))
}

/// Two files and a text field in one multipart form.
pub async fn create_file(form: MultipartForm) -> ApiResult<Json<Value>> {
    let (file, fileb, token) = all3(
        form.required_file("file"),
        form.required_file("fileb"),
        form.fields().required("token", coerce_str),
    )?;

    Ok(Json(json!({
        "file_size": file.data.len(),
        "token": token,
        "fileb_content_type": fileb.content_type,
    })))
}
