//! Typed path parameters: integers, fixed paths before dynamic ones,
//! enumerated values and catch-all file paths.

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::error::{ApiResult, Loc};
use crate::extract::PathParam;
use crate::validation::{check_enum, coerce_str, parse_param, path_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/:item_id", get(read_item))
        .route("/users/me", get(read_user_me))
        .route("/users/:user_id", get(read_user))
        .route("/models/:model_name", get(get_model))
        .route("/files/*file_path", get(read_file))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelName {
    Alexnet,
    Resnet,
    Lenet,
}

impl ModelName {
    pub const ALL: [&'static str; 3] = ["alexnet", "resnet", "lenet"];

    pub fn parse(raw: &str) -> ApiResult<Self> {
        let loc = Loc::root("path").key("model_name");
        let name = parse_param(raw, &loc, |v| coerce_str(v).and_then(|s| {
            check_enum(&s, &Self::ALL).map(str::to_string)
        }))?;
        Ok(match name.as_str() {
            "alexnet" => ModelName::Alexnet,
            "resnet" => ModelName::Resnet,
            _ => ModelName::Lenet,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Alexnet => "alexnet",
            ModelName::Resnet => "resnet",
            ModelName::Lenet => "lenet",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ModelName::Alexnet => "Deep Learning FTW!",
            ModelName::Lenet => "LeCNN all the images",
            ModelName::Resnet => "Have some residuals",
        }
    }
}

#[utoipa::path(
    get,
    path = "/path-params/items/{item_id}",
    tag = "path-params",
    params(("item_id" = i64, Path, description = "Integer item id")),
    responses(
        (status = 200, description = "The parsed id"),
        (status = 422, description = "Id is not an integer")
    )
)]
pub async fn read_item(PathParam(item_id): PathParam<String>) -> ApiResult<Json<Value>> {
    let item_id = path_i64("item_id", &item_id)?;
    Ok(Json(json!({ "item_id": item_id })))
}

#[utoipa::path(
    get,
    path = "/path-params/users/me",
    tag = "path-params",
    responses((status = 200, description = "The current user"))
)]
pub async fn read_user_me() -> Json<Value> {
    Json(json!({ "user_id": "the current user" }))
}

pub async fn read_user(PathParam(user_id): PathParam<String>) -> Json<Value> {
    Json(json!({ "user_id": user_id }))
}

#[utoipa::path(
    get,
    path = "/path-params/models/{model_name}",
    tag = "path-params",
    params(("model_name" = String, Path, description = "One of alexnet, resnet, lenet")),
    responses(
        (status = 200, description = "Model and its motto"),
        (status = 422, description = "Unknown model")
    )
)]
pub async fn get_model(PathParam(model_name): PathParam<String>) -> ApiResult<Json<Value>> {
    let model = ModelName::parse(&model_name)?;
    Ok(Json(json!({
        "model_name": model.as_str(),
        "message": model.message(),
    })))
}

pub async fn read_file(PathParam(file_path): PathParam<String>) -> Json<Value> {
    Json(json!({ "file_path": file_path }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names() {
        assert_eq!(ModelName::parse("lenet").unwrap(), ModelName::Lenet);
        assert_eq!(ModelName::Resnet.message(), "Have some residuals");
        assert!(ModelName::parse("vgg").is_err());
    }
}
