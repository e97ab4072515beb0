mod common;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::spawn_app;

async fn body(resp: reqwest::Response) -> Value {
    resp.json().await.unwrap()
}

// =============================================================================
// First steps, path and query parameters
// =============================================================================

#[tokio::test]
async fn test_hello_world() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await, json!({ "message": "Hello World" }));
}

#[tokio::test]
async fn test_path_params() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/path-params/items/3")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "item_id": 3 }));

    let resp = app.client.get(app.url("/path-params/users/me")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "user_id": "the current user" }));

    let resp = app.client.get(app.url("/path-params/users/alice")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "user_id": "alice" }));

    let resp = app
        .client
        .get(app.url("/path-params/files/home/johndoe/myfile.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "file_path": "home/johndoe/myfile.txt" }));
}

#[tokio::test]
async fn test_path_param_type_error() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/path-params/items/foo")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await,
        json!({
            "detail": [{
                "loc": ["path", "item_id"],
                "msg": "value is not a valid integer",
                "type": "type_error.integer"
            }]
        })
    );
}

#[tokio::test]
async fn test_undecodable_path_segment_uses_json_envelope() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/path-params/users/%FF")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers()["content-type"].to_str().unwrap().starts_with("application/json"));
    assert!(body(resp).await["detail"].is_string());
}

#[tokio::test]
async fn test_enum_path_param() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/path-params/models/alexnet")).send().await.unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "model_name": "alexnet", "message": "Deep Learning FTW!" })
    );

    let resp = app.client.get(app.url("/path-params/models/vgg")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["type"], "type_error.enum");
}

#[tokio::test]
async fn test_numeric_validations() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/path-validation/items/5?item-query=x&size=1.5"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "item_id": 5, "q": "x", "size": 1.5 }));

    let resp = app
        .client
        .get(app.url("/path-validation/items/0?size=11"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body(resp).await["detail"].clone();
    assert_eq!(detail.as_array().unwrap().len(), 2);
    assert_eq!(detail[0]["msg"], "ensure this value is greater than or equal to 1");
    assert_eq!(detail[1]["loc"], json!(["query", "size"]));
    assert_eq!(detail[1]["type"], "value_error.number.not_lt");
}

#[tokio::test]
async fn test_query_params() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/query-params/items/?skip=1&limit=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!([{ "item_name": "Bar" }]));

    let resp = app.client.get(app.url("/query-params/items/")).send().await.unwrap();
    assert_eq!(body(resp).await.as_array().unwrap().len(), 3);

    let resp = app
        .client
        .get(app.url("/query-params/items/foo?short=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "item_id": "foo" }));

    let resp = app
        .client
        .get(app.url("/query-params/users/1/items/a?q=x"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({
            "item_id": "a",
            "owner_id": 1,
            "q": "x",
            "description": "This is an amazing item that has a long description"
        })
    );
}

#[tokio::test]
async fn test_negative_skip_is_rejected() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/query-params/items/?skip=-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["loc"], json!(["query", "skip"]));
}

#[tokio::test]
async fn test_required_query_param() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/query-params/needy/foo?needy=sooooneedy"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "item_id": "foo", "needy": "sooooneedy" }));

    let resp = app.client.get(app.url("/query-params/needy/foo")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await["detail"][0],
        json!({ "loc": ["query", "needy"], "msg": "field required", "type": "value_error.missing" })
    );
}

#[tokio::test]
async fn test_query_string_validation() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/query-validation/items/?item-query=fixedquery"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "items": [{ "item_id": "Foo" }, { "item_id": "Bar" }], "q": "fixedquery" })
    );

    let resp = app
        .client
        .get(app.url("/query-validation/items/?item-query=fi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["type"], "value_error.any_str.min_length");

    let resp = app
        .client
        .get(app.url("/query-validation/items/?item-query=notfixed"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await["detail"][0]["type"], "value_error.str.regex");
}

#[tokio::test]
async fn test_list_query_param() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/query-validation/items/multi?q=foo&q=bar&q=baz"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "q": ["foo", "bar", "baz"] }));

    let resp = app
        .client
        .get(app.url("/query-validation/items/multi"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "q": ["foo", "bar"] }));
}

// =============================================================================
// Bodies
// =============================================================================

#[tokio::test]
async fn test_create_item_with_tax() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/body/items/"))
        .json(&json!({ "name": "Foo", "price": 42.0, "tax": 3.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body(resp).await,
        json!({ "name": "Foo", "description": null, "price": 42.0, "tax": 3.5, "price_with_tax": 45.5 })
    );
}

#[tokio::test]
async fn test_body_errors_are_collected() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/body/items/"))
        .json(&json!({ "price": "thirty five" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await,
        json!({
            "detail": [
                { "loc": ["body", "name"], "msg": "field required", "type": "value_error.missing" },
                { "loc": ["body", "price"], "msg": "value is not a valid float", "type": "type_error.float" }
            ]
        })
    );
}

#[tokio::test]
async fn test_malformed_json() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/body/items/"))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["type"], "value_error.jsondecode");
}

#[tokio::test]
async fn test_oversized_body_keeps_payload_too_large_status() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/body/items/"))
        .json(&json!({ "name": "a".repeat(2 * 1024 * 1024 + 1024), "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body(resp).await["detail"].is_string());
}

#[tokio::test]
async fn test_path_and_body_errors_are_reported_together() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/body/items/abc"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await,
        json!({
            "detail": [
                { "loc": ["path", "item_id"], "msg": "value is not a valid integer", "type": "type_error.integer" },
                { "loc": ["body", "name"], "msg": "field required", "type": "value_error.missing" },
                { "loc": ["body", "price"], "msg": "field required", "type": "value_error.missing" }
            ]
        })
    );

    let resp = app
        .client
        .put(app.url("/body-multiple/items/abc/full"))
        .json(&json!({ "item": { "name": "Foo", "price": 1.0 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body(resp).await["detail"].clone();
    assert_eq!(detail[0]["loc"], json!(["path", "item_id"]));
    assert!(detail.as_array().unwrap().len() > 1);
}

#[tokio::test]
async fn test_body_with_path_and_query() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/body/items/7?q=search"))
        .json(&json!({ "name": "Foo", "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "item_id": 7, "name": "Foo", "description": null, "price": 1.0, "tax": null, "q": "search" })
    );
}

#[tokio::test]
async fn test_multiple_body_params() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/body-multiple/items/5?q=x"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "item_id": 5, "q": "x" }));

    let resp = app
        .client
        .put(app.url("/body-multiple/items/5000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .client
        .put(app.url("/body-multiple/items/5/full"))
        .json(&json!({
            "item": { "name": "Foo", "price": 42.0 },
            "user": { "username": "dave", "full_name": "Dave Grohl" },
            "importance": 5
        }))
        .send()
        .await
        .unwrap();
    let full = body(resp).await;
    assert_eq!(full["importance"], 5);
    assert_eq!(full["user"]["username"], "dave");

    let resp = app
        .client
        .put(app.url("/body-multiple/items/5/full"))
        .json(&json!({
            "item": { "name": "Foo", "price": 42.0 },
            "user": { "username": "dave" },
            "importance": 0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["loc"], json!(["body", "importance"]));

    let resp = app
        .client
        .put(app.url("/body-multiple/items/5/embed"))
        .json(&json!({ "item": { "name": "Foo", "price": 42.0 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await["item"]["name"], "Foo");
}

#[tokio::test]
async fn test_nested_models() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/body-nested/items/1"))
        .json(&json!({
            "name": "Foo",
            "price": 42.0,
            "tags": ["rock", "metal", "rock"],
            "image": { "url": "http://example.com/baz.jpg", "name": "The Foo live" }
        }))
        .send()
        .await
        .unwrap();
    let item = body(resp).await["item"].clone();
    assert_eq!(item["tags"], json!(["metal", "rock"]));
    assert_eq!(item["image"]["name"], "The Foo live");

    let resp = app
        .client
        .put(app.url("/body-nested/items/1"))
        .json(&json!({
            "name": "Foo",
            "price": 42.0,
            "images": [{ "url": "example.com/baz.jpg", "name": "The Baz" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await["detail"][0]["loc"],
        json!(["body", "images", 0, "url"])
    );
}

#[tokio::test]
async fn test_offers_and_image_lists() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/body-nested/offers/"))
        .json(&json!({
            "name": "Deal",
            "price": 10.0,
            "items": [{ "name": "Foo", "price": 1.0 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await["items"][0]["tags"], json!([]));

    let resp = app
        .client
        .post(app.url("/body-nested/images/multiple/"))
        .json(&json!([{ "url": "https://example.com/a.png", "name": "a" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_index_weights() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/body-nested/index-weights/"))
        .json(&json!({ "1": 0.5, "2": 1.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "1": 0.5, "2": 1.5 }));

    let resp = app
        .client
        .post(app.url("/body-nested/index-weights/"))
        .json(&json!({ "one": 0.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await["detail"][0]["loc"],
        json!(["body", "one", "__key__"])
    );
}

#[tokio::test]
async fn test_body_examples_route() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/body-examples/items/1"))
        .json(&json!({ "name": "Bar", "price": "35.4" }))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await["item"]["price"], 35.4);
}

#[tokio::test]
async fn test_read_and_patch_item() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/body-updates/items/foo")).send().await.unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "name": "Foo", "description": null, "price": 50.2, "tax": 10.5, "tags": [] })
    );

    let resp = app
        .client
        .patch(app.url("/body-updates/items/bar"))
        .json(&json!({ "price": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "name": "Bar", "description": "The bartenders", "price": 3.0, "tax": 20.2, "tags": [] })
    );

    let resp = app.client.get(app.url("/body-updates/items/bar")).send().await.unwrap();
    assert_eq!(body(resp).await["price"], 3.0);

    let resp = app
        .client
        .patch(app.url("/body-updates/items/nope"))
        .json(&json!({ "price": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(resp).await, json!({ "detail": "Item not found" }));
}

#[tokio::test]
async fn test_put_replaces_with_defaults() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/body-updates/items/bar"))
        .json(&json!({ "name": "Barz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "name": "Barz", "description": null, "price": null, "tax": 10.5, "tags": [] })
    );

    let stored = app.state.stores.update_items.get("bar").await.unwrap();
    assert_eq!(stored["tax"], 10.5);
}

// =============================================================================
// Extra types and models, response filtering, status codes
// =============================================================================

#[tokio::test]
async fn test_extra_data_types() {
    let app = spawn_app().await;
    let item_id = "0c6f2f8e-3c7b-4a6b-9c7e-1e2b3a4d5f60";

    let resp = app
        .client
        .put(app.url(&format!("/extra-types/items/{item_id}")))
        .json(&json!({
            "start_datetime": "2024-01-01T10:00:00Z",
            "end_datetime": "2024-01-01T12:00:00Z",
            "repeat_at": "14:23:55",
            "process_after": 1800
        }))
        .send()
        .await
        .unwrap();
    let report = body(resp).await;
    assert_eq!(report["item_id"], item_id);
    assert_eq!(report["start_process"], "2024-01-01T10:30:00Z");
    assert_eq!(report["duration"], 5400.0);
    assert_eq!(report["process_after"], 1800.0);

    let resp = app
        .client
        .put(app.url("/extra-types/items/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["type"], "type_error.uuid");
}

#[tokio::test]
async fn test_user_models_never_leak_passwords() {
    let app = spawn_app().await;
    let user = json!({
        "username": "john",
        "password": "secret",
        "email": "john.doe@example.com",
        "full_name": "John Doe"
    });
    let expected = json!({
        "username": "john",
        "email": "john.doe@example.com",
        "full_name": "John Doe"
    });

    for path in ["/extra-models/user/", "/response-model/user/"] {
        let resp = app.client.post(app.url(path)).json(&user).send().await.unwrap();
        assert_eq!(body(resp).await, expected, "{path}");
    }

    let resp = app
        .client
        .post(app.url("/extra-models/user/"))
        .json(&json!({ "username": "john", "password": "secret", "email": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_union_and_dict_responses() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/extra-models/items/item2")).send().await.unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "description": "Music is my aeroplane, it's my aeroplane", "type": "plane", "size": 5 })
    );

    let resp = app.client.get(app.url("/extra-models/items/item9")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .client
        .get(app.url("/extra-models/keyword-weights/"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "foo": 2.3, "bar": 3.4 }));
}

#[tokio::test]
async fn test_response_filtering() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/response-model/items/foo")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "name": "Foo", "price": 50.2 }));

    let resp = app.client.get(app.url("/response-model/items/baz")).send().await.unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "name": "Baz", "description": null, "price": 50.2, "tax": 10.5, "tags": [] })
    );

    let resp = app
        .client
        .get(app.url("/response-model/items/bar/name"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "name": "Bar", "description": "The bartenders" })
    );

    let resp = app
        .client
        .get(app.url("/response-model/items/bar/public"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "name": "Bar", "description": "The bartenders", "price": 62.0, "tags": [] })
    );

    let resp = app.client.get(app.url("/response-model/items/")).send().await.unwrap();
    let items = body(resp).await;
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items[0]["name"], "Portugal Gun");
}

#[tokio::test]
async fn test_portal_redirects() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/response-model/portal")).send().await.unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "message": "Here's your interdimensional portal." })
    );

    for path in ["/response-model/portal?teleport=true", "/response-model/teleport"] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(
            resp.headers()["location"],
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}

#[tokio::test]
async fn test_created_status_codes() {
    let app = spawn_app().await;

    for path in ["/status-codes/item/?name=foo", "/status-codes/items/?name=foo"] {
        let resp = app.client.post(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED, "{path}");
        assert_eq!(body(resp).await, json!({ "name": "foo" }));
    }

    let resp = app
        .client
        .post(app.url("/path-ops/items/"))
        .json(&json!({ "name": "Foo", "price": 1.0, "tags": ["b", "a"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body(resp).await["tags"], json!(["a", "b"]));

    let resp = app.client.get(app.url("/path-ops/users/")).send().await.unwrap();
    assert_eq!(body(resp).await, json!([{ "username": "johndoe" }]));

    let resp = app.client.get(app.url("/path-ops/elements/")).send().await.unwrap();
    assert_eq!(body(resp).await, json!([{ "item_id": "Foo" }]));
}

// =============================================================================
// Forms and files
// =============================================================================

#[tokio::test]
async fn test_login_form() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/forms/login/"))
        .form(&[("username", "johndoe"), ("password", "secret")])
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "username": "johndoe" }));

    let resp = app
        .client
        .post(app.url("/forms/login/"))
        .form(&[("username", "johndoe")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["loc"], json!(["body", "password"]));
}

fn file_part(contents: &'static [u8], name: &'static str) -> Part {
    Part::bytes(contents).file_name(name)
}

#[tokio::test]
async fn test_file_uploads() {
    let app = spawn_app().await;

    let form = Form::new().part("file", file_part(b"hello", "hello.txt"));
    let resp = app.client.post(app.url("/files/file/")).multipart(form).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "file_size": 5 }));

    let form = Form::new().part("file", file_part(b"hello", "hello.txt"));
    let resp = app
        .client
        .post(app.url("/files/uploadfile/"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "filename": "hello.txt" }));

    let form = Form::new()
        .part("files", file_part(b"a", "a.txt"))
        .part("files", file_part(b"bcd", "b.txt"));
    let resp = app.client.post(app.url("/files/files/")).multipart(form).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "file_sizes": [1, 3] }));

    let form = Form::new()
        .part("files", file_part(b"a", "a.txt"))
        .part("files", file_part(b"bcd", "b.txt"));
    let resp = app
        .client
        .post(app.url("/files/uploadfiles/"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "filenames": ["a.txt", "b.txt"] }));
}

#[tokio::test]
async fn test_missing_file_is_required() {
    let app = spawn_app().await;

    let form = Form::new().text("other", "value");
    let resp = app.client.post(app.url("/files/file/")).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"][0]["loc"], json!(["body", "file"]));

    let resp = app.client.post(app.url("/files/file/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_upload_page() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/files")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(resp.text().await.unwrap().contains("multipart/form-data"));
}

#[tokio::test]
async fn test_form_and_files_together() {
    let app = spawn_app().await;

    let form = Form::new()
        .part("file", file_part(b"1234", "a.bin"))
        .part(
            "fileb",
            Part::bytes(&b"{}"[..])
                .file_name("b.json")
                .mime_str("application/json")
                .unwrap(),
        )
        .text("token", "secret");
    let resp = app
        .client
        .post(app.url("/form-files/files/"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "file_size": 4, "token": "secret", "fileb_content_type": "application/json" })
    );
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_http_errors() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/errors/items/foo")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "item": "The Foo Wrestlers" }));

    let resp = app.client.get(app.url("/errors/items/bar")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(resp).await, json!({ "detail": "Item not found" }));

    let resp = app.client.get(app.url("/errors/items-header/bar")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()["x-error"], "There goes my error");
}

#[tokio::test]
async fn test_custom_error_type() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/errors/unicorns/sparkle")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "unicorn_name": "sparkle" }));

    let resp = app.client.get(app.url("/errors/unicorns/yolo")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(
        body(resp).await,
        json!({ "message": "Oops! yolo did something. There goes a rainbow..." })
    );
}

#[tokio::test]
async fn test_plain_text_error_override() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/errors/plain/items/foo")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        resp.text().await.unwrap(),
        "1 validation error\npath -> item_id\n  value is not a valid integer (type=type_error.integer)"
    );

    let resp = app.client.get(app.url("/errors/plain/items/3")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(resp.text().await.unwrap(), "Nope! I don't like 3.");

    let resp = app.client.get(app.url("/errors/plain/items/4")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "item_id": 4 }));
}

#[tokio::test]
async fn test_validation_error_echoes_body() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/errors/echo/items/"))
        .json(&json!({ "title": "towel", "size": "XL" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body(resp).await,
        json!({
            "detail": [{
                "loc": ["body", "size"],
                "msg": "value is not a valid integer",
                "type": "type_error.integer"
            }],
            "body": { "title": "towel", "size": "XL" }
        })
    );
}

// =============================================================================
// Headers, encoder, dependencies, security
// =============================================================================

#[tokio::test]
async fn test_header_params() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/headers/items/"))
        .header("user-agent", "showcase-test")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "User-Agent": "showcase-test" }));

    let resp = app
        .client
        .get(app.url("/headers/items/tokens/"))
        .header("x-token", "foo")
        .header("x-token", "bar")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "X-Token values": ["foo", "bar"] }));

    let resp = app.client.get(app.url("/headers/items/tokens/")).send().await.unwrap();
    assert_eq!(body(resp).await, json!({ "X-Token values": null }));
}

#[tokio::test]
async fn test_json_compatible_storage() {
    let app = spawn_app().await;

    let resp = app
        .client
        .put(app.url("/encoder/items/abc"))
        .json(&json!({ "title": "Foo", "timestamp": "2024-01-01T10:00:00+02:00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await, Value::Null);

    let resp = app.client.get(app.url("/encoder/items/abc")).send().await.unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "title": "Foo", "timestamp": "2024-01-01T08:00:00Z", "description": null })
    );

    let resp = app.client.get(app.url("/encoder/items/missing")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_common_query_dependency() {
    let app = spawn_app().await;

    for path in ["/dependencies/items/?q=x", "/dependencies/users/?q=x"] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(body(resp).await, json!({ "q": "x", "skip": 0, "limit": 100 }));
    }

    let resp = app
        .client
        .get(app.url("/dependencies/class/items/?skip=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({ "items": [{ "item_name": "Bar" }, { "item_name": "Baz" }] })
    );

    let resp = app
        .client
        .get(app.url("/dependencies/items/?limit=lots"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_query_or_cookie_dependency() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/dependencies/query-or-cookie/"))
        .header("cookie", "last_query=pizza")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "q_or_cookie": "pizza" }));

    let resp = app
        .client
        .get(app.url("/dependencies/query-or-cookie/?q=pasta"))
        .header("cookie", "last_query=pizza")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "q_or_cookie": "pasta" }));

    let resp = app
        .client
        .get(app.url("/dependencies/query-or-cookie/"))
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "q_or_cookie": null }));
}

#[tokio::test]
async fn test_header_verification_dependency() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/dependencies/verified/items/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(resp).await["detail"].as_array().unwrap().len(), 2);

    let resp = app
        .client
        .get(app.url("/dependencies/verified/items/"))
        .header("x-token", "wrong")
        .header("x-key", "fake-super-secret-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(resp).await, json!({ "detail": "X-Token header invalid" }));

    let resp = app
        .client
        .get(app.url("/dependencies/verified/items/"))
        .header("x-token", "fake-super-secret-token")
        .header("x-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "detail": "X-Key header invalid" }));

    let resp = app
        .client
        .get(app.url("/dependencies/verified/items/"))
        .header("x-token", "fake-super-secret-token")
        .header("x-key", "fake-super-secret-key")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!([{ "item": "Foo" }, { "item": "Bar" }]));
}

#[tokio::test]
async fn test_session_is_closed_after_response() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/dependencies/db/")).send().await.unwrap();
    let session = body(resp).await;
    assert_eq!(session["session_id"], 1);
    assert_eq!(session["open_sessions"], 1);

    assert_eq!(app.state.sessions.open_sessions(), 0);
    assert_eq!(app.state.sessions.closed_sessions(), 1);
}

#[tokio::test]
async fn test_bearer_token() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/security/items/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()["www-authenticate"], "Bearer");
    assert_eq!(body(resp).await, json!({ "detail": "Not authenticated" }));

    let resp = app
        .client
        .get(app.url("/security/items/"))
        .header("authorization", "Basic abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .client
        .get(app.url("/security/items/"))
        .bearer_auth("abc")
        .send()
        .await
        .unwrap();
    assert_eq!(body(resp).await, json!({ "token": "abc" }));
}

#[tokio::test]
async fn test_current_user() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/security/users/me"))
        .bearer_auth("johndoe")
        .send()
        .await
        .unwrap();
    assert_eq!(
        body(resp).await,
        json!({
            "username": "johndoefakedecoded",
            "email": "john@example.com",
            "full_name": "John Doe",
            "disabled": null
        })
    );
}

// =============================================================================
// Ambient
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health = body(resp).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "api-showcase");

    let resp = app.client.get(app.url("/health/detailed")).send().await.unwrap();
    let detailed = body(resp).await;
    assert_eq!(detailed["rate_limiting"]["requests_per_window"], 3);
    assert_eq!(detailed["open_sessions"], 0);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/api-docs/openapi.json")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let doc = body(resp).await;
    let examples = &doc["paths"]["/body-examples/items/{item_id}"]["put"]["requestBody"]["content"]
        ["application/json"]["examples"];
    assert!(examples.get("normal").is_some());
    assert!(examples.get("invalid").is_some());
    assert_eq!(doc["paths"]["/path-ops/elements/"]["get"]["deprecated"], true);

    let health = &doc["paths"]["/health"]["get"]["responses"];
    assert!(health.get("200").is_some());
    assert!(health.get("503").is_none());
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
