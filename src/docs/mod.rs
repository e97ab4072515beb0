use axum::Router;
use utoipa::openapi::security::{Flow, OAuth2, Password, Scopes, SecurityScheme};
use utoipa::openapi::{Components, Deprecated};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::SecurityConfig;
use crate::models;
use crate::routes::{
    body, body_examples, body_multiple, body_nested, body_updates, encoder, errors, extra_models,
    first_steps, health, middleware_demo, path_ops, path_params, path_validation, query_validation,
    response_model, security, status_codes,
};
use crate::AppState;

/// Operations flagged as deprecated in the document.
const DEPRECATED_PATHS: [&str; 2] = ["/query-validation/items/", "/path-ops/elements/"];

#[derive(OpenApi)]
#[openapi(
    paths(
        first_steps::root,
        path_params::read_item,
        path_params::read_user_me,
        path_params::get_model,
        path_validation::read_item,
        query_validation::read_items,
        body::create_item,
        body_multiple::update_item_full,
        body_nested::update_item,
        body_nested::create_offer,
        body_examples::update_item,
        body_updates::read_item,
        body_updates::replace_item,
        body_updates::update_item,
        extra_models::create_user,
        extra_models::read_item,
        response_model::read_item,
        status_codes::create_item,
        path_ops::create_item,
        path_ops::read_elements,
        path_ops::read_users,
        errors::read_item,
        encoder::update_item,
        security::read_items,
        security::read_users_me,
        middleware_demo::info,
        middleware_demo::info_v2,
        health::health,
        health::health_detailed,
    ),
    components(
        schemas(
            models::Item,
            models::TaggedItem,
            models::NestedItem,
            models::Image,
            models::Offer,
            models::CatalogItem,
            models::UpdatableItem,
            models::User,
            models::UserIn,
            models::UserOut,
            models::CurrentUser,
            models::CarItem,
            models::PlaneItem,
            models::Vehicle,
            models::EncodableItem,
            models::ItemUserImportance,
            health::HealthResponse,
            health::DetailedHealthResponse,
            health::ServerConfigInfo,
            health::RateLimitingInfo,
        )
    ),
    modifiers(&DeprecatedOperations),
    tags(
        (name = "first-steps", description = "Hello world"),
        (name = "path-params", description = "Typed path parameters"),
        (name = "path-validation", description = "Numeric bounds on parameters"),
        (name = "query-validation", description = "String constraints on query parameters"),
        (name = "body", description = "JSON request bodies"),
        (name = "body-multiple", description = "Several body parameters"),
        (name = "body-nested", description = "Nested models"),
        (name = "body-examples", description = "Documented body examples"),
        (name = "body-updates", description = "Full and partial updates"),
        (name = "extra-models", description = "Input, output and storage models"),
        (name = "response-model", description = "Response filtering"),
        (name = "status-codes", description = "Response status codes"),
        (name = "items", description = "Item operations"),
        (name = "users", description = "User operations"),
        (name = "errors", description = "Error handling"),
        (name = "encoder", description = "JSON-compatible storage"),
        (name = "security", description = "Bearer token authentication"),
        (name = "middleware", description = "Rate limited routes"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "API Showcase",
        version = "0.1.0",
        description = "Typed request handling: parameters, validation, dependencies, errors and rate limiting",
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server"),
    ),
)]
pub struct ApiDoc;

struct DeprecatedOperations;

impl Modify for DeprecatedOperations {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for path in DEPRECATED_PATHS {
            if let Some(item) = openapi.paths.paths.get_mut(path) {
                for operation in item.operations.values_mut() {
                    operation.deprecated = Some(Deprecated::True);
                }
            }
        }
    }
}

/// The document with the bearer token scheme pointing at `token_url`.
pub fn get_openapi_spec(settings: &SecurityConfig) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let components = doc.components.get_or_insert_with(Components::default);
    components.add_security_scheme(
        security::SECURITY_SCHEME,
        SecurityScheme::OAuth2(OAuth2::new([Flow::Password(Password::new(
            settings.token_url.clone(),
            Scopes::new(),
        ))])),
    );
    doc
}

pub fn create_swagger_router(settings: &SecurityConfig) -> Router<AppState> {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", get_openapi_spec(settings))
        .into()
}
