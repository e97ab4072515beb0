//! One module per route family, each mounted under its own prefix.

pub mod body;
pub mod body_examples;
pub mod body_multiple;
pub mod body_nested;
pub mod body_updates;
pub mod cors;
pub mod dependencies;
pub mod encoder;
pub mod errors;
pub mod extra_models;
pub mod extra_types;
pub mod files;
pub mod first_steps;
pub mod form_files;
pub mod forms;
pub mod headers;
pub mod health;
pub mod middleware_demo;
pub mod path_ops;
pub mod path_params;
pub mod path_validation;
pub mod query_params;
pub mod query_validation;
pub mod response_model;
pub mod security;
pub mod status_codes;
