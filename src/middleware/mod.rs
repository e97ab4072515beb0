// Middleware modules
pub mod plain_text;
pub mod rate_limit;
pub mod rewrite;
