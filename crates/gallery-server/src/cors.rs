use std::time::Duration;

use anyhow::Result;
use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::Config;

/// Local dev servers the client is usually run from.
const LOCAL_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// Production: only the known client origins. Development: mirror any origin.
pub fn layer(config: &Config) -> Result<CorsLayer> {
    if !config.production {
        return Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true));
    }

    Ok(CorsLayer::new()
        .allow_origin(allowed_origins(config)?)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(600)))
}

fn allowed_origins(config: &Config) -> Result<Vec<HeaderValue>> {
    LOCAL_ORIGINS
        .iter()
        .map(|o| o.to_string())
        .chain(config.frontend_url.iter().map(|u| u.trim_end_matches('/').to_string()))
        .map(|o| HeaderValue::from_str(&o).map_err(anyhow::Error::from))
        .collect()
}
