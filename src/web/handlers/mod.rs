//! HTTP request handlers
//!
//! Handlers stay thin: extract parameters, call one service, map the result.

use serde::Deserialize;

pub mod download;
pub mod health;
pub mod metadata;
pub mod probe;
pub mod resolve;

/// `?url=` query shared by the lookup endpoints
#[derive(Debug, Default, Deserialize)]
pub struct UrlQuery {
    #[serde(default)]
    pub url: String,
}

/// JSON body of `POST /api/head`
#[derive(Debug, Default, Deserialize)]
pub struct UrlBody {
    #[serde(default)]
    pub url: String,
}
