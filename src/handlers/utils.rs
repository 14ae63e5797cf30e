use anyhow::Context;

use async_trait::async_trait;

use log::warn;

use serde::Serialize;

use crate::handlers::{HttpRequest, HttpResponse, PatternMatch, RequestHandler, RouteParams};

pub fn build_json_response(response_dto: impl Serialize) -> HttpResponse {
    let json_result = serde_json::to_string(&response_dto);

    match json_result {
        Err(e) => {
            warn!("json serialization error {}", e);

            build_status_code_response(http::StatusCode::INTERNAL_SERVER_ERROR)
        }
        Ok(json_string) => http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Some(json_string))
            .unwrap(),
    }
}

pub fn build_text_response(status_code: http::StatusCode, body: impl Into<String>) -> HttpResponse {
    http::Response::builder()
        .status(status_code)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Some(body.into()))
        .unwrap()
}

pub fn build_status_code_response(status_code: http::StatusCode) -> HttpResponse {
    http::Response::builder()
        .status(status_code)
        .body(None)
        .unwrap()
}

/// Answers every request with a fixed status and body taken from configuration.
pub struct StaticResponseHandler {
    status_code: http::StatusCode,
    body: String,
}

impl StaticResponseHandler {
    pub fn new(static_route: &crate::config::StaticRouteInfo) -> anyhow::Result<Self> {
        let status_code = http::StatusCode::from_u16(*static_route.status())
            .with_context(|| format!("invalid status code {}", static_route.status()))?;

        Ok(Self {
            status_code,
            body: static_route.body().clone(),
        })
    }
}

#[async_trait]
impl RequestHandler for StaticResponseHandler {
    async fn handle(
        &self,
        _request: &HttpRequest,
        _params: &RouteParams,
        _pattern_match: &PatternMatch,
    ) -> anyhow::Result<HttpResponse> {
        Ok(build_text_response(self.status_code, self.body.clone()))
    }
}
