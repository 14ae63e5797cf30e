use std::collections::BTreeMap;

use async_trait::async_trait;

use chrono::prelude::Local;

use serde::Serialize;

use crate::{
    handlers::{
        route::Router, utils::build_json_response, HttpRequest, HttpResponse, PatternMatch,
        RequestHandler, RouteParams,
    },
    request::FastCGIRequestInfo,
};

fn current_time_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.9f %z").to_string()
}

#[derive(Debug, Default, Serialize)]
struct RequestInfoResponse<'a> {
    now: String,
    fastcgi_role: Option<&'static str>,
    fastcgi_connection_id: Option<u64>,
    fastcgi_request_id: Option<u16>,
    method: &'a str,
    request_uri: String,
    pathname: &'a str,
    query: Option<&'a str>,
    http_headers: BTreeMap<&'a str, &'a str>,
}

struct RequestInfoHandler {}

impl RequestInfoHandler {
    fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl RequestHandler for RequestInfoHandler {
    async fn handle(
        &self,
        request: &HttpRequest,
        _params: &RouteParams,
        pattern_match: &PatternMatch,
    ) -> anyhow::Result<HttpResponse> {
        let fastcgi_request_info = request.extensions().get::<FastCGIRequestInfo>();

        let mut response = RequestInfoResponse {
            now: current_time_string(),
            fastcgi_role: fastcgi_request_info.map(|info| info.role()),
            fastcgi_connection_id: fastcgi_request_info.map(|info| info.connection_id().0),
            fastcgi_request_id: fastcgi_request_info.map(|info| info.request_id()),
            method: request.method().as_str(),
            request_uri: request.uri().to_string(),
            pathname: pattern_match.pathname(),
            query: pattern_match.query().as_deref(),
            ..Default::default()
        };

        for (key, value) in request.headers() {
            response
                .http_headers
                .insert(key.as_str(), value.to_str().unwrap_or("[Invalid UTF8]"));
        }

        Ok(build_json_response(response))
    }
}

pub fn add_routes(router: &mut Router) -> anyhow::Result<()> {
    router.add("GET", "/request_info", RequestInfoHandler::new())?;
    Ok(())
}
