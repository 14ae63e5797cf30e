use std::sync::Arc;

use log::{debug, warn};

use tokio_fastcgi::{Request, Requests};

use crate::{
    connection::FastCGIConnectionID,
    handlers::{
        route::RouteMatch,
        utils::{build_status_code_response, build_text_response},
        Handlers,
    },
    request::{FastCGIRequest, HttpRequest},
    response::{HttpResponse, Responder},
    utils::{GenericAsyncReader, GenericAsyncWriter},
};

/// Applies the hosting rules around `Router::match_request`: no match is a
/// 404, a handler or decode error is a 500 and running past `handler_timeout`
/// is a 504. Responses from matched handlers pass through unchanged.
async fn route_request(handlers: &Handlers, http_request: HttpRequest) -> HttpResponse {
    let match_result = tokio::time::timeout(
        handlers.handler_timeout(),
        handlers.router().match_request(&http_request),
    )
    .await;

    match match_result {
        Err(_) => {
            warn!(
                "handler timeout for {} {}",
                http_request.method(),
                http_request.uri()
            );
            build_status_code_response(http::StatusCode::GATEWAY_TIMEOUT)
        }
        Ok(Err(err)) => {
            warn!(
                "route error for {} {}: {:#}",
                http_request.method(),
                http_request.uri(),
                err
            );
            build_status_code_response(http::StatusCode::INTERNAL_SERVER_ERROR)
        }
        Ok(Ok(RouteMatch::Matched(response))) => response,
        Ok(Ok(RouteMatch::NoMatch)) => {
            debug!(
                "no route for {} {}",
                http_request.method(),
                http_request.uri()
            );
            build_text_response(http::StatusCode::NOT_FOUND, "404 Not Found")
        }
    }
}

pub struct ConnectionProcessor {
    connection_id: FastCGIConnectionID,
    handlers: Arc<Handlers>,
    fastcgi_connection_configuration: crate::config::FastCGIConnectionConfiguration,
}

impl ConnectionProcessor {
    pub fn new(
        connection_id: FastCGIConnectionID,
        handlers: Arc<Handlers>,
        fastcgi_connection_configuration: &crate::config::FastCGIConnectionConfiguration,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection_id,
            handlers,
            fastcgi_connection_configuration: fastcgi_connection_configuration.clone(),
        })
    }

    fn build_http_request<W: GenericAsyncWriter>(
        &self,
        request: &Request<W>,
    ) -> anyhow::Result<HttpRequest> {
        FastCGIRequest::new(self.connection_id, request).to_http_request()
    }

    async fn process_one_request(self: Arc<Self>, request: Request<impl GenericAsyncWriter>) {
        if let Err(err) = request
            .process(|request| async move {
                let http_response = match self.build_http_request(request.as_ref()) {
                    Err(err) => {
                        warn!("invalid fastcgi request: {:#}", err);
                        build_status_code_response(http::StatusCode::BAD_REQUEST)
                    }
                    Ok(http_request) => route_request(&self.handlers, http_request).await,
                };

                Responder::new(request, http_response).respond().await
            })
            .await
        {
            // This is the error handler that is called if the process call returns an error.
            warn!("request.process failed: err = {}", err);
        }
    }

    pub fn start(
        self: Arc<Self>,
        split_socket: (impl GenericAsyncReader, impl GenericAsyncWriter),
    ) {
        tokio::spawn(async move {
            // Create a new requests handler it will collect the requests from the server and
            // supply a streaming interface.
            let mut requests = Requests::from_split_socket(
                split_socket,
                *self
                    .fastcgi_connection_configuration
                    .max_concurrent_connections(),
                *self
                    .fastcgi_connection_configuration
                    .max_requests_per_connection(),
            );

            // Spawn a new task to process each request.
            while let Ok(Some(request)) = requests.next().await {
                tokio::spawn(Arc::clone(&self).process_one_request(request));
            }

            debug!("connection_id {:?} closed", self.connection_id);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    use crate::handlers::{handler_fn, route::Router, PatternMatch, RequestHandler, RouteParams};

    struct SleepingHandler;

    #[async_trait]
    impl RequestHandler for SleepingHandler {
        async fn handle(
            &self,
            _request: &HttpRequest,
            _params: &RouteParams,
            _pattern_match: &PatternMatch,
        ) -> anyhow::Result<HttpResponse> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(build_text_response(http::StatusCode::OK, "too late"))
        }
    }

    fn test_handlers() -> Handlers {
        let mut router = Router::new();
        router
            .add(
                "GET",
                "/missing",
                handler_fn(|_request, _params, _pattern_match| {
                    Ok(build_text_response(
                        http::StatusCode::NOT_FOUND,
                        "Sorry not found!",
                    ))
                }),
            )
            .unwrap();
        router
            .add(
                "GET",
                "/boom",
                handler_fn(|_request, _params, _pattern_match| anyhow::bail!("handler exploded")),
            )
            .unwrap();
        router
            .add(
                "GET",
                "/echo/:id",
                handler_fn(|_request, params, _pattern_match| {
                    Ok(build_text_response(
                        http::StatusCode::OK,
                        params.get("id").unwrap_or_default(),
                    ))
                }),
            )
            .unwrap();
        router.add("GET", "/slow", SleepingHandler).unwrap();

        Handlers::new(router, Duration::from_millis(20))
    }

    fn request(uri: &str) -> HttpRequest {
        http::Request::builder()
            .method("GET")
            .uri(uri)
            .body(None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_no_match_is_404() {
        let response = route_request(&test_handlers(), request("/nowhere")).await;

        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_deref(), Some("404 Not Found"));
    }

    #[tokio::test]
    async fn test_handler_404_passes_through() {
        let response = route_request(&test_handlers(), request("/missing")).await;

        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_deref(), Some("Sorry not found!"));
    }

    #[tokio::test]
    async fn test_handler_error_is_500() {
        let response = route_request(&test_handlers(), request("/boom")).await;

        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_none());
    }

    #[tokio::test]
    async fn test_decode_error_is_500() {
        let response = route_request(&test_handlers(), request("/echo/%zz")).await;

        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_matched_response_passes_through() {
        let response = route_request(&test_handlers(), request("/echo/a%20b")).await;

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.body().as_deref(), Some("a b"));
    }

    #[tokio::test]
    async fn test_handler_timeout_is_504() {
        let response = route_request(&test_handlers(), request("/slow")).await;

        assert_eq!(response.status(), http::StatusCode::GATEWAY_TIMEOUT);
        assert!(response.body().is_none());
    }
}
