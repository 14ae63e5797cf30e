mod hello;
mod request_info;
pub mod route;
pub mod utils;

use std::time::Duration;

use anyhow::Context;

use async_trait::async_trait;

use getset::{CopyGetters, Getters};

pub use crate::{
    params::RouteParams, pattern::PatternMatch, request::HttpRequest, response::HttpResponse,
};

/// Invoked by the `Router` for the first route whose method and pattern match a request.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(
        &self,
        request: &HttpRequest,
        params: &RouteParams,
        pattern_match: &PatternMatch,
    ) -> anyhow::Result<HttpResponse>;
}

/// Adapts a synchronous closure into a `RequestHandler`.
pub struct FnHandler<F> {
    function: F,
}

#[async_trait]
impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(&HttpRequest, &RouteParams, &PatternMatch) -> anyhow::Result<HttpResponse> + Send + Sync,
{
    async fn handle(
        &self,
        request: &HttpRequest,
        params: &RouteParams,
        pattern_match: &PatternMatch,
    ) -> anyhow::Result<HttpResponse> {
        (self.function)(request, params, pattern_match)
    }
}

pub fn handler_fn<F>(function: F) -> FnHandler<F>
where
    F: Fn(&HttpRequest, &RouteParams, &PatternMatch) -> anyhow::Result<HttpResponse> + Send + Sync,
{
    FnHandler { function }
}

/// A route table shared by every connection, plus the time budget for one match.
#[derive(Getters, CopyGetters)]
pub struct Handlers {
    #[getset(get = "pub")]
    router: route::Router,
    #[getset(get_copy = "pub")]
    handler_timeout: Duration,
}

impl Handlers {
    pub fn new(router: route::Router, handler_timeout: Duration) -> Self {
        Self {
            router,
            handler_timeout,
        }
    }
}

pub fn create_handlers(
    router_configuration: &crate::config::RouterConfiguration,
) -> anyhow::Result<Handlers> {
    let mut router = route::Router::new();

    for static_route in router_configuration.static_routes() {
        router
            .add(
                static_route.method(),
                static_route.pattern(),
                utils::StaticResponseHandler::new(static_route)?,
            )
            .with_context(|| {
                format!(
                    "error adding static route {} '{}'",
                    static_route.method(),
                    static_route.pattern()
                )
            })?;
    }

    request_info::add_routes(&mut router)?;
    hello::add_routes(&mut router)?;

    Ok(Handlers::new(
        router,
        *router_configuration.handler_timeout(),
    ))
}
