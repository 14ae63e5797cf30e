//! A small insertion-ordered HTTP router, with a FastCGI host for it.
//!
//! Routes are `(method, path template, handler)` triples tried in the order
//! they were added:
//!
//! ```
//! use fastcgi_router::{handler_fn, handlers::utils::build_text_response, RouteMatch, Router};
//!
//! # tokio_test_block_on(async {
//! let mut router = Router::new();
//! router
//!     .add("GET", "/foo/:id", handler_fn(|_request, params, _pattern_match| {
//!         Ok(build_text_response(http::StatusCode::OK, params.get("id").unwrap_or_default()))
//!     }))
//!     .unwrap();
//!
//! let request = http::Request::get("https://example.com/foo/bar").body(None).unwrap();
//! match router.match_request(&request).await.unwrap() {
//!     RouteMatch::Matched(response) => assert_eq!(response.body().as_deref(), Some("bar")),
//!     RouteMatch::NoMatch => unreachable!(),
//! }
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(future)
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod handlers;
pub mod params;
pub mod pattern;
pub mod request;
pub mod response;
pub mod server;
mod utils;

pub use handlers::{
    handler_fn,
    route::{Route, RouteMatch, Router, RouterError},
    FnHandler, RequestHandler,
};
pub use params::{ParamDecodeError, RouteParams};
pub use pattern::{
    Captures, PathMatcher, PatternCompiler, PatternError, PatternMatch, UrlPattern,
    UrlPatternCompiler,
};
pub use request::HttpRequest;
pub use response::HttpResponse;
