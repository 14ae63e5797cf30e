use getset::Getters;

use log::debug;

use crate::{
    handlers::{HttpRequest, HttpResponse, RequestHandler, RouteParams},
    params::ParamDecodeError,
    pattern::{PathMatcher, PatternCompiler, PatternError, UrlPatternCompiler},
};

#[derive(thiserror::Error, Debug)]
pub enum RouterError {
    #[error(transparent)]
    ParamDecode(#[from] ParamDecodeError),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

/// Outcome of `Router::match_request`.
///
/// `NoMatch` means no route accepted both method and path. A handler that
/// answers with a 404 status still produces `Matched`.
#[derive(Debug)]
pub enum RouteMatch {
    Matched(HttpResponse),
    NoMatch,
}

impl RouteMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            Self::Matched(response) => Some(response),
            Self::NoMatch => None,
        }
    }
}

#[derive(Getters)]
pub struct Route {
    #[getset(get = "pub")]
    method: String,
    matcher: Box<dyn PathMatcher>,
    handler: Box<dyn RequestHandler>,
}

impl Route {
    pub fn template(&self) -> &str {
        self.matcher.template()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// An insertion-ordered route table.
///
/// Routes are tried in the order they were added and the first route whose
/// method and pattern both match wins. There is no specificity ordering:
/// `/foo/:id` added before `/foo/bar` will always take `/foo/bar`.
/// Adding the same method and pattern twice is accepted and the second route
/// is never reached.
///
/// Routes can only be added through `&mut self`, so a table that is being
/// served from behind an `Arc` is read-only.
pub struct Router {
    compiler: Box<dyn PatternCompiler>,
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_compiler(UrlPatternCompiler)
    }

    pub fn with_compiler(compiler: impl PatternCompiler + 'static) -> Self {
        Self {
            compiler: Box::new(compiler),
            routes: Vec::new(),
        }
    }

    /// Compiles `pattern` and appends a route. `method` is matched case-insensitively.
    pub fn add(
        &mut self,
        method: &str,
        pattern: &str,
        handler: impl RequestHandler + 'static,
    ) -> Result<(), PatternError> {
        let matcher = self.compiler.compile(pattern)?;

        self.routes.push(Route {
            method: method.to_ascii_uppercase(),
            matcher,
            handler: Box::new(handler),
        });

        Ok(())
    }

    /// Runs the handler of the first route matching the request's method and path.
    ///
    /// Handler errors and parameter decode errors are returned as-is.
    pub async fn match_request(&self, request: &HttpRequest) -> Result<RouteMatch, RouterError> {
        let request_method = request.method().as_str().to_ascii_uppercase();

        for route in &self.routes {
            if route.method != request_method {
                continue;
            }

            let pattern_match = match route.matcher.exec(request.uri()) {
                None => continue,
                Some(pattern_match) => pattern_match,
            };

            debug!(
                "matched {} {} to route {} '{}'",
                request_method,
                request.uri(),
                route.method,
                route.template()
            );

            let params = RouteParams::decode(pattern_match.groups())?;

            let response = route
                .handler
                .handle(request, &params, &pattern_match)
                .await?;

            return Ok(RouteMatch::Matched(response));
        }

        Ok(RouteMatch::NoMatch)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::handlers::{handler_fn, utils::build_text_response};

    fn ok_handler(body: &'static str) -> impl RequestHandler {
        handler_fn(move |_, _, _| Ok(build_text_response(http::StatusCode::OK, body)))
    }

    #[test]
    fn test_route_match_helpers() {
        let matched = RouteMatch::Matched(build_text_response(http::StatusCode::NOT_FOUND, "x"));
        assert!(matched.is_match());
        assert_eq!(
            matched.into_response().map(|r| r.status()),
            Some(http::StatusCode::NOT_FOUND)
        );

        assert!(!RouteMatch::NoMatch.is_match());
        assert!(RouteMatch::NoMatch.into_response().is_none());
    }

    #[test]
    fn test_add_normalizes_method() {
        let mut router = Router::new();
        router.add("get", "/", ok_handler("1")).unwrap();
        router.add("Post", "/foo/:id", ok_handler("2")).unwrap();

        assert_eq!(router.len(), 2);
        assert_eq!(router.routes()[0].method(), "GET");
        assert_eq!(router.routes()[1].method(), "POST");
        assert_eq!(router.routes()[1].template(), "/foo/:id");
    }

    #[test]
    fn test_add_propagates_pattern_error() {
        let mut router = Router::new();
        let err = router.add("GET", "/foo/:", ok_handler("1")).unwrap_err();
        assert_eq!(err, PatternError::MissingParameterName { position: 5 });
        assert!(router.is_empty());
    }

    #[test]
    fn test_duplicate_routes_are_accepted() {
        let mut router = Router::default();
        router.add("GET", "/", ok_handler("1")).unwrap();
        router.add("GET", "/", ok_handler("2")).unwrap();
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_router_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Router>();
    }
}
