use crate::handlers::{handler_fn, route::Router, utils::build_text_response};

pub fn add_routes(router: &mut Router) -> anyhow::Result<()> {
    router.add(
        "GET",
        "/hello/:name",
        handler_fn(|_request, params, _pattern_match| {
            let name = params.get("name").unwrap_or("world");
            Ok(build_text_response(
                http::StatusCode::OK,
                format!("Hello, {}!", name),
            ))
        }),
    )?;
    Ok(())
}
