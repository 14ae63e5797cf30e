use anyhow::Context;

use getset::{CopyGetters, Getters};

use log::warn;

use tokio::io::AsyncWrite;

use crate::connection::FastCGIConnectionID;

pub type HttpRequest = http::Request<Option<String>>;

pub type ParamKeyValue<'a> = (&'a str, &'a str);

const HTTP_HEADER_PARAM_PREFIX: &str = "http_";

/// FastCGI metadata attached to every `HttpRequest` as an extension.
#[derive(Clone, Copy, Debug, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct FastCGIRequestInfo {
    role: &'static str,
    connection_id: FastCGIConnectionID,
    request_id: u16,
}

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct FastCGIRequest<'a> {
    info: FastCGIRequestInfo,
    params: Vec<ParamKeyValue<'a>>,
}

fn role_name(role: &tokio_fastcgi::Role) -> &'static str {
    match role {
        tokio_fastcgi::Role::Authorizer => "Authorizer",
        tokio_fastcgi::Role::Filter => "Filter",
        tokio_fastcgi::Role::Responder => "Responder",
    }
}

impl<'a> FastCGIRequest<'a> {
    pub fn new<W: AsyncWrite + Unpin>(
        connection_id: FastCGIConnectionID,
        request: &'a tokio_fastcgi::Request<W>,
    ) -> Self {
        let params: Vec<ParamKeyValue> = match request.str_params_iter() {
            Some(iter) => iter
                .map(|v| (v.0, v.1.unwrap_or("[Invalid UTF8]")))
                .collect(),
            None => Vec::new(),
        };

        Self::from_params(
            FastCGIRequestInfo {
                role: role_name(&request.role),
                connection_id,
                request_id: request.get_request_id(),
            },
            params,
        )
    }

    pub fn from_params(info: FastCGIRequestInfo, params: Vec<ParamKeyValue<'a>>) -> Self {
        Self { info, params }
    }

    fn param(&self, name: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Builds the request the router sees from `request_method`, `request_uri`
    /// and the `http_*` params.
    pub fn to_http_request(&self) -> anyhow::Result<HttpRequest> {
        let method = self
            .param("request_method")
            .context("missing request_method param")?;

        let request_uri = self
            .param("request_uri")
            .context("missing request_uri param")?;

        let mut builder = http::Request::builder()
            .method(
                http::Method::from_bytes(method.as_bytes())
                    .with_context(|| format!("invalid request_method '{}'", method))?,
            )
            .uri(
                request_uri
                    .parse::<http::Uri>()
                    .with_context(|| format!("invalid request_uri '{}'", request_uri))?,
            )
            .extension(self.info);

        for (key, value) in &self.params {
            if let Some(header_key) = key.strip_prefix(HTTP_HEADER_PARAM_PREFIX) {
                let header_key = header_key.replace('_', "-");

                match (
                    http::header::HeaderName::from_bytes(header_key.as_bytes()),
                    http::header::HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        builder = builder.header(name, value);
                    }
                    _ => warn!("skipping invalid header param '{}'", key),
                }
            }
        }

        builder.body(None).context("error building http request")
    }
}
