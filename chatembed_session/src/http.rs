use chatembed_core::EndpointConfig;
use reqwest::{Client, RequestBuilder};

/// Build the HTTP client shared by every component of one chat instance.
pub fn build_client(config: &EndpointConfig) -> reqwest::Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Attach the bearer token, if one is configured.
pub(crate) fn authorize(request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}
