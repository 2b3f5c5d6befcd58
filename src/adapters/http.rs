use crate::utils::error::{Result, RpcError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("atheme-rpc/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// POSTs `body` and returns the response text of a 2xx answer.
pub async fn post(client: &Client, endpoint: &str, content_type: &str, body: String) -> Result<String> {
    tracing::debug!("POST {} ({} bytes, {})", endpoint, body.len(), content_type);
    let response = client
        .post(endpoint)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await?;

    let status = response.status();
    tracing::debug!("Response status: {}", status);
    let text = response.text().await?;

    if !status.is_success() {
        return Err(RpcError::HttpStatus {
            status: status.as_u16(),
            body: text,
        });
    }

    // Bodies carry authcookies; only the size is logged.
    tracing::debug!("Response body: {} bytes", text.len());
    Ok(text)
}
