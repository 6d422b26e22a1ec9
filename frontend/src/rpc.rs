use futures::future::{select, Either};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use shared::transport::{ask, ClientError, ClientTransport, RawResponse};

pub(crate) struct Client {
    base_url: String,
}

impl Client {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl ClientTransport for Client {
    type Error = gloo_net::Error;

    async fn post_json(
        &self,
        route: &str,
        body: serde_json::Value,
    ) -> Result<RawResponse, Self::Error> {
        let url = format!("{}{}", self.base_url, route);

        let resp = Request::post(&url).json(&body)?.send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Asks the proxy, giving up after `timeout_secs`.
pub(crate) async fn ask_with_timeout(
    client: &Client,
    prompt: &str,
    timeout_secs: u64,
) -> Result<String, ClientError> {
    let request = ask(client, prompt);
    let timeout = TimeoutFuture::new(timeout_secs.saturating_mul(1000).min(u32::MAX as u64) as u32);
    futures::pin_mut!(request, timeout);

    match select(request, timeout).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(_) => Err(ClientError::Timeout(timeout_secs)),
    }
}
