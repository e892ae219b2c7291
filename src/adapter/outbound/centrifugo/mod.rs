//! Centrifugo broadcaster over the server HTTP API.
//!
//! Every update becomes one `publish` command on the channel derived from
//! its event and market. Centrifugo answers HTTP 200 even for rejected
//! commands, so the reply body is checked for an `error` object.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::BroadcastError;
use crate::port::{Broadcaster, PriceUpdate};

#[derive(Serialize)]
struct PublishCommand<'a> {
    channel: &'a str,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    code: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    error: Option<ReplyError>,
}

/// Turn a Centrifugo reply body into a publish outcome.
fn check_reply(channel: &str, body: &str) -> Result<(), BroadcastError> {
    let reply: Reply = serde_json::from_str(body).map_err(|e| BroadcastError::Rejected {
        channel: channel.to_string(),
        reason: format!("unreadable reply: {e}"),
    })?;
    match reply.error {
        Some(error) => Err(BroadcastError::Rejected {
            channel: channel.to_string(),
            reason: format!("{} ({})", error.message, error.code),
        }),
        None => Ok(()),
    }
}

/// Publishes price updates to a Centrifugo server.
pub struct CentrifugoBroadcaster {
    client: Client,
    api_url: String,
    api_key: String,
}

impl CentrifugoBroadcaster {
    /// Build a broadcaster for the server at `api_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self, BroadcastError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/{method}", self.api_url)
    }

    async fn call<T: Serialize + ?Sized>(
        &self,
        method: &str,
        channel: &str,
        body: &T,
    ) -> Result<(), BroadcastError> {
        let response = self
            .client
            .post(self.endpoint(method))
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(BroadcastError::Rejected {
                channel: channel.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        check_reply(channel, &text)
    }
}

#[async_trait]
impl Broadcaster for CentrifugoBroadcaster {
    fn name(&self) -> &'static str {
        "centrifugo"
    }

    async fn check(&self) -> Result<(), BroadcastError> {
        self.call("info", "-", &serde_json::json!({})).await?;
        info!(url = %self.api_url, "Centrifugo reachable");
        Ok(())
    }

    async fn publish(&self, update: &PriceUpdate) -> Result<(), BroadcastError> {
        let channel = update.channel();
        let command = PublishCommand {
            channel: &channel,
            data: update.payload()?,
        };
        self.call("publish", &channel, &command).await?;
        debug!(channel = %channel, price = %update.price_code, "Published");
        Ok(())
    }
}
