use std::env;
use std::time::Duration;

use reqwest::multipart::{Form, Part};

use crate::error::RelayError;
use crate::models::UploadedImage;

/// Wall-clock limit for one webhook round trip, body read included.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Read the analysis endpoint from the environment. Resolved per call; an
/// unset value fails that call with a configuration error, with no fallback
/// address.
pub fn resolve_webhook_url() -> Result<String, RelayError> {
    env::var("WEBHOOK_URL").map_err(|_| RelayError::Misconfigured)
}

/// Client for the external analysis webhook. Holds a single reqwest client
/// for connection reuse; carries no per-request state.
pub struct WebhookClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self::with_timeout(WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Re-encode the uploaded image as a one-field multipart form and POST it
    /// to the webhook. Returns the raw reply body on any 2xx status.
    ///
    /// Transport failures are classified here: the timeout firing aborts the
    /// in-flight call and is reported distinctly from other network errors,
    /// which in turn are distinct from unsuccessful upstream statuses.
    pub async fn forward(&self, url: &str, image: &UploadedImage) -> Result<String, RelayError> {
        let form = Form::new().part("image", self.image_part(image));

        let response = self
            .client
            .post(url)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| classify_transport(url, err))?;

        let status = response.status();

        // The body is read before the status check so a failure body can be
        // logged; it is never forwarded to the caller.
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(url, err))?;

        log::debug!("Webhook replied: status={} body_len={}", status, body.len());

        if !status.is_success() {
            let snippet: String = body.chars().take(500).collect();
            log::warn!("Webhook error body (status {}): {}", status, snippet);
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        Ok(body)
    }

    fn image_part(&self, image: &UploadedImage) -> Part {
        let part = Part::bytes(image.data.to_vec()).file_name(image.filename.clone());

        // A client can declare any string as the media type; an unparseable
        // one is forwarded without an explicit part content type.
        match part.mime_str(&image.content_type) {
            Ok(part) => part,
            Err(_) => {
                log::warn!(
                    "Unparseable content type {:?} on upload {:?}, omitting",
                    image.content_type,
                    image.filename
                );
                Part::bytes(image.data.to_vec()).file_name(image.filename.clone())
            }
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_transport(url: &str, err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout {
            url: url.to_string(),
        }
    } else {
        RelayError::Network {
            url: url.to_string(),
            source: err,
        }
    }
}
