//! HTTP classifier backend.
//!
//! Posts `{"imageData": <base64>}` to the detect endpoint and returns the
//! reply body. The endpoint sits in front of the vision model and owns
//! geofencing and rate limiting; both surface here as HTTP error statuses.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::detect::backend::ClassifierBackend;
use crate::detect::result::{decode_reply, RawClassification};
use crate::frame::EncodedImage;

/// Process-wide classifier endpoint configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointSettings {
    pub url: String,
    pub timeout: Duration,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/api/detect".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest<'a> {
    image_data: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpClassifier {
    settings: EndpointSettings,
    agent: ureq::Agent,
}

impl HttpClassifier {
    pub fn new(settings: EndpointSettings) -> Result<Self> {
        let url = Url::parse(&settings.url).context("parse detect endpoint url")?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported detect endpoint scheme '{}'; expected http(s)",
                url.scheme()
            ));
        }
        let agent = ureq::AgentBuilder::new().timeout(settings.timeout).build();
        Ok(Self { settings, agent })
    }

    pub fn settings(&self) -> &EndpointSettings {
        &self.settings
    }
}

impl ClassifierBackend for HttpClassifier {
    fn name(&self) -> &'static str {
        "http"
    }

    fn classify(&self, image: &EncodedImage) -> Result<RawClassification> {
        let request = DetectRequest {
            image_data: image.payload(),
        };
        match self.agent.post(&self.settings.url).send_json(&request) {
            Ok(response) => {
                let body = response
                    .into_string()
                    .context("read detect response body")?;
                decode_reply(&body)
            }
            Err(ureq::Error::Status(code, response)) => {
                let detail = response
                    .into_string()
                    .ok()
                    .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
                    .map(|body| body.error)
                    .unwrap_or_else(|| "no error detail".to_string());
                Err(anyhow!("{} (HTTP {}): {}", describe_status(code), code, detail))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(anyhow!("detect endpoint unreachable: {}", transport))
            }
        }
    }
}

/// Human-readable cause for a detect endpoint error status.
pub fn describe_status(code: u16) -> &'static str {
    match code {
        400 => "invalid image payload",
        429 => "rate limited",
        451 => "detection unavailable in this region",
        500..=599 => "detection service failure",
        _ => "unexpected detect endpoint status",
    }
}
