use crate::error::SignalingError;
use crate::signaling::signaling_client::SignalingClient;
use async_trait::async_trait;
use birbcast_core::{OfferRequest, SdpType, SessionDescription};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Posts `{id, offer}` as json and reads `{type, sdp}` back.
#[derive(Debug, Clone)]
pub struct HttpSignaling {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSignaling {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SignalingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignalingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SignalingClient for HttpSignaling {
    async fn exchange(&self, request: &OfferRequest) -> Result<SessionDescription, SignalingError> {
        debug!("Posting offer for session {} to {}", request.id, self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SignalingError::Timeout(self.timeout)
                } else {
                    SignalingError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Signaling endpoint rejected offer {}: {}", request.id, status);
            return Err(SignalingError::Status(status.as_u16()));
        }

        let answer: SessionDescription = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SignalingError::Timeout(self.timeout)
            } else {
                SignalingError::InvalidAnswer(e.to_string())
            }
        })?;

        if answer.sdp_type != SdpType::Answer {
            return Err(SignalingError::InvalidAnswer(format!(
                "expected an answer, got {:?}",
                answer.sdp_type
            )));
        }

        Ok(answer)
    }
}
