//! SDP exchange with the provider's negotiation endpoint.
//!
//! One POST per session: the local offer goes up as `application/sdp`
//! with the minted token as bearer credential, the SDP answer comes back
//! as the response body. The session's behavioral instructions (target
//! language, verbosity) were baked in server-side when the token was
//! minted; nothing language-specific travels here.

use crate::error::SessionError;

pub struct SignalingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SignalingClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Exchange the local offer for the remote answer.
    pub async fn exchange(&self, token: &str, offer_sdp: &str) -> Result<String, SessionError> {
        tracing::debug!(endpoint = %self.endpoint, offer_len = offer_sdp.len(), "Posting SDP offer");

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/sdp")
            .body(offer_sdp.to_string())
            .send()
            .await
            .map_err(|e| SessionError::Negotiation(format!("signaling transport error: {e}")))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SessionError::Negotiation(format!(
                "signaling rejected the offer ({status}): {body}"
            )));
        }

        // An SDP answer always opens with a version line.
        if !body.trim_start().starts_with("v=") {
            return Err(SessionError::Negotiation(
                "malformed SDP answer from signaling endpoint".into(),
            ));
        }

        Ok(body)
    }
}
