//! Token endpoint client.
//!
//! Exchanges the backend's long-lived secret (held server-side, never seen
//! here) for a short-lived, single-session token. The request carries the
//! session's target language and verbosity; the response is an opaque
//! bearer credential consumed exactly once by the session negotiator.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

// ── Wire shapes ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    language: &'a str,
    verbose: bool,
}

/// Both published response shapes are accepted: the secret wrapped in an
/// object with a `value` field, or a bare string.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    client_secret: ClientSecret,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClientSecret {
    Wrapped { value: String },
    Bare(String),
}

impl ClientSecret {
    fn into_token(self) -> String {
        match self {
            Self::Wrapped { value } => value,
            Self::Bare(value) => value,
        }
    }
}

// ── Broker ────────────────────────────────────────────────────────

/// Client for the short-lived-credential endpoint.
///
/// Stateless: nothing is retained after [`TokenBroker::mint`] returns.
pub struct TokenBroker {
    http: reqwest::Client,
    endpoint: String,
}

impl TokenBroker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Mint a single-session token for the given target language.
    ///
    /// Non-2xx responses surface the body verbatim as failure detail;
    /// a success response with no usable secret is also an auth failure.
    pub async fn mint(&self, language: &str, verbose: bool) -> Result<String, SessionError> {
        tracing::debug!(endpoint = %self.endpoint, language, verbose, "Minting session token");

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&TokenRequest { language, verbose })
            .send()
            .await
            .map_err(|e| SessionError::Auth {
                status: 0,
                body: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SessionError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SessionError::Auth {
                status: status.as_u16(),
                body: format!("malformed token response: {e}"),
            })?;

        let token = parsed.client_secret.into_token();
        if token.is_empty() {
            return Err(SessionError::Auth {
                status: status.as_u16(),
                body: "token response carried an empty secret".into(),
            });
        }
        Ok(token)
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn mints_wrapped_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rt-token"))
            .and(body_json(serde_json::json!({"language": "Spanish", "verbose": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"client_secret": {"value": "ek_abc123"}}),
            ))
            .mount(&server)
            .await;

        let broker = TokenBroker::new(format!("{}/api/rt-token", server.uri()));
        let token = broker.mint("Spanish", true).await.unwrap();
        assert_eq!(token, "ek_abc123");
    }

    #[tokio::test]
    async fn mints_bare_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"client_secret": "ek_bare"})),
            )
            .mount(&server)
            .await;

        let broker = TokenBroker::new(server.uri());
        let token = broker.mint("French", false).await.unwrap();
        assert_eq!(token, "ek_bare");
    }

    #[tokio::test]
    async fn non_2xx_surfaces_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
            .mount(&server)
            .await;

        let broker = TokenBroker::new(server.uri());
        let err = broker.mint("Spanish", false).await.unwrap_err();
        match err {
            SessionError::Auth { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream error");
            }
            other => panic!("expected auth failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let broker = TokenBroker::new(server.uri());
        let err = broker.mint("Spanish", false).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth { status: 200, .. }));
    }

    #[tokio::test]
    async fn empty_secret_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"client_secret": {"value": ""}})),
            )
            .mount(&server)
            .await;

        let broker = TokenBroker::new(server.uri());
        let err = broker.mint("Spanish", false).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth { .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_status_zero() {
        let broker = TokenBroker::new("http://127.0.0.1:1/api/rt-token");
        let err = broker.mint("Spanish", false).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth { status: 0, .. }));
    }
}
