//! Runtime configuration.
//!
//! Sources, later wins: built-in defaults, an optional TOML file, then
//! `VOXBRIDGE_*` environment overrides. The token endpoint may be a full
//! URL or a path resolved against the configured origin, mirroring the
//! same-origin default of the hosted deployment.

use serde::{Deserialize, Serialize};

use crate::session::SessionOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin the token endpoint path is resolved against.
    pub origin: String,
    /// Token endpoint: absolute URL, or a path joined to `origin`.
    pub token_endpoint: String,
    /// Provider negotiation endpoint receiving the SDP offer. A plain
    /// base URL gets the model appended as a query parameter; an
    /// endpoint that already carries a query string is used verbatim.
    pub signaling_endpoint: String,
    /// Realtime model requested from the provider.
    pub model: String,
    /// Target language the agent translates into.
    pub language: String,
    /// Render the word-by-word breakdown.
    pub verbose: bool,
    /// Side-channel label negotiated into the session.
    pub channel_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:3000".into(),
            token_endpoint: "/api/rt-token".into(),
            signaling_endpoint: "https://api.openai.com/v1/realtime".into(),
            model: "gpt-realtime".into(),
            language: "Spanish".into(),
            verbose: false,
            channel_label: "oai-events".into(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let expanded = shellexpand::tilde(path);
                let raw = std::fs::read_to_string(expanded.as_ref())
                    .map_err(|e| anyhow::anyhow!("failed to read config {expanded}: {e}"))?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("failed to parse config {expanded}: {e}"))?
            }
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `VOXBRIDGE_*` overrides from the given lookup.
    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("VOXBRIDGE_ORIGIN") {
            self.origin = v;
        }
        if let Some(v) = get("VOXBRIDGE_TOKEN_ENDPOINT") {
            self.token_endpoint = v;
        }
        if let Some(v) = get("VOXBRIDGE_SIGNALING_ENDPOINT") {
            self.signaling_endpoint = v;
        }
        if let Some(v) = get("VOXBRIDGE_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("VOXBRIDGE_LANGUAGE") {
            self.language = v;
        }
        if let Some(v) = get("VOXBRIDGE_VERBOSE") {
            self.verbose = matches!(v.as_str(), "1" | "true" | "yes");
        }
    }

    /// The token endpoint as an absolute URL.
    pub fn resolved_token_endpoint(&self) -> String {
        if self.token_endpoint.starts_with("http://") || self.token_endpoint.starts_with("https://")
        {
            self.token_endpoint.clone()
        } else {
            format!(
                "{}/{}",
                self.origin.trim_end_matches('/'),
                self.token_endpoint.trim_start_matches('/')
            )
        }
    }

    /// The signaling endpoint as an absolute URL with the model baked in.
    pub fn resolved_signaling_endpoint(&self) -> String {
        if self.signaling_endpoint.contains('?') {
            self.signaling_endpoint.clone()
        } else {
            format!(
                "{}?model={}",
                self.signaling_endpoint.trim_end_matches('/'),
                self.model
            )
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            language: self.language.clone(),
            verbose: self.verbose,
            channel_label: self.channel_label.clone(),
        }
    }
}
