//! Failure taxonomy for session establishment.
//!
//! Only the three fatal categories live here — they all end the session,
//! release every acquired resource, and surface one human-readable status
//! line. Malformed side-channel events and unparsable breakdowns are
//! non-fatal and are handled (dropped or logged) inside the engine.

use thiserror::Error;

/// Fatal errors raised while establishing or running a voice session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Microphone permission denied, no capture device, or the media
    /// backend failed to deliver a usable track.
    #[error("audio capture failed: {0}")]
    MediaAcquisition(String),

    /// The token endpoint answered non-2xx, was unreachable, or returned
    /// a response with no usable client secret. `status` is 0 when the
    /// request never produced an HTTP response.
    #[error("token endpoint failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// The signaling exchange failed: non-2xx response, malformed SDP
    /// answer, or a transport-level error on the peer connection.
    #[error("negotiation failed: {0}")]
    Negotiation(String),
}

impl SessionError {
    /// Short status line suitable for the presentation surface.
    pub fn status_line(&self) -> String {
        match self {
            Self::MediaAcquisition(_) => "error: microphone unavailable".to_string(),
            Self::Auth { status, .. } if *status == 0 => {
                "error: token endpoint unreachable".to_string()
            }
            Self::Auth { status, .. } => format!("error: token endpoint returned {status}"),
            Self::Negotiation(_) => "error: failed to start session".to_string(),
        }
    }
}
