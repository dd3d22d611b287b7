//! Push-protocol handshake over a websocket connection.
//!
//! Frames are JSON objects `{ "id": <u32>, "value": [..] }`. After the
//! authentication and join frames are sent, the server pushes the stream
//! status, the media server address, and the play-path token asynchronously
//! and in no guaranteed order; negotiation holds partial state and resolves
//! only once both the server address and the play path have arrived.

use futures_util::{SinkExt, StreamExt};
use reeler_capture::CaptureDescriptor;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::error::{NegotiateError, NegotiateResult};
use crate::parse::SessionCredential;

pub(crate) const MSG_AUTH: u32 = 0;
pub(crate) const MSG_JOIN: u32 = 2;
pub(crate) const MSG_SERVER: u32 = 101;
pub(crate) const MSG_STREAM_STATUS: u32 = 102;
pub(crate) const MSG_PLAY_PATH: u32 = 103;
pub(crate) const MSG_LOGIN_ACK: u32 = 143;

const STATUS_FAILURE: &str = "failure";
const STATUS_ALREADY_JOINED: &str = "alreadyJoined";

/// One decoded push-protocol frame.
#[derive(Debug, Deserialize)]
pub(crate) struct Frame {
    pub(crate) id: u32,
    #[serde(default)]
    pub(crate) value: Vec<Value>,
}

impl Frame {
    fn first_value(&self) -> Option<&str> {
        self.value.first().and_then(Value::as_str)
    }
}

/// Partial negotiation outcome accumulated across frames.
#[derive(Debug, Default)]
pub(crate) struct NegotiationState {
    server_address: Option<String>,
    play_path: Option<String>,
}

impl NegotiationState {
    /// Fold one frame into the state, rejecting on distinguished failure
    /// signals.
    pub(crate) fn apply(&mut self, frame: &Frame, target: &str) -> NegotiateResult<()> {
        match frame.id {
            MSG_LOGIN_ACK => {
                if frame.first_value() == Some("0") {
                    debug!(target_name = %target, "push session authenticated");
                }
            }
            MSG_STREAM_STATUS => match frame.first_value() {
                Some(STATUS_FAILURE) => {
                    return Err(NegotiateError::Offline {
                        target: target.to_string(),
                    });
                }
                Some(STATUS_ALREADY_JOINED) => {
                    return Err(NegotiateError::AlreadyJoined {
                        target: target.to_string(),
                    });
                }
                _ => {}
            },
            MSG_SERVER => {
                if let Some(address) = frame.first_value() {
                    self.server_address = Some(address.to_string());
                }
            }
            MSG_PLAY_PATH => {
                if let Some(token) = frame.first_value() {
                    self.play_path = Some(token.to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The completed descriptor, once both halves have arrived.
    pub(crate) fn descriptor(&self) -> Option<CaptureDescriptor> {
        match (&self.server_address, &self.play_path) {
            (Some(server_address), Some(play_path)) => Some(CaptureDescriptor {
                server_address: server_address.clone(),
                play_path: play_path.clone(),
            }),
            _ => None,
        }
    }
}

pub(crate) fn auth_frame(credential: &SessionCredential) -> Value {
    // The uid is sent as a bare number when it parses as one.
    let uid = credential
        .uid
        .parse::<u64>()
        .map_or_else(|_| Value::String(credential.uid.clone()), Value::from);
    json!({ "id": MSG_AUTH, "value": [uid, credential.password] })
}

pub(crate) fn join_frame(target: &str) -> Value {
    json!({ "id": MSG_JOIN, "value": [target] })
}

/// Run the handshake against an already-normalized websocket endpoint.
pub(crate) async fn negotiate_over_websocket(
    endpoint: &str,
    credential: &SessionCredential,
    target: &str,
) -> NegotiateResult<CaptureDescriptor> {
    let (mut socket, _response) =
        connect_async(endpoint)
            .await
            .map_err(|source| NegotiateError::WebSocket {
                operation: "handshake.connect",
                source,
            })?;

    socket
        .send(Message::text(auth_frame(credential).to_string()))
        .await
        .map_err(|source| NegotiateError::WebSocket {
            operation: "handshake.auth",
            source,
        })?;
    socket
        .send(Message::text(join_frame(target).to_string()))
        .await
        .map_err(|source| NegotiateError::WebSocket {
            operation: "handshake.join",
            source,
        })?;

    let mut state = NegotiationState::default();
    while let Some(message) = socket.next().await {
        let message = message.map_err(|source| NegotiateError::WebSocket {
            operation: "handshake.recv",
            source,
        })?;
        let Message::Text(text) = message else {
            continue;
        };
        let frame: Frame =
            serde_json::from_str(text.as_str()).map_err(|source| NegotiateError::Json {
                operation: "handshake.frame",
                source,
            })?;
        state.apply(&frame, target)?;
        if let Some(descriptor) = state.descriptor() {
            let _ = socket.close(None).await;
            return Ok(descriptor);
        }
    }

    Err(NegotiateError::Protocol {
        reason: "connection closed before negotiation completed",
    })
}
