//! Multipart framing for the request/reply socket
//!
//! Mutation commands travel as three frames: `[kind, path, body]`. The
//! queries (`url`, `wait`, `get_scene`) are a single bare frame. Every reply
//! is a single frame.

use bytes::Bytes;

use crate::command::{Command, CommandKind};
use crate::path::Path;

/// Frame asking the server for the viewer's public URL
pub const URL_FRAME: &[u8] = b"url";
/// Frame blocking until a browser is connected to the server
pub const WAIT_FRAME: &[u8] = b"wait";
/// Frame requesting a standalone HTML snapshot of the scene
pub const GET_SCENE_FRAME: &[u8] = b"get_scene";

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to encode command: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Failed to decode command: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Unexpected frame count: expected {expected}, got {actual}")]
    UnexpectedFrames { expected: usize, actual: usize },

    #[error("Frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Unknown request: {0}")]
    UnknownRequest(String),

    #[error("Framing mismatch: header says {header}, body says {body}")]
    HeaderMismatch { header: String, body: String },
}

/// One request on the socket
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Url,
    Wait,
    GetScene,
    Command(Command),
}

impl Request {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Request::Url => "url",
            Request::Wait => "wait",
            Request::GetScene => "get_scene",
            Request::Command(command) => command.kind().as_str(),
        }
    }

    pub fn to_frames(&self) -> Result<Vec<Bytes>, CodecError> {
        let frames = match self {
            Request::Url => vec![Bytes::from_static(URL_FRAME)],
            Request::Wait => vec![Bytes::from_static(WAIT_FRAME)],
            Request::GetScene => vec![Bytes::from_static(GET_SCENE_FRAME)],
            Request::Command(command) => command_frames(command)?,
        };
        Ok(frames)
    }

    /// Parse a request as the server sees it
    pub fn from_frames(frames: &[Bytes]) -> Result<Self, CodecError> {
        match frames {
            [single] => match single.as_ref() {
                URL_FRAME => Ok(Request::Url),
                WAIT_FRAME => Ok(Request::Wait),
                GET_SCENE_FRAME => Ok(Request::GetScene),
                other => Err(CodecError::UnknownRequest(
                    String::from_utf8_lossy(other).into_owned(),
                )),
            },
            [kind, path, body] => {
                let kind = std::str::from_utf8(kind)?;
                let path = std::str::from_utf8(path)?;
                if CommandKind::parse(kind).is_none() {
                    return Err(CodecError::UnknownRequest(kind.to_string()));
                }

                let command = Command::decode(body)?;
                if command.kind().as_str() != kind {
                    return Err(CodecError::HeaderMismatch {
                        header: kind.to_string(),
                        body: command.kind().to_string(),
                    });
                }
                if command.target_path() != &Path::from_wire(path) {
                    return Err(CodecError::HeaderMismatch {
                        header: path.to_string(),
                        body: command.target_path().to_wire(),
                    });
                }
                Ok(Request::Command(command))
            }
            other => Err(CodecError::UnexpectedFrames {
                expected: 3,
                actual: other.len(),
            }),
        }
    }
}

/// `[kind, path, body]` frames for a command
pub fn command_frames(command: &Command) -> Result<Vec<Bytes>, CodecError> {
    Ok(vec![
        Bytes::from_static(command.kind().as_str().as_bytes()),
        Bytes::from(command.target_path().to_wire().into_bytes()),
        Bytes::from(command.encode()?),
    ])
}

/// Decode a single-frame UTF-8 reply (`url`, `wait`, `get_scene`)
pub fn decode_text_reply(frames: &[Bytes]) -> Result<String, CodecError> {
    match frames {
        [single] => Ok(std::str::from_utf8(single)?.to_string()),
        other => Err(CodecError::UnexpectedFrames {
            expected: 1,
            actual: other.len(),
        }),
    }
}
