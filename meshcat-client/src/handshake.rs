//! Startup banner of a spawned meshcat server
//!
//! Before accepting connections the server prints exactly two lines:
//!
//! ```text
//! zmq_url=<endpoint>
//! web_url=<url>
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use meshcat_utils::{MeshcatError, Result};

pub const ZMQ_URL_PATTERN: &str = r"^zmq_url=(.*)$";
pub const WEB_URL_PATTERN: &str = r"^web_url=(.*)$";

lazy_static! {
    static ref ZMQ_URL_REGEX: Regex = Regex::new(ZMQ_URL_PATTERN).unwrap();
    static ref WEB_URL_REGEX: Regex = Regex::new(WEB_URL_PATTERN).unwrap();
}

/// Endpoints announced by the server banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrls {
    pub zmq_url: String,
    pub web_url: String,
}

fn capture(regex: &Regex, pattern: &str, line: &str) -> Result<String> {
    regex
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| MeshcatError::Handshake {
            expected: pattern.to_string(),
            line: line.to_string(),
        })
}

pub fn match_zmq_url(line: &str) -> Result<String> {
    capture(&ZMQ_URL_REGEX, ZMQ_URL_PATTERN, line.trim())
}

pub fn match_web_url(line: &str) -> Result<String> {
    capture(&WEB_URL_REGEX, WEB_URL_PATTERN, line.trim())
}

/// Read the two banner lines, failing on the first one that does not match
pub async fn read_banner<R>(reader: &mut R) -> Result<ServerUrls>
where
    R: AsyncBufRead + Unpin,
{
    let first = read_line(reader, ZMQ_URL_PATTERN).await?;
    let zmq_url = match_zmq_url(&first)?;

    let second = read_line(reader, WEB_URL_PATTERN).await?;
    let web_url = match_web_url(&second)?;

    Ok(ServerUrls { zmq_url, web_url })
}

async fn read_line<R>(reader: &mut R, expected: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let read = reader.read_until(b'\n', &mut raw).await?;
    if read == 0 {
        return Err(MeshcatError::Handshake {
            expected: expected.to_string(),
            line: String::new(),
        });
    }

    // Non-UTF-8 output is a mismatch like any other line
    String::from_utf8(raw).map_err(|e| MeshcatError::Handshake {
        expected: expected.to_string(),
        line: String::from_utf8_lossy(e.as_bytes()).trim().to_string(),
    })
}
