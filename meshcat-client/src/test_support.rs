//! Test doubles for the meshcat server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use meshcat_protocol::Request;

pub const MOCK_WEB_URL: &str = "http://127.0.0.1:7000/static/";
pub const MOCK_SCENE: &str = "<html><body>\"scene\" & more</body></html>";

/// How the mock peer answers
#[derive(Debug, Clone)]
pub enum Responder {
    /// `url` -> [`MOCK_WEB_URL`], `get_scene` -> [`MOCK_SCENE`], anything else -> `ok`
    Default,
    /// Same reply for every request
    Fixed(&'static str),
    /// Like `Default`, but each reply is held back for the given time
    Delayed(Duration),
    /// Receive requests but never reply
    Silent,
}

impl Responder {
    fn reply(&self, frames: &[Bytes]) -> Option<Bytes> {
        match self {
            Responder::Default | Responder::Delayed(_) => {
                let reply = match Request::from_frames(frames) {
                    Ok(Request::Url) => MOCK_WEB_URL,
                    Ok(Request::GetScene) => MOCK_SCENE,
                    _ => "ok",
                };
                Some(Bytes::from_static(reply.as_bytes()))
            }
            Responder::Fixed(reply) => Some(Bytes::from_static(reply.as_bytes())),
            Responder::Silent => None,
        }
    }
}

/// REP socket on a random local port that records every request
pub struct MockPeer {
    endpoint: String,
    requests: Arc<Mutex<Vec<Vec<Bytes>>>>,
    task: JoinHandle<()>,
}

impl MockPeer {
    pub async fn start(responder: Responder) -> Self {
        let mut socket = RepSocket::new();
        let endpoint = socket
            .bind("tcp://127.0.0.1:0")
            .await
            .expect("bind mock peer")
            .to_string();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let task = tokio::spawn(async move {
            loop {
                let message = match socket.recv().await {
                    Ok(message) => message,
                    Err(_) => break,
                };
                let frames: Vec<Bytes> = message.iter().cloned().collect();
                recorded.lock().unwrap().push(frames.clone());

                if let Responder::Delayed(delay) = responder {
                    tokio::time::sleep(delay).await;
                }

                match responder.reply(&frames) {
                    // The requester may be gone by now; keep serving the others
                    Some(reply) => {
                        let _ = socket.send(ZmqMessage::from(reply)).await;
                    }
                    None => std::future::pending::<()>().await,
                }
            }
        });

        Self {
            endpoint,
            requests,
            task,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every request received so far, frame by frame
    pub fn requests(&self) -> Vec<Vec<Bytes>> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that carried a command (three frames)
    pub fn commands(&self) -> Vec<Vec<Bytes>> {
        self.requests()
            .into_iter()
            .filter(|frames| frames.len() == 3)
            .collect()
    }
}

impl Drop for MockPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `sh` script printing a server banner, then sleeping
pub fn banner_script(zmq_url: &str, web_url: &str) -> Vec<String> {
    vec![
        "-c".into(),
        format!(
            "echo 'zmq_url={}'; echo 'web_url={}'; exec sleep 30",
            zmq_url, web_url
        ),
    ]
}

/// Whether a process id still refers to a live (or unreaped) process
pub fn process_alive(pid: u32) -> bool {
    // SAFETY: signal 0 only checks for existence
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}
