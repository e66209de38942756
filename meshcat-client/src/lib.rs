//! meshcat-client: remote control for the meshcat 3D viewer
//!
//! Spawns or attaches to a meshcat server and drives its scene over a
//! ZeroMQ request/reply socket.
//!
//! ```no_run
//! # async fn demo() -> meshcat_utils::Result<()> {
//! use meshcat_client::{TransportContext, Visualizer, WindowOptions};
//! use meshcat_protocol::Transform;
//!
//! let ctx = TransportContext::new();
//! let vis = Visualizer::new(&ctx, WindowOptions::spawn()).await?;
//! vis.child("box").set_transform(Transform::translation(0.0, 0.0, 1.0)).await?;
//! vis.close().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod embed;
pub mod handshake;
pub mod server;
pub mod session;
pub mod visualizer;
pub mod window;

#[cfg(test)]
mod test_support;

pub use config::{ClientConfig, ConfigLoader, LoggingConfig, ServerConfig, SessionConfig};
pub use context::TransportContext;
pub use embed::{srcdoc_escape, StaticSnapshot};
pub use handshake::{read_banner, ServerUrls};
pub use server::{ServerCommand, ServerProcess};
pub use session::{CloseHandle, Session, SessionState};
pub use visualizer::Visualizer;
pub use window::{Window, WindowMode, WindowOptions};
