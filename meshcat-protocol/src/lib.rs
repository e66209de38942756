//! meshcat-protocol: scene addressing and wire format for the meshcat viewer
//!
//! This crate defines the path-addressed commands sent to a meshcat server
//! and how they are framed on its ZeroMQ request/reply socket.

pub mod command;
pub mod path;
pub mod types;
pub mod wire;

// Re-export main types at crate root
pub use command::{Command, CommandKind};
pub use path::{Path, PATH_DELIMITER};
pub use types::{
    Animation, AnimationOptions, Geometry, JsonMap, JsonValue, Material, SceneObject, Transform,
};
pub use wire::{command_frames, decode_text_reply, CodecError, Request};

/// Name of the root node every visualizer starts from
pub const DEFAULT_ROOT: &str = "meshcat";
