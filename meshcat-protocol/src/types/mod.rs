//! Payload types carried by scene commands
//!
//! Geometry, material and animation contents are opaque to this crate; they
//! are passed through to the viewer as-is.

pub mod animation;
pub mod object;
pub mod transform;

pub use animation::{Animation, AnimationOptions};
pub use object::{Geometry, Material, ObjectMetadata, ObjectRef, SceneObject};
pub use transform::Transform;

/// Re-export for callers building opaque payloads
pub type JsonValue = serde_json::Value;

/// JSON object used as the body of opaque payloads
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
