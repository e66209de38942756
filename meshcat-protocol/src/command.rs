//! Scene-mutation commands

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::types::{Animation, AnimationOptions, Geometry, Material, SceneObject, Transform};
use crate::wire::CodecError;

/// Kind tag of a [`Command`], sent verbatim as the first request frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SetObject,
    SetTransform,
    Delete,
    SetAnimation,
}

impl CommandKind {
    pub const ALL: [CommandKind; 4] = [
        CommandKind::SetObject,
        CommandKind::SetTransform,
        CommandKind::Delete,
        CommandKind::SetAnimation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::SetObject => "set_object",
            CommandKind::SetTransform => "set_transform",
            CommandKind::Delete => "delete",
            CommandKind::SetAnimation => "set_animation",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction to mutate the scene at one path.
///
/// The msgpack body is a map carrying every field, including the `"type"`
/// tag and the `"path"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SetObject {
        object: SceneObject,
        path: Path,
    },
    SetTransform {
        matrix: Transform,
        path: Path,
    },
    Delete {
        path: Path,
    },
    SetAnimation {
        animations: Animation,
        options: AnimationOptions,
        path: Path,
    },
}

impl Command {
    /// Place a mesh at `path`, falling back to [`Material::phong`]
    pub fn set_object(geometry: Geometry, material: Option<Material>, path: Path) -> Self {
        let material = material.unwrap_or_else(Material::phong);
        Command::SetObject {
            object: SceneObject::mesh(geometry, material),
            path,
        }
    }

    /// Place a prebuilt object at `path`
    pub fn set_scene_object(object: SceneObject, path: Path) -> Self {
        Command::SetObject { object, path }
    }

    pub fn set_transform(matrix: Transform, path: Path) -> Self {
        Command::SetTransform { matrix, path }
    }

    pub fn delete(path: Path) -> Self {
        Command::Delete { path }
    }

    /// Play `animation` on the scene.
    ///
    /// Each clip names the node it animates; `path` only fills the path
    /// header and body field, and callers pass the issuing view's path. The
    /// server does not re-root clips under it.
    pub fn set_animation(animation: Animation, play: bool, repetitions: u32, path: Path) -> Self {
        Command::SetAnimation {
            animations: animation,
            options: AnimationOptions { play, repetitions },
            path,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetObject { .. } => CommandKind::SetObject,
            Command::SetTransform { .. } => CommandKind::SetTransform,
            Command::Delete { .. } => CommandKind::Delete,
            Command::SetAnimation { .. } => CommandKind::SetAnimation,
        }
    }

    pub fn target_path(&self) -> &Path {
        match self {
            Command::SetObject { path, .. }
            | Command::SetTransform { path, .. }
            | Command::Delete { path }
            | Command::SetAnimation { path, .. } => path,
        }
    }

    /// Encode the full command as a msgpack map
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
