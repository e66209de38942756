//! Animation clips and playback options

use serde::{Deserialize, Serialize};

use super::JsonValue;

/// Opaque list of animation clips, each addressed to its own scene path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Animation(pub JsonValue);

impl Animation {
    pub fn new(clips: JsonValue) -> Self {
        Self(clips)
    }

    pub fn clips(&self) -> &JsonValue {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationOptions {
    pub play: bool,
    pub repetitions: u32,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            play: true,
            repetitions: 1,
        }
    }
}
