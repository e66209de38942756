//! Scene objects in the three.js JSON object format

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{JsonMap, JsonValue};

/// three.js object format version understood by the viewer
const OBJECT_FORMAT_VERSION: f64 = 4.5;

fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Geometry payload, e.g. `{"type": "BoxGeometry", "width": 1, ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub uuid: String,
    #[serde(flatten)]
    pub fields: JsonMap,
}

impl Geometry {
    /// Wrap a geometry description and give it a fresh uuid.
    ///
    /// Non-object values are stored under a `"data"` key.
    pub fn new(fields: JsonValue) -> Self {
        Self {
            uuid: new_uuid(),
            fields: into_map(fields),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(JsonValue::as_str)
    }
}

/// Material payload, e.g. `{"type": "MeshLambertMaterial", "color": 16711680}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub uuid: String,
    #[serde(flatten)]
    pub fields: JsonMap,
}

impl Material {
    pub fn new(fields: JsonValue) -> Self {
        Self {
            uuid: new_uuid(),
            fields: into_map(fields),
        }
    }

    /// White double-sided Phong material, used when none is given
    pub fn phong() -> Self {
        Self::new(json!({
            "type": "MeshPhongMaterial",
            "color": 0xffffff,
            "reflectivity": 0.5,
            "side": 2,
            "transparent": false,
            "opacity": 1.0,
            "linewidth": 1.0,
            "wireframe": false,
            "vertexColors": false,
        }))
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(JsonValue::as_str)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::phong()
    }
}

fn into_map(value: JsonValue) -> JsonMap {
    match value {
        JsonValue::Object(map) => map,
        other => {
            let mut map = JsonMap::new();
            map.insert("data".into(), other);
            map
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub version: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Root object node referencing its geometry and material by uuid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: String,
    pub material: String,
}

/// Self-contained mesh object as accepted by `set_object`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub metadata: ObjectMetadata,
    pub geometries: Vec<Geometry>,
    pub materials: Vec<Material>,
    pub object: ObjectRef,
}

impl SceneObject {
    /// Mesh built from a geometry and material
    pub fn mesh(geometry: Geometry, material: Material) -> Self {
        let object = ObjectRef {
            uuid: new_uuid(),
            kind: "Mesh".into(),
            geometry: geometry.uuid.clone(),
            material: material.uuid.clone(),
        };
        Self {
            metadata: ObjectMetadata {
                version: OBJECT_FORMAT_VERSION,
                kind: "Object".into(),
            },
            geometries: vec![geometry],
            materials: vec![material],
            object,
        }
    }
}
