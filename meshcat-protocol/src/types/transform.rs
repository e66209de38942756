//! Homogeneous 4x4 transforms

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Row-major 4x4 homogeneous transform.
///
/// On the wire the matrix is a flat list of 16 `f32` values in column-major
/// order, which is what the viewer feeds to `Matrix4.fromArray`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    rows: [[f64; 4]; 4],
}

impl Transform {
    pub fn identity() -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { rows }
    }

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Pure translation
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut transform = Self::identity();
        transform.rows[0][3] = x;
        transform.rows[1][3] = y;
        transform.rows[2][3] = z;
        transform
    }

    pub fn rows(&self) -> &[[f64; 4]; 4] {
        &self.rows
    }

    pub fn to_column_major(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = self.rows[row][col] as f32;
            }
        }
        out
    }

    pub fn from_column_major(values: &[f32; 16]) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                rows[row][col] = f64::from(values[col * 4 + row]);
            }
        }
        Self { rows }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Serialize for Transform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_column_major().to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f32>::deserialize(deserializer)?;
        let values: [f32; 16] = values.try_into().map_err(|v: Vec<f32>| {
            serde::de::Error::invalid_length(v.len(), &"16 matrix entries")
        })?;
        Ok(Self::from_column_major(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_column_major() {
        let flat = Transform::identity().to_column_major();
        for (i, value) in flat.iter().enumerate() {
            let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
            assert_eq!(*value, expected, "entry {}", i);
        }
    }

    #[test]
    fn test_translation_lands_in_last_column() {
        let flat = Transform::translation(1.0, 2.0, 3.0).to_column_major();
        assert_eq!(&flat[12..16], &[1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Transform::default(), Transform::identity());
    }

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let result: Result<Transform, _> = serde_json::from_str("[1.0, 0.0, 0.0]");
        assert!(result.is_err());
    }
}
