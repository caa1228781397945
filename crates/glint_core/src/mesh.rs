//! Triangle mesh geometry.

use glint_math::{Aabb, Vec3};

use crate::error::{SceneError, SceneResult};

/// A triangle mesh: vertex soup plus per-vertex shading data.
///
/// Vertex normals average the unit normals of the adjacent faces, each face
/// counting equally; per-triangle geometric normals are kept alongside for
/// flat shading and back-face tests.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Smooth per-vertex normals, unit length
    pub normals: Vec<Vec3>,

    /// Texture coordinates, one per vertex (zero if the file has none)
    pub uvs: Vec<Vec3>,

    /// Triangle index triples, each referencing valid vertices
    pub indices: Vec<[u32; 3]>,

    /// Geometric (face) normals, one per triangle, unit length
    pub triangle_normals: Vec<Vec3>,

    /// Axis-aligned bounding box of all vertices
    pub bounds: Aabb,
}

impl Mesh {
    /// Build a mesh from flat scene-file arrays.
    ///
    /// `vertices` holds xyz triplets, `triangles` holds index triples and
    /// `uvs` (when present) holds one uvw triplet per vertex.
    pub fn from_arrays(
        vertices: &[f32],
        triangles: &[i64],
        uvs: Option<&[f32]>,
    ) -> SceneResult<Self> {
        if vertices.len() % 3 != 0 {
            return Err(SceneError::config(format!(
                "vertex array length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if triangles.len() % 3 != 0 {
            return Err(SceneError::config(format!(
                "triangle array length {} is not a multiple of 3",
                triangles.len()
            )));
        }

        let positions: Vec<Vec3> = vertices
            .chunks_exact(3)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
            .collect();

        let uvs = match uvs {
            Some(raw) => {
                if raw.len() != vertices.len() {
                    return Err(SceneError::config(format!(
                        "uv array length {} does not match vertex array length {}",
                        raw.len(),
                        vertices.len()
                    )));
                }
                raw.chunks_exact(3)
                    .map(|v| Vec3::new(v[0], v[1], v[2]))
                    .collect()
            }
            None => {
                log::warn!("mesh has no texture coordinates, defaulting to zero");
                vec![Vec3::ZERO; positions.len()]
            }
        };

        let mut indices = Vec::with_capacity(triangles.len() / 3);
        let mut triangle_normals = Vec::with_capacity(triangles.len() / 3);
        for tri in triangles.chunks_exact(3) {
            let mut idx = [0u32; 3];
            for (slot, &raw) in idx.iter_mut().zip(tri) {
                if raw < 0 || raw as usize >= positions.len() {
                    return Err(SceneError::config(format!(
                        "triangle index {} out of bounds for {} vertices",
                        raw,
                        positions.len()
                    )));
                }
                *slot = raw as u32;
            }
            let normal = face_normal(
                positions[idx[0] as usize],
                positions[idx[1] as usize],
                positions[idx[2] as usize],
            );
            indices.push(idx);
            triangle_normals.push(normal);
        }

        let mut bounds = Aabb::EMPTY;
        for &p in &positions {
            bounds.grow(p);
        }

        let normals = smooth_normals(&positions, &indices);

        Ok(Self {
            positions,
            normals,
            uvs,
            indices,
            triangle_normals,
            bounds,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// The three corner positions of a triangle.
    #[inline]
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.indices[index];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }
}

fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).normalize_or_zero()
}

/// Average face normals at each vertex.
fn smooth_normals(positions: &[Vec3], indices: &[[u32; 3]]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    let mut counts = vec![0u32; positions.len()];

    for &[a, b, c] in indices {
        let normal = face_normal(
            positions[a as usize],
            positions[b as usize],
            positions[c as usize],
        );
        for i in [a, b, c] {
            sums[i as usize] += normal;
            counts[i as usize] += 1;
        }
    }

    sums.iter()
        .zip(&counts)
        .enumerate()
        .map(|(i, (&sum, &count))| {
            if count > 0 {
                (sum / count as f32).normalize_or_zero()
            } else {
                log::warn!("vertex {i} belongs to no triangle, using default normal");
                Vec3::Y
            }
        })
        .collect()
}
