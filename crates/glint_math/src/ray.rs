use crate::Vec3;

/// What a ray is being traced for.
///
/// Shadow rays get filtered differently during traversal: meshes whose
/// material opts out of shadow casting ignore them entirely.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RayKind {
    #[default]
    Primary,
    Shadow,
}

/// A ray in 3D space with origin and direction.
///
/// Primary and shadow rays are normalised by their producers; rays that were
/// inverse-transformed into instance-local space intentionally are not, so
/// that `t` stays meaningful along the original world ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub kind: RayKind,
}

impl Ray {
    /// Create a new primary ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            kind: RayKind::Primary,
        }
    }

    /// Create a shadow ray toward a light.
    pub fn shadow(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            kind: RayKind::Shadow,
        }
    }

    /// Same ray carried into another space; keeps the kind.
    pub fn with_endpoints(&self, origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            kind: self.kind,
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
