use glint_math::Vec3;

/// A point light.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color: Vec3::ONE,
            intensity,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }
}
