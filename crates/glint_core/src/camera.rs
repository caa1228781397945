//! Pinhole camera.

use glint_math::{Mat3, Mat4, Ray, UVec2, Vec2, Vec3, Vec4};

/// Camera with a view transform, field of view and output resolution.
///
/// The view matrix's upper 3x3 carries the camera basis (columns are the
/// scene file's right/up/forward rows, so `view * v` rotates a view-space
/// direction into the world) and its translation column is the camera
/// position. An optional list of animation poses can replace the view
/// transform one frame at a time.
#[derive(Clone, Debug)]
pub struct Camera {
    pub view: Mat4,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub resolution: UVec2,
    aspect: f32,
    /// Animation poses; pose 0 is the base view when the list is empty.
    pub frames: Vec<Mat4>,
}

impl Camera {
    pub fn new(view: Mat4, fov: f32, resolution: UVec2) -> Self {
        Self {
            view,
            fov,
            resolution,
            aspect: resolution.x as f32 / resolution.y as f32,
            frames: Vec::new(),
        }
    }

    /// Assemble the view transform from a 3x3 basis (given as rows) and a
    /// position.
    pub fn from_basis(rows: [Vec3; 3], position: Vec3, fov: f32, resolution: UVec2) -> Self {
        let mut view = Mat4::from_mat3(Mat3::from_cols(rows[0], rows[1], rows[2]));
        view.w_axis = position.extend(1.0);
        Self::new(view, fov, resolution)
    }

    pub fn set_resolution(&mut self, resolution: UVec2) {
        self.resolution = resolution;
        self.aspect = resolution.x as f32 / resolution.y as f32;
    }

    /// Number of renderable camera poses.
    pub fn frame_count(&self) -> usize {
        self.frames.len().max(1)
    }

    /// Select an animation pose. Out-of-range frames leave the view as is.
    pub fn set_frame(&mut self, frame: usize) {
        if let Some(&pose) = self.frames.get(frame) {
            self.view = pose;
        }
    }

    pub fn position(&self) -> Vec3 {
        self.view.w_axis.truncate()
    }

    /// Generate the primary ray through a pixel.
    ///
    /// `jitter` is the sub-pixel offset in [0, 1) picked per sample.
    pub fn generate_ray(&self, pixel: UVec2, jitter: Vec2) -> Ray {
        // Flip Y for image coordinates
        let y = self.resolution.y - pixel.y - 1;

        let ndc = Vec2::new(
            (pixel.x as f32 + jitter.x) / self.resolution.x as f32,
            (y as f32 + jitter.y) / self.resolution.y as f32,
        );
        let mut screen = ndc * 2.0 - Vec2::ONE;
        screen.x *= self.aspect;

        let half_tan = (self.fov / 2.0).tan();
        let direction = Vec3::new(screen.x * half_tan, screen.y * half_tan, -1.0).normalize();
        let direction = (self.view * Vec4::new(direction.x, direction.y, direction.z, 0.0))
            .truncate()
            .normalize();

        Ray::new(self.position(), direction)
    }
}
