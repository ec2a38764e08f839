use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub aspect: f64,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 45.0, 1.0, 1000.0)
    }
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_deg: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            fov_y_deg,
            near,
            far,
            aspect: 1.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Right-handed perspective, depth mapped to `[0, 1]`, row-major.
    pub fn projection_row_major(&self) -> [[f64; 4]; 4] {
        let f = 1.0 / (0.5 * self.fov_y_deg.to_radians()).tan();
        let (near, far) = (self.near, self.far);
        [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, far / (near - far), (near * far) / (near - far)],
            [0.0, 0.0, -1.0, 0.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Camera3D;

    #[test]
    fn default_matches_viewer_camera() {
        let cam = Camera3D::default();
        assert_eq!(cam.position.z, 5.0);
        assert_eq!((cam.fov_y_deg, cam.near, cam.far), (45.0, 1.0, 1000.0));
    }

    #[test]
    fn aspect_scales_x_only() {
        let mut cam = Camera3D::default();
        let square = cam.projection_row_major();
        cam.set_aspect(2.0);
        let wide = cam.projection_row_major();
        assert!((wide[0][0] - square[0][0] / 2.0).abs() < 1e-12);
        assert_eq!(wide[1][1], square[1][1]);

        cam.set_aspect(0.0);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn near_plane_maps_to_depth_zero() {
        let cam = Camera3D::default();
        let m = cam.projection_row_major();
        // Point on the near plane: z_view = -near, w = 1.
        let z_clip = m[2][2] * -cam.near + m[2][3];
        let w_clip = m[3][2] * -cam.near;
        assert!((z_clip / w_clip).abs() < 1e-12);
    }
}
